use clap::ValueHint;

use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Path to the config file.
    ///
    /// By default, goodnews looks for a file named `goodnews.toml` in the following directories
    /// (in order):
    ///
    /// - `./` (the current directory)
    /// - `/etc`
    #[arg(
        short,
        env = "GOODNEWS_CONFIG",
        value_hint(ValueHint::FilePath)
    )]
    pub config_path: Option<PathBuf>,

    /// API server address to bind to.
    #[arg(long, env = "GOODNEWS_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// API key for the sentiment classification service.
    ///
    /// If neither this nor the `classifier.api-key` config entry is set, sentiment
    /// classification is disabled and the curated endpoint stores no new articles.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Args {
    pub fn parse() -> Self {
        clap::Parser::parse()
    }
}
