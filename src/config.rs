mod types;

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

pub use self::types::*;

fn default_recency_window() -> Duration {
    Config::default().recency_window
}

fn default_refresh_interval() -> Duration {
    Config::default().refresh_interval
}

fn default_per_feed_limit() -> usize {
    Config::default().per_feed_limit
}

fn default_feeds() -> Vec<String> {
    Config::default().feeds
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub bind_addr: String,

    /// Feed URLs the registry is seeded with at startup.
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,

    /// Only items published within this trailing window are ingested.
    #[serde(default = "default_recency_window")]
    pub recency_window: Duration,

    /// Per-feed cap on items surviving the recency filter.
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,

    /// How often the background task re-runs the ingestion pipeline.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Duration,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn update(&mut self, args: crate::cli::Args) {
        fn set_if_some<T>(dst: &mut T, v: Option<T>) {
            if let Some(v) = v {
                *dst = v;
            }
        }

        set_if_some(&mut self.bind_addr, args.bind_addr);
        set_if_some(&mut self.classifier.api_key, args.api_key.map(Some));
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.per_feed_limit > 0,
            "`per-feed-limit` must be at least 1"
        );
        ensure!(
            self.classifier.batch_size > 0,
            "`classifier.batch-size` must be at least 1"
        );

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:3000".into(),
            feeds: vec![
                "https://feeds.bbci.co.uk/news/world/rss.xml".into(),
                "https://rss.nytimes.com/services/xml/rss/nyt/World.xml".into(),
                "https://feeds.a.dj.com/rss/RSSWorldNews.xml".into(),
                "https://www.positive.news/feed/".into(),
            ],
            recency_window: Duration::from_secs(24 * 3600),
            per_feed_limit: 10,
            refresh_interval: Duration::from_secs(300),
            classifier: Default::default(),
        }
    }
}

fn default_api_base() -> String {
    ClassifierConfig::default().api_base
}

fn default_model() -> String {
    ClassifierConfig::default().model
}

fn default_batch_size() -> usize {
    ClassifierConfig::default().batch_size
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Base URL of an OpenAI-compatible chat completion API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Sentiment classification is disabled when no key is configured.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Number of candidate articles submitted per classification request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            api_base: "https://api.openai.com/v1".into(),
            model: "gpt-4-turbo-preview".into(),
            api_key: None,
            batch_size: 10,
        }
    }
}

pub fn load(search_paths: &[PathBuf]) -> Result<Config> {
    for path in search_paths {
        debug!("Trying to load {}", path.display());
        let mut contents = String::new();

        {
            let mut f = match File::open(path) {
                Ok(f) => f,

                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(file = %path.display(), "File not found, skipping");
                    continue;
                }

                Err(e) => {
                    return Err(e)
                        .context(anyhow!("could not load a config file `{}`", path.display()));
                }
            };

            f.read_to_string(&mut contents).with_context(|| {
                anyhow!(
                    "could not read the contents of a config file `{}`",
                    path.display()
                )
            })?;
        }

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| anyhow!("could not load the config file `{}`", path.display()))?;
        cfg.validate()
            .with_context(|| anyhow!("the config file `{}` is invalid", path.display()))?;

        info!("Loaded a config file `{}`", path.display());

        return Ok(cfg);
    }

    info!("Using the default config");

    Ok(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let cfg: Config = toml::from_str(
            r#"
            bind-addr = "0.0.0.0:8080"
            feeds = ["https://example.com/feed.xml"]
            recency-window = "12h"
            per-feed-limit = 5
            refresh-interval = "10m"

            [classifier]
            api-base = "https://llm.example.com/v1"
            model = "test-model"
            api-key = "secret"
            batch-size = 4
            "#,
        )
        .unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.feeds, vec!["https://example.com/feed.xml"]);
        assert_eq!(cfg.per_feed_limit, 5);
        assert_eq!(cfg.classifier.batch_size, 4);
        assert_eq!(cfg.classifier.api_key.as_deref(), Some("secret"));
        cfg.validate().unwrap();
    }

    #[test]
    fn falls_back_to_defaults() {
        let cfg: Config = toml::from_str(r#"bind-addr = "127.0.0.1:3000""#).unwrap();

        assert_eq!(cfg.feeds.len(), 4);
        assert_eq!(
            std::time::Duration::from(cfg.recency_window),
            std::time::Duration::from_secs(86_400),
        );
        assert_eq!(cfg.per_feed_limit, 10);
        assert!(cfg.classifier.api_key.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(toml::from_str::<Config>(r#"listen-addr = "127.0.0.1:3000""#).is_err());
    }

    #[test]
    fn rejects_a_zero_batch_size() {
        let cfg: Config = toml::from_str(
            r#"
            bind-addr = "127.0.0.1:3000"

            [classifier]
            batch-size = 0
            "#,
        )
        .unwrap();

        assert!(cfg.validate().is_err());
    }
}
