use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::registry::FeedRegistry;
use crate::store::ArticleStore;

/// Shared application services, constructed once at startup and injected into the
/// route handlers and background tasks.
#[derive(Clone)]
pub struct State {
    pub cfg: Arc<Config>,
    pub registry: Arc<FeedRegistry>,
    pub store: Arc<ArticleStore>,
    pub fetcher: Arc<Fetcher>,
    pub classifier: Option<Arc<Classifier>>,
}

impl State {
    pub fn new(cfg: Config) -> Result<Self> {
        let registry = Arc::new(FeedRegistry::new(cfg.feeds.iter().cloned()));
        let store = Arc::new(ArticleStore::new());
        let fetcher = Arc::new(Fetcher::new()?);

        let classifier = match &cfg.classifier.api_key {
            Some(api_key) => Some(Arc::new(Classifier::new(&cfg.classifier, api_key)?)),

            None => {
                info!("Sentiment classification is disabled: no API key is configured");

                None
            }
        };

        Ok(State {
            cfg: Arc::new(cfg),
            registry,
            store,
            fetcher,
            classifier,
        })
    }
}
