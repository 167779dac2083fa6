use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

/// The set of subscribed feed URLs, in insertion order.
///
/// URLs are not validated for reachability here: a bad feed simply yields a fetch
/// failure (and zero items) on the next pipeline run.
#[derive(Debug, Default)]
pub struct FeedRegistry {
    feeds: Mutex<Vec<String>>,
}

impl FeedRegistry {
    pub fn new(seed: impl IntoIterator<Item = String>) -> Self {
        let mut feeds = Vec::new();

        for url in seed {
            if !feeds.contains(&url) {
                feeds.push(url);
            }
        }

        Self {
            feeds: Mutex::new(feeds),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<String>>> {
        self.feeds
            .lock()
            .map_err(|_| anyhow!("the feed registry mutex is poisoned"))
    }

    /// Registers a feed URL unless it is already present. Returns the full list.
    pub fn add(&self, url: &str) -> Result<Vec<String>> {
        let mut feeds = self.lock()?;

        if !feeds.iter().any(|f| f == url) {
            feeds.push(url.into());
        }

        Ok(feeds.clone())
    }

    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.clone())
    }
}
