use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use serde::Serialize;
use time::OffsetDateTime;

/// A stored article. `link` is the identity used for deduplication; `id` is only
/// handed out for the mark-read operation.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub content_snippet: String,
    pub link: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub is_read: bool,
}

/// A candidate article that survived the recency filter but has not been checked
/// against the store yet.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content_snippet: String,
    pub link: String,
    pub pub_date: OffsetDateTime,
}

/// Process-lifetime article storage.
///
/// Articles are only ever appended and only their `is_read` flag is mutated, so ids
/// assigned from the current length stay unique. All operations take the mutex for
/// their whole duration, which makes `insert_if_absent` atomic and keeps concurrent
/// pipeline runs from inserting the same link twice.
#[derive(Debug, Default)]
pub struct ArticleStore {
    articles: Mutex<Vec<Article>>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Default::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Article>>> {
        self.articles
            .lock()
            .map_err(|_| anyhow!("the article store mutex is poisoned"))
    }

    pub fn get_by_link(&self, link: &str) -> Result<Option<Article>> {
        Ok(self.lock()?.iter().find(|a| a.link == link).cloned())
    }

    /// Inserts the candidate unless an article with the same link is already stored.
    /// Returns the stored article and whether it was newly created.
    pub fn insert_if_absent(&self, new: NewArticle) -> Result<(Article, bool)> {
        let mut articles = self.lock()?;

        if let Some(existing) = articles.iter().find(|a| a.link == new.link) {
            return Ok((existing.clone(), false));
        }

        let article = Article {
            id: articles.len() as u64 + 1,
            title: new.title,
            content_snippet: new.content_snippet,
            link: new.link,
            pub_date: new.pub_date,
            is_read: false,
        };
        articles.push(article.clone());

        Ok((article, true))
    }

    /// Sets the read flag on the matching article. Returns `None` if no article has
    /// that id.
    pub fn mark_read(&self, id: u64) -> Result<Option<Article>> {
        let mut articles = self.lock()?;
        let Some(article) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        article.is_read = true;

        Ok(Some(article.clone()))
    }

    pub fn all(&self) -> Result<Vec<Article>> {
        Ok(self.lock()?.clone())
    }

    /// Number of stored articles, as reported in the diagnostic counters.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}
