use std::cmp::Reverse;
use std::collections::HashSet;

use anyhow::Result;
use time::OffsetDateTime;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::fetch::RawItem;
use crate::state::State;
use crate::store::{Article, NewArticle};

/// Whether candidates are stored unconditionally or only after the sentiment
/// classifier judged them positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Raw,
    Curated,
}

#[derive(Debug)]
pub struct Outcome {
    /// Reused and newly inserted articles from this run, newest first.
    pub articles: Vec<Article>,
    pub feeds_count: usize,
    pub new_count: usize,
    /// How many candidates were submitted to the classifier (curated mode only).
    pub analyzed_count: usize,
    pub total_stored: usize,
}

/// Runs one ingestion pass: fetch every registered feed, keep recent items, dedupe
/// against the store, optionally classify, insert, and sort for presentation.
///
/// This never fails because of an upstream service: a feed that cannot be fetched or
/// parsed contributes zero items, and a classifier failure makes its batch contribute
/// zero positives. Only store/registry corruption surfaces as an error.
pub async fn run(state: &State, mode: Mode) -> Result<Outcome> {
    async move {
        let feeds = state.registry.list()?;
        let window: std::time::Duration = state.cfg.recency_window.into();
        let cutoff = OffsetDateTime::now_utc() - window;

        let mut seen_links = HashSet::new();
        let mut reused = Vec::new();
        let mut candidates = Vec::new();

        for url in &feeds {
            let items = match state.fetcher.fetch(url).await {
                Ok(items) => items,

                Err(e) => {
                    warn!("Skipping the feed `{url}`: {e:#}");
                    continue;
                }
            };

            for item in recent(items, cutoff, state.cfg.per_feed_limit) {
                if !seen_links.insert(item.link.clone()) {
                    continue;
                }

                match state.store.get_by_link(&item.link)? {
                    Some(article) => reused.push(article),
                    None => candidates.push(item),
                }
            }
        }

        let analyzed_count = match mode {
            Mode::Curated => candidates.len(),
            Mode::Raw => 0,
        };
        let mut new_count = 0;
        let mut inserted = Vec::new();

        match mode {
            Mode::Raw => {
                for candidate in candidates {
                    let (article, created) = state.store.insert_if_absent(candidate)?;

                    if created {
                        new_count += 1;
                    }

                    inserted.push(article);
                }
            }

            Mode::Curated => {
                if let Some(classifier) = &state.classifier {
                    for batch in candidates.chunks(state.cfg.classifier.batch_size) {
                        for idx in classifier.classify(batch).await {
                            let (article, created) =
                                state.store.insert_if_absent(batch[idx].clone())?;

                            if created {
                                new_count += 1;
                            }

                            inserted.push(article);
                        }
                    }
                } else if !candidates.is_empty() {
                    debug!(
                        count = candidates.len(),
                        "No classifier is configured; discarding all candidates"
                    );
                }
            }
        }

        let mut articles = reused;
        articles.extend(inserted);
        articles.sort_by_key(|article| Reverse(article.pub_date));

        let outcome = Outcome {
            articles,
            feeds_count: feeds.len(),
            new_count,
            analyzed_count,
            total_stored: state.store.count()?,
        };
        info!(
            feeds = outcome.feeds_count,
            new = outcome.new_count,
            stored = outcome.total_stored,
            "Finished an ingestion run"
        );

        Ok(outcome)
    }
    .instrument(info_span!("pipeline", ?mode))
    .await
}

/// Recency filter: keeps items published after `cutoff`, then truncates to `limit`
/// while preserving the feed's order. Items without a usable publication date are
/// excluded.
fn recent(items: Vec<RawItem>, cutoff: OffsetDateTime, limit: usize) -> Vec<NewArticle> {
    items
        .into_iter()
        .filter_map(|item| {
            let pub_date = item.pub_date.filter(|&d| d > cutoff)?;

            Some(NewArticle {
                title: item.title,
                content_snippet: item.content_snippet,
                link: item.link,
                pub_date,
            })
        })
        .take(limit)
        .collect()
}
