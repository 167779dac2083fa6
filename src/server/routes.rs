use std::cmp::Reverse;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::fetch::RawItem;
use crate::pipeline::{self, Mode, Outcome};
use crate::state::State as AppState;
use crate::store::{Article, NewArticle};

use super::responses::ApiError;

const DEV_ITEMS_PER_FEED: usize = 20;
const DEV_ITEMS_MAX: usize = 100;
const DEV_CLASSIFY_PER_FEED: usize = 5;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddFeedRequest {
    rss_url: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AddFeedResponse {
    success: bool,
    feeds: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct FeedListResponse {
    feeds: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct ArticlesResponse {
    articles: Vec<Article>,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,

    debug: DebugCounters,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DebugCounters {
    feeds_count: usize,
    new_articles_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    analyzed_count: Option<usize>,

    total_stored_articles: usize,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    article_id: Option<u64>,
}

#[derive(Serialize, Debug)]
pub struct MarkReadResponse {
    success: bool,
    article: Article,
}

#[derive(Serialize, Debug)]
pub struct DevItemsResponse {
    articles: Vec<RawItem>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DevClassifierResponse {
    analyzed_count: usize,
    positive: Vec<RawItem>,
}

pub async fn add_feed(
    State(state): State<AppState>,
    payload: Result<Json<AddFeedRequest>, JsonRejection>,
) -> Result<Json<AddFeedResponse>, ApiError> {
    let url = payload
        .ok()
        .and_then(|Json(req)| req.rss_url)
        .ok_or(ApiError::Validation("RSS URL is required"))?;
    let feeds = state.registry.add(&url)?;

    Ok(Json(AddFeedResponse {
        success: true,
        feeds,
    }))
}

pub async fn list_feeds(
    State(state): State<AppState>,
) -> Result<Json<FeedListResponse>, ApiError> {
    Ok(Json(FeedListResponse {
        feeds: state.registry.list()?,
    }))
}

pub async fn raw_articles(
    State(state): State<AppState>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let outcome = pipeline::run(&state, Mode::Raw).await?;

    Ok(articles_response(outcome, Mode::Raw))
}

pub async fn curated_articles(
    State(state): State<AppState>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let outcome = pipeline::run(&state, Mode::Curated).await?;

    Ok(articles_response(outcome, Mode::Curated))
}

fn articles_response(outcome: Outcome, mode: Mode) -> Json<ArticlesResponse> {
    let message = (outcome.feeds_count == 0).then_some("No RSS feeds configured");

    Json(ArticlesResponse {
        articles: outcome.articles,
        message,
        debug: DebugCounters {
            feeds_count: outcome.feeds_count,
            new_articles_count: outcome.new_count,
            analyzed_count: (mode == Mode::Curated).then_some(outcome.analyzed_count),
            total_stored_articles: outcome.total_stored,
        },
    })
}

pub async fn mark_read(
    State(state): State<AppState>,
    payload: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let id = payload
        .ok()
        .and_then(|Json(req)| req.article_id)
        .ok_or(ApiError::Validation("Article ID is required"))?;
    let article = state
        .store
        .mark_read(id)?
        .ok_or(ApiError::NotFound("Article not found"))?;

    Ok(Json(MarkReadResponse {
        success: true,
        article,
    }))
}

/// Dev-console view of the raw feed contents: a slice of every feed with no recency
/// filtering or deduplication applied.
pub async fn dev_items(
    State(state): State<AppState>,
) -> Result<Json<DevItemsResponse>, ApiError> {
    let mut articles = Vec::new();

    for url in state.registry.list()? {
        match state.fetcher.fetch(&url).await {
            Ok(items) => articles.extend(items.into_iter().take(DEV_ITEMS_PER_FEED)),

            Err(e) => {
                warn!("Skipping the feed `{url}`: {e:#}");
            }
        }
    }

    articles.sort_by_key(|item| Reverse(item.pub_date));
    articles.truncate(DEV_ITEMS_MAX);

    Ok(Json(DevItemsResponse { articles }))
}

/// Dev-console classifier dry run: feeds a small sample of every feed through the
/// classifier and reports which items it judged positive. Nothing is stored.
pub async fn dev_classifier(
    State(state): State<AppState>,
) -> Result<Json<DevClassifierResponse>, ApiError> {
    let Some(classifier) = &state.classifier else {
        return Err(ApiError::Validation("Classifier API key is not configured"));
    };

    let mut items = Vec::new();

    for url in state.registry.list()? {
        match state.fetcher.fetch(&url).await {
            Ok(fetched) => items.extend(fetched.into_iter().take(DEV_CLASSIFY_PER_FEED)),

            Err(e) => {
                warn!("Skipping the feed `{url}`: {e:#}");
            }
        }
    }

    let now = OffsetDateTime::now_utc();
    let mut positive = Vec::new();

    for chunk in items.chunks(state.cfg.classifier.batch_size) {
        let batch = chunk
            .iter()
            .map(|item| NewArticle {
                title: item.title.clone(),
                content_snippet: item.content_snippet.clone(),
                link: item.link.clone(),
                // the dry run applies no recency filter, so undated items are allowed
                pub_date: item.pub_date.unwrap_or(now),
            })
            .collect::<Vec<_>>();

        for idx in classifier.classify(&batch).await {
            positive.push(chunk[idx].clone());
        }
    }

    Ok(Json(DevClassifierResponse {
        analyzed_count: items.len(),
        positive,
    }))
}
