use std::fmt::Write;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClassifierConfig;
use crate::store::NewArticle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a news sentiment analyzer. Your task is to return \
    ONLY a JSON array of indices for positive articles. No explanation, no additional \
    text, just the array. Example response: [0,1,4]";

/// Sentiment classification via an OpenAI-compatible chat completion API.
///
/// The contract with the pipeline is deliberately soft: whatever goes wrong with the
/// external service (transport errors, API errors, replies that are not an index
/// array), the batch is treated as containing no positive articles. Classification
/// failures never abort an ingestion run.
pub struct Classifier {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl Classifier {
    pub fn new(cfg: &ClassifierConfig, api_key: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("could not create an HTTP client for the classifier")?;

        Ok(Self {
            http_client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: cfg.model.clone(),
        })
    }

    /// Returns the batch-local indices of the articles judged positive.
    pub async fn classify(&self, batch: &[NewArticle]) -> Vec<usize> {
        match self.request_indices(batch).await {
            Ok(indices) => {
                debug!(
                    batch_len = batch.len(),
                    positive = indices.len(),
                    "Classified a batch"
                );

                indices
                    .into_iter()
                    .filter_map(|idx| usize::try_from(idx).ok())
                    .filter(|&idx| idx < batch.len())
                    .collect()
            }

            Err(e) => {
                warn!("Could not classify a batch; treating it as having no positive articles: {e:#}");

                Vec::new()
            }
        }
    }

    async fn request_indices(&self, batch: &[NewArticle]) -> Result<Vec<i64>> {
        let prompt = build_prompt(batch);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.3,
            max_tokens: 150,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Into::into)
            .and_then(|r| {
                r.error_for_status()
                    .context("the classification service returned an error")
            })?;
        let reply: ChatResponse = response
            .json()
            .await
            .context("could not read the classification reply")?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("the classification reply contains no choices"))?;

        extract_indices(content.trim())
    }
}

fn build_prompt(batch: &[NewArticle]) -> String {
    let mut articles = String::new();

    for (idx, article) in batch.iter().enumerate() {
        let _ = writeln!(
            articles,
            "{idx}. Title: {}\nDescription: {}\n",
            article.title, article.content_snippet,
        );
    }

    format!(
        "Analyze these news articles and identify which have a positive tone or convey \
        positive news. Return ONLY a JSON array of indices for positive articles.\n\n\
        Articles:\n{articles}\n\
        RESPOND WITH ONLY A JSON ARRAY LIKE [0,1,4]. NO OTHER TEXT."
    )
}

/// Normalizes a model reply into an index array.
///
/// Direct JSON parsing is tried first; if the model disobeyed the prompt and wrapped
/// the array in prose, the first bracket-delimited substring is parsed instead.
fn extract_indices(reply: &str) -> Result<Vec<i64>> {
    if let Ok(indices) = serde_json::from_str::<Vec<i64>>(reply) {
        return Ok(indices);
    }

    static ARRAY: OnceLock<Regex> = OnceLock::new();

    let array = ARRAY.get_or_init(|| Regex::new(r"\[.*?\]").unwrap());
    let candidate = array
        .find(reply)
        .ok_or_else(|| anyhow!("the reply `{reply}` contains no JSON array"))?;

    serde_json::from_str(candidate.as_str())
        .with_context(|| anyhow!("the reply `{reply}` does not contain an index array"))
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_array() {
        assert_eq!(extract_indices("[0,1,4]").unwrap(), [0, 1, 4]);
        assert!(extract_indices("[]").unwrap().is_empty());
    }

    #[test]
    fn extracts_an_array_wrapped_in_prose() {
        assert_eq!(extract_indices("Sure! [0, 2]").unwrap(), [0, 2]);
        assert_eq!(
            extract_indices("Here you go: [1] (hope this helps)").unwrap(),
            [1],
        );
    }

    #[test]
    fn takes_the_first_array_when_several_appear() {
        assert_eq!(extract_indices("[0, 2] or maybe [1]").unwrap(), [0, 2]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(extract_indices("no articles are positive").is_err());
        assert!(extract_indices(r#"["first", "third"]"#).is_err());
        assert!(extract_indices("").is_err());
    }

    #[test]
    fn the_prompt_numbers_articles_from_zero() {
        use time::macros::datetime;

        let batch = vec![
            NewArticle {
                title: "Good news".into(),
                content_snippet: "Everything is fine".into(),
                link: "https://a.example/1".into(),
                pub_date: datetime!(2026-08-30 12:00 UTC),
            },
            NewArticle {
                title: "Other news".into(),
                content_snippet: String::new(),
                link: "https://a.example/2".into(),
                pub_date: datetime!(2026-08-30 12:00 UTC),
            },
        ];

        let prompt = build_prompt(&batch);
        assert!(prompt.contains("0. Title: Good news\nDescription: Everything is fine"));
        assert!(prompt.contains("1. Title: Other news\nDescription: \n"));
    }
}
