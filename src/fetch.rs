use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rss::Channel;
use serde::Serialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(300);

/// An item as it came out of a feed document. Lives only within one pipeline run.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub title: String,
    pub content_snippet: String,
    pub link: String,

    /// `None` when the feed carries no publication date or one that does not parse.
    /// Such items never pass the recency filter.
    #[serde(with = "time::serde::rfc3339::option")]
    pub pub_date: Option<OffsetDateTime>,
}

pub struct Fetcher {
    http_client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .build()
            .context("could not create an HTTP client")?;

        Ok(Self { http_client })
    }

    /// Retrieves and parses one feed document. Failures are the caller's to handle:
    /// the pipeline logs them and treats the feed as having produced zero items.
    pub async fn fetch(&self, url: &str) -> Result<Vec<RawItem>> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(Into::into)
            .and_then(|r| r.error_for_status().context("server returned an error"))
            .with_context(|| anyhow!("could not fetch `{url}`"))?;
        let body = response
            .bytes()
            .await
            .with_context(|| anyhow!("could not read the response when fetching `{url}`"))?;

        let channel = Channel::read_from(&body[..])
            .with_context(|| anyhow!("could not parse `{url}` as an RSS document"))?;

        let items = channel
            .items
            .into_iter()
            .filter_map(|item| {
                // an item without a link has no dedup identity
                let link = item.link?;

                Some(RawItem {
                    title: item.title.unwrap_or_default(),
                    content_snippet: item.description.unwrap_or_default(),
                    link,
                    pub_date: item.pub_date.as_deref().and_then(parse_pub_date),
                })
            })
            .collect::<Vec<_>>();

        debug!(%url, count = items.len(), "Parsed a feed document");

        Ok(items)
    }
}

fn parse_pub_date(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();

    OffsetDateTime::parse(s, &Rfc2822)
        // some feeds carry the obsolete `GMT` zone name instead of a numeric offset
        .or_else(|_| OffsetDateTime::parse(&s.replace("GMT", "+0000"), &Rfc2822))
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
        .ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn parses_rfc2822_dates() {
        assert_eq!(
            parse_pub_date("Mon, 21 Oct 2024 07:28:00 GMT"),
            Some(datetime!(2024-10-21 07:28 UTC)),
        );
    }

    #[test]
    fn parses_rfc3339_dates() {
        assert_eq!(
            parse_pub_date("2024-10-21T07:28:00Z"),
            Some(datetime!(2024-10-21 07:28 UTC)),
        );
    }

    #[test]
    fn unparseable_dates_become_none() {
        assert_eq!(parse_pub_date("yesterday-ish"), None);
        assert_eq!(parse_pub_date(""), None);
    }
}
