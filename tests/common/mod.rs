#![allow(dead_code)]

use goodnews::config::Config;
use goodnews::state::State;
use serde_json::json;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub pub_date: Option<OffsetDateTime>,
}

pub fn item(title: &str, link: &str, pub_date: OffsetDateTime) -> FeedItem {
    FeedItem {
        title: title.into(),
        link: link.into(),
        pub_date: Some(pub_date),
    }
}

pub fn undated_item(title: &str, link: &str) -> FeedItem {
    FeedItem {
        title: title.into(),
        link: link.into(),
        pub_date: None,
    }
}

pub fn feed_document(items: &[FeedItem]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>http://feed.example/</link>
    <description>Test description</description>
"#,
    );

    for item in items {
        body.push_str("    <item>\n");
        body.push_str(&format!("      <title>{}</title>\n", item.title));
        body.push_str(&format!("      <link>{}</link>\n", item.link));
        body.push_str(&format!(
            "      <description>About {}</description>\n",
            item.title
        ));

        if let Some(pub_date) = item.pub_date {
            body.push_str(&format!(
                "      <pubDate>{}</pubDate>\n",
                pub_date.format(&Rfc2822).unwrap()
            ));
        }

        body.push_str("    </item>\n");
    }

    body.push_str("  </channel>\n</rss>\n");
    body
}

/// Mounts a feed document at `/feed` on the mock server.
pub async fn mount_feed(server: &MockServer, items: &[FeedItem]) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(feed_document(items)),
        )
        .mount(server)
        .await;
}

/// Mounts a chat completion endpoint that always replies with `content`.
pub async fn mount_classifier(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": content,
                },
            }],
        })))
        .mount(server)
        .await;
}

pub fn test_config(feeds: Vec<String>) -> Config {
    let mut cfg = Config::default();
    cfg.bind_addr = "127.0.0.1:0".into();
    cfg.feeds = feeds;
    cfg
}

/// A config whose classifier points at the given mock server.
pub fn curated_config(feeds: Vec<String>, classifier_uri: &str) -> Config {
    let mut cfg = test_config(feeds);
    cfg.classifier.api_base = classifier_uri.to_string();
    cfg.classifier.api_key = Some("test-key".into());
    cfg
}

pub fn test_state(cfg: Config) -> State {
    State::new(cfg).unwrap()
}
