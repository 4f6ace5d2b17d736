// src/ingest/providers/google_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::ingest::normalize_title;
use crate::ingest::types::{Headline, SourceProvider};

pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source: Option<ItemSource>,
}

/// `<source url="https://www.theverge.com">The Verge</source>`
#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text", default)]
    name: Option<String>,
}

/// Build the search URL: `q=<words joined by +>+when:<n>d`.
pub fn search_url(base: &str, query: &str, days_back: u32) -> String {
    let words = query
        .split_whitespace()
        .map(|w| utf8_percent_encode(w, NON_ALPHANUMERIC).to_string())
        .collect::<Vec<_>>()
        .join("+");
    format!("{base}?q={words}+when:{days_back}d&hl=en&gl=US&ceid=US:en")
}

pub struct GoogleNewsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl GoogleNewsProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    /// Provider for `query` over the last `days_back` days.
    pub fn for_query(cfg: &AppConfig, query: &str, days_back: u32) -> Result<Self> {
        let url = search_url(&cfg.feed_base_url, query, days_back);
        Self::from_url(url, &cfg.user_agent)
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<Headline>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let source = it
                .source
                .and_then(|s| s.name)
                .map(|s| normalize_title(&s))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

            out.push(Headline::new(
                normalize_title(it.title.as_deref().unwrap_or_default()),
                it.link.unwrap_or_default().trim().to_string(),
                it.pub_date.unwrap_or_default().trim().to_string(),
                source,
            ));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_events_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GoogleNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<Headline>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                let t0 = std::time::Instant::now();
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .context("google news http get()")?
                    .error_for_status()
                    .context("google news http status")?;
                let body = resp.text().await.context("google news http .text()")?;
                histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "GoogleNews"
    }
}

/// quick-xml only knows the five XML entities; feeds leak HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_words_and_window() {
        let url = search_url(
            "https://news.google.com/rss/search",
            "Apple  WWDC 2025",
            7,
        );
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=Apple+WWDC+2025+when:7d&hl=en&gl=US&ceid=US:en"
        );
    }

    #[test]
    fn search_url_escapes_reserved_chars() {
        let url = search_url("http://x/rss", "AT&T 5G?", 3);
        assert!(url.contains("q=AT%26T+5G%3F+when:3d"), "{url}");
    }

    #[test]
    fn missing_source_defaults_to_unknown() {
        let xml = r#"<rss><channel>
            <item><title>  Apple   ships
              iOS 19 </title><link>https://a/1</link><pubDate>Tue, 10 Jun 2025 14:03:00 GMT</pubDate></item>
        </channel></rss>"#;
        let items = GoogleNewsProvider::parse_items_from_str(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Apple ships iOS 19");
        assert_eq!(items[0].source, UNKNOWN_SOURCE);
        assert_eq!(items[0].published, "Tue, 10 Jun 2025 14:03:00 GMT");
        assert_eq!(items[0].id.len(), 12);
    }

    #[test]
    fn empty_channel_is_not_an_error() {
        let xml = "<rss><channel><title>nothing</title></channel></rss>";
        let items = GoogleNewsProvider::parse_items_from_str(xml).unwrap();
        assert!(items.is_empty());
    }
}
