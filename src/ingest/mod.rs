// src/ingest/mod.rs
//! Collector: one feed request per run, entries flattened into [`Headline`]s.

pub mod providers;
pub mod types;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::ingest::providers::GoogleNewsProvider;
use crate::ingest::types::{Headline, SourceProvider};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Feed entries parsed.");
        describe_counter!("ingest_runs_total", "Collector runs.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("ingest_fetch_ms", "Feed download time in milliseconds.");
    });
}

/// Decode HTML entities, collapse whitespace runs, trim.
pub fn normalize_title(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Run a provider once. Errors propagate: there is no retry.
pub async fn run_once(provider: &dyn SourceProvider) -> Result<Vec<Headline>> {
    ensure_metrics_described();

    let items = provider.fetch_latest().await?;

    counter!("ingest_runs_total").increment(1);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    tracing::info!(
        target: "ingest",
        provider = provider.name(),
        count = items.len(),
        "feed fetched"
    );
    Ok(items)
}

/// `fetch(query, days_back)` against the configured feed.
pub async fn fetch(cfg: &AppConfig, query: &str, days_back: u32) -> Result<Vec<Headline>> {
    let provider = GoogleNewsProvider::for_query(cfg, query, days_back)?;
    run_once(&provider).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_collapses_ws() {
        let s = "  Apple\t unveils \n\n new   Vision Pro ";
        assert_eq!(normalize_title(s), "Apple unveils new Vision Pro");
    }

    #[test]
    fn normalize_title_decodes_entities_and_keeps_punctuation() {
        let s = "WWDC&nbsp;recap &amp; what&#39;s next?";
        assert_eq!(normalize_title(s), "WWDC recap & what's next?");
    }

    #[tokio::test]
    async fn run_once_passes_fixture_items_through() {
        let xml = r#"<rss><channel>
            <item><title>A</title><link>https://a</link><pubDate>Mon, 09 Jun 2025 10:00:00 GMT</pubDate><source url="https://x">X</source></item>
            <item><title>B</title><link>https://b</link><pubDate>Mon, 09 Jun 2025 11:00:00 GMT</pubDate></item>
        </channel></rss>"#;
        let provider = GoogleNewsProvider::from_fixture(xml);
        let items = run_once(&provider).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "X");
        assert_eq!(items[1].source, "Unknown");
    }
}
