// tests/providers_google_news.rs
//
// Feed parsing from the fixture, plus the real HTTP path against a local
// wiremock server (URL shape, browser User-Agent, status handling).

use headline_sentiment::config::{app::BROWSER_USER_AGENT, AppConfig};
use headline_sentiment::ingest::{
    self,
    providers::{google_news::UNKNOWN_SOURCE, GoogleNewsProvider},
    types::SourceProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/google_news_rss.xml");

#[tokio::test]
async fn parses_fixture_items_in_feed_order() {
    let provider = GoogleNewsProvider::from_fixture(FIXTURE);
    let items = provider.fetch_latest().await.expect("fixture parses");

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Apple unveils new Vision Pro - The Verge");
    assert_eq!(items[0].source, "The Verge");
    assert_eq!(items[0].published, "Mon, 09 Jun 2025 18:04:00 GMT");
    assert_eq!(
        items[0].link,
        "https://news.google.com/rss/articles/CBMiVision01?oc=5"
    );

    // Entities decoded and whitespace runs (including the line break) collapsed.
    assert_eq!(
        items[1].title,
        "Apple WWDC disappoints investors & analysts - Reuters"
    );
    assert_eq!(items[1].source, "Reuters");

    // No <source> element.
    assert_eq!(items[2].source, UNKNOWN_SOURCE);
}

#[tokio::test]
async fn fixture_ids_are_unique() {
    let items = GoogleNewsProvider::parse_items_from_str(FIXTURE).unwrap();
    let mut ids: Vec<&str> = items.iter().map(|h| h.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), items.len());
}

#[tokio::test]
async fn malformed_xml_is_an_error() {
    let provider = GoogleNewsProvider::from_fixture("<rss><channel><item>");
    assert!(provider.fetch_latest().await.is_err());
}

fn cfg_for(server: &MockServer) -> AppConfig {
    AppConfig {
        feed_base_url: format!("{}/rss/search", server.uri()),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn fetch_sends_query_window_and_browser_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .and(query_param("q", "Apple WWDC 2025 when:7d"))
        .and(query_param("hl", "en"))
        .and(query_param("gl", "US"))
        .and(query_param("ceid", "US:en"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = cfg_for(&server);
    let items = ingest::fetch(&cfg, "Apple WWDC 2025", 7).await.expect("fetch ok");
    assert_eq!(items.len(), 3);

    let received = server.received_requests().await.expect("recording enabled");
    let ua = received[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(ua, BROWSER_USER_AGENT);
}

#[tokio::test]
async fn empty_channel_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<rss><channel><title>x</title></channel></rss>"),
        )
        .mount(&server)
        .await;

    let items = ingest::fetch(&cfg_for(&server), "nothing here", 1).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn http_error_status_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = ingest::fetch(&cfg_for(&server), "Apple", 7).await.unwrap_err();
    assert!(format!("{err:#}").contains("status"), "{err:#}");
}
