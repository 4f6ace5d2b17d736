// tests/classifier_tei.rs
//
// TeiClassifier against a local wiremock inference server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use headline_sentiment::sentiment::classifier::{SentimentClassifier, TeiClassifier};
use headline_sentiment::sentiment::Sentiment;

fn client(server: &MockServer) -> TeiClassifier {
    TeiClassifier::new(&server.uri(), Duration::from_secs(5)).expect("client builds")
}

async fn mount_info(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model_id": "ProsusAI/finbert",
            "max_input_length": 512
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn raw_scores_are_softmaxed_locally() {
    let server = MockServer::start().await;
    mount_info(&server).await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({
            "inputs": "Apple beats estimates",
            "truncate": true,
            "raw_scores": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "label": "positive", "score": 2.0 },
            { "label": "neutral", "score": 0.0 },
            { "label": "negative", "score": -1.0 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server).classify("Apple beats estimates").await.unwrap();
    assert_eq!(c.label, Sentiment::Positive);
    let expected = 2f32.exp() / (2f32.exp() + 1.0 + (-1f32).exp());
    assert!((c.score - expected).abs() < 1e-5, "{} vs {expected}", c.score);
}

#[tokio::test]
async fn nested_batch_shape_is_accepted() {
    let server = MockServer::start().await;
    mount_info(&server).await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            { "label": "negative", "score": 1.5 },
            { "label": "neutral", "score": 0.2 },
            { "label": "positive", "score": -0.7 }
        ]])))
        .mount(&server)
        .await;

    let c = client(&server).classify("Apple WWDC disappoints").await.unwrap();
    assert_eq!(c.label, Sentiment::Negative);
}

#[tokio::test]
async fn model_info_is_fetched_once_and_optional() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "label": "neutral", "score": 1.0 },
            { "label": "positive", "score": 0.0 },
            { "label": "negative", "score": 0.0 }
        ])))
        .mount(&server)
        .await;

    let tei = client(&server);
    assert!(tei.model_info().await.is_none());
    for _ in 0..3 {
        let c = tei.classify("WWDC keynote recap").await.unwrap();
        assert_eq!(c.label, Sentiment::Neutral);
    }
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    mount_info(&server).await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).classify("anything").await.unwrap_err();
    assert!(format!("{err:#}").contains("/predict"), "{err:#}");
}

#[tokio::test]
async fn missing_class_is_reported() {
    let server = MockServer::start().await;
    mount_info(&server).await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "label": "LABEL_0", "score": 1.0 }
        ])))
        .mount(&server)
        .await;

    assert!(client(&server).classify("anything").await.is_err());
}
