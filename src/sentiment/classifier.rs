// src/sentiment/classifier.rs
//! FinBERT seam: a 3-class (negative/neutral/positive) sequence classifier.
//!
//! Production talks to a local text-embeddings-inference server hosting
//! `ProsusAI/finbert`; tests and offline runs use [`MockClassifier`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::vader::VaderScorer;
use super::Sentiment;
use crate::config::AppConfig;

/// Model output order: index 0 = negative, 1 = neutral, 2 = positive.
pub const FINBERT_LABELS: [Sentiment; 3] =
    [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

pub const ENV_TEST_MODE: &str = "CLASSIFIER_TEST_MODE";

/// Argmax class and its softmax probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Sentiment,
    pub score: f32,
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len() as f32; logits.len()];
    }
    exp.iter().map(|&v| v / sum).collect()
}

/// Softmax then argmax; ties resolve to the lowest index.
pub fn classify_logits(logits: &[f32; 3]) -> Classification {
    let probs = softmax(logits);
    let mut idx = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[idx] {
            idx = i;
        }
    }
    Classification {
        label: FINBERT_LABELS[idx],
        score: probs[idx],
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;
    fn name(&self) -> &'static str;
}

pub type SharedClassifier = Arc<dyn SentimentClassifier>;

// ------------------------------------------------------------
// Inference server client
// ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    #[serde(default)]
    pub max_input_length: Option<u32>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    truncate: bool,
    raw_scores: bool,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f32,
}

/// Single inputs come back flat, batched ones nested.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Flat(Vec<Prediction>),
    Nested(Vec<Vec<Prediction>>),
}

impl PredictResponse {
    fn into_first(self) -> Vec<Prediction> {
        match self {
            PredictResponse::Flat(v) => v,
            PredictResponse::Nested(mut v) => {
                if v.is_empty() {
                    Vec::new()
                } else {
                    v.swap_remove(0)
                }
            }
        }
    }
}

/// Arrange raw scores into model order, whatever order the server sent them in.
fn logits_from_predictions(preds: &[Prediction]) -> Result<[f32; 3]> {
    let mut out = [None; 3];
    for p in preds {
        let Ok(label) = p.label.parse::<Sentiment>() else {
            continue;
        };
        if let Some(i) = FINBERT_LABELS.iter().position(|l| *l == label) {
            out[i] = Some(p.score);
        }
    }
    match out {
        [Some(n), Some(u), Some(p)] => Ok([n, u, p]),
        _ => Err(anyhow!(
            "classifier response lacks one of negative/neutral/positive: {:?}",
            preds.iter().map(|p| p.label.as_str()).collect::<Vec<_>>()
        )),
    }
}

pub struct TeiClassifier {
    http: reqwest::Client,
    base_url: String,
    info: tokio::sync::OnceCell<Option<ModelInfo>>,
}

impl TeiClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building classifier http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            info: tokio::sync::OnceCell::new(),
        })
    }

    /// Fetched once, on first use. Purely diagnostic: failure is logged, not fatal.
    pub async fn model_info(&self) -> Option<&ModelInfo> {
        self.info
            .get_or_init(|| async {
                let url = format!("{}/info", self.base_url);
                let res = async {
                    self.http
                        .get(&url)
                        .send()
                        .await?
                        .error_for_status()?
                        .json::<ModelInfo>()
                        .await
                }
                .await;
                match res {
                    Ok(info) => {
                        tracing::info!(
                            target: "labeler",
                            model = %info.model_id,
                            max_input_length = ?info.max_input_length,
                            "classifier model loaded"
                        );
                        Some(info)
                    }
                    Err(e) => {
                        tracing::warn!(target: "labeler", error = %e, "classifier /info unavailable");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}

#[async_trait]
impl SentimentClassifier for TeiClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let _ = self.model_info().await;

        let t0 = Instant::now();
        let req = PredictRequest {
            inputs: text,
            truncate: true,
            raw_scores: true,
        };
        let resp = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(&req)
            .send()
            .await
            .context("classifier POST /predict")?
            .error_for_status()
            .context("classifier /predict status")?;
        let body: PredictResponse = resp.json().await.context("classifier /predict body")?;
        histogram!("classifier_latency_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let logits = logits_from_predictions(&body.into_first())?;
        Ok(classify_logits(&logits))
    }

    fn name(&self) -> &'static str {
        "finbert-tei"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Deterministic stand-in. Fixed logits, or logits shaped from the lexicon score.
#[derive(Debug, Clone, Copy)]
pub struct MockClassifier {
    fixed: Option<[f32; 3]>,
}

impl MockClassifier {
    pub fn fixed(logits: [f32; 3]) -> Self {
        Self {
            fixed: Some(logits),
        }
    }

    pub fn lexicon_driven() -> Self {
        Self { fixed: None }
    }
}

#[async_trait]
impl SentimentClassifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let logits = self.fixed.unwrap_or_else(|| {
            let c = VaderScorer::new().compound(text) as f32;
            [-2.0 * c, 0.5 - c.abs(), 2.0 * c]
        });
        Ok(classify_logits(&logits))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Build the classifier for `cfg`. `CLASSIFIER_TEST_MODE=mock` selects the mock.
pub fn build_classifier(cfg: &AppConfig) -> Result<SharedClassifier> {
    let mock = std::env::var(ENV_TEST_MODE)
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false);
    if mock {
        tracing::warn!(target: "labeler", "using mock classifier ({ENV_TEST_MODE}=mock)");
        return Ok(Arc::new(MockClassifier::lexicon_driven()));
    }
    Ok(Arc::new(TeiClassifier::new(
        &cfg.classifier_url,
        cfg.classifier_timeout(),
    )?))
}

/// Process-wide handle, built on first call and reused afterwards.
pub fn shared_classifier(cfg: &AppConfig) -> Result<SharedClassifier> {
    static HANDLE: OnceCell<SharedClassifier> = OnceCell::new();
    HANDLE.get_or_try_init(|| build_classifier(cfg)).cloned()
}
