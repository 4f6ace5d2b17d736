// src/sentiment/mod.rs
//! Labeler: two independent opinions per headline, appended as new columns.

pub mod classifier;
pub mod vader;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::ingest::types::Headline;
use classifier::{Classification, SharedClassifier};
use vader::{VaderScorer, POLARITY_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Display order used by every chart and count.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// ≥ 0.05 positive, ≤ -0.05 negative, else neutral.
    pub fn from_compound(score: f64) -> Self {
        if score >= POLARITY_THRESHOLD {
            Sentiment::Positive
        } else if score <= -POLARITY_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(anyhow!("unknown sentiment label: {other}")),
        }
    }
}

/// Raw record plus both labels. Field order is the enriched CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledHeadline {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: String,
    pub source: String,
    pub vader_label: Sentiment,
    pub finbert_label: Sentiment,
    pub finbert_score: f32,
}

impl LabeledHeadline {
    pub fn from_parts(h: Headline, vader_label: Sentiment, finbert: Classification) -> Self {
        Self {
            id: h.id,
            title: h.title,
            link: h.link,
            published: h.published,
            source: h.source,
            vader_label,
            finbert_label: finbert.label,
            finbert_score: finbert.score,
        }
    }

    /// The source columns, as the Collector wrote them.
    pub fn headline(&self) -> Headline {
        Headline {
            id: self.id.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            published: self.published.clone(),
            source: self.source.clone(),
        }
    }

    pub fn label(&self, column: LabelColumn) -> Sentiment {
        match column {
            LabelColumn::Finbert => self.finbert_label,
            LabelColumn::Vader => self.vader_label,
        }
    }
}

/// Which opinion a chart groups by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelColumn {
    #[default]
    Finbert,
    Vader,
}

impl LabelColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            LabelColumn::Finbert => "finbert_label",
            LabelColumn::Vader => "vader_label",
        }
    }
}

/// What a blank title gets: the probability of all-zero logits, labeled
/// neutral. This overrides the argmax tie-break of
/// [`classifier::classify_logits`], which would report the first class.
pub fn blank_title_classification() -> Classification {
    Classification {
        label: Sentiment::Neutral,
        score: 1.0 / 3.0,
    }
}

pub struct Labeler {
    vader: VaderScorer,
    classifier: SharedClassifier,
}

impl Labeler {
    pub fn new(classifier: SharedClassifier) -> Self {
        Self {
            vader: VaderScorer::new(),
            classifier,
        }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub async fn label_one(&self, h: Headline) -> Result<LabeledHeadline> {
        let (vader_label, _compound) = self.vader.label(&h.title);
        let finbert = if h.title.trim().is_empty() {
            blank_title_classification()
        } else {
            self.classifier
                .classify(&h.title)
                .await
                .with_context(|| format!("classifying headline {}", h.id))?
        };
        Ok(LabeledHeadline::from_parts(h, vader_label, finbert))
    }

    /// Label every row in order. The first classifier failure aborts the run.
    pub async fn label(&self, rows: Vec<Headline>) -> Result<Vec<LabeledHeadline>> {
        let total = rows.len();
        let mut out = Vec::with_capacity(total);
        for (i, mut h) in rows.into_iter().enumerate() {
            h.ensure_id();
            out.push(self.label_one(h).await?);
            counter!("labeler_rows_total").increment(1);
            if (i + 1) % 25 == 0 {
                tracing::info!(target: "labeler", done = i + 1, total, "sentiment progress");
            }
        }
        tracing::info!(
            target: "labeler",
            rows = out.len(),
            classifier = self.classifier.name(),
            "labeling finished"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_overrides_zero_logit_tie_break() {
        let tie = classifier::classify_logits(&[0.0, 0.0, 0.0]);
        let blank = blank_title_classification();
        assert_eq!(tie.label, Sentiment::Negative);
        assert_eq!(blank.label, Sentiment::Neutral);
        assert!((blank.score - tie.score).abs() < 1e-6);
    }

    #[test]
    fn boundaries_are_inclusive_on_labeled_side() {
        assert_eq!(Sentiment::from_compound(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(-0.05), Sentiment::Negative);
        assert_eq!(Sentiment::from_compound(0.0499), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.0499), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(1.0), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(-1.0), Sentiment::Negative);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(" neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert!("bullish".parse::<Sentiment>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let s = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(s, "\"negative\"");
    }
}
