// src/viz/mod.rs
//! Visualizer: pure aggregates over labeled rows, rendered to SVG by `charts` and `cloud`.

pub mod charts;
pub mod cloud;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::sentiment::{LabelColumn, LabeledHeadline, Sentiment};

/// Calendar date (UTC) of a feed timestamp; RFC 2822 first, RFC 3339 as fallback.
pub fn published_date(ts: &str) -> Option<NaiveDate> {
    let ts = ts.trim();
    if let Ok(dt) = OffsetDateTime::parse(ts, &Rfc2822) {
        let d = dt.to_offset(UtcOffset::UTC).date();
        return NaiveDate::from_ymd_opt(d.year(), d.month() as u32, u32::from(d.day()));
    }
    chrono::DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc).date_naive())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    pub fn get(&self, s: Sentiment) -> usize {
        match s {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// `(label, count)` in display order; absent labels are present with 0.
    pub fn ordered(&self) -> [(Sentiment, usize); 3] {
        Sentiment::ALL.map(|s| (s, self.get(s)))
    }
}

pub fn sentiment_counts<'a, I>(rows: I, column: LabelColumn) -> SentimentCounts
where
    I: IntoIterator<Item = &'a LabeledHeadline>,
{
    let mut c = SentimentCounts::default();
    for r in rows {
        match r.label(column) {
            Sentiment::Positive => c.positive += 1,
            Sentiment::Neutral => c.neutral += 1,
            Sentiment::Negative => c.negative += 1,
        }
    }
    c
}

/// Mean `finbert_score` per publish date. Rows with unparseable dates are skipped.
pub fn daily_mean<'a, I>(rows: I) -> BTreeMap<NaiveDate, f64>
where
    I: IntoIterator<Item = &'a LabeledHeadline>,
{
    let mut acc: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for r in rows {
        if let Some(d) = published_date(&r.published) {
            let e = acc.entry(d).or_insert((0.0, 0));
            e.0 += f64::from(r.finbert_score);
            e.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(d, (sum, n))| (d, sum / n as f64))
        .collect()
}

/// One point per calendar day in `start..=end`; days without data are `None`.
pub fn reindex_daily(
    means: &BTreeMap<NaiveDate, f64>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(NaiveDate, Option<f64>)> {
    if end < start {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, means.get(&d).copied()))
        .collect()
}

/// Daily means over the span of dates actually present.
pub fn daily_series(means: &BTreeMap<NaiveDate, f64>) -> Vec<(NaiveDate, Option<f64>)> {
    match (means.keys().next(), means.keys().next_back()) {
        (Some(&start), Some(&end)) => reindex_daily(means, start, end),
        _ => Vec::new(),
    }
}

/// All titles carrying `label` in `column`, space-joined.
pub fn cloud_text<'a, I>(rows: I, column: LabelColumn, label: Sentiment) -> String
where
    I: IntoIterator<Item = &'a LabeledHeadline>,
{
    rows.into_iter()
        .filter(|r| r.label(column) == label)
        .map(|r| r.title.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "more", "most", "my",
    "new", "no", "not", "of", "on", "or", "our", "out", "over", "says", "she", "so", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "up", "us",
    "was", "we", "were", "what", "when", "where", "which", "who", "why", "will", "with", "would",
    "you", "your",
];

/// Lowercased word counts, stop-words and 1-char tokens removed, most frequent first.
pub fn word_frequencies(text: &str, max_words: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tok in text.split(|c: char| !c.is_alphanumeric()) {
        if tok.chars().count() < 2 {
            continue;
        }
        let w = tok.to_lowercase();
        if STOPWORDS.contains(&w.as_str()) || w.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        *counts.entry(w).or_insert(0) += 1;
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out.truncate(max_words);
    out
}

/// Batch visualizer: writes the three charts for `rows` into `dir`.
///
/// The word cloud is skipped (with a log line) when no title carries `cloud_label`.
pub fn render_all(
    rows: &[LabeledHeadline],
    dir: &Path,
    date: NaiveDate,
    column: LabelColumn,
    cloud_label: Sentiment,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stamp = date.format("%Y-%m-%d");
    let mut written = Vec::new();

    let svg = charts::bar_chart(rows, column)?;
    written.push(write_svg(dir, &format!("sentiment_counts_{stamp}.svg"), &svg)?);

    let svg = charts::line_plot(rows, None)?;
    written.push(write_svg(dir, &format!("daily_score_{stamp}.svg"), &svg)?);

    match cloud::word_cloud(rows, column, cloud_label)? {
        Some(svg) => {
            let name = format!("wordcloud_{}_{stamp}.svg", cloud_label.as_str());
            written.push(write_svg(dir, &name, &svg)?);
        }
        None => tracing::info!(
            target: "viz",
            label = cloud_label.as_str(),
            "no headlines for word cloud; skipped"
        ),
    }

    Ok(written)
}

fn write_svg(dir: &Path, name: &str, svg: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(target: "viz", path = %path.display(), "chart written");
    Ok(path)
}
