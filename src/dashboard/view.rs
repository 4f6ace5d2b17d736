// src/dashboard/view.rs
//! Filtered view over a loaded dataset. No HTML here: the page and the JSON
//! endpoint both render what [`compute_view`] returns.

use std::cmp::Ordering;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::sentiment::{LabelColumn, LabeledHeadline, Sentiment};
use crate::viz::{
    cloud::MAX_WORDS, cloud_text, daily_mean, published_date, reindex_daily, sentiment_counts,
    word_frequencies, SentimentCounts,
};

/// The dashboard groups and filters by the transformer label.
pub const VIEW_COLUMN: LabelColumn = LabelColumn::Finbert;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Published,
    Title,
    Source,
    Score,
    Sentiment,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Published,
        SortKey::Title,
        SortKey::Source,
        SortKey::Score,
        SortKey::Sentiment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Published => "published",
            SortKey::Title => "title",
            SortKey::Source => "source",
            SortKey::Score => "score",
            SortKey::Sentiment => "sentiment",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown sort column: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query string as the browser sends it. Unset fields take data-driven defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// `None` = all labels; `Some(vec![])` = explicit empty selection.
    pub sentiments: Option<Vec<Sentiment>>,
    pub keyword: Option<String>,
    pub cloud: Option<Sentiment>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
}

impl ViewQuery {
    /// Parse repeated `key=value` pairs. An empty `sentiment=` marks the
    /// selection as explicit without adding a label.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut q = ViewQuery::default();
        for (k, v) in pairs {
            let v = v.trim();
            match k.as_str() {
                "start" if !v.is_empty() => q.start = Some(parse_date(v)?),
                "end" if !v.is_empty() => q.end = Some(parse_date(v)?),
                "sentiment" => {
                    let sel = q.sentiments.get_or_insert_with(Vec::new);
                    if !v.is_empty() {
                        let s: Sentiment = v.parse()?;
                        if !sel.contains(&s) {
                            sel.push(s);
                        }
                    }
                }
                "q" if !v.is_empty() => q.keyword = Some(v.to_string()),
                "cloud" if !v.is_empty() => q.cloud = Some(v.parse()?),
                "sort" if !v.is_empty() => q.sort = Some(SortKey::parse(v)?),
                "order" => {
                    q.order = match v.to_ascii_lowercase().as_str() {
                        "" | "asc" => SortOrder::Asc,
                        "desc" => SortOrder::Desc,
                        other => return Err(anyhow!("unknown sort order: {other}")),
                    }
                }
                _ => {}
            }
        }
        Ok(q)
    }
}

fn parse_date(v: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(v, "%Y-%m-%d").with_context(|| format!("invalid date: {v}"))
}

/// Min and max publish date across `rows`, ignoring unparseable timestamps.
pub fn date_span(rows: &[LabeledHeadline]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = rows.iter().filter_map(|r| published_date(&r.published));
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Resolved filters. Three independent predicates combined with AND.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filters {
    /// Inclusive. `None` only when the dataset has no parseable dates.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub sentiments: Vec<Sentiment>,
    pub keyword: Option<String>,
}

impl Filters {
    /// Fill unset inputs from the data: full date span, every label, no keyword.
    pub fn resolve(q: &ViewQuery, rows: &[LabeledHeadline]) -> Self {
        let span = date_span(rows);
        let date_range = match (q.start, q.end, span) {
            (Some(s), Some(e), _) => Some((s, e)),
            (Some(s), None, Some((_, hi))) => Some((s, hi)),
            (None, Some(e), Some((lo, _))) => Some((lo, e)),
            (Some(s), None, None) => Some((s, NaiveDate::MAX)),
            (None, Some(e), None) => Some((NaiveDate::MIN, e)),
            (None, None, span) => span,
        };
        Self {
            date_range,
            sentiments: q
                .sentiments
                .clone()
                .unwrap_or_else(|| Sentiment::ALL.to_vec()),
            keyword: q
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    /// Rows whose timestamp does not parse never fall inside a range.
    pub fn matches_date(&self, r: &LabeledHeadline) -> bool {
        match self.date_range {
            None => true,
            Some((start, end)) => {
                published_date(&r.published).is_some_and(|d| start <= d && d <= end)
            }
        }
    }

    pub fn matches_sentiment(&self, r: &LabeledHeadline) -> bool {
        self.sentiments.contains(&r.label(VIEW_COLUMN))
    }

    /// Case-insensitive substring on the title.
    pub fn matches_keyword(&self, r: &LabeledHeadline) -> bool {
        match &self.keyword {
            None => true,
            Some(k) => r.title.to_lowercase().contains(&k.to_lowercase()),
        }
    }

    pub fn matches(&self, r: &LabeledHeadline) -> bool {
        self.matches_date(r) && self.matches_sentiment(r) && self.matches_keyword(r)
    }

    pub fn apply<'a>(&self, rows: &'a [LabeledHeadline]) -> Vec<&'a LabeledHeadline> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub counts: SentimentCounts,
}

impl Summary {
    fn of<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a LabeledHeadline>,
    {
        let counts = sentiment_counts(rows, VIEW_COLUMN);
        Self {
            total: counts.total(),
            counts,
        }
    }
}

/// Everything the dashboard shows, computed from the full table and a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub filters: Filters,
    pub dataset: Summary,
    pub filtered: Summary,
    /// Reindexed over the full dataset span, so the axis never shrinks with filters.
    pub daily: Vec<DailyPoint>,
    pub cloud_label: Sentiment,
    pub cloud_words: Vec<(String, usize)>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    pub rows: Vec<LabeledHeadline>,
}

impl View {
    pub fn shown(&self) -> usize {
        self.filtered.total
    }

    pub fn of_total(&self) -> usize {
        self.dataset.total
    }
}

pub fn compute_view(rows: &[LabeledHeadline], q: &ViewQuery) -> View {
    let filters = Filters::resolve(q, rows);
    let mut subset = filters.apply(rows);

    let means = daily_mean(subset.iter().copied());
    let daily = match date_span(rows) {
        Some((lo, hi)) => reindex_daily(&means, lo, hi)
            .into_iter()
            .map(|(date, mean_score)| DailyPoint { date, mean_score })
            .collect(),
        None => Vec::new(),
    };

    let cloud_label = q.cloud.unwrap_or(Sentiment::Positive);
    let text = cloud_text(subset.iter().copied(), VIEW_COLUMN, cloud_label);
    let cloud_words = word_frequencies(&text, MAX_WORDS);

    if let Some(key) = q.sort {
        sort_rows(&mut subset, key, q.order);
    }

    View {
        dataset: Summary::of(rows),
        filtered: Summary::of(subset.iter().copied()),
        filters,
        daily,
        cloud_label,
        cloud_words,
        sort: q.sort,
        order: q.order,
        rows: subset.into_iter().cloned().collect(),
    }
}

fn sentiment_rank(s: Sentiment) -> usize {
    Sentiment::ALL.iter().position(|x| *x == s).unwrap_or(0)
}

/// Stable sort; ties keep file order in both directions.
pub fn sort_rows(rows: &mut [&LabeledHeadline], key: SortKey, order: SortOrder) {
    let cmp = |a: &&LabeledHeadline, b: &&LabeledHeadline| -> Ordering {
        match key {
            SortKey::Published => {
                published_at(&a.published).cmp(&published_at(&b.published))
            }
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Source => a.source.to_lowercase().cmp(&b.source.to_lowercase()),
            SortKey::Score => a.finbert_score.total_cmp(&b.finbert_score),
            SortKey::Sentiment => {
                sentiment_rank(a.label(VIEW_COLUMN)).cmp(&sentiment_rank(b.label(VIEW_COLUMN)))
            }
        }
    };
    match order {
        SortOrder::Asc => rows.sort_by(cmp),
        SortOrder::Desc => rows.sort_by(|a, b| cmp(b, a)),
    }
}

/// Unix seconds for ordering; unparseable timestamps sort first.
fn published_at(ts: &str) -> Option<i64> {
    use time::{format_description::well_known::Rfc2822, OffsetDateTime};
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .map(|t| t.unix_timestamp())
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(ts.trim())
                .ok()
                .map(|t| t.timestamp())
        })
}
