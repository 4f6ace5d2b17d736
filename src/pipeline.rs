// src/pipeline.rs
//! Stage orchestration: collect -> label -> visualize, each re-runnable from
//! the files the previous stage left on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use crate::config::AppConfig;
use crate::dashboard::cache::Bootstrap;
use crate::dataset::{self, date_from_filename, dated_filename};
use crate::ingest::{self, types::Headline};
use crate::sentiment::{classifier::SharedClassifier, LabelColumn, LabeledHeadline, Labeler, Sentiment};
use crate::viz;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fetch the feed and write `<raw_prefix>_<today>.csv`. `None` when the feed was empty.
pub async fn run_collect(cfg: &AppConfig, query: &str, days_back: u32) -> Result<Option<PathBuf>> {
    let rows = ingest::fetch(cfg, query, days_back)
        .await
        .with_context(|| format!("collecting headlines for {query:?}"))?;
    dataset::persist(&rows, &cfg.raw_dir(), &dated_filename(&cfg.raw_prefix, today()))
}

/// Label the newest raw file; the enriched file keeps the raw file's date.
pub async fn run_label(cfg: &AppConfig, labeler: &Labeler) -> Result<Option<PathBuf>> {
    let raw = dataset::require_latest(&cfg.raw_dir(), &cfg.raw_prefix)?;
    let rows: Vec<Headline> = dataset::load(&raw)?;
    tracing::info!(target: "labeler", rows = rows.len(), path = %raw.display(), "labeling");

    let labeled = labeler
        .label(rows)
        .await
        .with_context(|| format!("labeling {}", raw.display()))?;

    let date = date_from_filename(&raw).unwrap_or_else(today);
    dataset::persist(
        &labeled,
        &cfg.processed_dir(),
        &dated_filename(&cfg.processed_prefix, date),
    )
}

/// Render the three charts for the newest enriched file into `charts_dir`.
pub fn run_visualize(
    cfg: &AppConfig,
    column: LabelColumn,
    cloud_label: Sentiment,
) -> Result<Vec<PathBuf>> {
    let path = dataset::require_latest(&cfg.processed_dir(), &cfg.processed_prefix)?;
    let rows: Vec<LabeledHeadline> = dataset::load(&path)?;
    let date = date_from_filename(&path).unwrap_or_else(today);
    viz::render_all(&rows, &cfg.charts_dir(), date, column, cloud_label)
}

/// Collect then label. An empty feed stops the run without error.
pub async fn collect_and_label(cfg: &AppConfig, labeler: &Labeler) -> Result<Option<PathBuf>> {
    if run_collect(cfg, &cfg.query, cfg.days_back).await?.is_none() {
        tracing::warn!(target: "ingest", query = %cfg.query, "feed returned no headlines");
        return Ok(None);
    }
    run_label(cfg, labeler).await
}

/// collect -> label -> visualize with the default chart options.
pub async fn run_all(cfg: &AppConfig, labeler: &Labeler) -> Result<Vec<PathBuf>> {
    if collect_and_label(cfg, labeler).await?.is_none() {
        return Ok(Vec::new());
    }
    run_visualize(cfg, LabelColumn::default(), Sentiment::Positive)
}

/// Dashboard bootstrap backed by the real pipeline.
pub struct PipelineBootstrap {
    cfg: AppConfig,
    classifier: SharedClassifier,
}

impl PipelineBootstrap {
    pub fn new(cfg: AppConfig, classifier: SharedClassifier) -> Self {
        Self { cfg, classifier }
    }
}

#[async_trait]
impl Bootstrap for PipelineBootstrap {
    async fn run(&self) -> Result<()> {
        let labeler = Labeler::new(self.classifier.clone());
        collect_and_label(&self.cfg, &labeler).await.map(|_| ())
    }
}
