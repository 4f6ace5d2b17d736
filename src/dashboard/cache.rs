// src/dashboard/cache.rs
//! Latest enriched dataset, cached for a fixed TTL (absolute, no sliding refresh).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use metrics::counter;
use tokio::sync::Mutex;

use crate::dataset;
use crate::error::DatasetError;
use crate::sentiment::LabeledHeadline;

/// Produces the first dataset when none exists yet.
#[async_trait]
pub trait Bootstrap: Send + Sync {
    async fn run(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub path: PathBuf,
    pub rows: Vec<LabeledHeadline>,
    pub modified: Option<DateTime<Local>>,
}

impl LoadedDataset {
    pub fn load(path: &Path) -> Result<Self> {
        let rows = dataset::load::<LabeledHeadline>(path)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);
        Ok(Self {
            path: path.to_path_buf(),
            rows,
            modified,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

struct Slot {
    dataset: Arc<LoadedDataset>,
    loaded_at: Instant,
}

#[derive(Default)]
struct Inner {
    slot: Option<Slot>,
    bootstrapped: bool,
}

pub struct DatasetCache {
    dir: PathBuf,
    prefix: String,
    ttl: Duration,
    bootstrap: Arc<dyn Bootstrap>,
    inner: Mutex<Inner>,
}

impl DatasetCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        ttl: Duration,
        bootstrap: Arc<dyn Bootstrap>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            ttl,
            bootstrap,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current dataset. Concurrent callers wait on one load (and one bootstrap).
    ///
    /// With no file on disk the bootstrap runs once per process; if it leaves
    /// no file behind the result is [`DatasetError::Bootstrap`].
    pub async fn get(&self) -> Result<(Arc<LoadedDataset>, CacheStatus)> {
        let mut inner = self.inner.lock().await;

        if let Some(slot) = &inner.slot {
            if slot.loaded_at.elapsed() < self.ttl {
                return Ok((slot.dataset.clone(), CacheStatus::Hit));
            }
        }

        let path = match dataset::latest(&self.dir, &self.prefix) {
            Some(p) => Some(p),
            None if !inner.bootstrapped => {
                inner.bootstrapped = true;
                counter!("dashboard_bootstrap_runs_total").increment(1);
                tracing::info!(
                    target: "dashboard",
                    dir = %self.dir.display(),
                    "no dataset found; running pipeline once"
                );
                if let Err(e) = self.bootstrap.run().await {
                    tracing::warn!(target: "dashboard", error = %format!("{e:#}"), "bootstrap run failed");
                }
                dataset::latest(&self.dir, &self.prefix)
            }
            None => None,
        };

        let Some(path) = path else {
            if let Some(slot) = &inner.slot {
                tracing::warn!(target: "dashboard", "dataset file vanished; serving stale copy");
                return Ok((slot.dataset.clone(), CacheStatus::Hit));
            }
            return Err(DatasetError::Bootstrap.into());
        };

        let ds = Arc::new(LoadedDataset::load(&path)?);
        counter!("dashboard_cache_loads_total").increment(1);
        tracing::info!(
            target: "dashboard",
            rows = ds.rows.len(),
            path = %path.display(),
            "dataset loaded"
        );
        inner.slot = Some(Slot {
            dataset: ds.clone(),
            loaded_at: Instant::now(),
        });
        Ok((ds, CacheStatus::Miss))
    }
}
