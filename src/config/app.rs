// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_CONFIG_PATH: &str = "HEADLINES_CONFIG_PATH";

const ENV_QUERY: &str = "HEADLINES_QUERY";
const ENV_DAYS_BACK: &str = "HEADLINES_DAYS_BACK";
const ENV_DATA_DIR: &str = "HEADLINES_DATA_DIR";
const ENV_CLASSIFIER_URL: &str = "CLASSIFIER_URL";
const ENV_BIND: &str = "DASHBOARD_BIND";

/// Desktop Chrome identity; the news endpoint rejects library user agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

fn default_query() -> String {
    "Apple WWDC 2025".to_string()
}
fn default_days_back() -> u32 {
    7
}
fn default_feed_base_url() -> String {
    "https://news.google.com/rss/search".to_string()
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_raw_prefix() -> String {
    "apple_wwdc_raw".to_string()
}
fn default_processed_prefix() -> String {
    "headlines".to_string()
}
fn default_classifier_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_classifier_timeout_secs() -> u64 {
    30
}
fn default_cache_ttl_secs() -> u64 {
    600
}
fn default_refresh_secs() -> u64 {
    600
}
fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Search phrase sent to the feed.
    #[serde(default = "default_query")]
    pub query: String,
    /// Trailing window in days (`when:<n>d`).
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Root for `raw/`, `processed/` and `charts/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,
    #[serde(default = "default_processed_prefix")]
    pub processed_prefix: String,
    /// Base URL of the FinBERT inference server.
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,
    #[serde(default = "default_classifier_timeout_secs")]
    pub classifier_timeout_secs: u64,
    /// How long the dashboard keeps a loaded dataset before re-reading disk.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Full-page reload interval of the dashboard.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            days_back: default_days_back(),
            feed_base_url: default_feed_base_url(),
            user_agent: default_user_agent(),
            data_dir: default_data_dir(),
            raw_prefix: default_raw_prefix(),
            processed_prefix: default_processed_prefix(),
            classifier_url: default_classifier_url(),
            classifier_timeout_secs: default_classifier_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            refresh_secs: default_refresh_secs(),
            bind: default_bind(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML file; missing keys fall back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolve config the usual way:
    /// 1) explicit `path` (CLI flag)
    /// 2) $HEADLINES_CONFIG_PATH
    /// 3) config/pipeline.toml
    /// 4) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = if let Some(p) = path {
            Self::load_from_file(p)?
        } else if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides().sanitized())
    }

    fn with_env_overrides(mut self) -> Self {
        let get = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(q) = get(ENV_QUERY) {
            self.query = q;
        }
        if let Some(d) = get(ENV_DAYS_BACK).and_then(|s| s.parse::<u32>().ok()) {
            self.days_back = d;
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = get(ENV_CLASSIFIER_URL) {
            self.classifier_url = url;
        }
        if let Some(bind) = get(ENV_BIND) {
            self.bind = bind;
        }
        self
    }

    fn sanitized(mut self) -> Self {
        self.days_back = self.days_back.clamp(1, 365);
        self.cache_ttl_secs = self.cache_ttl_secs.max(1);
        self.refresh_secs = self.refresh_secs.max(1);
        self.classifier_url = self.classifier_url.trim_end_matches('/').to_string();
        self
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.data_dir.join("charts")
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(r#"query = "Vision Pro""#).unwrap();
        assert_eq!(cfg.query, "Vision Pro");
        assert_eq!(cfg.days_back, 7);
        assert_eq!(cfg.processed_prefix, "headlines");
        assert_eq!(cfg.cache_ttl_secs, 600);
    }

    #[test]
    fn sanitize_clamps_and_trims() {
        let cfg = AppConfig {
            days_back: 0,
            cache_ttl_secs: 0,
            classifier_url: "http://localhost:8080/".into(),
            ..AppConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.days_back, 1);
        assert_eq!(cfg.cache_ttl_secs, 1);
        assert_eq!(cfg.classifier_url, "http://localhost:8080");
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_win_over_file() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("pipeline.toml");
        fs::write(&p, "query = \"from file\"\ndays_back = 3\n").unwrap();

        env::set_var(ENV_QUERY, "from env");
        let cfg = AppConfig::load(Some(&p)).unwrap();
        env::remove_var(ENV_QUERY);

        assert_eq!(cfg.query, "from env");
        assert_eq!(cfg.days_back, 3);
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_path_is_an_error() {
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        let res = AppConfig::load(None);
        env::remove_var(ENV_CONFIG_PATH);
        assert!(res.is_err());
    }
}
