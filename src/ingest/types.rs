// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One feed entry, flattened. Column order here is the raw CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Headline {
    /// Synthetic id (see [`record_id`]); empty only for legacy rows before
    /// [`Headline::ensure_id`] runs.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub link: String,
    /// Publish timestamp exactly as the feed printed it (RFC 2822-ish).
    pub published: String,
    pub source: String,
}

impl Headline {
    pub fn new(title: String, link: String, published: String, source: String) -> Self {
        let id = record_id(&link, &title);
        Self {
            id,
            title,
            link,
            published,
            source,
        }
    }

    /// Older raw files carry no `id` column; derive it the same way collection does.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = record_id(&self.link, &self.title);
        }
    }
}

/// First 6 bytes of SHA-256(link + "\n" + title), hex encoded.
pub fn record_id(link: &str, title: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(b"\n");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Headline>>;
    fn name(&self) -> &'static str;
}
