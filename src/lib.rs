// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod sentiment;
pub mod viz;

pub use crate::config::AppConfig;
pub use crate::error::DatasetError;
pub use crate::ingest::types::Headline;
pub use crate::sentiment::{LabeledHeadline, Labeler, Sentiment};
