// src/config/mod.rs
//! Runtime configuration: TOML file + env overrides + built-in defaults.

pub mod app;

pub use app::{AppConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
