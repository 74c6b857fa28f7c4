//! StarPlan: a resilient scraper for a legacy university-admissions catalog
//!
//! This crate extracts structured admissions records from a public
//! admissions website that has no API. Department pages are rendered with
//! inconsistent legacy table layouts, so field extraction is anchored on
//! label text rather than cell positions.

pub mod config;
pub mod crawler;
pub mod dom;
pub mod export;
pub mod jobs;
pub mod model;
pub mod progress;

use thiserror::Error;

/// Main error type for StarPlan operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Entry URL is required")]
    MissingEntryUrl,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for StarPlan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use jobs::{JobHandle, JobRegistry, JobStatus, RunRequest};
pub use model::{DepartmentLink, DepartmentRecord, Institution};
pub use progress::{Phase, ProgressSink, RunProgress};
