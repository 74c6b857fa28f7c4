//! Crawler module for catalog fetching and extraction
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with soft rate-limit detection and retry backoff
//! - Institution and department-link discovery
//! - Label-anchored department-page field extraction
//! - Run orchestration with two-phase progress

mod discovery;
mod extract;
mod fetcher;
mod runner;

pub use discovery::{
    discover_departments, discover_institutions, parse_department_list, parse_institution_list,
};
pub use extract::extract_record;
pub use fetcher::{
    build_http_client, is_rate_limited, FetchPolicy, Fetcher, BROWSER_USER_AGENT,
    RATE_LIMIT_MARKERS,
};
pub use runner::Runner;

use crate::config::Config;
use crate::model::Institution;
use crate::{Error, Result};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Discovers the institution list without starting a run
///
/// Synchronous from the caller's point of view: no progress events, no job
/// entry, just the discovered institutions. An unobtainable or empty entry
/// page yields an empty list.
pub async fn get_universities(config: &Config, entry_url: &str) -> Result<Vec<Institution>> {
    if entry_url.trim().is_empty() {
        return Err(Error::MissingEntryUrl);
    }

    let fetcher = Fetcher::new(
        FetchPolicy::from(&config.fetch),
        Arc::new(AtomicBool::new(false)),
    )?;
    Ok(discover_institutions(&fetcher, entry_url).await)
}
