//! Run orchestration: discovery, then detail extraction
//!
//! A run walks the catalog in two strictly sequential phases. Scanning
//! discovers each retained institution's department links with a
//! randomized pause between institutions; details fetches and extracts
//! each department page using the owning institution's page as referer.
//! Sequential processing and the pauses are deliberate throttling, not a
//! missed parallelization opportunity: the target server soft-rate-limits
//! bursts.

use crate::config::Config;
use crate::crawler::discovery::{discover_departments, discover_institutions};
use crate::crawler::extract::extract_record;
use crate::crawler::fetcher::{FetchPolicy, Fetcher};
use crate::dom::LabelDoc;
use crate::model::{DepartmentLink, DepartmentRecord, Institution};
use crate::progress::{Phase, ProgressSink, RunProgress};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executes one scrape run over the catalog
///
/// Owns the run's fetcher session; shares only its stop flag and result
/// sequence with the outside. Results are appended in processing order,
/// which is discovery order.
pub struct Runner {
    fetcher: Fetcher,
    stop: Arc<AtomicBool>,
    results: Arc<Mutex<Vec<DepartmentRecord>>>,
    min_delay_secs: f64,
    max_delay_secs: f64,
}

impl Runner {
    /// Creates a runner with a fresh fetcher session
    pub fn new(
        config: &Config,
        stop: Arc<AtomicBool>,
        results: Arc<Mutex<Vec<DepartmentRecord>>>,
    ) -> Result<Self, reqwest::Error> {
        let fetcher = Fetcher::new(FetchPolicy::from(&config.fetch), stop.clone())?;
        Ok(Self {
            fetcher,
            stop,
            results,
            min_delay_secs: config.pacing.min_delay_secs,
            max_delay_secs: config.pacing.max_delay_secs,
        })
    }

    /// Runs the full scrape: institutions, then departments, then details
    ///
    /// An empty institution list ends the run with zero results; an empty
    /// catalog is not a fault. Departments whose pages stay unobtainable
    /// after the fetcher's retries are skipped silently.
    pub async fn run(
        &self,
        entry_url: &str,
        targets: Option<&[String]>,
        progress: &dyn ProgressSink,
    ) {
        tracing::info!("Fetching institution list from {}", entry_url);
        let institutions = discover_institutions(&self.fetcher, entry_url).await;
        if institutions.is_empty() {
            tracing::info!("No institutions found");
            progress.emit(RunProgress::new(Phase::Done, 0, 0, "完成！"));
            return;
        }
        tracing::info!("Found {} institutions", institutions.len());

        let retained = filter_institutions(&institutions, targets);
        if let Some(targets) = targets {
            tracing::info!(
                "Filter of {} names retained {} institutions",
                targets.len(),
                retained.len()
            );
        }

        let departments = self.scan_institutions(&retained, entry_url, progress).await;
        tracing::info!(
            "Found {} departments, starting detailed extraction",
            departments.len()
        );

        self.fetch_details(&departments, progress).await;

        let count = self.results.lock().unwrap().len();
        progress.emit(RunProgress::new(
            Phase::Done,
            departments.len(),
            departments.len(),
            "完成！",
        ));
        tracing::info!("Run finished with {} records", count);
    }

    /// Scanning phase: collect every retained institution's department
    /// links into one flat sequence, pausing between institutions
    async fn scan_institutions(
        &self,
        institutions: &[&Institution],
        entry_url: &str,
        progress: &dyn ProgressSink,
    ) -> Vec<DepartmentLink> {
        let total = institutions.len();
        let mut departments = Vec::new();

        for (index, institution) in institutions.iter().enumerate() {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!("Stop requested during scanning");
                break;
            }

            progress.emit(RunProgress::new(
                Phase::Scanning,
                index,
                total,
                format!("正在掃描學校: {} ({}/{})", institution.name, index + 1, total),
            ));

            let links = discover_departments(&self.fetcher, institution, entry_url).await;
            tracing::debug!(
                "Institution {} has {} department links",
                institution.name,
                links.len()
            );
            departments.extend(links);

            self.pause_between_institutions().await;
        }

        departments
    }

    /// Details phase: fetch and extract each department page in order
    async fn fetch_details(&self, departments: &[DepartmentLink], progress: &dyn ProgressSink) {
        let total = departments.len();

        for (index, department) in departments.iter().enumerate() {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!("Stop requested during detail extraction");
                break;
            }

            progress.emit(RunProgress::new(
                Phase::Details,
                index,
                total,
                format!(
                    "正在抓取系所詳細資料: {} ({}/{})",
                    department.institution_name,
                    index + 1,
                    total
                ),
            ));

            let Some(body) = self
                .fetcher
                .fetch(&department.url, Some(&department.institution_url))
                .await
            else {
                // Already retried inside the fetcher; skip and move on.
                tracing::warn!("Skipping unobtainable department page {}", department.url);
                continue;
            };

            let doc = LabelDoc::parse(&body);
            let record = extract_record(&doc, &department.institution_name, &department.url);
            self.results.lock().unwrap().push(record);
        }
    }

    /// Randomized pause between institutions to stay under the soft rate
    /// limit
    async fn pause_between_institutions(&self) {
        let secs = rand::random_range(self.min_delay_secs..=self.max_delay_secs);
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Applies the optional target-name filter, preserving discovery order
///
/// The full discovered list is never mutated; only the retained subset is
/// forwarded downstream.
fn filter_institutions<'a>(
    institutions: &'a [Institution],
    targets: Option<&[String]>,
) -> Vec<&'a Institution> {
    match targets {
        Some(targets) if !targets.is_empty() => {
            let wanted: HashSet<&str> = targets.iter().map(String::as_str).collect();
            institutions
                .iter()
                .filter(|inst| wanted.contains(inst.name.as_str()))
                .collect()
        }
        _ => institutions.iter().collect(),
    }
}
