//! Job registry: one entry per run, keyed by job id
//!
//! Each run executes on its own tokio task with its own fetcher session
//! (cookie and referer state is run-specific), so multiple runs may
//! proceed concurrently. A run only ever mutates its own registry entry;
//! external pollers read status and progress as eventually-consistent
//! snapshots. An errored run is terminal; it is restarted as a new job,
//! never resumed.

use crate::config::Config;
use crate::crawler::Runner;
use crate::export::{default_export_filename, CsvExporter, RecordExporter};
use crate::model::DepartmentRecord;
use crate::progress::{RunProgress, WatchSink};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

/// Lifecycle state of a run
///
/// `starting → running → completed | error`; the terminal states absorb
/// all further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Starting,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    /// Returns true if no further transitions can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one scrape run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Catalog entry page; must be non-empty
    pub entry_url: String,

    /// Optional institution-name filter (exact match)
    pub targets: Option<Vec<String>>,

    /// Export file path; defaults to `star_plan_<job_id>.csv` under the
    /// configured output directory
    pub export_path: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(entry_url: impl Into<String>) -> Self {
        Self {
            entry_url: entry_url.into(),
            targets: None,
            export_path: None,
        }
    }
}

/// Mutable run state behind the handle
#[derive(Debug)]
struct JobState {
    status: JobStatus,
    error: Option<String>,
    export_path: Option<PathBuf>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Shared view of one run, readable by external pollers
#[derive(Clone)]
pub struct JobHandle {
    pub id: Uuid,
    state: Arc<Mutex<JobState>>,
    progress: watch::Receiver<RunProgress>,
    stop: Arc<AtomicBool>,
    results: Arc<Mutex<Vec<DepartmentRecord>>>,
}

impl JobHandle {
    fn new(id: Uuid, progress: watch::Receiver<RunProgress>) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(JobState {
                status: JobStatus::Starting,
                error: None,
                export_path: None,
                started_at: Utc::now(),
                finished_at: None,
            })),
            progress,
            stop: Arc::new(AtomicBool::new(false)),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.lock().unwrap().status
    }

    /// Error message of a failed run, if any
    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> RunProgress {
        self.progress.borrow().clone()
    }

    /// Snapshot of the records accumulated so far
    ///
    /// Readable during a run; a failed run keeps whatever it accumulated.
    pub fn results(&self) -> Vec<DepartmentRecord> {
        self.results.lock().unwrap().clone()
    }

    /// Path of the exported file once the run completed
    pub fn export_path(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().export_path.clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().finished_at
    }

    /// Requests cooperative cancellation
    ///
    /// The run checks the flag before each institution, each department,
    /// and each fetch attempt; an already-issued request completes or
    /// times out normally.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Moves the run to a new status; terminal states absorb
    fn set_status(&self, status: JobStatus, error: Option<String>) {
        let mut state = self.state.lock().unwrap();
        if state.status.is_terminal() {
            return;
        }
        state.status = status;
        state.error = error;
        if status.is_terminal() {
            state.finished_at = Some(Utc::now());
        }
    }

    fn set_export_path(&self, path: PathBuf) {
        self.state.lock().unwrap().export_path = Some(path);
    }
}

/// Keyed store of runs
///
/// One entry per run, created at start; entries are never removed while
/// the registry lives, so a terminal job stays inspectable.
pub struct JobRegistry {
    config: Config,
    jobs: Arc<Mutex<HashMap<Uuid, JobHandle>>>,
}

impl JobRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a new run and returns its job id
    ///
    /// Rejects an empty entry URL before any work starts. The run itself
    /// executes on a freshly spawned task.
    pub fn start(&self, request: RunRequest) -> Result<Uuid> {
        if request.entry_url.trim().is_empty() {
            return Err(Error::MissingEntryUrl);
        }

        let id = Uuid::new_v4();
        let (sink, progress_rx) = WatchSink::new();
        let handle = JobHandle::new(id, progress_rx);

        self.jobs.lock().unwrap().insert(id, handle.clone());

        let config = self.config.clone();
        let watcher = handle.clone();
        tokio::spawn(async move {
            // A panicking run must still land in the error state instead of
            // reading as running forever.
            let worker = tokio::spawn(run_job(config, request, handle, sink));
            if let Err(e) = worker.await {
                tracing::error!("Job {} aborted unexpectedly: {}", watcher.id, e);
                watcher.set_status(JobStatus::Error, Some(e.to_string()));
            }
        });

        tracing::info!("Started job {}", id);
        Ok(id)
    }

    /// Looks up a run by id
    pub fn get(&self, id: &Uuid) -> Option<JobHandle> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    /// Requests cancellation of a run
    pub fn stop(&self, id: &Uuid) -> Result<()> {
        let handle = self.get(id).ok_or_else(|| Error::UnknownJob(id.to_string()))?;
        handle.stop();
        Ok(())
    }
}

/// Drives one run to a terminal state
async fn run_job(config: Config, request: RunRequest, handle: JobHandle, sink: WatchSink) {
    handle.set_status(JobStatus::Running, None);

    let runner = match Runner::new(&config, handle.stop.clone(), handle.results.clone()) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!("Job {} failed to initialize: {}", handle.id, e);
            handle.set_status(JobStatus::Error, Some(e.to_string()));
            return;
        }
    };

    runner
        .run(&request.entry_url, request.targets.as_deref(), &sink)
        .await;

    // Hand the accumulated records to the export collaborator. An export
    // failure marks the run as errored, but the records stay inspectable.
    let path = request.export_path.unwrap_or_else(|| {
        PathBuf::from(&config.output.directory).join(default_export_filename(&handle.id))
    });
    let records = handle.results();
    match CsvExporter.export(&records, &path) {
        Ok(()) => {
            tracing::info!(
                "Job {} completed with {} records, exported to {}",
                handle.id,
                records.len(),
                path.display()
            );
            handle.set_export_path(path);
            handle.set_status(JobStatus::Completed, None);
        }
        Err(e) => {
            tracing::error!("Job {} export failed: {}", handle.id, e);
            handle.set_status(JobStatus::Error, Some(e.to_string()));
        }
    }
}
