//! Run progress reporting
//!
//! A run reports progress in two weighted phases, scanning the institution
//! list (~10% of the work) and fetching department details (~90%), followed
//! by a final done event. Progress is an event-emission contract: events
//! are ordered and emitted at most once per logical step, but there is no
//! delivery guarantee to a disconnected listener. The watch-channel sink
//! keeps only the latest snapshot, so external pollers read
//! eventually-consistent state rather than a backlog.

use tokio::sync::watch;

/// The phase a run is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Discovering each institution's department links
    Scanning,

    /// Fetching and extracting department detail pages
    Details,

    /// All work finished
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::Details => "details",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient progress snapshot, overwritten on every emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl RunProgress {
    pub fn new(phase: Phase, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            message: message.into(),
        }
    }

    /// Maps the snapshot onto a 0–100 scale, weighting scanning at 10% and
    /// details at 90%
    pub fn percent(&self) -> u8 {
        let total = self.total.max(1);
        match self.phase {
            Phase::Scanning => ((self.current * 10) / total) as u8,
            Phase::Details => (10 + (self.current * 90) / total) as u8,
            Phase::Done => 100,
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new(Phase::Scanning, 0, 0, "")
    }
}

/// Receiver of progress events from a single run
///
/// Implementations may deliver events through a channel, a queue, or a
/// polling store; the run never waits on delivery.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: RunProgress);
}

/// Sink that discards every event
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _progress: RunProgress) {}
}

/// Sink backed by a tokio watch channel: the receiver always sees the
/// latest snapshot
pub struct WatchSink {
    tx: watch::Sender<RunProgress>,
}

impl WatchSink {
    pub fn new() -> (Self, watch::Receiver<RunProgress>) {
        let (tx, rx) = watch::channel(RunProgress::default());
        (Self { tx }, rx)
    }
}

impl ProgressSink for WatchSink {
    fn emit(&self, progress: RunProgress) {
        // A send error just means nobody is polling anymore.
        let _ = self.tx.send(progress);
    }
}
