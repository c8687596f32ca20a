use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ImportError, Result};
use crate::import::stats::ImportStats;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobProgress {
    pub batches_completed: usize,
    pub total_batches: usize,
    pub messages_processed: usize,
    pub messages_total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub id: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub stats: Option<ImportStats>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Idle,
            progress: JobProgress::default(),
            stats: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

/// Shared state of one import run, observable by the UI while it runs.
///
/// Holds the cancellation token wired to the user's "stop import" action.
/// A stop requested before `start` applies to the run that starts next. The
/// token is replaced when a run ends, so a stopped job can be re-run.
pub struct ImportJob {
    state: Arc<Mutex<JobState>>,
    cancellation_token: Mutex<CancellationToken>,
}

impl ImportJob {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(JobState::default())),
            cancellation_token: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn state(&self) -> JobState {
        self.state.lock().clone()
    }

    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    pub fn start(&self, messages_total: usize, total_batches: usize) -> Result<String> {
        let mut state = self.state.lock();

        if state.status == JobStatus::Running {
            return Err(ImportError::JobAlreadyRunning(state.id.clone()));
        }

        let job_id = Uuid::new_v4().to_string();
        *state = JobState {
            id: job_id.clone(),
            status: JobStatus::Running,
            progress: JobProgress {
                batches_completed: 0,
                total_batches,
                messages_processed: 0,
                messages_total,
            },
            stats: None,
            started_at: Some(Utc::now()),
            completed_at: None,
            error_message: None,
        };

        Ok(job_id)
    }

    pub fn update_progress(&self, batches_completed: usize, messages_processed: usize) {
        let mut state = self.state.lock();
        state.progress.batches_completed = batches_completed;
        state.progress.messages_processed = messages_processed;
    }

    pub fn complete(&self, stats: ImportStats) {
        self.finish(JobStatus::Completed, stats);
    }

    /// Record the partial stats of a run that stopped on cancellation.
    pub fn mark_cancelled(&self, stats: ImportStats) {
        self.finish(JobStatus::Cancelled, stats);
    }

    pub fn fail(&self, error: String) {
        let mut state = self.state.lock();
        state.status = JobStatus::Failed;
        state.error_message = Some(error);
        state.completed_at = Some(Utc::now());
        self.reset_cancellation();
    }

    /// Request cancellation. The running import stops at its next batch boundary.
    pub fn cancel(&self) {
        self.cancellation_token.lock().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.lock().is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.lock().clone()
    }

    fn finish(&self, status: JobStatus, stats: ImportStats) {
        let mut state = self.state.lock();
        state.status = status;
        state.stats = Some(stats);
        state.completed_at = Some(Utc::now());
        self.reset_cancellation();
    }

    fn reset_cancellation(&self) {
        *self.cancellation_token.lock() = CancellationToken::new();
    }
}

impl Default for ImportJob {
    fn default() -> Self {
        Self::new()
    }
}
