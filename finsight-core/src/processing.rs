//! Processing status machine: upload + analysis lifecycle of one statement.
//!
//! The machine is clock-free. Drivers feed it upload increments and
//! [`StatusUpdate`]s, either simulated from elapsed wall-clock time
//! ([`simulated_update`]) or mapped from the backend's status endpoint.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Uploading => "uploading",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    /// Uploading or processing: a cycle is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Status::Uploading | Status::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Heading shown above the progress bar.
    pub fn headline(&self) -> &'static str {
        match self {
            Status::Idle => "",
            Status::Uploading => "Uploading File",
            Status::Processing => "Analyzing Statement",
            Status::Completed => "Analysis Complete",
            Status::Failed => "Processing Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MSG_UPLOADING: &str = "Uploading your bank statement...";
pub const MSG_UPLOAD_DONE: &str = "Upload complete! Starting analysis...";
pub const MSG_PROCESSING_STARTED: &str =
    "Your statements are being analyzed. Please hold on for insights.";
pub const MSG_COMPLETED: &str = "Analysis complete! Your financial insights are ready.";
pub const MSG_UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";
pub const MSG_PROCESSING_FAILED: &str = "Processing failed. Please try uploading again.";

/// Share of overall progress taken by the upload phase.
const UPLOAD_SHARE: f64 = 10.0;

/// Simulated processing never reports more than this before completing.
pub const SIMULATED_PROGRESS_CAP: f64 = 95.0;

/// Cadence and estimates for one upload + processing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    pub upload_step_delay: Duration,
    pub upload_step_percent: u8,
    pub poll_interval: Duration,
    pub max_duration: Duration,
    /// Polling gives up after `max_duration * deadline_factor` without a result
    pub deadline_factor: u32,
    pub upload_eta_seconds: u64,
    pub processing_eta_seconds: u64,
}

impl ProcessingConfig {
    /// Longest the processing phase may poll before the cycle fails.
    pub fn poll_deadline(&self) -> Duration {
        self.max_duration * self.deadline_factor.max(1)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            upload_step_delay: Duration::from_millis(200),
            upload_step_percent: 10,
            poll_interval: Duration::from_millis(2500),
            max_duration: Duration::from_millis(120_000),
            deadline_factor: 3,
            upload_eta_seconds: 30,
            processing_eta_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingState {
    pub status: Status,
    /// Progress of the current phase, 0-100
    pub progress: f64,
    /// Progress of the whole cycle, 0-100, never decreases until reset/failure
    pub overall_progress: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,
}

impl ProcessingState {
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            progress: 0.0,
            overall_progress: 0.0,
            message: String::new(),
            estimated_time_seconds: None,
            statement_id: None,
        }
    }

    /// Remaining-time estimate, only while a cycle is running.
    pub fn visible_eta(&self) -> Option<u64> {
        if self.status.is_in_flight() {
            self.estimated_time_seconds
        } else {
            None
        }
    }
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self::idle()
    }
}

/// One observation of the analysis job.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    InProgress {
        progress: f64,
        estimated_time_seconds: Option<u64>,
        message: Option<String>,
    },
    Completed,
    Failed {
        message: Option<String>,
    },
}

/// Why an in-flight cycle failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The local upload/poll action was interrupted.
    Interrupted,
    /// A real call to the analysis service failed (timeout, 4xx/5xx, disconnect).
    Service { detail: String },
}

/// Phase message for a processing progress value.
pub fn processing_message(progress: f64) -> &'static str {
    if progress < 30.0 {
        "Extracting transaction data..."
    } else if progress < 60.0 {
        "Categorizing transactions with AI..."
    } else if progress < 90.0 {
        "Generating insights and trends..."
    } else {
        "Finalizing your analysis..."
    }
}

/// Time-driven stand-in for the backend status endpoint.
pub fn simulated_update(elapsed: Duration, max_duration: Duration) -> StatusUpdate {
    if elapsed >= max_duration {
        return StatusUpdate::Completed;
    }
    let max_ms = max_duration.as_millis().max(1) as f64;
    let elapsed_ms = elapsed.as_millis() as f64;
    let progress = (elapsed_ms / max_ms * 100.0).min(SIMULATED_PROGRESS_CAP);
    let remaining = max_duration - elapsed;
    let remaining_secs = remaining.as_millis().div_ceil(1000) as u64;
    StatusUpdate::InProgress {
        progress,
        estimated_time_seconds: Some(remaining_secs),
        message: None,
    }
}

fn clamp_pct(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) }
}

#[derive(Debug, Clone)]
pub struct StatusMachine {
    config: ProcessingConfig,
    state: ProcessingState,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new(ProcessingConfig::default())
    }
}

impl StatusMachine {
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            state: ProcessingState::idle(),
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    fn require(&self, allowed: &[Status], event: &'static str) -> Result<(), TransitionError> {
        if allowed.contains(&self.state.status) {
            Ok(())
        } else {
            Err(TransitionError::new(self.state.status, event))
        }
    }

    fn enter(&mut self, status: Status) {
        debug!(from = %self.state.status, to = %status, "processing transition");
        self.state.status = status;
    }

    /// Raise phase progress; never lowers it within a phase.
    fn raise_progress(&mut self, phase_progress: f64) {
        let phase = clamp_pct(phase_progress).max(self.state.progress);
        self.state.progress = phase;
        let overall = match self.state.status {
            Status::Uploading => phase * UPLOAD_SHARE / 100.0,
            Status::Processing => UPLOAD_SHARE + phase * (100.0 - UPLOAD_SHARE) / 100.0,
            Status::Completed => 100.0,
            Status::Idle | Status::Failed => 0.0,
        };
        self.state.overall_progress = clamp_pct(overall).max(self.state.overall_progress);
    }

    /// idle -> uploading
    pub fn start_upload(&mut self) -> Result<(), TransitionError> {
        self.require(&[Status::Idle], "start upload")?;
        self.enter(Status::Uploading);
        self.state.progress = 0.0;
        self.state.overall_progress = 0.0;
        self.state.message = MSG_UPLOADING.to_string();
        self.state.estimated_time_seconds = Some(self.config.upload_eta_seconds);
        self.state.statement_id = None;
        Ok(())
    }

    /// Record upload progress (one step of the increment loop).
    pub fn advance_upload(&mut self, percent: f64) -> Result<(), TransitionError> {
        self.require(&[Status::Uploading], "advance upload")?;
        self.raise_progress(percent);
        self.state.message = if self.state.progress >= 100.0 {
            MSG_UPLOAD_DONE
        } else {
            MSG_UPLOADING
        }
        .to_string();
        Ok(())
    }

    /// uploading (complete) -> processing
    pub fn begin_processing(&mut self, statement_id: impl Into<String>) -> Result<(), TransitionError> {
        self.require(&[Status::Uploading], "begin processing")?;
        if self.state.progress < 100.0 {
            return Err(TransitionError::new(self.state.status, "begin processing before upload finished"));
        }
        self.enter(Status::Processing);
        // new phase: phase progress restarts, overall keeps climbing
        self.state.progress = 0.0;
        self.raise_progress(0.0);
        self.state.message = MSG_PROCESSING_STARTED.to_string();
        self.state.estimated_time_seconds = Some(self.config.processing_eta_seconds);
        self.state.statement_id = Some(statement_id.into());
        Ok(())
    }

    /// Apply one status observation while processing.
    pub fn apply_update(&mut self, update: StatusUpdate) -> Result<(), TransitionError> {
        self.require(&[Status::Processing], "apply status update")?;
        match update {
            StatusUpdate::InProgress {
                progress,
                estimated_time_seconds,
                message,
            } => {
                self.raise_progress(progress);
                if estimated_time_seconds.is_some() {
                    self.state.estimated_time_seconds = estimated_time_seconds;
                }
                self.state.message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| processing_message(self.state.progress).to_string());
            }
            StatusUpdate::Completed => {
                self.enter(Status::Completed);
                self.state.progress = 100.0;
                self.state.overall_progress = 100.0;
                self.state.message = MSG_COMPLETED.to_string();
                self.state.estimated_time_seconds = None;
            }
            StatusUpdate::Failed { message } => {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| MSG_PROCESSING_FAILED.to_string());
                self.enter_failed(message);
            }
        }
        Ok(())
    }

    /// uploading | processing -> failed
    pub fn fail(&mut self, cause: FailureCause) -> Result<(), TransitionError> {
        self.require(&[Status::Uploading, Status::Processing], "fail")?;
        let uploading = self.state.status == Status::Uploading;
        let message = match (&cause, uploading) {
            (FailureCause::Interrupted, true) => MSG_UPLOAD_FAILED.to_string(),
            (FailureCause::Interrupted, false) => MSG_PROCESSING_FAILED.to_string(),
            (FailureCause::Service { detail }, true) => format!(
                "Upload failed: the analysis service could not be reached ({detail}). Please try again."
            ),
            (FailureCause::Service { detail }, false) => format!(
                "Processing failed: the analysis service reported an error ({detail}). Please try uploading again."
            ),
        };
        self.enter_failed(message);
        Ok(())
    }

    fn enter_failed(&mut self, message: String) {
        self.enter(Status::Failed);
        self.state.progress = 0.0;
        self.state.overall_progress = 0.0;
        self.state.message = message;
        self.state.estimated_time_seconds = None;
    }

    /// completed | failed -> idle. Clears the statement id.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.require(&[Status::Idle, Status::Completed, Status::Failed], "reset")?;
        self.abandon();
        Ok(())
    }

    /// Unconditional return to idle (navigation away). Any driver must be
    /// cancelled before calling this.
    pub fn abandon(&mut self) {
        if self.state.status != Status::Idle {
            self.enter(Status::Idle);
        }
        self.state = ProcessingState::idle();
    }
}
