//! Upload view session: the selected file, its validation error, and the
//! latest processing snapshot published by the driver.

use tracing::{debug, info};

use crate::error::{TransitionError, ValidationError};
use crate::processing::{ProcessingState, Status};
use crate::upload::{validate, UploadCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Upload,
    Results,
}

#[derive(Debug, Clone)]
pub struct UploadSession {
    candidate: Option<UploadCandidate>,
    error: Option<ValidationError>,
    processing: ProcessingState,
    view: View,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            candidate: None,
            error: None,
            processing: ProcessingState::idle(),
            view: View::Upload,
        }
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn processing(&self) -> &ProcessingState {
        &self.processing
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Replace the selection. Clears the previous error and processing state
    /// before validating; a rejected file leaves no candidate behind.
    pub fn select_file(&mut self, name: &str, size_bytes: u64) -> Result<&UploadCandidate, ValidationError> {
        self.error = None;
        self.processing = ProcessingState::idle();
        self.candidate = None;

        match validate(name, size_bytes) {
            Ok(c) => {
                debug!(name = %c.name, size_bytes = c.size_bytes, "file accepted");
                Ok(&*self.candidate.insert(c))
            }
            Err(e) => {
                debug!(name, size_bytes, error = %e, "file rejected");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// The "Analyze" trigger is enabled only with a file and no running cycle.
    pub fn can_analyze(&self) -> bool {
        self.candidate.is_some() && !self.processing.status.is_in_flight()
    }

    /// Hand the candidate to a new processing driver.
    pub fn begin_cycle(&self) -> Result<UploadCandidate, TransitionError> {
        if self.processing.status.is_in_flight() {
            return Err(TransitionError::new(self.processing.status, "analyze"));
        }
        self.candidate
            .clone()
            .ok_or_else(|| TransitionError::new(self.processing.status, "analyze without a selected file"))
    }

    /// Mirror a snapshot published by the processing driver.
    pub fn observe(&mut self, state: ProcessingState) {
        if state.status != self.processing.status {
            info!(status = %state.status, statement_id = ?state.statement_id, "processing status changed");
        }
        self.processing = state;
    }

    /// Completed statement id, switching to the results view.
    pub fn view_results(&mut self) -> Result<String, TransitionError> {
        match (&self.processing.status, &self.processing.statement_id) {
            (Status::Completed, Some(id)) => {
                self.view = View::Results;
                Ok(id.clone())
            }
            (status, _) => Err(TransitionError::new(*status, "view results")),
        }
    }

    /// "Upload another statement": only once the cycle has ended.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if self.processing.status.is_in_flight() {
            return Err(TransitionError::new(self.processing.status, "reset"));
        }
        self.navigate_away();
        Ok(())
    }

    /// Drop everything; the caller cancels any running driver first.
    pub fn navigate_away(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: &str) -> ProcessingState {
        ProcessingState {
            status: Status::Completed,
            progress: 100.0,
            overall_progress: 100.0,
            message: "done".into(),
            estimated_time_seconds: None,
            statement_id: Some(id.into()),
        }
    }

    #[test]
    fn test_select_valid_file_clears_previous_state() {
        let mut s = UploadSession::new();
        assert!(s.select_file("notes.txt", 10).is_err());
        assert!(s.error().is_some());

        s.observe(completed("stmt_old"));
        let c = s.select_file("STATEMENT.PDF", 2048).unwrap().clone();
        assert_eq!(c.extension, "pdf");
        assert!(s.error().is_none());
        assert_eq!(s.processing().status, Status::Idle);
        assert!(s.can_analyze());
    }

    #[test]
    fn test_rejected_file_drops_previous_candidate() {
        let mut s = UploadSession::new();
        s.select_file("a.csv", 10).unwrap();
        let err = s.select_file("a.csv", 10_485_761).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(s.candidate().is_none());
        assert!(!s.can_analyze());
    }

    #[test]
    fn test_analyze_disabled_while_in_flight() {
        let mut s = UploadSession::new();
        s.select_file("a.pdf", 10).unwrap();
        assert!(s.begin_cycle().is_ok());

        let mut st = ProcessingState::idle();
        st.status = Status::Processing;
        s.observe(st);
        assert!(!s.can_analyze());
        assert!(s.begin_cycle().is_err());
        assert!(s.reset().is_err());
    }

    #[test]
    fn test_view_results_requires_completion() {
        let mut s = UploadSession::new();
        s.select_file("a.pdf", 10).unwrap();
        assert!(s.view_results().is_err());
        s.observe(completed("stmt_9"));
        assert_eq!(s.view_results().unwrap(), "stmt_9");
        assert_eq!(s.view(), View::Results);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = UploadSession::new();
        s.select_file("a.pdf", 10).unwrap();
        s.observe(completed("stmt_10"));
        s.view_results().unwrap();
        s.reset().unwrap();
        assert!(s.candidate().is_none());
        assert!(s.error().is_none());
        assert_eq!(s.processing().statement_id, None);
        assert_eq!(s.view(), View::Upload);
    }
}
