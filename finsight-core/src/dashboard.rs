//! Results dashboard session state for one loaded analysis.
//!
//! Owns the filter inputs, the export guard and the delete dialog. Created
//! when the results view loads an analysis, dropped when the view goes away.

use std::fmt;

use tracing::{info, warn};

use crate::analysis::{AnalysisRecord, Transaction};
use crate::filter::{filter_transactions, AdvancedFilters, ALL_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Csv,
}

impl ExportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "PDF",
            ExportKind::Csv => "CSV",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "PDF report downloaded successfully!",
            ExportKind::Csv => "CSV data exported successfully!",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSession {
    analysis: AnalysisRecord,
    search: String,
    category: String,
    advanced: AdvancedFilters,
    exporting: Option<ExportKind>,
    delete_dialog_open: bool,
}

impl DashboardSession {
    pub fn new(analysis: AnalysisRecord) -> Self {
        Self {
            analysis,
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
            advanced: AdvancedFilters::default(),
            exporting: None,
            delete_dialog_open: false,
        }
    }

    pub fn analysis(&self) -> &AnalysisRecord {
        &self.analysis
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    pub fn advanced(&self) -> &AdvancedFilters {
        &self.advanced
    }

    pub fn advanced_mut(&mut self) -> &mut AdvancedFilters {
        &mut self.advanced
    }

    /// Category selector options: "all" followed by the transaction categories.
    pub fn category_options(&self) -> Vec<&str> {
        let mut out = vec![ALL_CATEGORIES];
        out.extend(self.analysis.categories());
        out
    }

    pub fn filtered(&self) -> Vec<&Transaction> {
        filter_transactions(
            &self.analysis.transactions,
            &self.search,
            &self.category,
            &self.advanced,
        )
    }

    /// Drives the "filters active" indicator.
    pub fn has_active_filters(&self) -> bool {
        self.advanced.is_active()
    }

    pub fn clear_advanced_filters(&mut self) {
        self.advanced.clear();
    }

    pub fn exporting(&self) -> Option<ExportKind> {
        self.exporting
    }

    /// Mark an export as running. Refused while another export runs.
    pub fn begin_export(&mut self, kind: ExportKind) -> Result<(), Notification> {
        if let Some(running) = self.exporting {
            return Err(Notification::error(format!(
                "A {} export is already in progress.",
                running.label()
            )));
        }
        self.exporting = Some(kind);
        Ok(())
    }

    /// Release the export guard and turn the outcome into a notification.
    pub fn finish_export<E: fmt::Display>(&mut self, kind: ExportKind, outcome: Result<(), E>) -> Notification {
        self.exporting = None;
        match outcome {
            Ok(()) => {
                info!(kind = kind.label(), file = %self.analysis.file_name, "export finished");
                Notification::success(kind.success_message())
            }
            Err(e) => {
                warn!(kind = kind.label(), error = %e, "export failed");
                Notification::error(format!("Failed to export {}: {e}", kind.label()))
            }
        }
    }

    /// Run a synchronous export under the guard.
    pub fn run_export<T, E, F>(&mut self, kind: ExportKind, render: F) -> (Option<T>, Notification)
    where
        E: fmt::Display,
        F: FnOnce(&AnalysisRecord) -> Result<T, E>,
    {
        if let Err(busy) = self.begin_export(kind) {
            return (None, busy);
        }
        match render(&self.analysis) {
            Ok(out) => (Some(out), self.finish_export::<E>(kind, Ok(()))),
            Err(e) => (None, self.finish_export(kind, Err(e))),
        }
    }

    pub fn is_delete_dialog_open(&self) -> bool {
        self.delete_dialog_open
    }

    pub fn open_delete_dialog(&mut self) {
        self.delete_dialog_open = true;
    }

    pub fn cancel_delete(&mut self) {
        self.delete_dialog_open = false;
    }

    /// The dialog stays open so the user can retry.
    pub fn delete_failed<E: fmt::Display>(&mut self, error: E) -> Notification {
        warn!(statement_id = %self.analysis.statement_id, error = %error, "delete failed");
        Notification::error(format!("Failed to delete analysis: {error}"))
    }

    pub fn delete_succeeded(&mut self) -> Notification {
        self.delete_dialog_open = false;
        info!(statement_id = %self.analysis.statement_id, "analysis deleted");
        Notification::success("Analysis deleted successfully.")
    }
}
