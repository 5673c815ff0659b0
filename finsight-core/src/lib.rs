//! finsight-core: domain types and client-side state for statement analysis.
//!
//! Nothing in here performs I/O; the HTTP client, exporters and CLI build on
//! these types.

pub mod analysis;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod fmt;
pub mod processing;
pub mod session;
pub mod upload;

pub use analysis::{
    AnalysisRecord, CategorySpend, Insight, InsightKind, MerchantSummary, MonthlyTrend,
    RecurringTransaction, StatementPeriod, Summary, Transaction, TransactionType,
    UnusualTransaction,
};
pub use dashboard::{DashboardSession, ExportKind, Notification, NotificationLevel};
pub use error::{TransitionError, ValidationError};
pub use filter::{filter_transactions, AdvancedFilters, AmountRange, TransactionTypeFilter};
pub use processing::{
    simulated_update, FailureCause, ProcessingConfig, ProcessingState, Status, StatusMachine,
    StatusUpdate,
};
pub use session::{UploadSession, View};
pub use upload::{validate, UploadCandidate, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
