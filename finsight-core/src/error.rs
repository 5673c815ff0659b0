use thiserror::Error;

use crate::processing::Status;

/// Rejections raised while accepting a selected statement file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a PDF, CSV, or Excel file.")]
    InvalidType { extension: Option<String> },

    #[error("File size must be less than 10MB.")]
    TooLarge { size_bytes: u64 },
}

/// An event that is not legal in the machine's current status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {event} while {from}")]
pub struct TransitionError {
    pub from: Status,
    pub event: &'static str,
}

impl TransitionError {
    pub fn new(from: Status, event: &'static str) -> Self {
        Self { from, event }
    }
}
