use thiserror::Error;

/// Failure loading data from the analysis backend.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error! status: {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn http(status: reqwest::StatusCode) -> Self {
        FetchError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure deleting a statement.
#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("HTTP error! status: {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
