//! Submission errors

use thiserror::Error;

use crate::transport::TransportError;

/// Fatal error before a job entered polling
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Submission failed: {0}")]
    Transport(String),
    #[error("Submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Response carried no task handle")]
    MissingHandle,
    #[error("Invalid submission response: {0}")]
    InvalidResponse(String),
    #[error("No route configured for job kind: {0}")]
    NoRoute(String),
}

impl SubmissionError {
    /// Message suitable for showing to the user, backend-provided when available
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport(detail) | Self::InvalidResponse(detail) => detail.clone(),
            Self::MissingHandle | Self::NoRoute(_) => self.to_string(),
        }
    }

    /// HTTP status of a rejected submission
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for SubmissionError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::InvalidResponse(detail) => Self::InvalidResponse(detail),
            other => Self::Transport(other.to_string()),
        }
    }
}
