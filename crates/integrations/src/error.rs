use thiserror::Error;

use fulfil_core::DomainError;

use crate::adapter::CallFailure;
use crate::audit::AuditWriteError;

/// Errors from delivery platform operations.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// No adapter is registered for the requested platform.
    #[error("unsupported delivery platform: {0}")]
    UnsupportedPlatform(String),

    /// The request never produced an HTTP response (network error, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The platform answered but refused the request, or its response was
    /// unusable.
    #[error("platform rejected request (status {status:?}): {message}")]
    RemoteRejected {
        status: Option<u16>,
        message: String,
    },

    /// The audit log could not be written. The operation is aborted before
    /// any local state changes.
    #[error(transparent)]
    AuditWrite(#[from] AuditWriteError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<CallFailure> for IntegrationError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(message) => IntegrationError::Transport(message),
            CallFailure::Rejected { status, message } => {
                IntegrationError::RemoteRejected { status, message }
            }
        }
    }
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;
