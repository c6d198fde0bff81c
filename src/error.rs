//! Error taxonomy shared by the widgets and the HTTP layer.
//!
//! DESIGN
//! ======
//! Each error type owns a stable machine-readable code through
//! [`ErrorCode`]. The HTTP layer renders `{code, message, retryable}` from
//! it, so handlers never match on message text.

use crate::store::StoreError;

/// Stable error code and retry hint for user-facing errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Failure of a widget action.
#[derive(Debug, thiserror::Error)]
pub enum UtilityError {
    /// User input failed a local check (blank text, non-numeric amount, ...).
    #[error("{0}")]
    Validation(String),

    /// The exchange-rate fetch failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server failed on its own side (a worker task died, output could
    /// not be written).
    #[error("internal error: {0}")]
    Internal(String),

    /// The widget's slot could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UtilityError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl ErrorCode for UtilityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Network(_) => "E_NETWORK",
            Self::Internal(_) => "E_INTERNAL",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal(_) => false,
            Self::Network(_) => true,
            Self::Store(e) => e.retryable(),
        }
    }
}
