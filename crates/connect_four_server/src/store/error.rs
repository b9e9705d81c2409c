//! Store error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Storage failure with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<connect_four::BoardError> for StoreError {
    #[track_caller]
    fn from(err: connect_four::BoardError) -> Self {
        Self::new(format!("Stored board is malformed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_records_caller_location() {
        let err = StoreError::new("boom");
        assert_eq!(err.file, file!());
        assert!(err.to_string().starts_with("Store error: boom at "));
    }
}
