//! Error types for Vitals Resolver

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors visible to callers of the resolver
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Why a single data source could not produce a summary.
///
/// These never reach the resolver's caller; they decide how the fallback
/// chain advances and how loudly it is logged.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No export found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed source data: {0}")]
    Malformed(String),

    #[error("Export is {size} bytes, exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Export parse exceeded {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Stable short code for logs and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::NotFound(_) => "not_found",
            SourceError::Unavailable(_) => "unavailable",
            SourceError::Malformed(_) => "malformed",
            SourceError::TooLarge { .. } => "too_large",
            SourceError::Timeout(_) => "timeout",
        }
    }

    /// True when the source exists but its content could not be used.
    ///
    /// Plain absence is expected and stays quiet; everything else points at
    /// a real data-quality or sizing problem.
    pub fn is_data_issue(&self) -> bool {
        !matches!(self, SourceError::NotFound(_) | SourceError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_is_not_a_data_issue() {
        assert!(!SourceError::NotFound(PathBuf::from("/nope/export.xml")).is_data_issue());
        assert!(!SourceError::Unavailable("stale".to_string()).is_data_issue());
        assert!(SourceError::Malformed("eof".to_string()).is_data_issue());
        assert!(SourceError::TooLarge { size: 2, limit: 1 }.is_data_issue());
        assert!(SourceError::Timeout(Duration::from_secs(1)).is_data_issue());
    }

    #[test]
    fn test_error_messages() {
        let err = SourceError::TooLarge {
            size: 200,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Export is 200 bytes, exceeds limit of 100 bytes"
        );
        assert_eq!(err.code(), "too_large");
    }
}
