//! Error types for sheetsum.
//!
//! Library crates use [`SheetsumError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The error taxonomy mirrors the recovery policy: [`SheetsumError::Fetch`]
//! and [`SheetsumError::Summarize`] are recovered per-URL by the pipeline
//! (log and skip, row left untouched); everything else aborts the run.

use std::path::PathBuf;

/// Top-level error type for all sheetsum operations.
#[derive(Debug, thiserror::Error)]
pub enum SheetsumError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP failure or non-2xx response while fetching a URL.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Summarization inference failure or empty model output.
    #[error("summarize error: {0}")]
    Summarize(String),

    /// Spreadsheet read/write transport error. Never recovered locally.
    #[error("sheet transport error: {0}")]
    Transport(String),

    /// OAuth credential loading, refresh, or consent-flow error.
    #[error("auth error: {0}")]
    Auth(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed range contents, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SheetsumError>;

impl SheetsumError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the pipeline may recover from this error by skipping the
    /// current URL and continuing with the next one.
    pub fn is_per_url(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Summarize(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SheetsumError::config("missing spreadsheet_id");
        assert_eq!(err.to_string(), "config error: missing spreadsheet_id");

        let err = SheetsumError::Fetch("http://a.test: HTTP 404".into());
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn per_url_classification() {
        assert!(SheetsumError::Fetch("timeout".into()).is_per_url());
        assert!(SheetsumError::Summarize("empty output".into()).is_per_url());
        assert!(!SheetsumError::Transport("write failed".into()).is_per_url());
        assert!(!SheetsumError::Auth("token expired".into()).is_per_url());
    }
}
