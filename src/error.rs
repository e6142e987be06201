//! Error taxonomy shared by the loader, aggregator and query service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HexError>;

#[derive(Error, Debug)]
pub enum HexError {
    /// Source files disagree on their column set, or lack a required column.
    #[error("schema mismatch in {file}: {detail}")]
    SchemaMismatch { file: String, detail: String },

    /// The storage engine could not be opened or is not ready for queries.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed hex id; rejected before any query is issued.
    #[error("invalid hex id: {0:?}")]
    InvalidInput(String),

    #[error("hex not found: {0}")]
    NotFound(String),

    #[error("download of {url} failed: {reason}")]
    DownloadFailure { url: String, reason: String },

    /// A built summary table that breaks one of its row invariants.
    #[error("summary integrity check failed: {0}")]
    Integrity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] duckdb::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HexError {
    /// Stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            HexError::SchemaMismatch { .. } => "schema_mismatch",
            HexError::StorageUnavailable(_) => "storage_unavailable",
            HexError::InvalidInput(_) => "invalid_input",
            HexError::NotFound(_) => "not_found",
            HexError::DownloadFailure { .. } => "download_failure",
            HexError::Integrity(_) => "integrity",
            HexError::Config(_) => "config",
            HexError::Storage(_) => "storage",
            HexError::Io(_) => "io",
        }
    }

    /// Per-request errors the caller caused and can recover from.
    pub fn is_client_error(&self) -> bool {
        matches!(self, HexError::InvalidInput(_) | HexError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_only_input_and_not_found() {
        assert!(HexError::InvalidInput("x'".into()).is_client_error());
        assert!(HexError::NotFound("8844d6abffffff".into()).is_client_error());
        assert!(!HexError::StorageUnavailable("closed".into()).is_client_error());
        assert!(!HexError::SchemaMismatch {
            file: "a.csv".into(),
            detail: "columns differ".into()
        }
        .is_client_error());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(HexError::InvalidInput(String::new()).kind(), "invalid_input");
        assert_eq!(HexError::NotFound(String::new()).kind(), "not_found");
        let dl = HexError::DownloadFailure {
            url: "http://x".into(),
            reason: "404".into(),
        };
        assert_eq!(dl.kind(), "download_failure");
        assert_eq!(
            dl.to_string(),
            "download of http://x failed: 404"
        );
    }
}
