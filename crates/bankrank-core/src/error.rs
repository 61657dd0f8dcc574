use std::path::Path;

use rusqlite::{Error as SqliteError, ffi::ErrorCode};
use thiserror::Error;

/// Pipeline failure classes. Each stage produces exactly one of these; the
/// orchestrator logs and propagates without retrying.
#[derive(Debug, Clone, Error)]
pub enum EtlError {
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    DataNotFound(String),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Query(String),
}

impl EtlError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn data_not_found(message: impl Into<String>) -> Self {
        Self::DataNotFound(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Stable snake_case identifier for output contracts and exit-code mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::DataNotFound(_) => "data_not_found",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Storage(_) => "storage_error",
            Self::Query(_) => "query_error",
        }
    }

    pub fn recovery_steps(&self) -> Vec<String> {
        match self {
            Self::Network(_) => vec![
                "Check network connectivity and that the source URL is reachable.".to_string(),
                "Rerun `bankrank run` once the source responds.".to_string(),
            ],
            Self::DataNotFound(_) => vec![
                "Verify the source page still carries a ranked market-cap table.".to_string(),
                "Pass a different page with `bankrank run --url <url>`.".to_string(),
            ],
            Self::Config(_) => vec![
                "Fix the exchange-rate file (Currency,Rate rows for GBP, EUR, INR).".to_string(),
                "Or remove it to fall back to the built-in default rates.".to_string(),
            ],
            Self::Io(_) => vec![
                "Check write permissions and free space for the output paths.".to_string(),
                "Point outputs elsewhere with `bankrank run --data-dir <dir>`.".to_string(),
            ],
            Self::Storage(_) => vec![
                "Close other processes holding the database file, then rerun.".to_string(),
                "If the file is corrupt, delete it; each run rebuilds the table.".to_string(),
            ],
            Self::Query(_) => vec![
                "Fix the SQL syntax and retry.".to_string(),
                "Use a single read-only SELECT statement.".to_string(),
            ],
        }
    }
}

pub type EtlResult<T> = Result<T, EtlError>;

/// Classifies SQLite failures into operator-meaningful storage messages.
pub(crate) fn map_sqlite_error(db_path: &Path, error: &SqliteError) -> EtlError {
    let location = db_path.display();
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => EtlError::storage(format!(
            "database is locked at `{location}`: another process is using it"
        )),
        Some(ErrorCode::NotADatabase) => EtlError::storage(format!(
            "file at `{location}` is not a valid SQLite database"
        )),
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => EtlError::storage(format!(
            "cannot open database at `{location}` for writing: {error}"
        )),
        _ => EtlError::storage(format!("database operation failed at `{location}`: {error}")),
    }
}

pub(crate) fn map_io_error(path: &Path, error: &std::io::Error) -> EtlError {
    let location = path.display();
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        return EtlError::io(format!("permission denied writing `{location}`"));
    }
    EtlError::io(format!("write to `{location}` failed: {error}"))
}

#[cfg(test)]
mod tests {
    use super::EtlError;

    #[test]
    fn codes_are_stable_per_kind() {
        let cases = [
            (EtlError::network("x"), "network_error"),
            (EtlError::data_not_found("x"), "data_not_found"),
            (EtlError::config("x"), "config_error"),
            (EtlError::io("x"), "io_error"),
            (EtlError::storage("x"), "storage_error"),
            (EtlError::query("x"), "query_error"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.code(), expected);
            assert!(!error.recovery_steps().is_empty());
        }
    }

    #[test]
    fn display_is_the_message() {
        let error = EtlError::config("missing GBP rate");
        assert_eq!(error.to_string(), "missing GBP rate");
    }
}
