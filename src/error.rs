use crate::database::DatabaseError;
use crate::scraper::FetchError;
use sqlx::error::ErrorKind;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Scraping failed; carries the fetch error unchanged
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Observation written for a product that is not tracked
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Product is not tracked
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Caller input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_fetch_error(&self) -> bool {
        matches!(self, AppError::Fetch(_))
    }

    /// Message shown to the person using the tracker, one per error kind
    pub fn user_message(&self) -> String {
        match self {
            AppError::Fetch(FetchError::Timeout { element, .. }) => format!(
                "The product page did not show {} in time. Try again later.",
                element
            ),
            AppError::Fetch(FetchError::ParseFailure { input }) => format!(
                "Found a price on the page but could not read it: {:?}",
                input
            ),
            AppError::Fetch(FetchError::ConnectionFailure(reason)) => {
                format!("Could not reach the remote browser: {}", reason)
            }
            AppError::Integrity(msg) => format!("Price was not recorded: {}", msg),
            AppError::NotFound(url) => format!("This product is not being tracked: {}", url),
            AppError::Storage(e) => format!("Could not save price data: {}", e),
            AppError::Validation(msg) => format!("Invalid input: {}", msg),
            AppError::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }

    /// Process exit status for the command-line caller
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) => 2,
            AppError::NotFound(_) => 3,
            AppError::Fetch(_) => 4,
            AppError::Integrity(_) => 5,
            AppError::Storage(_) => 6,
            AppError::Config(_) => 78,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Referential integrity violation
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored row could not be decoded
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Storage(DatabaseError::QueryError(e)),
            RepositoryError::Integrity(msg) => AppError::Integrity(msg),
            RepositoryError::InvalidInput(msg) => AppError::Validation(msg),
            RepositoryError::InvalidData(msg) => AppError::Storage(DatabaseError::InvalidData(msg)),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => match db_err.kind() {
                ErrorKind::ForeignKeyViolation => {
                    RepositoryError::Integrity(db_err.message().to_string())
                }
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    RepositoryError::InvalidInput(db_err.message().to_string())
                }
                _ => RepositoryError::Query(err),
            },
            _ => RepositoryError::Query(err),
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        RepositoryError::from(err).into()
    }
}
