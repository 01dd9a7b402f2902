//! Error types for the Subtrack core library.
//!
//! Every failure surfaced by the store, the aggregator or the service layer is
//! a [`SubtrackError`]. Callers that need to translate failures into a
//! transport response should match on [`SubtrackError::kind`] rather than on
//! individual variants.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Persistence | Connection, query, migration, pool and row decode errors |
//! | E2001-E2099 | Config | Environment, config file, and config value errors |
//! | E3001-E3099 | Lookup | Subscription lookups that require a present row |
//! | E4001-E4099 | Validation | Malformed identifiers, months, prices and names |
//! | E5001-E5099 | Cancellation | Caller-initiated aborts and deadlines |
//! | E9002-E9099 | General | IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Coarse classification used to map errors onto a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    Cancelled,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// The main error type for the Subtrack core library.
#[derive(Debug, Error)]
pub enum SubtrackError {
    // ========================================================================
    // Persistence Errors (E1001-E1099)
    // ========================================================================
    /// Failed to establish database connection
    #[error("[E1001] Database connection failed: {message}")]
    DatabaseConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database query execution failed (includes constraint violations)
    #[error("[E1002] Database query failed: {0}")]
    DatabaseQueryFailed(String),

    /// Database migration failed
    #[error("[E1003] Database migration failed: {0}")]
    DatabaseMigrationFailed(String),

    /// Database pool exhausted or closed
    #[error("[E1004] Database pool unavailable: {0}")]
    DatabasePoolUnavailable(String),

    /// A stored row could not be decoded into a subscription
    #[error("[E1005] Failed to decode stored row: {0}")]
    RowDecodeFailed(String),

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Required environment variable is missing
    #[error("[E2001] Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Configuration file parse error
    #[error("[E2002] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2003] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Lookup Errors (E3001-E3099)
    // ========================================================================
    /// No subscription exists for the identifier
    #[error("[E3001] Subscription not found: {0}")]
    SubscriptionNotFound(String),

    // ========================================================================
    // Validation Errors (E4001-E4099)
    // ========================================================================
    /// Value is not a UUID-shaped identifier
    #[error("[E4001] Invalid identifier for '{field}': '{value}'")]
    InvalidIdentifier { field: String, value: String },

    /// Value is not a "YYYY-MM" calendar month
    #[error("[E4002] Invalid month for '{field}': '{value}' (expected YYYY-MM)")]
    InvalidMonth { field: String, value: String },

    /// Price is negative or out of range
    #[error("[E4003] Invalid price: {0} (must be a non-negative integer)")]
    InvalidPrice(i64),

    /// Service name is empty
    #[error("[E4004] Service name must not be empty")]
    EmptyServiceName,

    // ========================================================================
    // Cancellation Errors (E5001-E5099)
    // ========================================================================
    /// Operation was cancelled by the caller
    #[error("[E5001] Operation '{0}' was cancelled")]
    Cancelled(String),

    /// Operation exceeded its deadline
    #[error("[E5002] Operation '{operation}' timed out after {timeout_ms} ms")]
    TimedOut { operation: String, timeout_ms: u64 },

    // ========================================================================
    // General Errors (E9002-E9099)
    // ========================================================================
    /// IO error
    #[error("[E9002] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9003] Serialization error: {0}")]
    SerializationError(String),
}

impl SubtrackError {
    /// Create a database connection error from a string message.
    pub fn database_connection_failed(message: impl Into<String>) -> Self {
        SubtrackError::DatabaseConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_identifier(field: impl Into<String>, value: impl Into<String>) -> Self {
        SubtrackError::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_month(field: impl Into<String>, value: impl Into<String>) -> Self {
        SubtrackError::InvalidMonth {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type alias for Subtrack operations.
pub type SubtrackResult<T> = Result<T, SubtrackError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<sqlx::Error> for SubtrackError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => SubtrackError::DatabasePoolUnavailable(err.to_string()),
            sqlx::Error::PoolClosed => {
                SubtrackError::DatabasePoolUnavailable("Connection pool is closed".to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                SubtrackError::RowDecodeFailed(err.to_string())
            }
            sqlx::Error::Configuration(_) | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                SubtrackError::DatabaseConnectionFailed {
                    message: err.to_string(),
                    source: Some(Box::new(err)),
                }
            }
            sqlx::Error::Database(db_err) => {
                SubtrackError::DatabaseQueryFailed(db_err.to_string())
            }
            _ => SubtrackError::DatabaseQueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for SubtrackError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SubtrackError::DatabaseMigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for SubtrackError {
    fn from(err: serde_json::Error) -> Self {
        SubtrackError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for SubtrackError {
    fn from(err: std::io::Error) -> Self {
        SubtrackError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for SubtrackError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => SubtrackError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => SubtrackError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => SubtrackError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => SubtrackError::ConfigParseError(err.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for SubtrackError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        use crate::config::ConfigLoadError;

        match err {
            ConfigLoadError::Config(e) => e.into(),
            ConfigLoadError::MissingRequired(key) => SubtrackError::InvalidConfigValue {
                key,
                message: "Missing required value".to_string(),
            },
            ConfigLoadError::InvalidValue { key, message } => {
                SubtrackError::InvalidConfigValue { key, message }
            }
            ConfigLoadError::Io(e) => e.into(),
        }
    }
}

impl From<crate::db::DatabaseError> for SubtrackError {
    fn from(err: crate::db::DatabaseError) -> Self {
        use crate::db::DatabaseError;

        match err {
            DatabaseError::MissingEnvVar(name) => SubtrackError::MissingEnvVar(name),
            DatabaseError::ConnectionFailed(e) => e.into(),
            DatabaseError::MigrationFailed(e) => e.into(),
            DatabaseError::InvalidConfig(msg) => SubtrackError::InvalidConfigValue {
                key: "database".to_string(),
                message: msg,
            },
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl SubtrackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubtrackError::DatabaseConnectionFailed { .. }
            | SubtrackError::DatabaseQueryFailed(_)
            | SubtrackError::DatabaseMigrationFailed(_)
            | SubtrackError::DatabasePoolUnavailable(_)
            | SubtrackError::RowDecodeFailed(_) => ErrorKind::Persistence,
            SubtrackError::MissingEnvVar(_)
            | SubtrackError::ConfigParseError(_)
            | SubtrackError::InvalidConfigValue { .. } => ErrorKind::Config,
            SubtrackError::SubscriptionNotFound(_) => ErrorKind::NotFound,
            SubtrackError::InvalidIdentifier { .. }
            | SubtrackError::InvalidMonth { .. }
            | SubtrackError::InvalidPrice(_)
            | SubtrackError::EmptyServiceName => ErrorKind::Validation,
            SubtrackError::Cancelled(_) | SubtrackError::TimedOut { .. } => ErrorKind::Cancelled,
            SubtrackError::IoError(_)
            | SubtrackError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_persistence_error(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            SubtrackError::DatabaseConnectionFailed { .. } => "E1001",
            SubtrackError::DatabaseQueryFailed(_) => "E1002",
            SubtrackError::DatabaseMigrationFailed(_) => "E1003",
            SubtrackError::DatabasePoolUnavailable(_) => "E1004",
            SubtrackError::RowDecodeFailed(_) => "E1005",
            SubtrackError::MissingEnvVar(_) => "E2001",
            SubtrackError::ConfigParseError(_) => "E2002",
            SubtrackError::InvalidConfigValue { .. } => "E2003",
            SubtrackError::SubscriptionNotFound(_) => "E3001",
            SubtrackError::InvalidIdentifier { .. } => "E4001",
            SubtrackError::InvalidMonth { .. } => "E4002",
            SubtrackError::InvalidPrice(_) => "E4003",
            SubtrackError::EmptyServiceName => "E4004",
            SubtrackError::Cancelled(_) => "E5001",
            SubtrackError::TimedOut { .. } => "E5002",
            SubtrackError::IoError(_) => "E9002",
            SubtrackError::SerializationError(_) => "E9003",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            SubtrackError::DatabaseConnectionFailed { .. } => {
                Some("Check that PostgreSQL is running and DATABASE_URL is correct")
            }
            SubtrackError::DatabasePoolUnavailable(_) => {
                Some("The database is busy. Try again in a few seconds")
            }
            SubtrackError::DatabaseMigrationFailed(_) => {
                Some("Run 'subtrack init' against an empty or up-to-date database")
            }
            SubtrackError::MissingEnvVar(_) => {
                Some("Create a .env file or set the environment variable")
            }
            SubtrackError::SubscriptionNotFound(_) => {
                Some("Run 'subtrack list' to see stored subscriptions")
            }
            SubtrackError::InvalidIdentifier { .. } => {
                Some("Identifiers are UUIDs, e.g. 60601fee-2bf1-4721-ae6f-7636e79a0cba")
            }
            SubtrackError::InvalidMonth { .. } => Some("Months are written as YYYY-MM, e.g. 2025-07"),
            SubtrackError::TimedOut { .. } => {
                Some("Raise query.timeout_secs or narrow the filter")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let kind = self.kind();

        match kind {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Cancelled => {
                warn!(error_code = %code, kind = %kind, "{}", self);
            }
            _ => {
                error!(
                    error_code = %code,
                    kind = %kind,
                    suggestion = self.user_suggestion(),
                    "{}",
                    self
                );
            }
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with an optional suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a SubtrackError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a SubtrackError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_code() {
        let err = SubtrackError::MissingEnvVar("DATABASE_URL".to_string());
        assert!(err.to_string().contains("E2001"));
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = SubtrackError::invalid_month("start_date", "2025-13");
        assert!(err.to_string().contains("E4002"));
        assert!(err.to_string().contains("2025-13"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SubtrackError::database_connection_failed("refused").kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            SubtrackError::RowDecodeFailed("bad month".to_string()).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            SubtrackError::invalid_identifier("user_id", "nope").kind(),
            ErrorKind::Validation
        );
        assert_eq!(SubtrackError::InvalidPrice(-1).kind(), ErrorKind::Validation);
        assert_eq!(SubtrackError::EmptyServiceName.kind(), ErrorKind::Validation);
        assert_eq!(
            SubtrackError::SubscriptionNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SubtrackError::Cancelled("list".to_string()).kind(),
            ErrorKind::Cancelled
        );
        assert_eq!(
            SubtrackError::TimedOut {
                operation: "total_cost".to_string(),
                timeout_ms: 10,
            }
            .kind(),
            ErrorKind::Cancelled
        );
    }

    #[test]
    fn test_sqlx_error_mapping() {
        let err: SubtrackError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, SubtrackError::DatabasePoolUnavailable(_)));

        let err: SubtrackError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, SubtrackError::DatabasePoolUnavailable(_)));

        let err: SubtrackError = sqlx::Error::RowNotFound.into();
        assert!(err.is_persistence_error());

        let err: SubtrackError = sqlx::Error::ColumnDecode {
            index: "start_date".to_string(),
            source: "bad".into(),
        }
        .into();
        assert!(matches!(err, SubtrackError::RowDecodeFailed(_)));
    }

    #[test]
    fn test_error_codes_unique_per_category() {
        assert_eq!(SubtrackError::EmptyServiceName.error_code(), "E4004");
        assert_eq!(
            SubtrackError::Cancelled("op".to_string()).error_code(),
            "E5001"
        );
        assert_eq!(
            SubtrackError::DatabaseQueryFailed("x".to_string()).error_code(),
            "E1002"
        );
    }

    #[test]
    fn test_cli_error_display() {
        let err = SubtrackError::invalid_identifier("user_id", "abc");
        let output = CliErrorDisplay::new(&err).to_string();
        assert!(output.contains("E4001"));
        assert!(output.contains("Suggestion"));

        let output = CliErrorDisplay::new(&err).without_suggestion().to_string();
        assert!(!output.contains("Suggestion"));
    }
}
