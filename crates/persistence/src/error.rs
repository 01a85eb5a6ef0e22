//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates record errors, validation errors,
//! tenant errors and backend errors.
//!
//! Callers at the boundary rarely care about the full hierarchy. They use
//! [`StorageError::kind`] to collapse an error into one of the coarse
//! [`ErrorKind`] classes and [`ErrorKind::status_code`] to pick a response.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Tenant and period key errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No row with the given id exists in the tenant database.
    #[error("{entity} not found with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A row with the same natural key already exists for the tenant and period.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },
}

/// Errors related to payload validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A payload field failed validation.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A required field was blank.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },
}

/// Errors related to tenant and period keys.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The tenant key is malformed and cannot address a database.
    #[error("invalid tenant key '{tenant_id}': {reason}")]
    InvalidTenant { tenant_id: String, reason: String },

    /// The period key is blank.
    #[error("invalid period key '{period}'")]
    InvalidPeriod { period: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The tenant database is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Building a pool or opening a connection failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// No connection could be checked out before the connect timeout.
    #[error("connection pool exhausted for {backend_name}: {message}")]
    PoolExhausted {
        backend_name: String,
        message: String,
    },

    /// A statement gave up waiting for another connection's lock.
    #[error("lock timeout in {backend_name}: {message}")]
    LockTimeout {
        backend_name: String,
        message: String,
    },

    /// Provisioning a table failed.
    #[error("schema provisioning failed for table {table}: {message}")]
    MigrationError { table: String, message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },
}

/// Errors in process-wide configuration, detected before any pool is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The tenant key pattern is not a valid regular expression.
    #[error("invalid tenant key pattern: {0}")]
    TenantPattern(#[from] regex::Error),

    /// The pool policy is inconsistent.
    #[error("invalid pool policy: {}", .0.join("; "))]
    PoolPolicy(Vec<String>),
}

/// Coarse classification of a [`StorageError`] for boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Natural-key collision on create.
    DuplicateEntity,
    /// Update or delete target absent.
    NotFound,
    /// Payload or key validation failure.
    InvalidInput,
    /// Tenant pool construction or connection acquisition failure.
    ResourceUnavailable,
    /// Unexpected driver failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code a boundary layer should answer with.
    ///
    /// | Kind | Status |
    /// |------|--------|
    /// | DuplicateEntity | 400 |
    /// | NotFound | 404 |
    /// | InvalidInput | 400 |
    /// | ResourceUnavailable | 503 |
    /// | Internal | 500 |
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::DuplicateEntity | ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::ResourceUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns `true` for errors caused by the caller's request.
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::DuplicateEntity => write!(f, "duplicate-entity"),
            ErrorKind::NotFound => write!(f, "not-found"),
            ErrorKind::InvalidInput => write!(f, "invalid-input"),
            ErrorKind::ResourceUnavailable => write!(f, "resource-unavailable"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

impl StorageError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Resource(ResourceError::NotFound { .. }) => ErrorKind::NotFound,
            StorageError::Resource(ResourceError::Duplicate { .. }) => ErrorKind::DuplicateEntity,
            StorageError::Validation(_) | StorageError::Tenant(_) => ErrorKind::InvalidInput,
            StorageError::Backend(
                BackendError::Unavailable { .. }
                | BackendError::ConnectionFailed { .. }
                | BackendError::PoolExhausted { .. }
                | BackendError::LockTimeout { .. },
            ) => ErrorKind::ResourceUnavailable,
            StorageError::Backend(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StorageError::Resource(ResourceError::NotFound { entity, id })
    }

    /// Shorthand for an `InvalidInput` validation error.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Validation(ValidationError::InvalidInput {
            field: field.into(),
            message: message.into(),
        })
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Returns `true` if `err` means the database was locked by another connection.
pub(crate) fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if is_lock_contention(&err) {
            // The wait itself is bounded by the connection's busy timeout.
            return StorageError::Backend(BackendError::LockTimeout {
                backend_name: "sqlite".to_string(),
                message: err.to_string(),
            });
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::invalid_input("payload", err.to_string())
    }
}
