//! # Error Types
//!
//! Error types for storage and ledger operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          ValidationError / CoreError       │
//! │       │                                     │ (depot-core)              │
//! │       ▼                                     │                           │
//! │  DbError ← categorised storage failure      │                           │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │  LedgerError ← the four kinds collaborators handle:                    │
//! │                NotFound, InvalidEntry, InsufficientStock, Storage      │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  BatchError ← LedgerError + how many entries already committed         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use depot_core::{CoreError, ValidationError};
use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and caller retry decisions.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another writer held the database lock past the busy timeout.
    ///
    /// ## When This Occurs
    /// - Long-running writer on another connection
    /// - Busy timeout configured too low for the write load
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be decoded (e.g. malformed decimal text).
    #[error("Invalid stored {column}: '{value}'")]
    InvalidData { column: String, value: String },

    /// A derived value over stored balances overflowed the decimal range.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidData error for a column that failed to decode.
    pub fn invalid_data(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::InvalidData {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Lock contention or connection trouble that may clear on its own.
    ///
    /// Constraint violations, bad stored data and migration failures will
    /// fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DbError::Busy(_) | DbError::PoolExhausted | DbError::ConnectionFailed(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint / lock type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // Lock: "database is locked" / "database table is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("is locked") || msg.contains("busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Errors surfaced by the ledger to its collaborators.
///
/// ## Retry Policy
/// The ledger never retries internally. A [`LedgerError::Storage`] failure
/// always leaves nothing behind, but only a transient one (lock timeout,
/// exhausted pool, lost connection) is worth retrying; see
/// [`LedgerError::is_retryable`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The requested stock record or reference does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed input: non-positive quantity, blank ids, oversized text.
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// An OUT entry would drive the balance negative; nothing was persisted.
    #[error("Insufficient stock for {item_id} at {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        location_id: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Underlying persistence or transaction failure.
    #[error("Storage error: {0}")]
    Storage(DbError),
}

impl LedgerError {
    /// Returns true when the caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(err) if err.is_transient())
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            other => LedgerError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::InvalidEntry(err.to_string())
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                item_id,
                location_id,
                available,
                requested,
            } => LedgerError::InsufficientStock {
                item_id,
                location_id,
                available,
                requested,
            },
            CoreError::Validation(v) => v.into(),
            overflow @ (CoreError::QuantityOverflow { .. } | CoreError::ValueOverflow { .. }) => {
                LedgerError::InvalidEntry(overflow.to_string())
            }
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Batch Error
// =============================================================================

/// A batch stopped at its first failing entry.
///
/// Entries before `failed_index` are committed and stay committed; the
/// caller decides whether to compensate.
#[derive(Debug, Error)]
#[error("Batch stopped at entry {failed_index} after {committed} committed: {source}")]
pub struct BatchError {
    pub committed: usize,
    pub failed_index: usize,
    #[source]
    pub source: LedgerError,
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading and saving errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
