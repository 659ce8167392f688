//! # Engine Error Types
//!
//! Error types for booking engine operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Domain       │  │    Storage      │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  Storage(..)    │  │  ConfigLoadFailed       │ │
//! │  │  overpayment,   │  │  not found,     │  │  ConfigSaveFailed       │ │
//! │  │  state guards,  │  │  version        │  │  InvalidConfig          │ │
//! │  │  validation     │  │  conflicts      │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Domain and storage variants pass their inner messages through         │
//! │  unchanged - they are already written for the desk operator.           │
//! │                                                                         │
//! │  NotificationFailed never crosses an operation boundary: the engine    │
//! │  catches it, logs a warning, and returns the successful result.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use rentdesk_core::{CoreError, ValidationError};
use rentdesk_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type covering all booking operation failures.
///
/// ## Design Principles
/// - Domain and storage errors stay typed so callers can match on them
/// - Validation errors are detected before any write
/// - Notification failures are internal; they are logged, never returned
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// A business rule was violated (overpayment, state guard, validation).
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// The storage collaborator failed (I/O, constraint, version conflict).
    #[error(transparent)]
    Storage(#[from] DbError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load the engine config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the engine config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// The loaded configuration is not usable.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Notification Errors (caught at the dispatch site)
    // =========================================================================
    /// Notification dispatch failed. Returned by `Notifier` impls; the
    /// engine logs it and carries on.
    #[error("Notification dispatch failed: {0}")]
    NotificationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::from(err))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl EngineError {
    /// Returns true if the operation failed before any write (safe to fix
    /// the input and resubmit).
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Core(_))
    }

    /// Returns true if retrying against a fresh booking snapshot can
    /// succeed (another desk wrote the booking first).
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Storage(DbError::VersionConflict { .. }))
    }

    /// Returns true if the booking could not be found at all.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::Core(CoreError::BookingNotFound(_))
                | EngineError::Storage(DbError::NotFound { .. })
        )
    }
}
