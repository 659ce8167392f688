//! # Error Types
//!
//! Domain-specific error types for rentdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rentdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rentdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  rentdesk-engine errors (separate crate)                               │
//! │  └── EngineError      - What callers see (Core + Db + config)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Error messages are user-facing and actionable, never internal jargon
//! 3. Errors are enum variants, never String
//! 4. Each variant carries the numbers/states that caused it

use thiserror::Error;

use crate::types::BookingStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// Their messages are written to be shown to the desk operator as-is.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Booking cannot be found.
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// A monetary amount fails its rule (zero/negative payment, negative charge).
    ///
    /// ## When This Occurs
    /// - Recording a payment of ₹0 or less
    /// - Negative damage charges or fees on a completion request
    #[error("{reason}")]
    InvalidAmount { reason: String },

    /// A payment would push the paid amount past the total.
    ///
    /// ## When This Occurs
    /// ```text
    /// Record payment ₹3,000
    ///      │
    ///      ▼
    /// paid ₹8,000 + ₹3,000 = ₹11,000 > total ₹10,000
    ///      │
    ///      ▼
    /// Overpayment { attempted: 300000, paid: 800000, total: 1000000 }
    ///      │
    ///      ▼
    /// UI shows: "Paid amount cannot exceed total amount"
    /// ```
    #[error("Paid amount cannot exceed total amount")]
    Overpayment {
        attempted_paise: i64,
        paid_paise: i64,
        total_paise: i64,
    },

    /// The booking is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Completing a booking that is not in use
    /// - Cancelling an already completed booking
    /// - Re-running completion on a completed booking
    /// - Recording a payment against a terminal booking
    #[error("Booking {booking_id} is {current}, cannot {attempted}")]
    InvalidStateTransition {
        booking_id: String,
        current: BookingStatus,
        attempted: String,
    },

    /// An extension request failed one of its preconditions.
    ///
    /// The reason is a full sentence identifying the failed precondition,
    /// e.g. "Next payment date is required when a balance remains".
    #[error("{reason}")]
    ExtensionValidation { reason: String },

    /// Required data is missing or malformed for the requested operation.
    #[error("{reason}")]
    InvalidInput { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an `InvalidAmount` error from a message.
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Builds an `ExtensionValidation` error from a message.
    pub fn extension_invalid(reason: impl Into<String>) -> Self {
        CoreError::ExtensionValidation {
            reason: reason.into(),
        }
    }

    /// Builds an `InvalidStateTransition` error for a disallowed operation.
    pub fn state_guard(
        booking_id: impl Into<String>,
        current: BookingStatus,
        attempted: impl Into<String>,
    ) -> Self {
        CoreError::InvalidStateTransition {
            booking_id: booking_id.into(),
            current,
            attempted: attempted.into(),
        }
    }

    /// Builds an `InvalidInput` error from a message.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
