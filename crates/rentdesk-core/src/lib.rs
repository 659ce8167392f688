//! # rentdesk-core: Pure Business Logic for RentDesk
//!
//! This crate is the **heart** of RentDesk. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RentDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desk Frontend (out of scope)                 │   │
//! │  │    Booking Form ──► Payments ──► Extension ──► Return Desk     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              rentdesk-engine (Orchestration)                    │   │
//! │  │    create_booking, record_payment, extend_booking, complete    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rentdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   fees    │  │ lifecycle │  │   │
//! │  │   │  Booking  │  │   Money   │  │ FeePolicy │  │  planners │  │   │
//! │  │   │  Payment  │  │  (paise)  │  │ LateCalc  │  │  guards   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  rentdesk-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, Payment, Extension, DamageRecord)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`fees`] - Late-return and extension fee assessment
//! - [`lifecycle`] - Pure planners for extension, completion, cancellation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O, No Clock**: Callers pass "today" in; this crate never reads time
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rentdesk_core::money::Money;
//! use rentdesk_core::types::PaymentStatus;
//!
//! // Create money from paise (never from floats!)
//! let total = Money::from_paise(500_000); // ₹5,000.00
//! let paid = Money::from_paise(200_000);  // ₹2,000.00
//!
//! // Payment status is always derived, never assigned
//! let status = PaymentStatus::derive(paid, total);
//! assert_eq!(status, PaymentStatus::Partial);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fees;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use rentdesk_core::Money` instead of
// `use rentdesk_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use fees::{FeeBreakdown, FeePolicy};
pub use lifecycle::{
    plan_cancellation, plan_completion, plan_extension, plan_payment, plan_transition,
    CompletionPlan, CompletionRequest, CompletionSummary, DamageDraft, ExtensionPlan,
    ExtensionRequest, PaymentPlan,
};
pub use money::Money;
pub use types::*;
pub use validation::{validate_actor, validate_new_booking, ValidationResult};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum rental duration in days, measured from start date to end date.
///
/// ## Business Reason
/// Rentals longer than a month are handled as fresh bookings so pricing and
/// vehicle allocation stay reviewable. Also bounds the extension window.
pub const MAX_RENTAL_DAYS: i64 = 30;

/// Maximum days a booking can be extended past the window anchor.
///
/// The anchor is the later of "today" and the current end date, so an
/// overdue booking can still be extended, but only up to 30 days out.
pub const EXTENSION_WINDOW_DAYS: i64 = 30;

/// Prefix for human-facing booking codes (`BK-20260821-0001`).
pub const BOOKING_CODE_PREFIX: &str = "BK";

/// IST (Indian Standard Time) offset from UTC in seconds (+05:30).
///
/// ## Why a constant?
/// The desk operates on IST wall-clock dates. Every "today" comparison in
/// the system (extension windows, next payment dates) uses this offset so
/// that a server running in UTC agrees with the desk calendar.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
