//! # Validation Module
//!
//! Input validation for booking creation and shared field rules.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Desk Frontend (out of scope)                                 │
//! │  ├── Basic format checks (empty fields, date pickers)                  │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine Operation (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (booking_code)                                 │
//! │  └── Foreign key constraints (ledger → booking)                        │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State- and money-dependent rules (overpayment, extension windows,
//! completion guards) live in [`crate::lifecycle`]; this module covers the
//! stateless field rules that apply before a booking exists.
//!
//! ## Usage
//! ```rust,no_run
//! use rentdesk_core::validation::{validate_actor, validate_booking_dates};
//! use chrono::NaiveDate;
//!
//! validate_actor("operator-1").unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
//! let end = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
//! validate_booking_dates(start, end).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{BookingStatus, NewBooking, RentalPurpose};
use crate::MAX_RENTAL_DAYS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an actor identifier (the operator behind a mutation).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
///
/// Every audit column (`created_by`, `updated_by`) passes through here, so
/// a blank actor can never reach the database.
pub fn validate_actor(actor: &str) -> ValidationResult<()> {
    let actor = actor.trim();

    if actor.is_empty() {
        return Err(ValidationError::Required {
            field: "actor".to_string(),
        });
    }

    if actor.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "actor".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a customer or vehicle reference id.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
///
/// These ids are owned by the customer/fleet modules; we only check they
/// are present and plausible, not that they resolve.
pub fn validate_reference_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a damage description recorded at vehicle return.
///
/// ## Rules
/// - Must not be empty (a charge without a description is unauditable)
/// - Must be at most 500 characters
pub fn validate_damage_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "damage description".to_string(),
        });
    }

    if description.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "damage description".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount in paise that may be zero.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (no deposit, no advance)
///
/// ## Example
/// ```rust
/// use rentdesk_core::validation::validate_amount_paise;
///
/// assert!(validate_amount_paise("security deposit", 200_000).is_ok());
/// assert!(validate_amount_paise("security deposit", 0).is_ok());
/// assert!(validate_amount_paise("security deposit", -1).is_err());
/// ```
pub fn validate_amount_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an odometer reading in kilometres.
///
/// ## Rules
/// - Must be non-negative (a fresh vehicle legitimately reads 0)
pub fn validate_odometer(field: &str, km: i64) -> ValidationResult<()> {
    if km < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates the rental period at creation.
///
/// ## Rules
/// - `end_date` must be after `start_date` (at least one rental day)
/// - Duration must not exceed [`MAX_RENTAL_DAYS`]
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Booking Form: Pick Dates                                               │
/// │                                                                         │
/// │  Operator picks start 2026-03-10, end 2026-03-13                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_booking_dates(start, end) ← THIS FUNCTION                    │
/// │       │                                                                 │
/// │       ├── end <= start?  → Error: duration below 1 day                 │
/// │       │                                                                 │
/// │       ├── > 30 days?     → Error: duration above 30 days               │
/// │       │                                                                 │
/// │       └── OK → Proceed with create_booking                             │
/// │                                                                         │
/// │  Longer rentals are written up as fresh bookings; extensions           │
/// │  re-anchor their own 30-day window mid-rental.                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_booking_dates(start_date: NaiveDate, end_date: NaiveDate) -> ValidationResult<()> {
    let duration_days = (end_date - start_date).num_days();

    if duration_days < 1 || duration_days > MAX_RENTAL_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "rental duration".to_string(),
            min: 1,
            max: MAX_RENTAL_DAYS,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a complete [`NewBooking`] before any row is written.
///
/// ## Checks (in order)
/// 1. Customer and vehicle references present
/// 2. Rental period valid (1..=30 days)
/// 3. Booking amount, deposit, and advance non-negative
/// 4. Advance payment mode present when an advance is collected
/// 5. Initial status is a creation state (pending / confirmed / in_use)
/// 6. Outstation bookings carry destination and estimated distance
///
/// Overpayment of the advance is NOT checked here - the ledger path guards
/// it against the live totals when the advance is recorded.
pub fn validate_new_booking(new_booking: &NewBooking) -> ValidationResult<()> {
    validate_reference_id("customer_id", &new_booking.customer_id)?;
    validate_reference_id("vehicle_id", &new_booking.vehicle_id)?;

    validate_booking_dates(new_booking.start_date, new_booking.end_date)?;

    validate_amount_paise("booking amount", new_booking.booking_amount_paise)?;
    validate_amount_paise("security deposit", new_booking.security_deposit_paise)?;
    validate_amount_paise("advance amount", new_booking.advance_amount_paise)?;

    if new_booking.advance_amount_paise > 0 && new_booking.advance_payment_mode.is_none() {
        return Err(ValidationError::Required {
            field: "advance payment mode".to_string(),
        });
    }

    // Bookings are born pending, confirmed, or in_use (walk-ins ride out
    // immediately). Terminal states are never a starting point.
    if new_booking.initial_status.is_terminal() {
        return Err(ValidationError::NotAllowed {
            field: "initial status".to_string(),
            allowed: vec![
                BookingStatus::Pending.as_str().to_string(),
                BookingStatus::Confirmed.as_str().to_string(),
                BookingStatus::InUse.as_str().to_string(),
            ],
        });
    }

    if new_booking.rental_purpose == RentalPurpose::Outstation {
        match new_booking.destination.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ValidationError::Required {
                    field: "destination".to_string(),
                });
            }
            Some(destination) if destination.len() > 200 => {
                return Err(ValidationError::TooLong {
                    field: "destination".to_string(),
                    max: 200,
                });
            }
            Some(_) => {}
        }

        match new_booking.estimated_distance_km {
            None => {
                return Err(ValidationError::Required {
                    field: "estimated distance".to_string(),
                });
            }
            Some(km) if km <= 0 => {
                return Err(ValidationError::MustBePositive {
                    field: "estimated distance".to_string(),
                });
            }
            Some(_) => {}
        }
    }

    if let Some(odometer) = new_booking.start_odometer {
        validate_odometer("start odometer", odometer)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMode;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn local_booking() -> NewBooking {
        NewBooking {
            customer_id: "cust-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            start_date: date(2026, 3, 10),
            end_date: date(2026, 3, 13),
            pickup_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            dropoff_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            booking_amount_paise: 1_000_000,
            security_deposit_paise: 200_000,
            advance_amount_paise: 0,
            advance_payment_mode: None,
            rental_purpose: RentalPurpose::Local,
            destination: None,
            estimated_distance_km: None,
            start_odometer: None,
            initial_status: BookingStatus::Confirmed,
        }
    }

    #[test]
    fn test_validate_actor() {
        assert!(validate_actor("operator-1").is_ok());

        assert!(validate_actor("").is_err());
        assert!(validate_actor("   ").is_err());
        assert!(validate_actor(&"a".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_reference_id() {
        assert!(validate_reference_id("customer_id", "cust-1").is_ok());
        assert!(validate_reference_id("customer_id", "").is_err());
        assert!(validate_reference_id("customer_id", &"x".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_booking_dates() {
        // 3 days: fine
        assert!(validate_booking_dates(date(2026, 3, 10), date(2026, 3, 13)).is_ok());
        // Exactly 30 days: the boundary is inclusive
        assert!(validate_booking_dates(date(2026, 3, 1), date(2026, 3, 31)).is_ok());

        // Same day: no rental days
        assert!(validate_booking_dates(date(2026, 3, 10), date(2026, 3, 10)).is_err());
        // Backwards
        assert!(validate_booking_dates(date(2026, 3, 13), date(2026, 3, 10)).is_err());
        // 31 days: one past the cap
        assert!(validate_booking_dates(date(2026, 3, 1), date(2026, 4, 1)).is_err());
    }

    #[test]
    fn test_validate_amount_paise() {
        assert!(validate_amount_paise("booking amount", 0).is_ok());
        assert!(validate_amount_paise("booking amount", 1_000_000).is_ok());
        assert!(validate_amount_paise("booking amount", -1).is_err());
    }

    #[test]
    fn test_validate_damage_description() {
        assert!(validate_damage_description("Scratch on left door").is_ok());
        assert!(validate_damage_description("").is_err());
        assert!(validate_damage_description(&"x".repeat(600)).is_err());
    }

    #[test]
    fn test_new_booking_happy_path() {
        assert!(validate_new_booking(&local_booking()).is_ok());
    }

    #[test]
    fn test_new_booking_missing_references() {
        let mut booking = local_booking();
        booking.customer_id = "  ".to_string();
        assert!(validate_new_booking(&booking).is_err());

        let mut booking = local_booking();
        booking.vehicle_id = String::new();
        assert!(validate_new_booking(&booking).is_err());
    }

    #[test]
    fn test_new_booking_negative_amounts() {
        let mut booking = local_booking();
        booking.security_deposit_paise = -100;
        assert!(validate_new_booking(&booking).is_err());
    }

    #[test]
    fn test_new_booking_advance_requires_mode() {
        let mut booking = local_booking();
        booking.advance_amount_paise = 500_000;
        booking.advance_payment_mode = None;
        assert!(matches!(
            validate_new_booking(&booking),
            Err(ValidationError::Required { field }) if field == "advance payment mode"
        ));

        booking.advance_payment_mode = Some(PaymentMode::Upi);
        assert!(validate_new_booking(&booking).is_ok());
    }

    #[test]
    fn test_new_booking_rejects_terminal_initial_status() {
        let mut booking = local_booking();
        booking.initial_status = BookingStatus::Completed;
        assert!(validate_new_booking(&booking).is_err());

        booking.initial_status = BookingStatus::Cancelled;
        assert!(validate_new_booking(&booking).is_err());

        // Walk-in straight to in_use is fine
        booking.initial_status = BookingStatus::InUse;
        assert!(validate_new_booking(&booking).is_ok());
    }

    #[test]
    fn test_new_booking_outstation_requirements() {
        let mut booking = local_booking();
        booking.rental_purpose = RentalPurpose::Outstation;

        // Missing destination
        assert!(matches!(
            validate_new_booking(&booking),
            Err(ValidationError::Required { field }) if field == "destination"
        ));

        // Destination present, missing distance
        booking.destination = Some("Lonavala".to_string());
        assert!(matches!(
            validate_new_booking(&booking),
            Err(ValidationError::Required { field }) if field == "estimated distance"
        ));

        // Zero distance is not a trip
        booking.estimated_distance_km = Some(0);
        assert!(validate_new_booking(&booking).is_err());

        booking.estimated_distance_km = Some(180);
        booking.start_odometer = Some(42_150);
        assert!(validate_new_booking(&booking).is_ok());
    }

    #[test]
    fn test_new_booking_negative_odometer() {
        let mut booking = local_booking();
        booking.start_odometer = Some(-5);
        assert!(validate_new_booking(&booking).is_err());
    }
}
