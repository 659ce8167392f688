//! # Lifecycle Planners
//!
//! Pure planning logic for the booking lifecycle: payments, extensions,
//! completion, cancellation. Each planner validates a request against a
//! booking snapshot and returns a *plan* describing every field the storage
//! layer must write. Planners never touch I/O, never read the clock, and
//! never mutate the booking they are given.
//!
//! ## Why Plans?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Plan → Apply Separation                             │
//! │                                                                         │
//! │  rentdesk-core (pure)              rentdesk-db (transactional)          │
//! │  ────────────────────              ───────────────────────────          │
//! │                                                                         │
//! │  plan_extension(booking, req)      BEGIN;                               │
//! │    ├── check preconditions           INSERT extension row               │
//! │    ├── compute new amounts           INSERT payment row (if any)        │
//! │    └── ExtensionPlan ───────────►    UPDATE booking (version-guarded)   │
//! │                                    COMMIT;                              │
//! │                                                                         │
//! │  All-or-nothing: a failed precondition means NOTHING was written,      │
//! │  and a failed write rolls the whole unit of work back.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Booking, BookingStatus, PaymentMode, PaymentStatus, RentalPurpose};
use crate::EXTENSION_WINDOW_DAYS;

// =============================================================================
// Payment Planning
// =============================================================================

/// Booking-side effects of recording one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPlan {
    pub new_paid_amount_paise: i64,
    pub new_payment_status: PaymentStatus,
}

/// Validates a payment against the booking and computes the ledger effect.
///
/// ## Preconditions
/// - booking is not terminal
/// - amount > 0, else `InvalidAmount`
/// - paid + amount ≤ total, else `Overpayment`
pub fn plan_payment(booking: &Booking, amount_paise: i64) -> CoreResult<PaymentPlan> {
    if booking.is_terminal() {
        return Err(CoreError::state_guard(
            &booking.booking_code,
            booking.status,
            "accept a payment",
        ));
    }

    if amount_paise <= 0 {
        return Err(CoreError::invalid_amount(
            "Payment amount must be greater than zero",
        ));
    }

    let new_paid = booking.paid_amount() + Money::from_paise(amount_paise);
    if new_paid > booking.total_amount() {
        return Err(CoreError::Overpayment {
            attempted_paise: amount_paise,
            paid_paise: booking.paid_amount_paise,
            total_paise: booking.total_amount_paise,
        });
    }

    Ok(PaymentPlan {
        new_paid_amount_paise: new_paid.paise(),
        new_payment_status: PaymentStatus::derive(new_paid, booking.total_amount()),
    })
}

// =============================================================================
// Extension Planning
// =============================================================================

/// Request to extend a running booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtensionRequest {
    #[ts(as = "String")]
    pub new_end_date: NaiveDate,
    /// New agreed return time. `None` keeps the current dropoff time.
    #[ts(as = "Option<String>")]
    pub new_dropoff_time: Option<NaiveTime>,
    /// Extra rental charge for the added days, in paise.
    pub additional_amount_paise: i64,
    /// Payment collected right now, in paise (0 = extension on credit).
    pub payment_amount_paise: i64,
    /// Required when `payment_amount_paise` > 0.
    pub payment_mode: Option<PaymentMode>,
    /// Required when the extension leaves a balance outstanding.
    #[ts(as = "Option<String>")]
    pub next_payment_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

/// Everything the storage layer writes to apply one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPlan {
    pub previous_end_date: NaiveDate,
    pub previous_dropoff_time: NaiveTime,
    pub new_end_date: NaiveDate,
    pub new_dropoff_time: NaiveTime,
    pub additional_amount_paise: i64,
    pub payment_amount_paise: i64,
    pub payment_mode: Option<PaymentMode>,
    pub next_payment_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub new_booking_amount_paise: i64,
    pub new_paid_amount_paise: i64,
    pub new_total_amount_paise: i64,
    pub new_payment_status: PaymentStatus,
}

/// Validates an extension request and computes the resulting booking state.
///
/// ## Window Rule
/// ```text
/// anchor = max(today, current end date)
///
///   not before current end ─┐         ┌─ not past anchor + 30 days
///                             ▼        ▼
///      ──────[current end]──[anchor]━━━━━━━━━━[anchor + 30d]──────►
///                              allowed range
///
/// For an overdue booking (today > end date) the anchor is today, so the
/// desk can only extend forward from today, never legitimize the past.
/// ```
///
/// ## Payment Rule
/// If the payment collected now does not cover the outstanding balance plus
/// the additional charge, a future `next_payment_date` is mandatory.
pub fn plan_extension(
    booking: &Booking,
    request: &ExtensionRequest,
    today: NaiveDate,
) -> CoreResult<ExtensionPlan> {
    if booking.is_terminal() {
        return Err(CoreError::state_guard(
            &booking.booking_code,
            booking.status,
            "be extended",
        ));
    }

    if request.additional_amount_paise < 0 {
        return Err(CoreError::extension_invalid(
            "Additional amount cannot be negative",
        ));
    }

    if request.payment_amount_paise < 0 {
        return Err(CoreError::extension_invalid(
            "Payment amount cannot be negative",
        ));
    }

    if request.payment_amount_paise > 0 && request.payment_mode.is_none() {
        return Err(CoreError::extension_invalid(
            "Payment mode is required when a payment is collected",
        ));
    }

    if request.new_end_date < booking.end_date {
        return Err(CoreError::extension_invalid(
            "New end date cannot be before the current end date",
        ));
    }

    let anchor = booking.end_date.max(today);
    if request.new_end_date < anchor {
        return Err(CoreError::extension_invalid(format!(
            "New end date must be on or after {}",
            anchor
        )));
    }
    if request.new_end_date > anchor + Duration::days(EXTENSION_WINDOW_DAYS) {
        return Err(CoreError::extension_invalid(format!(
            "New end date must be within {} days of {}",
            EXTENSION_WINDOW_DAYS, anchor
        )));
    }

    let additional = Money::from_paise(request.additional_amount_paise);
    let payment = Money::from_paise(request.payment_amount_paise);

    let new_total = booking.total_amount() + additional;
    let new_paid = booking.paid_amount() + payment;
    if new_paid > new_total {
        return Err(CoreError::Overpayment {
            attempted_paise: request.payment_amount_paise,
            paid_paise: booking.paid_amount_paise,
            total_paise: new_total.paise(),
        });
    }

    // Balance remaining after this extension must have a follow-up date.
    let balance_remains = new_paid < new_total;
    if balance_remains {
        match request.next_payment_date {
            None => {
                return Err(CoreError::extension_invalid(
                    "Next payment date is required when a balance remains",
                ));
            }
            Some(date) if date < today => {
                return Err(CoreError::extension_invalid(
                    "Next payment date cannot be in the past",
                ));
            }
            Some(_) => {}
        }
    }

    Ok(ExtensionPlan {
        previous_end_date: booking.end_date,
        previous_dropoff_time: booking.dropoff_time,
        new_end_date: request.new_end_date,
        new_dropoff_time: request.new_dropoff_time.unwrap_or(booking.dropoff_time),
        additional_amount_paise: request.additional_amount_paise,
        payment_amount_paise: request.payment_amount_paise,
        payment_mode: request.payment_mode,
        next_payment_date: if balance_remains {
            request.next_payment_date
        } else {
            None
        },
        reason: request.reason.clone(),
        new_booking_amount_paise: booking.booking_amount_paise + request.additional_amount_paise,
        new_paid_amount_paise: new_paid.paise(),
        new_total_amount_paise: new_total.paise(),
        new_payment_status: PaymentStatus::derive(new_paid, new_total),
    })
}

// =============================================================================
// Completion Planning
// =============================================================================

/// Request to complete a booking at vehicle return.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletionRequest {
    /// Damage charges to bill, in paise (0 = no damage).
    pub damage_charges_paise: i64,
    pub damage_description: Option<String>,
    /// Late fee, in paise. Typically prefilled from fee assessment.
    pub late_fee_paise: i64,
    /// Extension fee, in paise. Typically prefilled from fee assessment.
    pub extension_fee_paise: i64,
    /// Mode for the settlement payment. Required when a balance remains.
    pub final_payment_mode: Option<PaymentMode>,
    /// Odometer at return. Applied only to outstation bookings.
    pub odometer_reading: Option<i64>,
    /// Fuel level at return. Applied only to outstation bookings.
    pub fuel_level: Option<String>,
}

/// Damage row to be written alongside the completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageDraft {
    pub description: String,
    pub charges_paise: i64,
}

/// Everything the storage layer writes to complete one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPlan {
    pub damage_record: Option<DamageDraft>,
    /// Settlement collected at the desk, in paise (0 = nothing due).
    pub settlement_paise: i64,
    pub settlement_mode: Option<PaymentMode>,
    pub damage_charges_paise: i64,
    pub late_fee_paise: i64,
    pub extension_fee_paise: i64,
    pub new_paid_amount_paise: i64,
    pub new_total_amount_paise: i64,
    pub new_payment_status: PaymentStatus,
    pub end_odometer: Option<i64>,
    pub fuel_level: Option<String>,
    pub summary: CompletionSummary,
}

/// Figures the desk shows (and messages) once a booking is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletionSummary {
    /// What the rental actually cost: booking + damage + late + extension.
    /// The security deposit is NOT a charge, so it is excluded here.
    pub rental_charges_paise: i64,
    /// Collected at return to settle the pre-completion balance.
    pub settlement_paise: i64,
    /// Deposit minus fees assessed at return, floored at zero.
    pub deposit_refund_paise: i64,
    /// Balance still outstanding after completion (fees billed on credit).
    pub pending_after_paise: i64,
    pub payment_status: PaymentStatus,
}

/// Validates a completion request and computes the settlement.
///
/// ## Settlement Rule
/// The remaining balance is figured from PRE-completion amounts:
/// `(booking_amount + security_deposit) − paid`. Fees assessed at return
/// (damage, late, extension) join the total but are not forced into the
/// settlement payment - they may remain outstanding.
///
/// ## Preconditions
/// - booking is `in_use`, else `InvalidStateTransition` (this is also what
///   rejects completing an already-completed booking)
/// - all charge amounts ≥ 0
/// - a payment mode accompanies a positive settlement
pub fn plan_completion(booking: &Booking, request: &CompletionRequest) -> CoreResult<CompletionPlan> {
    if booking.status != BookingStatus::InUse {
        return Err(CoreError::state_guard(
            &booking.booking_code,
            booking.status,
            "be completed",
        ));
    }

    if request.damage_charges_paise < 0 {
        return Err(CoreError::invalid_amount("Damage charges cannot be negative"));
    }
    if request.late_fee_paise < 0 {
        return Err(CoreError::invalid_amount("Late fee cannot be negative"));
    }
    if request.extension_fee_paise < 0 {
        return Err(CoreError::invalid_amount("Extension fee cannot be negative"));
    }

    let damage_description = request
        .damage_description
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    let damage_record = if request.damage_charges_paise > 0 || !damage_description.is_empty() {
        Some(DamageDraft {
            description: damage_description.to_string(),
            charges_paise: request.damage_charges_paise,
        })
    } else {
        None
    };

    // Settlement covers the balance that existed before return fees.
    let due_before_fees = booking.booking_amount() + booking.security_deposit();
    let settlement = due_before_fees.saturating_sub(booking.paid_amount());
    if settlement.is_positive() && request.final_payment_mode.is_none() {
        return Err(CoreError::invalid_input(
            "Final payment mode is required when a balance remains",
        ));
    }

    // Odometer and fuel readings only make sense for outstation rentals.
    let (end_odometer, fuel_level) = match booking.rental_purpose {
        RentalPurpose::Outstation => {
            if let (Some(start), Some(end)) = (booking.start_odometer, request.odometer_reading) {
                if end < start {
                    return Err(CoreError::invalid_input(
                        "Odometer reading cannot be less than the start odometer",
                    ));
                }
            }
            (request.odometer_reading, request.fuel_level.clone())
        }
        RentalPurpose::Local => (None, None),
    };

    let fees_at_return = Money::from_paise(request.damage_charges_paise)
        + Money::from_paise(request.late_fee_paise)
        + Money::from_paise(request.extension_fee_paise);

    let new_paid = booking.paid_amount() + settlement;
    let new_total = due_before_fees + fees_at_return;
    let new_payment_status = PaymentStatus::derive(new_paid, new_total);

    let rental_charges = booking.booking_amount() + fees_at_return;
    let deposit_refund = booking.security_deposit().saturating_sub(fees_at_return);

    Ok(CompletionPlan {
        damage_record,
        settlement_paise: settlement.paise(),
        settlement_mode: if settlement.is_positive() {
            request.final_payment_mode
        } else {
            None
        },
        damage_charges_paise: request.damage_charges_paise,
        late_fee_paise: request.late_fee_paise,
        extension_fee_paise: request.extension_fee_paise,
        new_paid_amount_paise: new_paid.paise(),
        new_total_amount_paise: new_total.paise(),
        new_payment_status,
        end_odometer,
        fuel_level,
        summary: CompletionSummary {
            rental_charges_paise: rental_charges.paise(),
            settlement_paise: settlement.paise(),
            deposit_refund_paise: deposit_refund.paise(),
            pending_after_paise: new_total.saturating_sub(new_paid).paise(),
            payment_status: new_payment_status,
        },
    })
}

// =============================================================================
// Cancellation & Status Progression
// =============================================================================

/// Checks that a booking may be cancelled. No amounts change on cancel.
pub fn plan_cancellation(booking: &Booking) -> CoreResult<()> {
    if booking.is_terminal() {
        return Err(CoreError::state_guard(
            &booking.booking_code,
            booking.status,
            "be cancelled",
        ));
    }
    Ok(())
}

/// Checks a forward status move (confirm, hand over) against the
/// transition table.
pub fn plan_transition(booking: &Booking, next: BookingStatus) -> CoreResult<()> {
    if !booking.status.can_transition_to(next) {
        return Err(CoreError::state_guard(
            &booking.booking_code,
            booking.status,
            format!("move to {}", next),
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
