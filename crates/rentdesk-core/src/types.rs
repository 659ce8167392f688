//! # Domain Types
//!
//! Core domain types used throughout RentDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Booking      │   │    Payment      │   │   Extension     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  booking_code   │   │  booking_id(FK) │   │  booking_id(FK) │       │
//! │  │  status         │   │  mode           │   │  new_end_date   │       │
//! │  │  total_amount   │   │  amount_paise   │   │  amounts        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  BookingStatus  │   │ PaymentStatus   │   │  PaymentMode    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  Pending        │   │  Cash           │       │
//! │  │  Confirmed      │   │  Partial        │   │  Upi            │       │
//! │  │  InUse          │   │  Full           │   │  Card           │       │
//! │  │  Completed      │   │  (derived!)     │   │  BankTransfer   │       │
//! │  │  Cancelled      │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every booking has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `booking_code`: human-readable (`BK-20260821-0001`), shown to customers

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::IST_OFFSET_SECS;

// =============================================================================
// Booking Status
// =============================================================================

/// Lifecycle state of a booking.
///
/// ## State Machine
/// ```text
/// pending ──► confirmed ──► in_use ──► completed
///    │            │           │
///    └────────────┴───────────┴──────► cancelled
///
/// completed and cancelled are TERMINAL: no further transitions.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Reserved, vehicle not yet confirmed against the booking.
    Pending,
    /// Confirmed, awaiting handover.
    Confirmed,
    /// Vehicle handed over, rental running.
    InUse,
    /// Vehicle returned, accounts settled. Terminal.
    Completed,
    /// Called off before completion. Terminal.
    Cancelled,
}

impl BookingStatus {
    /// Returns the snake_case form stored in the database and shown in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InUse => "in_use",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states reject every further mutation.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Encodes the transition table of the state machine.
    ///
    /// Forward progress is strictly linear; cancellation is allowed from
    /// any non-terminal state. Terminal states allow nothing.
    pub const fn can_transition_to(&self, next: BookingStatus) -> bool {
        match (self, next) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Confirmed, BookingStatus::InUse) => true,
            (BookingStatus::InUse, BookingStatus::Completed) => true,
            (
                BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InUse,
                BookingStatus::Cancelled,
            ) => true,
            _ => false,
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// How much of the booking total has been collected.
///
/// This value is ALWAYS derived from (paid, total) via [`PaymentStatus::derive`].
/// Nothing else in the codebase may assign it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No payments received.
    Pending,
    /// Some paid, balance outstanding.
    Partial,
    /// Paid in full.
    Full,
}

impl PaymentStatus {
    /// Derives the payment status from amounts. The single source of truth.
    ///
    /// ## Rules (checked in order)
    /// 1. paid == 0          → Pending
    /// 2. paid >= total      → Full
    /// 3. otherwise          → Partial
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    /// use rentdesk_core::types::PaymentStatus;
    ///
    /// let total = Money::from_paise(1_000_000);
    /// assert_eq!(PaymentStatus::derive(Money::zero(), total), PaymentStatus::Pending);
    /// assert_eq!(PaymentStatus::derive(Money::from_paise(400_000), total), PaymentStatus::Partial);
    /// assert_eq!(PaymentStatus::derive(total, total), PaymentStatus::Full);
    /// ```
    pub fn derive(paid: Money, total: Money) -> Self {
        if paid.is_zero() {
            PaymentStatus::Pending
        } else if paid >= total {
            PaymentStatus::Full
        } else {
            PaymentStatus::Partial
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Physical cash at the desk.
    Cash,
    /// UPI transfer (GPay, PhonePe, etc.).
    Upi,
    /// Card on the desk terminal.
    Card,
    /// Direct bank transfer (NEFT/IMPS).
    BankTransfer,
}

// =============================================================================
// Rental Purpose
// =============================================================================

/// Whether the vehicle stays in town or travels outstation.
///
/// Outstation rentals carry destination/distance details and have their
/// odometer and fuel level recorded at return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RentalPurpose {
    Local,
    Outstation,
}

// =============================================================================
// Booking
// =============================================================================

/// A vehicle rental booking.
///
/// Monetary fields are raw paise (`i64`); use the accessor methods for
/// [`Money`] values. `total_amount_paise` and `payment_status` are cached
/// projections - call [`Booking::recompute_derived`] after changing any
/// amount, never write them directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-facing sequential code (`BK-20260821-0001`).
    pub booking_code: String,

    /// Customer reference (owned by the customer module, not here).
    pub customer_id: String,

    /// Vehicle reference (owned by the fleet module, not here).
    pub vehicle_id: String,

    /// First rental day.
    #[ts(as = "String")]
    pub start_date: NaiveDate,

    /// Agreed return day. Always after `start_date`.
    #[ts(as = "String")]
    pub end_date: NaiveDate,

    /// Handover time on `start_date`.
    #[ts(as = "String")]
    pub pickup_time: NaiveTime,

    /// Agreed return time on `end_date`.
    #[ts(as = "String")]
    pub dropoff_time: NaiveTime,

    /// Base rental charge in paise.
    pub booking_amount_paise: i64,

    /// Refundable security deposit in paise.
    pub security_deposit_paise: i64,

    /// Damage charges assessed at return, in paise.
    pub damage_charges_paise: i64,

    /// Late-return fee assessed at return, in paise.
    pub late_fee_paise: i64,

    /// Extension fee accrued (mid-rental or at return), in paise.
    pub extension_fee_paise: i64,

    /// Total payable: booking + deposit + damage + late + extension.
    /// Cached projection - recomputed, never hand-edited.
    pub total_amount_paise: i64,

    /// Sum of the payment ledger for this booking, in paise.
    pub paid_amount_paise: i64,

    /// Derived from (paid, total). Cached projection.
    pub payment_status: PaymentStatus,

    /// Lifecycle state.
    pub status: BookingStatus,

    /// Local or outstation rental.
    pub rental_purpose: RentalPurpose,

    /// Outstation destination. Required when purpose is outstation.
    pub destination: Option<String>,

    /// Estimated round-trip distance in km (outstation only).
    pub estimated_distance_km: Option<i64>,

    /// Odometer at handover (outstation only).
    pub start_odometer: Option<i64>,

    /// Odometer at return (outstation only, recorded at completion).
    pub end_odometer: Option<i64>,

    /// Fuel level at return ("full", "3/4", ...; outstation only).
    pub fuel_level: Option<String>,

    /// When a remaining balance is due. Set by extensions taken on credit.
    #[ts(as = "Option<String>")]
    pub next_payment_date: Option<NaiveDate>,

    /// Operator who created the booking.
    pub created_by: String,

    /// Operator who last changed the booking.
    pub updated_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency version, incremented on every update.
    pub row_version: i64,
}

impl Booking {
    /// Returns the base rental charge as Money.
    #[inline]
    pub fn booking_amount(&self) -> Money {
        Money::from_paise(self.booking_amount_paise)
    }

    /// Returns the security deposit as Money.
    #[inline]
    pub fn security_deposit(&self) -> Money {
        Money::from_paise(self.security_deposit_paise)
    }

    /// Returns the damage charges as Money.
    #[inline]
    pub fn damage_charges(&self) -> Money {
        Money::from_paise(self.damage_charges_paise)
    }

    /// Returns the late fee as Money.
    #[inline]
    pub fn late_fee(&self) -> Money {
        Money::from_paise(self.late_fee_paise)
    }

    /// Returns the extension fee as Money.
    #[inline]
    pub fn extension_fee(&self) -> Money {
        Money::from_paise(self.extension_fee_paise)
    }

    /// Returns the total payable as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_paise(self.total_amount_paise)
    }

    /// Returns the amount paid to date as Money.
    #[inline]
    pub fn paid_amount(&self) -> Money {
        Money::from_paise(self.paid_amount_paise)
    }

    /// Outstanding balance (total − paid), floored at zero.
    #[inline]
    pub fn pending_amount(&self) -> Money {
        self.total_amount().saturating_sub(self.paid_amount())
    }

    /// Rental length in days (end − start).
    #[inline]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// The agreed return instant: end date + dropoff time.
    #[inline]
    pub fn expected_return(&self) -> NaiveDateTime {
        self.end_date.and_time(self.dropoff_time)
    }

    /// Whether the booking is in a terminal state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Assembles the outstation view, if this is an outstation booking.
    pub fn outstation_details(&self) -> Option<OutstationDetails> {
        match self.rental_purpose {
            RentalPurpose::Local => None,
            RentalPurpose::Outstation => Some(OutstationDetails {
                destination: self.destination.clone().unwrap_or_default(),
                estimated_distance_km: self.estimated_distance_km.unwrap_or(0),
                start_odometer: self.start_odometer,
                end_odometer: self.end_odometer,
            }),
        }
    }

    /// Recomputes the cached projections: total amount, then payment status.
    ///
    /// ## Invariants Maintained
    /// - total = booking + deposit + damage + late + extension
    /// - payment_status = derive(paid, total)
    ///
    /// Every mutation path (payment, extension, completion) must call this
    /// after touching any amount field.
    pub fn recompute_derived(&mut self) {
        self.total_amount_paise = self.booking_amount_paise
            + self.security_deposit_paise
            + self.damage_charges_paise
            + self.late_fee_paise
            + self.extension_fee_paise;
        self.payment_status = PaymentStatus::derive(self.paid_amount(), self.total_amount());
    }
}

// =============================================================================
// Outstation Details
// =============================================================================

/// Outstation trip details assembled from the booking's flat columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutstationDetails {
    pub destination: String,
    pub estimated_distance_km: i64,
    pub start_odometer: Option<i64>,
    pub end_odometer: Option<i64>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a booking.
///
/// Payments are an append-only ledger: once written they are never updated
/// or deleted. Corrections happen with compensating entries.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub mode: PaymentMode,
    /// Amount paid in paise. Always > 0.
    pub amount_paise: i64,
    /// Free-text note ("advance at pickup", "settlement at return", ...).
    pub note: Option<String>,
    /// Operator who took the payment.
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Extension
// =============================================================================

/// A mid-rental extension, recorded as immutable history.
///
/// Captures the before/after dates and the money that moved, so the rental
/// timeline can be reconstructed even after further extensions.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Extension {
    pub id: String,
    pub booking_id: String,
    #[ts(as = "String")]
    pub previous_end_date: NaiveDate,
    #[ts(as = "String")]
    pub previous_dropoff_time: NaiveTime,
    #[ts(as = "String")]
    pub new_end_date: NaiveDate,
    #[ts(as = "String")]
    pub new_dropoff_time: NaiveTime,
    /// Extra rental charge added by this extension, in paise.
    pub additional_amount_paise: i64,
    /// Payment collected alongside the extension, in paise (0 = on credit).
    pub payment_amount_paise: i64,
    pub payment_mode: Option<PaymentMode>,
    #[ts(as = "Option<String>")]
    pub next_payment_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Extension {
    /// Returns the additional rental charge as Money.
    #[inline]
    pub fn additional_amount(&self) -> Money {
        Money::from_paise(self.additional_amount_paise)
    }

    /// Returns the payment taken with the extension as Money.
    #[inline]
    pub fn payment_amount(&self) -> Money {
        Money::from_paise(self.payment_amount_paise)
    }
}

// =============================================================================
// Damage Record
// =============================================================================

/// Damage observed at vehicle return. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DamageRecord {
    pub id: String,
    pub booking_id: String,
    pub description: String,
    /// Charges billed for the damage, in paise (0 = noted, not billed).
    pub charges_paise: i64,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DamageRecord {
    /// Returns the damage charges as Money.
    #[inline]
    pub fn charges(&self) -> Money {
        Money::from_paise(self.charges_paise)
    }
}

// =============================================================================
// New Booking (creation input)
// =============================================================================

/// Input for creating a booking.
///
/// Validated by [`crate::validation::validate_new_booking`] before any row
/// is written. The engine fills in ids, codes, and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBooking {
    pub customer_id: String,
    pub vehicle_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[ts(as = "String")]
    pub pickup_time: NaiveTime,
    #[ts(as = "String")]
    pub dropoff_time: NaiveTime,
    pub booking_amount_paise: i64,
    pub security_deposit_paise: i64,
    /// Advance collected at the desk while creating the booking (0 = none).
    pub advance_amount_paise: i64,
    /// Mode for the advance. Required when `advance_amount_paise` > 0.
    pub advance_payment_mode: Option<PaymentMode>,
    pub rental_purpose: RentalPurpose,
    pub destination: Option<String>,
    pub estimated_distance_km: Option<i64>,
    pub start_odometer: Option<i64>,
    /// Where the booking starts its life: pending, confirmed, or in_use
    /// (walk-in customers ride out immediately).
    pub initial_status: BookingStatus,
}

// =============================================================================
// IST Calendar
// =============================================================================

/// Converts a UTC instant to the IST calendar date.
///
/// The desk runs on IST wall-clock dates; a booking extended at 01:00 IST
/// belongs to that IST day even though UTC is still on the previous one.
/// Pure function - callers supply the instant, tests supply fixed ones.
pub fn ist_date_of(instant: DateTime<Utc>) -> NaiveDate {
    (instant + Duration::seconds(IST_OFFSET_SECS as i64)).date_naive()
}

// =============================================================================
// Unit Tests
// =============================================================================
