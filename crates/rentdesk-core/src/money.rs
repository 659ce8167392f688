//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many rental ledgers:                                                │
//! │    ₹100.00 / 3 = ₹33.33 (×3 = ₹99.99)  → Lost ₹0.01!                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    10000 paise / 3 = 3333 paise (×3 = 9999 paise)                      │
//! │    We KNOW we lost 1 paisa, and handle it explicitly                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rentdesk_core::money::Money;
//!
//! // Create from paise (preferred)
//! let daily_rate = Money::from_paise(150_000); // ₹1,500.00
//!
//! // Arithmetic operations
//! let three_days = daily_rate * 3;                       // ₹4,500.00
//! let with_deposit = three_days + Money::from_paise(200_000); // ₹6,500.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(1500.00); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Booking.booking_amount ──┬──► + deposit + damage + late + extension    │
/// │                           │                                             │
/// │                           └──► Booking.total_amount (recomputed)        │
/// │                                                                         │
/// │  Payment.amount ──► SUM(ledger) ──► Booking.paid_amount ──► status     │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let deposit = Money::from_paise(200_000); // Represents ₹2,000.00
    /// assert_eq!(deposit.paise(), 200_000);
    /// ```
    ///
    /// ## Why Paise?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The database, calculations, and API all use paise.
    /// Only the UI converts to rupees for display.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let rate = Money::from_rupees(1500); // ₹1,500.00
    /// assert_eq!(rate.paise(), 150_000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise (smallest currency unit).
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let amount = Money::from_paise(1099);
    /// assert_eq!(amount.rupees(), 10);
    ///
    /// let negative = Money::from_paise(-550);
    /// assert_eq!(negative.rupees(), -5);
    /// ```
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (paise) portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let amount = Money::from_paise(1099);
    /// assert_eq!(amount.paise_part(), 99);
    ///
    /// let negative = Money::from_paise(-550);
    /// assert_eq!(negative.paise_part(), 50); // Absolute value
    /// ```
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let zero = Money::zero();
    /// assert_eq!(zero.paise(), 0);
    /// assert!(zero.is_zero());
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Subtracts, flooring the result at zero.
    ///
    /// ## Where This Is Used
    /// Settlement math that must never go negative:
    /// - pending amount  = total − paid (overpaid ledgers clamp to ₹0)
    /// - deposit refund  = deposit − fees charged at return
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let deposit = Money::from_paise(200_000);
    /// let fees = Money::from_paise(250_000);
    /// assert_eq!(deposit.saturating_sub(fees), Money::zero());
    /// ```
    #[inline]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Multiplies money by a unit count (days late, extension days, etc.).
    ///
    /// ## Example
    /// ```rust
    /// use rentdesk_core::money::Money;
    ///
    /// let per_day = Money::from_paise(50_000); // ₹500.00/day
    /// let late_fee = per_day.multiply_units(3);
    /// assert_eq!(late_fee.paise(), 150_000);   // ₹1,500.00
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Return is 3 days late
    ///      │
    ///      ▼
    /// multiply_units(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Late fee: ₹1,500.00
    /// ```
    #[inline]
    pub const fn multiply_units(&self, units: i64) -> Self {
        Money(self.0 * units)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log output. Use frontend formatting for actual
/// UI display to handle lakh/crore grouping properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for day/hour counts).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, units: i32) -> Self {
        Money(self.0 * units as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, units: i64) -> Self {
        Money(self.0 * units)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
