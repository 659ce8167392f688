//! # Fee Assessment
//!
//! Pure late-return and extension fee math.
//!
//! ## Fee Brackets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Return Fees Are Billed                           │
//! │                                                                         │
//! │  Expected return: 13 Mar 18:00      Grace: 30 minutes                  │
//! │                                                                         │
//! │  Actual return        Lateness      Billed as                          │
//! │  ──────────────       ─────────     ───────────────────────────────    │
//! │  13 Mar 17:00         early         nothing                            │
//! │  13 Mar 18:25         25 min        nothing (inside grace)             │
//! │  13 Mar 19:10         70 min        2 hours × hourly late fee          │
//! │  14 Mar 10:00         16 hours      16 hours × hourly late fee         │
//! │  14 Mar 20:00         26 hours      2 days × daily late fee            │
//! │                                     + 2 days × daily extension fee     │
//! │                                                                         │
//! │  Once past the grace window, fees count from the EXPECTED return,     │
//! │  not from the end of grace. Hours and days always round UP.           │
//! │                                                                         │
//! │  Lateness of a full day or more is treated as an unplanned            │
//! │  extension: the daily late fee AND the daily extension fee both       │
//! │  accrue per (rounded-up) day.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module never touches booking state. [`assess`] produces a
//! [`FeeBreakdown`] that the completion flow feeds into the booking's fee
//! fields; callers may also surface it to prefill the return form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Fee Policy
// =============================================================================

/// Rates and grace window for return-fee assessment.
///
/// Loaded from the engine's TOML config (`[fees]` section); every field has
/// a default so a missing section means "house rates".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeePolicy {
    /// Minutes past the expected return that are forgiven entirely.
    #[serde(default = "default_grace_period_minutes")]
    pub grace_period_minutes: i64,

    /// Hourly late fee in paise, for lateness under one day.
    #[serde(default = "default_late_fee_per_hour_paise")]
    pub late_fee_per_hour_paise: i64,

    /// Daily late fee in paise, for lateness of a day or more.
    #[serde(default = "default_late_fee_per_day_paise")]
    pub late_fee_per_day_paise: i64,

    /// Daily extension fee in paise, accrued alongside the daily late fee.
    #[serde(default = "default_extension_fee_per_day_paise")]
    pub extension_fee_per_day_paise: i64,
}

fn default_grace_period_minutes() -> i64 {
    30
}

fn default_late_fee_per_hour_paise() -> i64 {
    10_000 // ₹100/hour
}

fn default_late_fee_per_day_paise() -> i64 {
    50_000 // ₹500/day
}

fn default_extension_fee_per_day_paise() -> i64 {
    30_000 // ₹300/day
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy {
            grace_period_minutes: default_grace_period_minutes(),
            late_fee_per_hour_paise: default_late_fee_per_hour_paise(),
            late_fee_per_day_paise: default_late_fee_per_day_paise(),
            extension_fee_per_day_paise: default_extension_fee_per_day_paise(),
        }
    }
}

impl FeePolicy {
    /// Returns the hourly late fee as Money.
    #[inline]
    pub fn late_fee_per_hour(&self) -> Money {
        Money::from_paise(self.late_fee_per_hour_paise)
    }

    /// Returns the daily late fee as Money.
    #[inline]
    pub fn late_fee_per_day(&self) -> Money {
        Money::from_paise(self.late_fee_per_day_paise)
    }

    /// Returns the daily extension fee as Money.
    #[inline]
    pub fn extension_fee_per_day(&self) -> Money {
        Money::from_paise(self.extension_fee_per_day_paise)
    }

    /// Validates the policy (no negative rates or grace window).
    pub fn validate(&self) -> ValidationResult<()> {
        if self.grace_period_minutes < 0 {
            return Err(ValidationError::OutOfRange {
                field: "grace_period_minutes".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        for (field, value) in [
            ("late_fee_per_hour_paise", self.late_fee_per_hour_paise),
            ("late_fee_per_day_paise", self.late_fee_per_day_paise),
            (
                "extension_fee_per_day_paise",
                self.extension_fee_per_day_paise,
            ),
        ] {
            if value < 0 {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Fee Breakdown
// =============================================================================

/// Outcome of a return-fee assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeBreakdown {
    /// How late the return was, in minutes (0 for on-time/within grace).
    pub minutes_late: i64,
    /// Late fee in paise.
    pub late_fee_paise: i64,
    /// Extension fee in paise.
    pub extension_fee_paise: i64,
}

impl FeeBreakdown {
    /// An on-time return: nothing billed.
    pub const fn zero() -> Self {
        FeeBreakdown {
            minutes_late: 0,
            late_fee_paise: 0,
            extension_fee_paise: 0,
        }
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

    /// Total of both fees as Money.
    #[inline]
    pub fn total_fees(&self) -> Money {
        self.late_fee() + self.extension_fee()
    }

    /// True when nothing is billed.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.late_fee_paise == 0 && self.extension_fee_paise == 0
    }
}

// =============================================================================
// Assessment
// =============================================================================

/// Assesses late and extension fees for a vehicle return.
///
/// ## Arguments
/// * `policy` - rates and grace window
/// * `expected` - agreed return instant (end date + dropoff time); bookings
///   missing this data cannot be assessed
/// * `actual` - when the vehicle actually came back
///
/// ## Errors
/// `CoreError::InvalidInput` when `expected` is `None`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use rentdesk_core::fees::{assess, FeePolicy};
///
/// let policy = FeePolicy::default();
/// let expected = NaiveDate::from_ymd_opt(2026, 3, 13)
///     .unwrap()
///     .and_hms_opt(18, 0, 0)
///     .unwrap();
/// let actual = expected + chrono::Duration::minutes(70);
///
/// let fees = assess(&policy, Some(expected), actual).unwrap();
/// assert_eq!(fees.late_fee_paise, 20_000); // 2 hours × ₹100
/// assert_eq!(fees.extension_fee_paise, 0);
/// ```
pub fn assess(
    policy: &FeePolicy,
    expected: Option<NaiveDateTime>,
    actual: NaiveDateTime,
) -> CoreResult<FeeBreakdown> {
    let expected = expected.ok_or_else(|| {
        CoreError::invalid_input("Expected return date and time are required to assess return fees")
    })?;

    let minutes_late = actual.signed_duration_since(expected).num_minutes();

    // Early, on time, or inside the grace window: nothing to bill.
    if minutes_late <= policy.grace_period_minutes {
        return Ok(FeeBreakdown::zero());
    }

    let hours_late = div_ceil(minutes_late, 60);

    if hours_late < 24 {
        return Ok(FeeBreakdown {
            minutes_late,
            late_fee_paise: policy.late_fee_per_hour().multiply_units(hours_late).paise(),
            extension_fee_paise: 0,
        });
    }

    let days_late = div_ceil(hours_late, 24);
    Ok(FeeBreakdown {
        minutes_late,
        late_fee_paise: policy.late_fee_per_day().multiply_units(days_late).paise(),
        extension_fee_paise: policy
            .extension_fee_per_day()
            .multiply_units(days_late)
            .paise(),
    })
}

/// Ceiling division for positive durations.
const fn div_ceil(n: i64, d: i64) -> i64 {
    (n + d - 1) / d
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn expected() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 13)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    fn policy() -> FeePolicy {
        FeePolicy::default()
    }

    #[test]
    fn test_missing_expected_return_is_rejected() {
        let err = assess(&policy(), None, expected()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
        assert_eq!(
            err.to_string(),
            "Expected return date and time are required to assess return fees"
        );
    }

    #[test]
    fn test_early_return_has_no_fees() {
        let actual = expected() - Duration::hours(3);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert!(fees.is_zero());
        assert_eq!(fees.minutes_late, 0);
    }

    #[test]
    fn test_on_time_return_has_no_fees() {
        let fees = assess(&policy(), Some(expected()), expected()).unwrap();
        assert!(fees.is_zero());
    }

    #[test]
    fn test_grace_window_boundary() {
        // Exactly at the grace limit: forgiven
        let actual = expected() + Duration::minutes(30);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert!(fees.is_zero());

        // One minute past grace: billed as a full hour
        let actual = expected() + Duration::minutes(31);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.minutes_late, 31);
        assert_eq!(fees.late_fee_paise, 10_000);
        assert_eq!(fees.extension_fee_paise, 0);
    }

    #[test]
    fn test_hours_round_up() {
        // 70 minutes late → 2 hours billed
        let actual = expected() + Duration::minutes(70);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 20_000);

        // Exactly 2 hours late → still 2 hours
        let actual = expected() + Duration::hours(2);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 20_000);
    }

    #[test]
    fn test_sub_day_lateness_never_bills_extension() {
        let actual = expected() + Duration::hours(23);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 23 * 10_000);
        assert_eq!(fees.extension_fee_paise, 0);
    }

    #[test]
    fn test_full_day_switches_to_daily_rates() {
        // Exactly 24 hours late → 1 day late fee + 1 day extension fee
        let actual = expected() + Duration::hours(24);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 50_000);
        assert_eq!(fees.extension_fee_paise, 30_000);
        assert_eq!(fees.total_fees().paise(), 80_000);
    }

    #[test]
    fn test_days_round_up() {
        // 26 hours late → 2 days billed at both daily rates
        let actual = expected() + Duration::hours(26);
        let fees = assess(&policy(), Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 100_000);
        assert_eq!(fees.extension_fee_paise, 60_000);
    }

    #[test]
    fn test_custom_policy_rates() {
        let policy = FeePolicy {
            grace_period_minutes: 0,
            late_fee_per_hour_paise: 5_000,
            late_fee_per_day_paise: 20_000,
            extension_fee_per_day_paise: 10_000,
        };

        let actual = expected() + Duration::minutes(10);
        let fees = assess(&policy, Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 5_000);

        let actual = expected() + Duration::hours(48);
        let fees = assess(&policy, Some(expected()), actual).unwrap();
        assert_eq!(fees.late_fee_paise, 40_000);
        assert_eq!(fees.extension_fee_paise, 20_000);
    }

    #[test]
    fn test_policy_validation() {
        assert!(FeePolicy::default().validate().is_ok());

        let bad = FeePolicy {
            late_fee_per_day_paise: -1,
            ..FeePolicy::default()
        };
        assert!(bad.validate().is_err());

        let bad = FeePolicy {
            grace_period_minutes: -5,
            ..FeePolicy::default()
        };
        assert!(bad.validate().is_err());
    }
}
