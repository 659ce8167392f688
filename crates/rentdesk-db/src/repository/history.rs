//! # Rental History Repository
//!
//! Reads the immutable side tables that document how a rental unfolded:
//! extensions (each date change) and damage records (each observation at
//! return). Both are written inside booking transactions and never touched
//! afterwards, so this repository is read-only by construction.

use sqlx::SqlitePool;

use crate::error::DbResult;
use rentdesk_core::{DamageRecord, Extension};

/// Repository for extension and damage history reads.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Creates a new HistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Gets all extensions for a booking, oldest first.
    ///
    /// Each row carries the before/after dates, so walking the list in
    /// order reconstructs the full timeline of the rental.
    pub async fn extensions_for(&self, booking_id: &str) -> DbResult<Vec<Extension>> {
        let extensions = sqlx::query_as::<_, Extension>(
            r#"
            SELECT id, booking_id, previous_end_date, previous_dropoff_time,
                   new_end_date, new_dropoff_time, additional_amount_paise,
                   payment_amount_paise, payment_mode, next_payment_date,
                   reason, created_by, created_at
            FROM extensions
            WHERE booking_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(extensions)
    }

    /// Gets all damage records for a booking, oldest first.
    pub async fn damage_records_for(&self, booking_id: &str) -> DbResult<Vec<DamageRecord>> {
        let records = sqlx::query_as::<_, DamageRecord>(
            r#"
            SELECT id, booking_id, description, charges_paise, created_by, created_at
            FROM damage_records
            WHERE booking_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use rentdesk_core::lifecycle::plan_extension;
    use rentdesk_core::{
        Booking, BookingStatus, ExtensionRequest, PaymentStatus, RentalPurpose,
    };
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_booking() -> Booking {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 5, 0, 0).unwrap();
        let mut booking = Booking {
            id: Uuid::new_v4().to_string(),
            booking_code: String::new(),
            customer_id: "cust-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            start_date: date(2026, 5, 4),
            end_date: date(2026, 5, 7),
            pickup_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            dropoff_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            booking_amount_paise: 600_000,
            security_deposit_paise: 0,
            damage_charges_paise: 0,
            late_fee_paise: 0,
            extension_fee_paise: 0,
            total_amount_paise: 0,
            paid_amount_paise: 600_000,
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::InUse,
            rental_purpose: RentalPurpose::Local,
            destination: None,
            estimated_distance_km: None,
            start_odometer: None,
            end_odometer: None,
            fuel_level: None,
            next_payment_date: None,
            created_by: "operator-1".to_string(),
            updated_by: "operator-1".to_string(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            row_version: 0,
        };
        booking.recompute_derived();
        booking
    }

    fn extend_request(new_end: NaiveDate, amount: i64) -> ExtensionRequest {
        ExtensionRequest {
            new_end_date: new_end,
            new_dropoff_time: None,
            additional_amount_paise: amount,
            payment_amount_paise: 0,
            payment_mode: None,
            // Extensions on credit need a follow-up date; collect at return.
            next_payment_date: Some(new_end),
            reason: None,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_history_starts_empty() {
        let db = test_db().await;
        let booking = test_booking();
        db.bookings().create(&booking, None).await.unwrap();

        assert!(db.history().extensions_for(&booking.id).await.unwrap().is_empty());
        assert!(db
            .history()
            .damage_records_for(&booking.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_extension_chain_reads_back_in_order() {
        let db = test_db().await;
        let booking = test_booking();
        let mut current = db.bookings().create(&booking, None).await.unwrap();

        // Two extensions on consecutive desk days
        for (day, new_end, hour) in [(5u32, date(2026, 5, 9), 9u32), (6, date(2026, 5, 11), 11)] {
            let request = extend_request(new_end, 200_000);
            let plan = plan_extension(&current, &request, date(2026, 5, day)).unwrap();
            let now = Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap();
            let extension = Extension {
                id: Uuid::new_v4().to_string(),
                booking_id: current.id.clone(),
                previous_end_date: plan.previous_end_date,
                previous_dropoff_time: plan.previous_dropoff_time,
                new_end_date: plan.new_end_date,
                new_dropoff_time: plan.new_dropoff_time,
                additional_amount_paise: plan.additional_amount_paise,
                payment_amount_paise: plan.payment_amount_paise,
                payment_mode: plan.payment_mode,
                next_payment_date: plan.next_payment_date,
                reason: plan.reason.clone(),
                created_by: "operator-1".to_string(),
                created_at: now,
            };
            current = db
                .bookings()
                .apply_extension(&current, &extension, None, &plan)
                .await
                .unwrap();
        }

        let chain = db.history().extensions_for(&booking.id).await.unwrap();
        assert_eq!(chain.len(), 2);

        // The timeline links up: each row starts where the previous ended
        assert_eq!(chain[0].previous_end_date, date(2026, 5, 7));
        assert_eq!(chain[0].new_end_date, date(2026, 5, 9));
        assert_eq!(chain[1].previous_end_date, date(2026, 5, 9));
        assert_eq!(chain[1].new_end_date, date(2026, 5, 11));

        assert_eq!(current.end_date, date(2026, 5, 11));
        assert_eq!(current.booking_amount_paise, 1_000_000);
    }
}
