//! # Booking Repository
//!
//! Database operations for bookings and their attached rows.
//!
//! ## Booking Lifecycle in Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Booking Writes (all transactional)                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → assign booking_code, INSERT booking                 │
//! │                    (+ INSERT advance payment in same transaction)      │
//! │                                                                         │
//! │  2. RECORD PAYMENT                                                     │
//! │     └── record_payment() → INSERT payment + guarded UPDATE booking     │
//! │                                                                         │
//! │  3. EXTEND                                                             │
//! │     └── apply_extension() → INSERT extension (+ payment)               │
//! │                             + guarded UPDATE booking                   │
//! │                                                                         │
//! │  4. COMPLETE                                                           │
//! │     └── apply_completion() → INSERT settlement (+ damage)              │
//! │                              + guarded UPDATE booking                  │
//! │                                                                         │
//! │  5. CANCEL / PROGRESS                                                  │
//! │     └── update() → guarded UPDATE booking                              │
//! │                                                                         │
//! │  Every UPDATE carries `WHERE id = ? AND row_version = ?` and           │
//! │  increments row_version. A miss is classified as NotFound (row gone)   │
//! │  or VersionConflict (row moved on) - never silently lost.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The planners in `rentdesk_core::lifecycle` decide WHAT to write; this
//! repository only persists plans it is handed. Keeping the decision logic
//! out of the storage layer is what lets tests drive it with fixed dates.

use sqlx::sqlite::SqliteQueryResult;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use rentdesk_core::lifecycle::{CompletionPlan, ExtensionPlan, PaymentPlan};
use rentdesk_core::types::ist_date_of;
use rentdesk_core::{
    Booking, BookingStatus, DamageRecord, Extension, Payment, BOOKING_CODE_PREFIX,
};

/// Column list shared by every booking SELECT.
///
/// Kept in one place so the row shape and the `FromRow` derive cannot
/// drift apart query by query.
const BOOKING_COLUMNS: &str = "\
    id, booking_code, customer_id, vehicle_id, \
    start_date, end_date, pickup_time, dropoff_time, \
    booking_amount_paise, security_deposit_paise, damage_charges_paise, \
    late_fee_paise, extension_fee_paise, total_amount_paise, paid_amount_paise, \
    payment_status, status, rental_purpose, \
    destination, estimated_distance_km, start_odometer, end_odometer, fuel_level, \
    next_payment_date, created_by, updated_by, created_at, updated_at, \
    completed_at, row_version";

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Gets a booking by its human-facing code (`BK-20260821-0001`).
    pub async fn get_by_code(&self, booking_code: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_code = ?1");
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Lists bookings, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<BookingStatus>) -> DbResult<Vec<Booking>> {
        let bookings = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE status = ?1 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Booking>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC");
                sqlx::query_as::<_, Booking>(&sql).fetch_all(&self.pool).await?
            }
        };

        Ok(bookings)
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Inserts a new booking, assigning its booking code.
    ///
    /// ## Booking Code Assignment
    /// The caller hands over a fully-built booking with an EMPTY
    /// `booking_code`; the code is assigned here because the per-day
    /// counter must be read inside the same transaction as the insert:
    ///
    /// ```text
    /// BEGIN;
    ///   count today's codes (BK-20260821-%)  → e.g. 3
    ///   booking_code = BK-20260821-0004
    ///   INSERT booking
    ///   INSERT advance payment (if collected)
    /// COMMIT;
    /// ```
    ///
    /// The UNIQUE index on booking_code backstops the counter if two desks
    /// ever race the same transaction window.
    ///
    /// ## Returns
    /// The booking as stored, with its assigned code.
    pub async fn create(&self, booking: &Booking, advance: Option<&Payment>) -> DbResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // Day of the desk calendar (IST), not of the UTC clock.
        let date_part = ist_date_of(booking.created_at).format("%Y%m%d").to_string();
        let prefix = format!("{}-{}-", BOOKING_CODE_PREFIX, date_part);

        let today_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE booking_code LIKE ?1")
            .bind(format!("{prefix}%"))
            .fetch_one(&mut *tx)
            .await?;

        let booking_code = format!("{}{:04}", prefix, today_count + 1);

        debug!(id = %booking.id, code = %booking_code, "Creating booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, booking_code, customer_id, vehicle_id,
                start_date, end_date, pickup_time, dropoff_time,
                booking_amount_paise, security_deposit_paise, damage_charges_paise,
                late_fee_paise, extension_fee_paise, total_amount_paise, paid_amount_paise,
                payment_status, status, rental_purpose,
                destination, estimated_distance_km, start_odometer, end_odometer, fuel_level,
                next_payment_date, created_by, updated_by, created_at, updated_at,
                completed_at, row_version
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18,
                ?19, ?20, ?21, ?22, ?23,
                ?24, ?25, ?26, ?27, ?28,
                ?29, ?30
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking_code)
        .bind(&booking.customer_id)
        .bind(&booking.vehicle_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.pickup_time)
        .bind(booking.dropoff_time)
        .bind(booking.booking_amount_paise)
        .bind(booking.security_deposit_paise)
        .bind(booking.damage_charges_paise)
        .bind(booking.late_fee_paise)
        .bind(booking.extension_fee_paise)
        .bind(booking.total_amount_paise)
        .bind(booking.paid_amount_paise)
        .bind(booking.payment_status)
        .bind(booking.status)
        .bind(booking.rental_purpose)
        .bind(&booking.destination)
        .bind(booking.estimated_distance_km)
        .bind(booking.start_odometer)
        .bind(booking.end_odometer)
        .bind(&booking.fuel_level)
        .bind(booking.next_payment_date)
        .bind(&booking.created_by)
        .bind(&booking.updated_by)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.completed_at)
        .bind(booking.row_version)
        .execute(&mut *tx)
        .await?;

        if let Some(payment) = advance {
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit().await?;

        let mut stored = booking.clone();
        stored.booking_code = booking_code;
        Ok(stored)
    }

    // =========================================================================
    // Transactional Composites
    // =========================================================================

    /// Records a payment: ledger insert + booking update, one transaction.
    ///
    /// ## Arguments
    /// * `booking` - the snapshot the payment was planned against (its
    ///   `row_version` guards the update)
    /// * `payment` - the ledger row to append
    /// * `plan` - the new paid amount / payment status from the planner
    pub async fn record_payment(
        &self,
        booking: &Booking,
        payment: &Payment,
        plan: &PaymentPlan,
    ) -> DbResult<Booking> {
        debug!(
            booking_id = %booking.id,
            amount = payment.amount_paise,
            "Recording payment"
        );

        let mut tx = self.pool.begin().await?;

        insert_payment(&mut tx, payment).await?;

        let result: SqliteQueryResult = sqlx::query(
            r#"
            UPDATE bookings SET
                paid_amount_paise = ?2,
                payment_status = ?3,
                updated_by = ?4,
                updated_at = ?5,
                row_version = row_version + 1
            WHERE id = ?1 AND row_version = ?6
            "#,
        )
        .bind(&booking.id)
        .bind(plan.new_paid_amount_paise)
        .bind(plan.new_payment_status)
        .bind(&payment.created_by)
        .bind(payment.created_at)
        .bind(booking.row_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(classify_guard_miss(&mut tx, &booking.id).await);
        }

        tx.commit().await?;

        let mut updated = booking.clone();
        updated.paid_amount_paise = plan.new_paid_amount_paise;
        updated.payment_status = plan.new_payment_status;
        updated.updated_by = payment.created_by.clone();
        updated.updated_at = payment.created_at;
        updated.row_version += 1;
        Ok(updated)
    }

    /// Applies an extension: history insert (+ optional payment) + booking
    /// update, one transaction.
    pub async fn apply_extension(
        &self,
        booking: &Booking,
        extension: &Extension,
        payment: Option<&Payment>,
        plan: &ExtensionPlan,
    ) -> DbResult<Booking> {
        debug!(
            booking_id = %booking.id,
            new_end_date = %plan.new_end_date,
            "Applying extension"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO extensions (
                id, booking_id,
                previous_end_date, previous_dropoff_time,
                new_end_date, new_dropoff_time,
                additional_amount_paise, payment_amount_paise, payment_mode,
                next_payment_date, reason,
                created_by, created_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4,
                ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&extension.id)
        .bind(&extension.booking_id)
        .bind(extension.previous_end_date)
        .bind(extension.previous_dropoff_time)
        .bind(extension.new_end_date)
        .bind(extension.new_dropoff_time)
        .bind(extension.additional_amount_paise)
        .bind(extension.payment_amount_paise)
        .bind(extension.payment_mode)
        .bind(extension.next_payment_date)
        .bind(&extension.reason)
        .bind(&extension.created_by)
        .bind(extension.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(payment) = payment {
            insert_payment(&mut tx, payment).await?;
        }

        let result: SqliteQueryResult = sqlx::query(
            r#"
            UPDATE bookings SET
                end_date = ?2,
                dropoff_time = ?3,
                booking_amount_paise = ?4,
                paid_amount_paise = ?5,
                total_amount_paise = ?6,
                payment_status = ?7,
                next_payment_date = ?8,
                updated_by = ?9,
                updated_at = ?10,
                row_version = row_version + 1
            WHERE id = ?1 AND row_version = ?11
            "#,
        )
        .bind(&booking.id)
        .bind(plan.new_end_date)
        .bind(plan.new_dropoff_time)
        .bind(plan.new_booking_amount_paise)
        .bind(plan.new_paid_amount_paise)
        .bind(plan.new_total_amount_paise)
        .bind(plan.new_payment_status)
        .bind(plan.next_payment_date)
        .bind(&extension.created_by)
        .bind(extension.created_at)
        .bind(booking.row_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(classify_guard_miss(&mut tx, &booking.id).await);
        }

        tx.commit().await?;

        let mut updated = booking.clone();
        updated.end_date = plan.new_end_date;
        updated.dropoff_time = plan.new_dropoff_time;
        updated.booking_amount_paise = plan.new_booking_amount_paise;
        updated.paid_amount_paise = plan.new_paid_amount_paise;
        updated.total_amount_paise = plan.new_total_amount_paise;
        updated.payment_status = plan.new_payment_status;
        updated.next_payment_date = plan.next_payment_date;
        updated.updated_by = extension.created_by.clone();
        updated.updated_at = extension.created_at;
        updated.row_version += 1;
        Ok(updated)
    }

    /// Completes a booking: settlement payment + damage record + final
    /// booking update, one transaction.
    ///
    /// ## Arguments
    /// * `settlement` - ledger row for the balance collected at return
    ///   (None when nothing was due)
    /// * `damage` - damage row (None when the vehicle came back clean)
    /// * `completed_at` - the completion instant, also used as `updated_at`
    pub async fn apply_completion(
        &self,
        booking: &Booking,
        plan: &CompletionPlan,
        settlement: Option<&Payment>,
        damage: Option<&DamageRecord>,
        actor: &str,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<Booking> {
        debug!(
            booking_id = %booking.id,
            settlement = plan.settlement_paise,
            "Completing booking"
        );

        let mut tx = self.pool.begin().await?;

        if let Some(payment) = settlement {
            insert_payment(&mut tx, payment).await?;
        }

        if let Some(damage) = damage {
            sqlx::query(
                r#"
                INSERT INTO damage_records (
                    id, booking_id, description, charges_paise, created_by, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&damage.id)
            .bind(&damage.booking_id)
            .bind(&damage.description)
            .bind(damage.charges_paise)
            .bind(&damage.created_by)
            .bind(damage.created_at)
            .execute(&mut *tx)
            .await?;
        }

        let result: SqliteQueryResult = sqlx::query(
            r#"
            UPDATE bookings SET
                damage_charges_paise = ?2,
                late_fee_paise = ?3,
                extension_fee_paise = ?4,
                paid_amount_paise = ?5,
                total_amount_paise = ?6,
                payment_status = ?7,
                status = ?8,
                end_odometer = ?9,
                fuel_level = ?10,
                completed_at = ?11,
                updated_by = ?12,
                updated_at = ?11,
                row_version = row_version + 1
            WHERE id = ?1 AND row_version = ?13
            "#,
        )
        .bind(&booking.id)
        .bind(plan.damage_charges_paise)
        .bind(plan.late_fee_paise)
        .bind(plan.extension_fee_paise)
        .bind(plan.new_paid_amount_paise)
        .bind(plan.new_total_amount_paise)
        .bind(plan.new_payment_status)
        .bind(BookingStatus::Completed)
        .bind(plan.end_odometer)
        .bind(&plan.fuel_level)
        .bind(completed_at)
        .bind(actor)
        .bind(booking.row_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(classify_guard_miss(&mut tx, &booking.id).await);
        }

        tx.commit().await?;

        let mut updated = booking.clone();
        updated.damage_charges_paise = plan.damage_charges_paise;
        updated.late_fee_paise = plan.late_fee_paise;
        updated.extension_fee_paise = plan.extension_fee_paise;
        updated.paid_amount_paise = plan.new_paid_amount_paise;
        updated.total_amount_paise = plan.new_total_amount_paise;
        updated.payment_status = plan.new_payment_status;
        updated.status = BookingStatus::Completed;
        updated.end_odometer = plan.end_odometer;
        updated.fuel_level = plan.fuel_level.clone();
        updated.completed_at = Some(completed_at);
        updated.updated_by = actor.to_string();
        updated.updated_at = completed_at;
        updated.row_version += 1;
        Ok(updated)
    }

    // =========================================================================
    // Plain Guarded Update
    // =========================================================================

    /// Writes a booking's mutable columns back, guarded by its row_version.
    ///
    /// Used by the cancel and status-progression paths, where the caller
    /// mutates a loaded snapshot and persists it as-is. `row_version` in the
    /// given booking must be the version that was READ; the stored row is
    /// bumped to `row_version + 1`.
    pub async fn update(&self, booking: &Booking) -> DbResult<Booking> {
        debug!(id = %booking.id, status = %booking.status, "Updating booking");

        let mut tx = self.pool.begin().await?;

        let result: SqliteQueryResult = sqlx::query(
            r#"
            UPDATE bookings SET
                start_date = ?2,
                end_date = ?3,
                pickup_time = ?4,
                dropoff_time = ?5,
                booking_amount_paise = ?6,
                security_deposit_paise = ?7,
                damage_charges_paise = ?8,
                late_fee_paise = ?9,
                extension_fee_paise = ?10,
                total_amount_paise = ?11,
                paid_amount_paise = ?12,
                payment_status = ?13,
                status = ?14,
                destination = ?15,
                estimated_distance_km = ?16,
                start_odometer = ?17,
                end_odometer = ?18,
                fuel_level = ?19,
                next_payment_date = ?20,
                updated_by = ?21,
                updated_at = ?22,
                completed_at = ?23,
                row_version = row_version + 1
            WHERE id = ?1 AND row_version = ?24
            "#,
        )
        .bind(&booking.id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.pickup_time)
        .bind(booking.dropoff_time)
        .bind(booking.booking_amount_paise)
        .bind(booking.security_deposit_paise)
        .bind(booking.damage_charges_paise)
        .bind(booking.late_fee_paise)
        .bind(booking.extension_fee_paise)
        .bind(booking.total_amount_paise)
        .bind(booking.paid_amount_paise)
        .bind(booking.payment_status)
        .bind(booking.status)
        .bind(&booking.destination)
        .bind(booking.estimated_distance_km)
        .bind(booking.start_odometer)
        .bind(booking.end_odometer)
        .bind(&booking.fuel_level)
        .bind(booking.next_payment_date)
        .bind(&booking.updated_by)
        .bind(booking.updated_at)
        .bind(booking.completed_at)
        .bind(booking.row_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(classify_guard_miss(&mut tx, &booking.id).await);
        }

        tx.commit().await?;

        let mut updated = booking.clone();
        updated.row_version += 1;
        Ok(updated)
    }

    /// Counts all bookings. Used by the seed binary.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Appends a ledger row inside an open transaction.
async fn insert_payment(tx: &mut Transaction<'_, Sqlite>, payment: &Payment) -> DbResult<()> {
    debug!(
        booking_id = %payment.booking_id,
        amount = payment.amount_paise,
        "Appending ledger row"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, booking_id, mode, amount_paise, note, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.booking_id)
    .bind(payment.mode)
    .bind(payment.amount_paise)
    .bind(&payment.note)
    .bind(&payment.created_by)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Decides why a guarded UPDATE matched nothing: the row is gone
/// (NotFound) or it moved past the version we read (VersionConflict).
async fn classify_guard_miss(tx: &mut Transaction<'_, Sqlite>, id: &str) -> DbError {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
    {
        Ok(0) => DbError::not_found("Booking", id),
        Ok(_) => DbError::version_conflict("Booking", id),
        Err(e) => e.into(),
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
    use rentdesk_core::lifecycle::{plan_completion, plan_extension, plan_payment};
    use rentdesk_core::{
        CompletionRequest, ExtensionRequest, PaymentMode, PaymentStatus, RentalPurpose,
    };
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// In-use local booking: ₹10,000 rental + ₹2,000 deposit.
    fn test_booking() -> Booking {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap();
        let mut booking = Booking {
            id: Uuid::new_v4().to_string(),
            booking_code: String::new(), // assigned by create()
            customer_id: "cust-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            start_date: date(2026, 3, 10),
            end_date: date(2026, 3, 13),
            pickup_time: time(10, 0),
            dropoff_time: time(18, 0),
            booking_amount_paise: 1_000_000,
            security_deposit_paise: 200_000,
            damage_charges_paise: 0,
            late_fee_paise: 0,
            extension_fee_paise: 0,
            total_amount_paise: 0,
            paid_amount_paise: 0,
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

    fn test_payment(booking: &Booking, amount_paise: i64) -> Payment {
        Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            mode: PaymentMode::Cash,
            amount_paise,
            note: None,
            created_by: "operator-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 11, 6, 0, 0).unwrap(),
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_load_roundtrip() {
        let db = test_db().await;
        let booking = test_booking();

        let stored = db.bookings().create(&booking, None).await.unwrap();
        assert_eq!(stored.booking_code, "BK-20260310-0001");

        let loaded = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(loaded.booking_code, "BK-20260310-0001");
        assert_eq!(loaded.customer_id, "cust-1");
        assert_eq!(loaded.start_date, date(2026, 3, 10));
        assert_eq!(loaded.dropoff_time, time(18, 0));
        assert_eq!(loaded.total_amount_paise, 1_200_000);
        assert_eq!(loaded.payment_status, PaymentStatus::Pending);
        assert_eq!(loaded.status, BookingStatus::InUse);
        assert_eq!(loaded.row_version, 0);

        let by_code = db
            .bookings()
            .get_by_code("BK-20260310-0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_code.id, booking.id);
    }

    #[tokio::test]
    async fn test_booking_codes_count_up_within_a_day() {
        let db = test_db().await;

        for expected in ["BK-20260310-0001", "BK-20260310-0002", "BK-20260310-0003"] {
            let stored = db.bookings().create(&test_booking(), None).await.unwrap();
            assert_eq!(stored.booking_code, expected);
        }

        // A booking created on another desk day starts its own sequence
        let mut other_day = test_booking();
        other_day.created_at = Utc.with_ymd_and_hms(2026, 3, 11, 6, 0, 0).unwrap();
        let stored = db.bookings().create(&other_day, None).await.unwrap();
        assert_eq!(stored.booking_code, "BK-20260311-0001");
    }

    #[tokio::test]
    async fn test_create_with_advance_writes_ledger_row() {
        let db = test_db().await;
        let mut booking = test_booking();

        // Engine-side: advance applied to the snapshot before storage
        booking.paid_amount_paise = 500_000;
        booking.recompute_derived();
        let advance = test_payment(&booking, 500_000);

        db.bookings().create(&booking, Some(&advance)).await.unwrap();

        let paid = db.ledger().paid_to_date(&booking.id).await.unwrap();
        assert_eq!(paid, 500_000);

        let loaded = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(loaded.paid_amount_paise, 500_000);
        assert_eq!(loaded.payment_status, PaymentStatus::Partial);
    }

    #[tokio::test]
    async fn test_record_payment_composite() {
        let db = test_db().await;
        let booking = test_booking();
        let stored = db.bookings().create(&booking, None).await.unwrap();

        let payment = test_payment(&stored, 500_000);
        let plan = plan_payment(&stored, 500_000).unwrap();
        let updated = db
            .bookings()
            .record_payment(&stored, &payment, &plan)
            .await
            .unwrap();

        assert_eq!(updated.paid_amount_paise, 500_000);
        assert_eq!(updated.payment_status, PaymentStatus::Partial);
        assert_eq!(updated.row_version, 1);

        // Ledger agrees with the cached projection
        let paid = db.ledger().paid_to_date(&stored.id).await.unwrap();
        assert_eq!(paid, 500_000);

        let rows = db.ledger().payments_for(&stored.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_paise, 500_000);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_a_version_conflict() {
        let db = test_db().await;
        let booking = test_booking();
        let stored = db.bookings().create(&booking, None).await.unwrap();

        // First write moves the row to version 1
        let payment = test_payment(&stored, 200_000);
        let plan = plan_payment(&stored, 200_000).unwrap();
        db.bookings()
            .record_payment(&stored, &payment, &plan)
            .await
            .unwrap();

        // Second write still holds the version-0 snapshot
        let payment = test_payment(&stored, 100_000);
        let plan = plan_payment(&stored, 100_000).unwrap();
        let err = db
            .bookings()
            .record_payment(&stored, &payment, &plan)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { .. }));

        // The conflicting payment must NOT have reached the ledger
        let paid = db.ledger().paid_to_date(&stored.id).await.unwrap();
        assert_eq!(paid, 200_000);
    }

    #[tokio::test]
    async fn test_update_unknown_booking_is_not_found() {
        let db = test_db().await;
        let booking = test_booking(); // never created

        let err = db.bookings().update(&booking).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_apply_extension_composite() {
        let db = test_db().await;
        let mut booking = test_booking();
        booking.paid_amount_paise = 1_200_000; // fully paid
        booking.recompute_derived();
        let stored = db.bookings().create(&booking, None).await.unwrap();

        let request = ExtensionRequest {
            new_end_date: date(2026, 3, 16),
            new_dropoff_time: None,
            additional_amount_paise: 300_000,
            payment_amount_paise: 300_000,
            payment_mode: Some(PaymentMode::Upi),
            next_payment_date: None,
            reason: Some("Trip ran long".to_string()),
        };
        let plan = plan_extension(&stored, &request, date(2026, 3, 12)).unwrap();

        let now = Utc.with_ymd_and_hms(2026, 3, 12, 9, 0, 0).unwrap();
        let extension = Extension {
            id: Uuid::new_v4().to_string(),
            booking_id: stored.id.clone(),
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
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: stored.id.clone(),
            mode: PaymentMode::Upi,
            amount_paise: 300_000,
            note: Some("Collected with extension".to_string()),
            created_by: "operator-1".to_string(),
            created_at: now,
        };

        let updated = db
            .bookings()
            .apply_extension(&stored, &extension, Some(&payment), &plan)
            .await
            .unwrap();

        assert_eq!(updated.end_date, date(2026, 3, 16));
        assert_eq!(updated.booking_amount_paise, 1_300_000);
        assert_eq!(updated.total_amount_paise, 1_500_000);
        assert_eq!(updated.paid_amount_paise, 1_500_000);
        assert_eq!(updated.payment_status, PaymentStatus::Full);
        assert_eq!(updated.row_version, 1);

        let history = db.history().extensions_for(&stored.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_end_date, date(2026, 3, 13));
        assert_eq!(history[0].new_end_date, date(2026, 3, 16));

        let paid = db.ledger().paid_to_date(&stored.id).await.unwrap();
        assert_eq!(paid, 1_500_000);
    }

    #[tokio::test]
    async fn test_apply_completion_composite() {
        let db = test_db().await;
        let mut booking = test_booking();
        booking.paid_amount_paise = 500_000;
        booking.recompute_derived();
        let stored = db.bookings().create(&booking, None).await.unwrap();

        let request = CompletionRequest {
            damage_charges_paise: 150_000,
            damage_description: Some("Rear fender scratched".to_string()),
            late_fee_paise: 0,
            extension_fee_paise: 0,
            final_payment_mode: Some(PaymentMode::Cash),
            odometer_reading: None,
            fuel_level: None,
        };
        let plan = plan_completion(&stored, &request).unwrap();

        let now = Utc.with_ymd_and_hms(2026, 3, 13, 13, 0, 0).unwrap();
        let settlement = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: stored.id.clone(),
            mode: PaymentMode::Cash,
            amount_paise: plan.settlement_paise,
            note: Some("Settlement at return".to_string()),
            created_by: "operator-2".to_string(),
            created_at: now,
        };
        let damage = DamageRecord {
            id: Uuid::new_v4().to_string(),
            booking_id: stored.id.clone(),
            description: "Rear fender scratched".to_string(),
            charges_paise: 150_000,
            created_by: "operator-2".to_string(),
            created_at: now,
        };

        let updated = db
            .bookings()
            .apply_completion(&stored, &plan, Some(&settlement), Some(&damage), "operator-2", now)
            .await
            .unwrap();

        assert_eq!(updated.status, BookingStatus::Completed);
        assert_eq!(updated.completed_at, Some(now));
        assert_eq!(updated.damage_charges_paise, 150_000);
        assert_eq!(updated.paid_amount_paise, 1_200_000);
        assert_eq!(updated.total_amount_paise, 1_350_000);
        assert_eq!(updated.payment_status, PaymentStatus::Partial);

        let damage_rows = db.history().damage_records_for(&stored.id).await.unwrap();
        assert_eq!(damage_rows.len(), 1);
        assert_eq!(damage_rows[0].charges_paise, 150_000);

        let paid = db.ledger().paid_to_date(&stored.id).await.unwrap();
        assert_eq!(paid, 1_200_000);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = test_db().await;

        let mut in_use = test_booking();
        in_use.status = BookingStatus::InUse;
        db.bookings().create(&in_use, None).await.unwrap();

        let mut confirmed = test_booking();
        confirmed.status = BookingStatus::Confirmed;
        db.bookings().create(&confirmed, None).await.unwrap();

        let all = db.bookings().list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_in_use = db.bookings().list(Some(BookingStatus::InUse)).await.unwrap();
        assert_eq!(only_in_use.len(), 1);
        assert_eq!(only_in_use[0].id, in_use.id);

        let cancelled = db.bookings().list(Some(BookingStatus::Cancelled)).await.unwrap();
        assert!(cancelled.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_via_plain_update() {
        let db = test_db().await;
        let booking = test_booking();
        let stored = db.bookings().create(&booking, None).await.unwrap();

        let mut cancelled = stored.clone();
        cancelled.status = BookingStatus::Cancelled;
        cancelled.updated_by = "operator-2".to_string();

        let updated = db.bookings().update(&cancelled).await.unwrap();
        assert_eq!(updated.row_version, 1);

        let loaded = db.bookings().get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Cancelled);
        assert_eq!(loaded.updated_by, "operator-2");
        assert_eq!(loaded.row_version, 1);
    }
}
