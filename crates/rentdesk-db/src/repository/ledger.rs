//! # Payment Ledger Repository
//!
//! Read side of the append-only payment ledger.
//!
//! ## Ledger Reads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Append-Only Ledger                               │
//! │                                                                         │
//! │  WRITES happen elsewhere: every ledger row is inserted inside a        │
//! │  booking transaction (create / record_payment / apply_extension /      │
//! │  apply_completion). There is no INSERT, UPDATE, or DELETE here.        │
//! │                                                                         │
//! │  READS:                                                                │
//! │  • payments_for()  - full history of a booking, oldest first           │
//! │  • paid_to_date()  - SUM over the ledger, the source of truth that     │
//! │                      bookings.paid_amount_paise is checked against     │
//! │                                                                         │
//! │  If SUM(ledger) and the cached paid_amount_paise ever disagree, the    │
//! │  ledger wins - it is the record of what actually changed hands.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use rentdesk_core::Payment;

/// Repository for payment ledger reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Gets all payments for a booking, oldest first.
    ///
    /// Insertion order and `created_at` order agree because rows are only
    /// ever appended; sorting by `created_at` keeps statements stable even
    /// if ids are regenerated in tests.
    pub async fn payments_for(&self, booking_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, mode, amount_paise, note, created_by, created_at
            FROM payments
            WHERE booking_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Gets the total amount paid for a booking, in paise.
    ///
    /// `SUM` over an empty ledger is NULL, which reads back as `None`;
    /// a booking with no payments has paid zero.
    pub async fn paid_to_date(&self, booking_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_paise)
            FROM payments
            WHERE booking_id = ?1
            "#,
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts all ledger rows. Used by the seed binary.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
