//! # Booking Store Trait
//!
//! Storage abstraction the engine drives. The production implementation is
//! [`rentdesk_db::Database`]; tests may substitute anything that honors the
//! same contract.
//!
//! ## Contract
//! - Mutating methods take the caller's loaded snapshot plus a plan computed
//!   by `rentdesk-core::lifecycle`, and persist atomically with a version
//!   guard. A concurrent writer surfaces as `DbError::VersionConflict`.
//! - Readers never mutate. `paid_to_date` sums the payments ledger directly
//!   rather than trusting the cached column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rentdesk_core::lifecycle::{CompletionPlan, ExtensionPlan, PaymentPlan};
use rentdesk_core::{Booking, BookingStatus, DamageRecord, Extension, Payment};
use rentdesk_db::{Database, DbResult};

/// Persistence operations the booking engine needs.
///
/// Every mutation is transactional: either the booking row, the ledger rows,
/// and the history rows all land, or none do.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Loads a booking by internal id.
    async fn load_booking(&self, booking_id: &str) -> DbResult<Option<Booking>>;

    /// Inserts a new booking, assigns its booking code, and records the
    /// advance payment (if any) in the same transaction.
    async fn create_booking(&self, booking: &Booking, advance: Option<&Payment>)
        -> DbResult<Booking>;

    /// Appends a payment and applies the computed money fields.
    async fn record_payment(
        &self,
        booking: &Booking,
        payment: &Payment,
        plan: &PaymentPlan,
    ) -> DbResult<Booking>;

    /// Records an extension, its optional payment, and the new dates/amounts.
    async fn apply_extension(
        &self,
        booking: &Booking,
        extension: &Extension,
        payment: Option<&Payment>,
        plan: &ExtensionPlan,
    ) -> DbResult<Booking>;

    /// Settles and closes a booking: final charges, optional settlement
    /// payment, optional damage record, and the Completed status flip.
    async fn apply_completion(
        &self,
        booking: &Booking,
        plan: &CompletionPlan,
        settlement: Option<&Payment>,
        damage: Option<&DamageRecord>,
        actor: &str,
        completed_at: DateTime<Utc>,
    ) -> DbResult<Booking>;

    /// Writes back a modified booking snapshot (status flips, audit fields).
    async fn update_booking(&self, booking: &Booking) -> DbResult<Booking>;

    /// All payments for a booking, oldest first.
    async fn payments_for(&self, booking_id: &str) -> DbResult<Vec<Payment>>;

    /// All extensions for a booking, oldest first.
    async fn extensions_for(&self, booking_id: &str) -> DbResult<Vec<Extension>>;

    /// All damage records for a booking, oldest first.
    async fn damage_records_for(&self, booking_id: &str) -> DbResult<Vec<DamageRecord>>;

    /// Sum of the payments ledger in paise. Source of truth for reconciliation.
    async fn paid_to_date(&self, booking_id: &str) -> DbResult<i64>;

    /// Lists bookings, newest first, optionally filtered by status.
    async fn list_bookings(&self, status: Option<BookingStatus>) -> DbResult<Vec<Booking>>;
}

// =============================================================================
// Production implementation
// =============================================================================

#[async_trait]
impl BookingStore for Database {
    async fn load_booking(&self, booking_id: &str) -> DbResult<Option<Booking>> {
        self.bookings().get_by_id(booking_id).await
    }

    async fn create_booking(
        &self,
        booking: &Booking,
        advance: Option<&Payment>,
    ) -> DbResult<Booking> {
        self.bookings().create(booking, advance).await
    }

    async fn record_payment(
        &self,
        booking: &Booking,
        payment: &Payment,
        plan: &PaymentPlan,
    ) -> DbResult<Booking> {
        self.bookings().record_payment(booking, payment, plan).await
    }

    async fn apply_extension(
        &self,
        booking: &Booking,
        extension: &Extension,
        payment: Option<&Payment>,
        plan: &ExtensionPlan,
    ) -> DbResult<Booking> {
        self.bookings()
            .apply_extension(booking, extension, payment, plan)
            .await
    }

    async fn apply_completion(
        &self,
        booking: &Booking,
        plan: &CompletionPlan,
        settlement: Option<&Payment>,
        damage: Option<&DamageRecord>,
        actor: &str,
        completed_at: DateTime<Utc>,
    ) -> DbResult<Booking> {
        self.bookings()
            .apply_completion(booking, plan, settlement, damage, actor, completed_at)
            .await
    }

    async fn update_booking(&self, booking: &Booking) -> DbResult<Booking> {
        self.bookings().update(booking).await
    }

    async fn payments_for(&self, booking_id: &str) -> DbResult<Vec<Payment>> {
        self.ledger().payments_for(booking_id).await
    }

    async fn extensions_for(&self, booking_id: &str) -> DbResult<Vec<Extension>> {
        self.history().extensions_for(booking_id).await
    }

    async fn damage_records_for(&self, booking_id: &str) -> DbResult<Vec<DamageRecord>> {
        self.history().damage_records_for(booking_id).await
    }

    async fn paid_to_date(&self, booking_id: &str) -> DbResult<i64> {
        self.ledger().paid_to_date(booking_id).await
    }

    async fn list_bookings(&self, status: Option<BookingStatus>) -> DbResult<Vec<Booking>> {
        self.bookings().list(status).await
    }
}
