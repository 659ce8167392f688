//! # Booking Engine
//!
//! Orchestrates the booking lifecycle over pluggable collaborators.
//!
//! ## Operation Shape
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         BookingEngine                                │
//! │                                                                      │
//! │  validate ──► lock ──► load ──► plan (pure) ──► apply (tx) ──► notify│
//! │                                                                      │
//! │  Collaborators:                                                      │
//! │    S: BookingStore   persistence (rentdesk-db in production)         │
//! │    N: Notifier       outbound events (log / channel)                 │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure and lives in `rentdesk-core::lifecycle`; this module
//! wires plans to storage and announces the outcome. A failed plan leaves
//! the database untouched; a failed notification leaves the database
//! committed (delivery is best-effort).

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use rentdesk_core::{
    fees, ist_date_of, plan_cancellation, plan_completion, plan_extension, plan_payment,
    plan_transition, validate_actor, validate_new_booking, Booking, BookingStatus,
    CompletionRequest, CompletionSummary, CoreError, DamageRecord, Extension, ExtensionRequest,
    FeeBreakdown, Money, NewBooking, Payment, PaymentMode, PaymentStatus,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::locks::BookingLocks;
use crate::notify::{Notifier, NotifyEvent, NotifyMessage};
use crate::store::BookingStore;

// =============================================================================
// Read models
// =============================================================================

/// Cross-check of the payments ledger against the cached paid amount.
///
/// The ledger is the source of truth; `cached_paid_paise` is the projection
/// on the booking row. They disagree only if a write path has a bug.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerReconciliation {
    pub booking_id: String,
    /// SUM over the payments ledger, in paise.
    pub ledger_total_paise: i64,
    /// `paid_amount_paise` as cached on the booking row.
    pub cached_paid_paise: i64,
}

impl LedgerReconciliation {
    pub fn is_consistent(&self) -> bool {
        self.ledger_total_paise == self.cached_paid_paise
    }

    /// Cached minus ledger. Zero when consistent.
    pub fn drift_paise(&self) -> i64 {
        self.cached_paid_paise - self.ledger_total_paise
    }
}

/// Full account of one booking: the row plus every ledger and history entry.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatement {
    pub booking: Booking,
    pub payments: Vec<Payment>,
    pub extensions: Vec<Extension>,
    pub damage_records: Vec<DamageRecord>,
    /// Outstanding balance (total − paid), floored at zero.
    pub pending_paise: i64,
}

// =============================================================================
// Engine
// =============================================================================

/// The booking lifecycle orchestrator.
///
/// One instance serves the whole process. Mutations on the same booking are
/// serialized through [`BookingLocks`]; different bookings run concurrently.
pub struct BookingEngine<S: BookingStore, N: Notifier> {
    store: S,
    notifier: N,
    config: EngineConfig,
    locks: BookingLocks,
}

impl<S: BookingStore, N: Notifier> BookingEngine<S, N> {
    /// Creates an engine with default configuration.
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_config(store, notifier, EngineConfig::default())
    }

    /// Creates an engine with explicit configuration.
    pub fn with_config(store: S, notifier: N, config: EngineConfig) -> Self {
        BookingEngine {
            store,
            notifier,
            config,
            locks: BookingLocks::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a booking, optionally collecting an advance in the same
    /// transaction.
    ///
    /// The advance flows through the regular payment planner, so the
    /// overpayment guard applies from day one. The store assigns the
    /// booking code.
    pub async fn create_booking(
        &self,
        new_booking: NewBooking,
        actor: &str,
    ) -> EngineResult<Booking> {
        validate_actor(actor)?;
        validate_new_booking(&new_booking)?;

        let now = Utc::now();
        let mut booking = Booking {
            id: Uuid::new_v4().to_string(),
            // Assigned inside the create transaction.
            booking_code: String::new(),
            customer_id: new_booking.customer_id,
            vehicle_id: new_booking.vehicle_id,
            start_date: new_booking.start_date,
            end_date: new_booking.end_date,
            pickup_time: new_booking.pickup_time,
            dropoff_time: new_booking.dropoff_time,
            booking_amount_paise: new_booking.booking_amount_paise,
            security_deposit_paise: new_booking.security_deposit_paise,
            damage_charges_paise: 0,
            late_fee_paise: 0,
            extension_fee_paise: 0,
            total_amount_paise: 0,
            paid_amount_paise: 0,
            payment_status: PaymentStatus::Pending,
            status: new_booking.initial_status,
            rental_purpose: new_booking.rental_purpose,
            destination: new_booking.destination,
            estimated_distance_km: new_booking.estimated_distance_km,
            start_odometer: new_booking.start_odometer,
            end_odometer: None,
            fuel_level: None,
            next_payment_date: None,
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            row_version: 0,
        };
        booking.recompute_derived();

        let advance = if new_booking.advance_amount_paise > 0 {
            let plan = plan_payment(&booking, new_booking.advance_amount_paise)?;
            booking.paid_amount_paise = plan.new_paid_amount_paise;
            booking.payment_status = plan.new_payment_status;

            // validate_new_booking guarantees the mode is present.
            new_booking.advance_payment_mode.map(|mode| Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                mode,
                amount_paise: new_booking.advance_amount_paise,
                note: Some("Advance at booking".to_string()),
                created_by: actor.to_string(),
                created_at: now,
            })
        } else {
            None
        };

        let stored = self.store.create_booking(&booking, advance.as_ref()).await?;

        info!(
            booking_id = %stored.id,
            booking_code = %stored.booking_code,
            customer_id = %stored.customer_id,
            total = %stored.total_amount(),
            "Booking created"
        );

        self.dispatch(
            NotifyEvent::BookingCreated,
            &stored,
            json!({
                "status": stored.status,
                "start_date": stored.start_date,
                "end_date": stored.end_date,
                "total_amount_paise": stored.total_amount_paise,
                "paid_amount_paise": stored.paid_amount_paise,
            }),
        )
        .await;

        Ok(stored)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment against a booking.
    ///
    /// Appends to the ledger and refreshes the cached paid amount and
    /// payment status in one transaction.
    pub async fn record_payment(
        &self,
        booking_id: &str,
        amount_paise: i64,
        mode: PaymentMode,
        note: Option<String>,
        actor: &str,
    ) -> EngineResult<Booking> {
        validate_actor(actor)?;

        let lock = self.locks.lock_for(booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.require_booking(booking_id).await?;
        let plan = plan_payment(&booking, amount_paise)?;

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            mode,
            amount_paise,
            note,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };

        let stored = self.store.record_payment(&booking, &payment, &plan).await?;

        info!(
            booking_code = %stored.booking_code,
            amount = %payment.amount(),
            mode = ?mode,
            payment_status = ?stored.payment_status,
            "Payment recorded"
        );

        self.dispatch(
            NotifyEvent::BookingUpdated,
            &stored,
            json!({
                "change": "payment",
                "amount_paise": amount_paise,
                "mode": mode,
                "payment_status": stored.payment_status,
                "pending_paise": stored.pending_amount().paise(),
            }),
        )
        .await;

        Ok(stored)
    }

    // =========================================================================
    // Extension
    // =========================================================================

    /// Extends a running booking to a later end date.
    ///
    /// "Today" for the extension window is the IST calendar date of now.
    /// An extension that leaves a balance must carry a next payment date;
    /// the planner enforces this.
    pub async fn extend_booking(
        &self,
        booking_id: &str,
        request: ExtensionRequest,
        actor: &str,
    ) -> EngineResult<Booking> {
        validate_actor(actor)?;

        let lock = self.locks.lock_for(booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.require_booking(booking_id).await?;
        let today = ist_date_of(Utc::now());
        let plan = plan_extension(&booking, &request, today)?;

        let now = Utc::now();
        let extension = Extension {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            previous_end_date: plan.previous_end_date,
            previous_dropoff_time: plan.previous_dropoff_time,
            new_end_date: plan.new_end_date,
            new_dropoff_time: plan.new_dropoff_time,
            additional_amount_paise: plan.additional_amount_paise,
            payment_amount_paise: plan.payment_amount_paise,
            payment_mode: plan.payment_mode,
            next_payment_date: plan.next_payment_date,
            reason: plan.reason.clone(),
            created_by: actor.to_string(),
            created_at: now,
        };

        // The planner guarantees a mode accompanies a positive payment.
        let payment = match (plan.payment_amount_paise > 0, plan.payment_mode) {
            (true, Some(mode)) => Some(Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                mode,
                amount_paise: plan.payment_amount_paise,
                note: Some("Payment with extension".to_string()),
                created_by: actor.to_string(),
                created_at: now,
            }),
            _ => None,
        };

        let stored = self
            .store
            .apply_extension(&booking, &extension, payment.as_ref(), &plan)
            .await?;

        info!(
            booking_code = %stored.booking_code,
            previous_end = %extension.previous_end_date,
            new_end = %extension.new_end_date,
            additional = %extension.additional_amount(),
            "Booking extended"
        );

        self.dispatch(
            NotifyEvent::BookingExtended,
            &stored,
            json!({
                "previous_end_date": extension.previous_end_date,
                "new_end_date": extension.new_end_date,
                "additional_amount_paise": extension.additional_amount_paise,
                "payment_amount_paise": extension.payment_amount_paise,
                "payment_status": stored.payment_status,
                "next_payment_date": stored.next_payment_date,
            }),
        )
        .await;

        Ok(stored)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Completes a booking at vehicle return.
    ///
    /// Bills return fees, collects the settlement for the pre-return
    /// balance, records damage, and flips the booking to `completed`.
    /// Returns the stored booking and the desk-facing summary.
    pub async fn complete_booking(
        &self,
        booking_id: &str,
        request: CompletionRequest,
        actor: &str,
    ) -> EngineResult<(Booking, CompletionSummary)> {
        validate_actor(actor)?;

        let lock = self.locks.lock_for(booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.require_booking(booking_id).await?;
        let plan = plan_completion(&booking, &request)?;

        let now = Utc::now();
        let settlement = match (plan.settlement_paise > 0, plan.settlement_mode) {
            (true, Some(mode)) => Some(Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                mode,
                amount_paise: plan.settlement_paise,
                note: Some("Settlement at return".to_string()),
                created_by: actor.to_string(),
                created_at: now,
            }),
            _ => None,
        };

        let damage = plan.damage_record.as_ref().map(|draft| DamageRecord {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            description: draft.description.clone(),
            charges_paise: draft.charges_paise,
            created_by: actor.to_string(),
            created_at: now,
        });

        let stored = self
            .store
            .apply_completion(&booking, &plan, settlement.as_ref(), damage.as_ref(), actor, now)
            .await?;

        info!(
            booking_code = %stored.booking_code,
            settlement = plan.settlement_paise,
            deposit_refund = plan.summary.deposit_refund_paise,
            pending_after = plan.summary.pending_after_paise,
            "Booking completed"
        );

        self.dispatch(
            NotifyEvent::BookingCompleted,
            &stored,
            json!({ "summary": plan.summary }),
        )
        .await;

        Ok((stored, plan.summary))
    }

    // =========================================================================
    // Cancellation & Status Progression
    // =========================================================================

    /// Cancels a booking. Amounts are left as they stand; refunds are a
    /// desk decision recorded elsewhere.
    pub async fn cancel_booking(&self, booking_id: &str, actor: &str) -> EngineResult<Booking> {
        validate_actor(actor)?;

        let lock = self.locks.lock_for(booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.require_booking(booking_id).await?;
        plan_cancellation(&booking)?;

        let mut cancelled = booking.clone();
        cancelled.status = BookingStatus::Cancelled;
        cancelled.updated_by = actor.to_string();
        cancelled.updated_at = Utc::now();

        let stored = self.store.update_booking(&cancelled).await?;

        info!(booking_code = %stored.booking_code, "Booking cancelled");

        self.dispatch(
            NotifyEvent::BookingUpdated,
            &stored,
            json!({ "change": "cancelled" }),
        )
        .await;

        Ok(stored)
    }

    /// Moves a booking one step forward: pending → confirmed → in_use.
    ///
    /// Completion does not pass through here; it has its own settlement
    /// path in [`Self::complete_booking`].
    pub async fn transition_booking(
        &self,
        booking_id: &str,
        next: BookingStatus,
        actor: &str,
    ) -> EngineResult<Booking> {
        validate_actor(actor)?;

        let lock = self.locks.lock_for(booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.require_booking(booking_id).await?;
        plan_transition(&booking, next)?;

        let mut updated = booking.clone();
        updated.status = next;
        updated.updated_by = actor.to_string();
        updated.updated_at = Utc::now();

        let stored = self.store.update_booking(&updated).await?;

        info!(
            booking_code = %stored.booking_code,
            status = %stored.status,
            "Booking status changed"
        );

        self.dispatch(
            NotifyEvent::BookingUpdated,
            &stored,
            json!({ "change": "status", "status": stored.status }),
        )
        .await;

        Ok(stored)
    }

    // =========================================================================
    // Fees & Reads
    // =========================================================================

    /// Quotes the late and extension fees for returning at `actual_return`,
    /// using the configured fee policy. Pure quote - nothing is written.
    pub async fn assess_return_fees(
        &self,
        booking_id: &str,
        actual_return: NaiveDateTime,
    ) -> EngineResult<FeeBreakdown> {
        let booking = self.require_booking(booking_id).await?;
        let breakdown = fees::assess(
            &self.config.fees,
            Some(booking.expected_return()),
            actual_return,
        )?;
        Ok(breakdown)
    }

    /// Loads a booking or fails with `BookingNotFound`.
    pub async fn get_booking(&self, booking_id: &str) -> EngineResult<Booking> {
        self.require_booking(booking_id).await
    }

    /// Total received for a booking, summed from the payments ledger.
    pub async fn paid_to_date(&self, booking_id: &str) -> EngineResult<Money> {
        let booking = self.require_booking(booking_id).await?;
        let total = self.store.paid_to_date(&booking.id).await?;
        Ok(Money::from_paise(total))
    }

    /// Cross-checks the payments ledger against the cached paid amount.
    ///
    /// Drift is reported, never auto-corrected: a disagreement means a
    /// write-path bug, and papering over it would hide the evidence.
    pub async fn reconcile_ledger(&self, booking_id: &str) -> EngineResult<LedgerReconciliation> {
        let booking = self.require_booking(booking_id).await?;
        let ledger_total_paise = self.store.paid_to_date(&booking.id).await?;

        let report = LedgerReconciliation {
            booking_id: booking.id.clone(),
            ledger_total_paise,
            cached_paid_paise: booking.paid_amount_paise,
        };

        if !report.is_consistent() {
            warn!(
                booking_code = %booking.booking_code,
                ledger = report.ledger_total_paise,
                cached = report.cached_paid_paise,
                drift = report.drift_paise(),
                "Ledger and cached paid amount disagree"
            );
        }

        Ok(report)
    }

    /// Assembles the full statement: booking, payments, extensions, damage.
    pub async fn booking_statement(&self, booking_id: &str) -> EngineResult<BookingStatement> {
        let booking = self.require_booking(booking_id).await?;
        let payments = self.store.payments_for(&booking.id).await?;
        let extensions = self.store.extensions_for(&booking.id).await?;
        let damage_records = self.store.damage_records_for(&booking.id).await?;
        let pending_paise = booking.pending_amount().paise();

        Ok(BookingStatement {
            booking,
            payments,
            extensions,
            damage_records,
            pending_paise,
        })
    }

    /// Lists bookings, newest first, optionally filtered by status.
    pub async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
    ) -> EngineResult<Vec<Booking>> {
        Ok(self.store.list_bookings(status).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require_booking(&self, booking_id: &str) -> EngineResult<Booking> {
        self.store
            .load_booking(booking_id)
            .await?
            .ok_or_else(|| EngineError::Core(CoreError::BookingNotFound(booking_id.to_string())))
    }

    /// Announces a lifecycle event. Best-effort: the mutation has already
    /// committed, so delivery failures are logged and swallowed.
    async fn dispatch(&self, event: NotifyEvent, booking: &Booking, payload: serde_json::Value) {
        if !self.config.notifications.enabled {
            return;
        }

        let message = NotifyMessage {
            event,
            booking_id: booking.id.clone(),
            booking_code: booking.booking_code.clone(),
            payload,
            sent_at: Utc::now(),
        };

        if let Err(e) = self.notifier.notify(&message).await {
            warn!(
                event = %message.event,
                booking_id = %message.booking_id,
                "Notification delivery failed: {}",
                e
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifySettings;
    use crate::notify::ChannelNotifier;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use rentdesk_core::RentalPurpose;
    use rentdesk_db::{Database, DbConfig};
    use tokio::sync::mpsc;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Desk dates are anchored on the IST today so the extension window
    /// (which the engine anchors on the wall clock) behaves the same on
    /// any day the suite runs.
    fn today() -> NaiveDate {
        ist_date_of(Utc::now())
    }

    fn desk_booking(initial_status: BookingStatus) -> NewBooking {
        NewBooking {
            customer_id: "cust-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            start_date: today(),
            end_date: today() + Duration::days(3),
            pickup_time: time(10, 0),
            dropoff_time: time(18, 0),
            booking_amount_paise: 200_000,
            security_deposit_paise: 100_000,
            advance_amount_paise: 0,
            advance_payment_mode: None,
            rental_purpose: RentalPurpose::Local,
            destination: None,
            estimated_distance_km: None,
            start_odometer: None,
            initial_status,
        }
    }

    async fn engine() -> (
        BookingEngine<Database, ChannelNotifier>,
        mpsc::Receiver<NotifyMessage>,
    ) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (notifier, rx) = ChannelNotifier::new(16);
        (BookingEngine::new(db, notifier), rx)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_booking_assigns_code_and_records_advance() {
        let (engine, mut rx) = engine().await;

        let mut request = desk_booking(BookingStatus::Confirmed);
        request.advance_amount_paise = 60_000;
        request.advance_payment_mode = Some(PaymentMode::Upi);

        let booking = engine.create_booking(request, "operator-1").await.unwrap();

        assert!(booking.booking_code.starts_with("BK-"));
        assert!(booking.booking_code.ends_with("-0001"));
        assert_eq!(booking.total_amount_paise, 300_000);
        assert_eq!(booking.paid_amount_paise, 60_000);
        assert_eq!(booking.payment_status, PaymentStatus::Partial);

        // The advance is on the ledger, not just the cache.
        let paid = engine.paid_to_date(&booking.id).await.unwrap();
        assert_eq!(paid.paise(), 60_000);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, NotifyEvent::BookingCreated);
        assert_eq!(event.booking_code, booking.booking_code);
    }

    #[tokio::test]
    async fn test_create_booking_rejects_advance_beyond_total() {
        let (engine, _rx) = engine().await;

        let mut request = desk_booking(BookingStatus::Confirmed);
        request.advance_amount_paise = 300_001;
        request.advance_payment_mode = Some(PaymentMode::Cash);

        let err = engine
            .create_booking(request, "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Overpayment { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_booking_rejects_unknown_actor() {
        let (engine, _rx) = engine().await;

        let err = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "  ")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();

        // ₹1,500 of ₹3,000 → partial
        let after_first = engine
            .record_payment(&booking.id, 150_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();
        assert_eq!(after_first.paid_amount_paise, 150_000);
        assert_eq!(after_first.payment_status, PaymentStatus::Partial);
        assert_eq!(after_first.pending_amount().paise(), 150_000);

        // The remaining ₹1,500 → full
        let after_second = engine
            .record_payment(&booking.id, 150_000, PaymentMode::Upi, None, "operator-1")
            .await
            .unwrap();
        assert_eq!(after_second.paid_amount_paise, 300_000);
        assert_eq!(after_second.payment_status, PaymentStatus::Full);
        assert_eq!(after_second.pending_amount().paise(), 0);

        let paid = engine.paid_to_date(&booking.id).await.unwrap();
        assert_eq!(paid.paise(), 300_000);
    }

    #[tokio::test]
    async fn test_exact_remainder_reaches_full() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();

        engine
            .record_payment(&booking.id, 120_000, PaymentMode::Card, None, "operator-1")
            .await
            .unwrap();

        let remainder = 300_000 - 120_000;
        let settled = engine
            .record_payment(&booking.id, remainder, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();
        assert_eq!(settled.payment_status, PaymentStatus::Full);
    }

    #[tokio::test]
    async fn test_zero_and_overpayment_rejected_without_mutation() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();

        let err = engine
            .record_payment(&booking.id, 0, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidAmount { .. })
        ));

        let err = engine
            .record_payment(&booking.id, 300_001, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Overpayment { .. })
        ));

        // Nothing landed.
        let reloaded = engine.get_booking(&booking.id).await.unwrap();
        assert_eq!(reloaded.paid_amount_paise, 0);
        assert_eq!(reloaded.row_version, booking.row_version);
        assert_eq!(engine.paid_to_date(&booking.id).await.unwrap().paise(), 0);
    }

    #[tokio::test]
    async fn test_payment_rejected_for_missing_booking() {
        let (engine, _rx) = engine().await;
        let err = engine
            .record_payment("no-such-id", 10_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    // -------------------------------------------------------------------------
    // Extension
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_extension_on_credit_requires_next_payment_date() {
        let (engine, mut rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::InUse), "operator-1")
            .await
            .unwrap();
        let _created = rx.recv().await.unwrap();

        // Settle the original booking in full; the extension alone creates
        // the new balance.
        engine
            .record_payment(&booking.id, 300_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();
        let _updated = rx.recv().await.unwrap();

        // ₹500 more rental, only ₹200 collected, no follow-up date → rejected
        let request = ExtensionRequest {
            new_end_date: booking.end_date + Duration::days(2),
            new_dropoff_time: None,
            additional_amount_paise: 50_000,
            payment_amount_paise: 20_000,
            payment_mode: Some(PaymentMode::Cash),
            next_payment_date: None,
            reason: Some("Trip ran long".to_string()),
        };
        let err = engine
            .extend_booking(&booking.id, request.clone(), "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ExtensionValidation { .. })
        ));

        // Same request with a follow-up date → accepted
        let request = ExtensionRequest {
            next_payment_date: Some(today() + Duration::days(2)),
            ..request
        };
        let extended = engine
            .extend_booking(&booking.id, request, "operator-1")
            .await
            .unwrap();

        assert_eq!(extended.end_date, booking.end_date + Duration::days(2));
        assert_eq!(extended.booking_amount_paise, 250_000);
        assert_eq!(extended.total_amount_paise, 350_000);
        assert_eq!(extended.paid_amount_paise, 320_000);
        assert_eq!(extended.payment_status, PaymentStatus::Partial);
        assert_eq!(extended.next_payment_date, Some(today() + Duration::days(2)));

        let statement = engine.booking_statement(&booking.id).await.unwrap();
        assert_eq!(statement.extensions.len(), 1);
        assert_eq!(statement.payments.len(), 2);
        assert_eq!(statement.pending_paise, 30_000);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, NotifyEvent::BookingExtended);
        assert_eq!(event.payload["additional_amount_paise"], 50_000);
    }

    #[tokio::test]
    async fn test_fully_paid_extension_needs_no_follow_up() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::InUse), "operator-1")
            .await
            .unwrap();
        engine
            .record_payment(&booking.id, 300_000, PaymentMode::Upi, None, "operator-1")
            .await
            .unwrap();

        let request = ExtensionRequest {
            new_end_date: booking.end_date + Duration::days(1),
            new_dropoff_time: Some(time(20, 0)),
            additional_amount_paise: 50_000,
            payment_amount_paise: 50_000,
            payment_mode: Some(PaymentMode::Upi),
            next_payment_date: None,
            reason: None,
        };
        let extended = engine
            .extend_booking(&booking.id, request, "operator-1")
            .await
            .unwrap();

        assert_eq!(extended.payment_status, PaymentStatus::Full);
        assert_eq!(extended.dropoff_time, time(20, 0));
        assert_eq!(extended.next_payment_date, None);
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_completion_with_return_fees_leaves_balance() {
        let (engine, mut rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::InUse), "operator-1")
            .await
            .unwrap();
        engine
            .record_payment(&booking.id, 300_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();
        let _ = rx.recv().await.unwrap();
        let _ = rx.recv().await.unwrap();

        // ₹300 damage + ₹100 late fee, billed at return on credit
        let request = CompletionRequest {
            damage_charges_paise: 30_000,
            damage_description: Some("Scratched left door".to_string()),
            late_fee_paise: 10_000,
            extension_fee_paise: 0,
            final_payment_mode: None,
            odometer_reading: None,
            fuel_level: None,
        };
        let (completed, summary) = engine
            .complete_booking(&booking.id, request, "operator-1")
            .await
            .unwrap();

        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.total_amount_paise, 340_000);
        assert_eq!(completed.paid_amount_paise, 300_000);
        assert_eq!(completed.payment_status, PaymentStatus::Partial);
        assert_eq!(completed.pending_amount().paise(), 40_000);

        assert_eq!(summary.settlement_paise, 0);
        assert_eq!(summary.pending_after_paise, 40_000);
        assert_eq!(summary.rental_charges_paise, 240_000);
        assert_eq!(summary.deposit_refund_paise, 60_000);

        let statement = engine.booking_statement(&booking.id).await.unwrap();
        assert_eq!(statement.damage_records.len(), 1);
        assert_eq!(statement.damage_records[0].charges_paise, 30_000);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, NotifyEvent::BookingCompleted);
        assert_eq!(event.payload["summary"]["pending_after_paise"], 40_000);
    }

    #[tokio::test]
    async fn test_completion_collects_settlement() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::InUse), "operator-1")
            .await
            .unwrap();
        engine
            .record_payment(&booking.id, 100_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();

        // ₹2,000 outstanding; a mode is mandatory for the settlement
        let request = CompletionRequest {
            damage_charges_paise: 0,
            damage_description: None,
            late_fee_paise: 0,
            extension_fee_paise: 0,
            final_payment_mode: None,
            odometer_reading: None,
            fuel_level: None,
        };
        let err = engine
            .complete_booking(&booking.id, request.clone(), "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidInput { .. })
        ));

        let request = CompletionRequest {
            final_payment_mode: Some(PaymentMode::Card),
            ..request
        };
        let (completed, summary) = engine
            .complete_booking(&booking.id, request, "operator-1")
            .await
            .unwrap();

        assert_eq!(summary.settlement_paise, 200_000);
        assert_eq!(completed.paid_amount_paise, 300_000);
        assert_eq!(completed.payment_status, PaymentStatus::Full);

        // Settlement landed on the ledger.
        let statement = engine.booking_statement(&booking.id).await.unwrap();
        assert_eq!(statement.payments.len(), 2);
        assert_eq!(statement.payments[1].amount_paise, 200_000);
    }

    #[tokio::test]
    async fn test_completion_rejected_unless_in_use() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();

        let request = CompletionRequest {
            damage_charges_paise: 30_000,
            damage_description: Some("Dent".to_string()),
            late_fee_paise: 10_000,
            extension_fee_paise: 0,
            final_payment_mode: Some(PaymentMode::Cash),
            odometer_reading: None,
            fuel_level: None,
        };
        let err = engine
            .complete_booking(&booking.id, request, "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidStateTransition { .. })
        ));

        // Nothing mutated: status, amounts, history all untouched.
        let reloaded = engine.get_booking(&booking.id).await.unwrap();
        assert_eq!(reloaded.status, BookingStatus::Confirmed);
        assert_eq!(reloaded.total_amount_paise, 300_000);
        assert_eq!(reloaded.damage_charges_paise, 0);
        assert!(reloaded.completed_at.is_none());

        let statement = engine.booking_statement(&booking.id).await.unwrap();
        assert!(statement.damage_records.is_empty());
    }

    // -------------------------------------------------------------------------
    // Cancellation & Transitions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cancel_booking_keeps_amounts() {
        let (engine, _rx) = engine().await;
        let mut request = desk_booking(BookingStatus::Confirmed);
        request.advance_amount_paise = 60_000;
        request.advance_payment_mode = Some(PaymentMode::Cash);
        let booking = engine.create_booking(request, "operator-1").await.unwrap();

        let cancelled = engine.cancel_booking(&booking.id, "operator-2").await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.paid_amount_paise, 60_000);
        assert_eq!(cancelled.updated_by, "operator-2");

        // Terminal: a second cancel is rejected.
        let err = engine
            .cancel_booking(&booking.id, "operator-2")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_transitions_walk_the_state_machine() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::Pending), "operator-1")
            .await
            .unwrap();

        // Skipping ahead is rejected.
        let err = engine
            .transition_booking(&booking.id, BookingStatus::InUse, "operator-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidStateTransition { .. })
        ));

        let confirmed = engine
            .transition_booking(&booking.id, BookingStatus::Confirmed, "operator-1")
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let in_use = engine
            .transition_booking(&booking.id, BookingStatus::InUse, "operator-1")
            .await
            .unwrap();
        assert_eq!(in_use.status, BookingStatus::InUse);
    }

    // -------------------------------------------------------------------------
    // Fees & Reconciliation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_assess_return_fees_uses_configured_rates() {
        let (engine, _rx) = engine().await;
        let booking = engine
            .create_booking(desk_booking(BookingStatus::InUse), "operator-1")
            .await
            .unwrap();

        let expected = booking.expected_return();

        // 10 minutes late is inside the grace window.
        let on_time = engine
            .assess_return_fees(&booking.id, expected + Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(on_time.late_fee_paise, 0);
        assert_eq!(on_time.minutes_late, 0);

        // 2 hours late → hourly rate.
        let late = engine
            .assess_return_fees(&booking.id, expected + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(late.late_fee_paise, 20_000);
        assert_eq!(late.extension_fee_paise, 0);
    }

    #[tokio::test]
    async fn test_ledger_reconciles_after_mixed_activity() {
        let (engine, _rx) = engine().await;
        let mut request = desk_booking(BookingStatus::InUse);
        request.advance_amount_paise = 50_000;
        request.advance_payment_mode = Some(PaymentMode::Upi);
        let booking = engine.create_booking(request, "operator-1").await.unwrap();

        engine
            .record_payment(&booking.id, 100_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();

        // Reads are idempotent and agree with the cache.
        let first = engine.paid_to_date(&booking.id).await.unwrap();
        let second = engine.paid_to_date(&booking.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.paise(), 150_000);

        let report = engine.reconcile_ledger(&booking.id).await.unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.drift_paise(), 0);
        assert_eq!(report.ledger_total_paise, 150_000);
    }

    #[tokio::test]
    async fn test_list_bookings_filters_by_status() {
        let (engine, _rx) = engine().await;
        engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();
        let second = engine
            .create_booking(desk_booking(BookingStatus::Pending), "operator-1")
            .await
            .unwrap();

        let all = engine.list_bookings(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let pending = engine
            .list_bookings(Some(BookingStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _message: &NotifyMessage) -> EngineResult<()> {
            Err(EngineError::NotificationFailed("transport down".into()))
        }
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_the_operation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = BookingEngine::new(db, FailingNotifier);

        let booking = engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();
        let updated = engine
            .record_payment(&booking.id, 50_000, PaymentMode::Cash, None, "operator-1")
            .await
            .unwrap();

        // Both mutations committed despite the dead transport.
        assert_eq!(updated.paid_amount_paise, 50_000);
    }

    #[tokio::test]
    async fn test_notifications_can_be_disabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (notifier, mut rx) = ChannelNotifier::new(16);
        let config = EngineConfig {
            notifications: NotifySettings {
                enabled: false,
                ..NotifySettings::default()
            },
            ..EngineConfig::default()
        };
        let engine = BookingEngine::with_config(db, notifier, config);

        engine
            .create_booking(desk_booking(BookingStatus::Confirmed), "operator-1")
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }
}
