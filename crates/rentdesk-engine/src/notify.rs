//! # Notification Dispatch
//!
//! Booking lifecycle events fan out to interested parties (front desk
//! displays, WhatsApp glue, audit sinks) through the [`Notifier`] trait.
//!
//! ## Delivery Model
//! ```text
//! ┌──────────────┐   NotifyMessage    ┌──────────────┐
//! │ BookingEngine│ ──────────────────▶│   Notifier   │
//! │  (dispatch)  │    best effort     │ Log/Channel  │
//! └──────────────┘                    └──────────────┘
//! ```
//!
//! Delivery is best-effort by design: a notification failure is logged and
//! swallowed at the dispatch site. The booking mutation already committed;
//! nothing downstream may roll it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::NotifySettings;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Events and messages
// =============================================================================

/// Lifecycle event kinds the engine announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyEvent {
    BookingCreated,
    BookingUpdated,
    BookingExtended,
    BookingCompleted,
}

impl std::fmt::Display for NotifyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotifyEvent::BookingCreated => "BOOKING_CREATED",
            NotifyEvent::BookingUpdated => "BOOKING_UPDATED",
            NotifyEvent::BookingExtended => "BOOKING_EXTENDED",
            NotifyEvent::BookingCompleted => "BOOKING_COMPLETED",
        };
        write!(f, "{}", s)
    }
}

/// One outbound notification.
///
/// `payload` carries event-specific details (amounts, new dates, completion
/// summary) as plain JSON so transports do not need the core types.
#[derive(Debug, Clone, Serialize)]
pub struct NotifyMessage {
    pub event: NotifyEvent,
    pub booking_id: String,
    pub booking_code: String,
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

// =============================================================================
// Notifier trait
// =============================================================================

/// Delivery transport for lifecycle notifications.
///
/// Implementations should return `EngineError::NotificationFailed` on
/// delivery problems; the engine logs and continues.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &NotifyMessage) -> EngineResult<()>;
}

// =============================================================================
// Log notifier
// =============================================================================

/// Writes every notification to the tracing log. The default transport for
/// desk installs that have nothing listening yet.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        LogNotifier
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &NotifyMessage) -> EngineResult<()> {
        info!(
            event = %message.event,
            booking_id = %message.booking_id,
            booking_code = %message.booking_code,
            "Booking notification"
        );
        Ok(())
    }
}

// =============================================================================
// Channel notifier
// =============================================================================

/// Forwards notifications over a bounded mpsc channel.
///
/// The receiving half belongs to whatever delivery glue the install wires up
/// (UI refresh, messaging bridge). Dropping the receiver turns every
/// subsequent send into a `NotificationFailed`, which the engine logs and
/// ignores.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<NotifyMessage>,
}

impl ChannelNotifier {
    /// Creates the notifier and hands back the receiving end.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotifyMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelNotifier { tx }, rx)
    }

    /// Creates the notifier sized per the engine configuration.
    pub fn from_settings(settings: &NotifySettings) -> (Self, mpsc::Receiver<NotifyMessage>) {
        Self::new(settings.channel_capacity)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, message: &NotifyMessage) -> EngineResult<()> {
        self.tx
            .send(message.clone())
            .await
            .map_err(|e| EngineError::NotificationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(event: NotifyEvent) -> NotifyMessage {
        NotifyMessage {
            event,
            booking_id: "bkg-1".to_string(),
            booking_code: "BK-20260501-0001".to_string(),
            payload: json!({ "amount_paise": 150_000 }),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_wire_names() {
        assert_eq!(NotifyEvent::BookingCreated.to_string(), "BOOKING_CREATED");
        assert_eq!(NotifyEvent::BookingUpdated.to_string(), "BOOKING_UPDATED");
        assert_eq!(NotifyEvent::BookingExtended.to_string(), "BOOKING_EXTENDED");
        assert_eq!(
            NotifyEvent::BookingCompleted.to_string(),
            "BOOKING_COMPLETED"
        );
    }

    #[test]
    fn test_event_serde_matches_display() {
        let json = serde_json::to_string(&NotifyEvent::BookingExtended).unwrap();
        assert_eq!(json, "\"BOOKING_EXTENDED\"");
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier::new();
        assert!(notifier.notify(&message(NotifyEvent::BookingCreated)).await.is_ok());
    }

    #[test]
    fn test_from_settings_uses_configured_capacity() {
        let settings = NotifySettings {
            enabled: true,
            channel_capacity: 7,
        };
        let (notifier, _rx) = ChannelNotifier::from_settings(&settings);
        assert_eq!(notifier.tx.max_capacity(), 7);
    }

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        notifier
            .notify(&message(NotifyEvent::BookingCompleted))
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event, NotifyEvent::BookingCompleted);
        assert_eq!(received.booking_code, "BK-20260501-0001");
        assert_eq!(received.payload["amount_paise"], 150_000);
    }

    #[tokio::test]
    async fn test_channel_notifier_fails_after_receiver_drop() {
        let (notifier, rx) = ChannelNotifier::new(4);
        drop(rx);

        let err = notifier
            .notify(&message(NotifyEvent::BookingUpdated))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotificationFailed(_)));
    }
}
