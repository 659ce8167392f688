//! # RentDesk Engine
//!
//! Booking lifecycle orchestration: validation, planning, persistence,
//! notification.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RentDesk Engine                                │
//! │                                                                         │
//! │   ┌────────────────┐      ┌─────────────────┐      ┌────────────────┐   │
//! │   │  BookingEngine │─────▶│  rentdesk-core  │      │  EngineConfig  │   │
//! │   │  orchestration │ plan │  pure planners  │      │  fees + notify │   │
//! │   └───────┬────────┘      └─────────────────┘      └────────────────┘   │
//! │           │ apply                                                       │
//! │   ┌───────▼────────┐      ┌─────────────────┐                           │
//! │   │  BookingStore  │      │    Notifier     │                           │
//! │   │  (rentdesk-db) │      │  log / channel  │                           │
//! │   └────────────────┘      └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine owns no business rules of its own: every money and state
//! decision comes from `rentdesk-core`, every write goes through the
//! [`BookingStore`] trait, and every event leaves through a [`Notifier`].

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod notify;
pub mod store;

pub use config::{EngineConfig, NotifySettings};
pub use engine::{BookingEngine, BookingStatement, LedgerReconciliation};
pub use error::{EngineError, EngineResult};
pub use locks::BookingLocks;
pub use notify::{ChannelNotifier, LogNotifier, Notifier, NotifyEvent, NotifyMessage};
pub use store::BookingStore;
