//! # rentdesk-db: Database Layer for RentDesk
//!
//! This crate provides database access for the RentDesk rental engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RentDesk Data Flow                                │
//! │                                                                         │
//! │  Engine Operation (record_payment)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    rentdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (booking.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ BookingRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ LedgerRepo    │    │ 002_idx.sql  │  │   │
//! │  │   │ Management    │    │ HistoryRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   rentals.db (WAL mode, foreign keys on)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (booking, ledger, history)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rentdesk_db::{Database, DbConfig};
//!
//! // Create database with default config (migrations run on startup)
//! let config = DbConfig::new("path/to/rentals.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let booking = db.bookings().get_by_code("BK-20260821-0001").await?;
//! let paid = db.ledger().paid_to_date(&booking_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::history::HistoryRepository;
pub use repository::ledger::LedgerRepository;
