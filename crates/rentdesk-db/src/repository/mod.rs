//! # Repository Module
//!
//! Database repository implementations for RentDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine Operation                                                      │
//! │       │                                                                 │
//! │       │  db.bookings().record_payment(&booking, &payment, &plan)       │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── create(&self, booking, advance)                                   │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── record_payment(&self, booking, payment, plan)                     │
//! │  └── apply_extension(&self, booking, extension, payment, plan)         │
//! │       │                                                                 │
//! │       │  SQL transaction (BEGIN ... COMMIT)                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-row operations are atomic                                     │
//! │  • Version guards live next to the UPDATEs they protect               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`booking::BookingRepository`] - Booking rows + transactional composites
//! - [`ledger::LedgerRepository`] - Payment ledger reads
//! - [`history::HistoryRepository`] - Extension and damage history reads

pub mod booking;
pub mod history;
pub mod ledger;
