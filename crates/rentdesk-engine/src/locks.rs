//! Per-booking write serialization.
//!
//! SQLite gives us atomicity and the version guard gives us conflict
//! detection, but two tasks mutating the same booking would still race to a
//! retry. Handing each booking its own async mutex keeps mutations on one
//! booking sequential while leaving unrelated bookings fully concurrent.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registry of per-booking mutexes, keyed by booking id.
///
/// Entries are created on first use and kept for the process lifetime; a
/// desk install sees a few thousand bookings a year, so the map stays small.
#[derive(Debug, Default)]
pub struct BookingLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for a booking, creating it on first sight.
    ///
    /// Callers hold the returned Arc and lock it for the duration of the
    /// load-plan-apply sequence.
    pub async fn lock_for(&self, booking_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(booking_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
