//! Payment correlation between booking creation and the external payment agent.
//!
//! Booking creation and payment collection happen on different surfaces (a browser and a chat bot), so the
//! facts a payment needs (who owes what for which booking) travel through the event channel and land
//! here. The stores in this module are the only in-process shared mutable state in the system, and both
//! have explicit semantics: bounded capacity, last-write-wins per user, exact-key lookup.
//!
//! A lookup miss means "not yet available". Callers that can afford to wait use [`PaymentCorrelation::wait_for`],
//! which parks on a notification with a bounded timeout rather than polling.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;
use pks_common::Cents;
use serde::{Deserialize, Serialize};
use tokio::{sync::Notify, time::Instant};

pub const DEFAULT_CORRELATION_CAPACITY: usize = 256;

/// What the payment agent needs to know to collect on one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInvoice {
    pub booking_id: i64,
    pub amount: Cents,
}

#[derive(Debug)]
struct Entry {
    seq: u64,
    invoice: PendingInvoice,
}

#[derive(Debug, Default)]
struct CacheState {
    next_seq: u64,
    entries: HashMap<i64, Entry>,
}

/// A bounded, last-write-wins map from user id to that user's pending invoice.
///
/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct PaymentCorrelation {
    capacity: usize,
    state: Arc<Mutex<CacheState>>,
    notify: Arc<Notify>,
}

impl Default for PaymentCorrelation {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CORRELATION_CAPACITY)
    }
}

impl PaymentCorrelation {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Arc::new(Mutex::new(CacheState::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Records the pending invoice for a user, replacing any previous one. At capacity, the entry that has
    /// gone longest without being written is evicted.
    pub fn insert(&self, user_id: i64, invoice: PendingInvoice) {
        {
            let mut state = self.state.lock().unwrap();
            let seq = state.next_seq;
            state.next_seq += 1;
            if !state.entries.contains_key(&user_id) && state.entries.len() >= self.capacity {
                if let Some(oldest) = state.entries.iter().min_by_key(|(_, e)| e.seq).map(|(uid, _)| *uid) {
                    warn!("💳️ Correlation cache full. Evicting pending invoice for user {oldest}");
                    state.entries.remove(&oldest);
                }
            }
            state.entries.insert(user_id, Entry { seq, invoice });
        }
        self.notify.notify_waiters();
    }

    /// Exact-key lookup. A miss is "not yet available", never "try another user's entry".
    pub fn get(&self, user_id: i64) -> Option<PendingInvoice> {
        let state = self.state.lock().unwrap();
        state.entries.get(&user_id).map(|e| e.invoice)
    }

    pub fn remove(&self, user_id: i64) -> Option<PendingInvoice> {
        let mut state = self.state.lock().unwrap();
        state.entries.remove(&user_id).map(|e| e.invoice)
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits up to `timeout` for a pending invoice for `user_id` to arrive. The wait is bounded and
    /// signal-driven; the notification is registered before the map is checked so a concurrent insert
    /// cannot be missed.
    pub async fn wait_for(&self, user_id: i64, timeout: Duration) -> Option<PendingInvoice> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            if let Some(invoice) = self.get(user_id) {
                return Some(invoice);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if tokio::time::timeout(remaining, notified).await.is_err() {
                debug!("💳️ Timed out waiting for a pending invoice for user {user_id}");
                return None;
            }
        }
    }
}

/// Tracks each user's most recent booking id so a vehicle registered straight after booking can be
/// attached to it. Entries survive payment; they are only replaced by the next booking.
#[derive(Clone, Default)]
pub struct LatestBookings {
    entries: Arc<Mutex<HashMap<i64, i64>>>,
}

impl LatestBookings {
    pub fn record(&self, user_id: i64, booking_id: i64) {
        self.entries.lock().unwrap().insert(user_id, booking_id);
    }

    pub fn get(&self, user_id: i64) -> Option<i64> {
        self.entries.lock().unwrap().get(&user_id).copied()
    }

    pub fn forget(&self, user_id: i64) {
        self.entries.lock().unwrap().remove(&user_id);
    }
}
