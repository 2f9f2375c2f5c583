use pks_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{Booking, CancelledBooking};

/// Emitted after a booking has been committed. Carries exactly the facts the payment-collection agent
/// needs to raise an invoice; delivery is best-effort and never rolls back the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequestedEvent {
    pub user_id: i64,
    pub booking_id: i64,
    pub amount: Cents,
}

impl PaymentRequestedEvent {
    pub fn new(user_id: i64, booking_id: i64, amount: Cents) -> Self {
        Self { user_id, booking_id, amount }
    }
}

/// Emitted when the sweeper or an administrator reclaims a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReclaimedEvent {
    pub booking: Booking,
    pub reason: String,
}

impl BookingReclaimedEvent {
    pub fn new(booking: Booking, reason: impl Into<String>) -> Self {
        Self { booking, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentRequested(PaymentRequestedEvent),
    BookingReclaimed(BookingReclaimedEvent),
}

#[derive(Debug, Clone)]
pub struct CancellationNotice(pub CancelledBooking);
