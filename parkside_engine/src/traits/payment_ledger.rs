use thiserror::Error;

use crate::db_types::{NewPayment, Payment};

/// The payment ledger: an append-only record of confirmed payments, keyed by booking.
///
/// The confirmation path is the only writer of new rows. Administrative reversal flips a row's status to
/// `Cancelled` in place; it is deliberately not linked to booking-level cancellation.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger {
    /// Inserts a completed payment. The external transaction id must be unique.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentApiError>;

    /// The most recent payment recorded for a booking, if any. Feeds receipt display.
    async fn fetch_payment_for_booking(&self, booking_id: i64) -> Result<Option<Payment>, PaymentApiError>;

    /// Marks the payment for a booking as `Cancelled` in place.
    async fn cancel_payment_for_booking(&self, booking_id: i64) -> Result<Payment, PaymentApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert payment, since it already exists with txid {0}")]
    PaymentAlreadyExists(String),
    #[error("No payment has been recorded for booking {0}")]
    PaymentNotFound(i64),
}

impl From<sqlx::Error> for PaymentApiError {
    fn from(e: sqlx::Error) -> Self {
        PaymentApiError::DatabaseError(e.to_string())
    }
}
