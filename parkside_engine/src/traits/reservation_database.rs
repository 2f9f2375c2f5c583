use chrono::{Duration, NaiveDateTime};
use pks_common::Cents;
use thiserror::Error;

use crate::{
    db_types::{Booking, CancelledBooking, NewBooking},
    traits::SweepSummary,
};

/// The availability coordinator's storage contract.
///
/// A spot can hold at most one active booking, and the availability flag must flip atomically with the
/// booking row that justifies it. Implementations must serialize the check-and-flip on the spot row
/// (a compare-and-swap update or equivalent transactional isolation) so that two concurrent requests for
/// the same spot cannot both succeed.
#[allow(async_fn_in_trait)]
pub trait ReservationDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a booking in a single atomic transaction: resolves the address and (spot number, floor)
    /// pair to exactly one available spot, inserts the booking row and flips the spot to unavailable.
    ///
    /// In a location where no spot declares a floor, the floor argument is ignored.
    ///
    /// Returns the new booking together with the resolved spot number.
    async fn create_booking(&self, booking: NewBooking) -> Result<(Booking, i64), ReservationError>;

    /// User-initiated cancellation. Fails unless `now` is more than 24 hours before the booking's start
    /// time. Atomically deletes any vehicle rows registered against the booking (the user path deletes
    /// them outright; the admin path in [`Self::release_spot`] only detaches them), frees the spot and
    /// deletes the booking.
    async fn cancel_booking_for_user(&self, booking_id: i64, now: NaiveDateTime) -> Result<(), ReservationError>;

    /// Admin-initiated freeing of a spot. For each user with bookings on the spot, only that user's most
    /// recent booking is cancelled: its vehicles are detached (booking reference nulled, record kept), a
    /// cancellation audit row is written, and the booking row deleted. Finally the spot is marked
    /// available. Returns the audit rows that were written.
    async fn release_spot(&self, spot_id: i64) -> Result<Vec<CancelledBooking>, ReservationError>;

    /// Admin-initiated reservation of a spot: flips the flag to unavailable without creating a booking.
    /// A no-op when the spot is already occupied.
    async fn occupy_spot(&self, spot_id: i64) -> Result<(), ReservationError>;

    /// Updates the hourly price for a spot. Negative prices are rejected.
    async fn update_spot_price(&self, spot_id: i64, price: Cents) -> Result<(), ReservationError>;

    /// The payment-timeout sweep pass: deletes every booking older than `grace` that has no payment row,
    /// and frees its spot. The payment check runs inside the same transaction, immediately before the
    /// delete, so a payment that lands during the sweep wins.
    async fn reclaim_unpaid_bookings(&self, grace: Duration, now: NaiveDateTime)
        -> Result<Vec<Booking>, ReservationError>;

    /// The window-expiry sweep pass: deletes every booking whose end time lies in the past, paid or not,
    /// and frees its spot. End times that parse in neither accepted text format are logged and skipped.
    async fn reclaim_lapsed_bookings(&self, now: NaiveDateTime) -> Result<Vec<Booking>, ReservationError>;

    /// Runs both sweep passes, each in its own transaction, with no ordering guarantee between them.
    async fn sweep(&self, grace: Duration, now: NaiveDateTime) -> Result<SweepSummary, ReservationError> {
        let unpaid = self.reclaim_unpaid_bookings(grace, now).await?;
        let lapsed = self.reclaim_lapsed_bookings(now).await?;
        Ok(SweepSummary { unpaid, lapsed })
    }

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), ReservationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReservationError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No parking location is registered at address '{0}'")]
    LocationNotFound(String),
    #[error("Spot {spot_number} {floor_label} is unavailable or does not exist at {address}")]
    SpotUnavailable { address: String, spot_number: i64, floor_label: String },
    #[error("The requested spot (id {0}) does not exist")]
    SpotNotFound(i64),
    #[error("The requested booking (id {0}) does not exist")]
    BookingNotFound(i64),
    #[error("Bookings can only be cancelled up to 24 hours before their start time")]
    CancellationWindow,
    #[error("Price cannot be negative")]
    NegativePrice,
    #[error("Invalid booking time range: {0}")]
    InvalidTimeRange(String),
    #[error("This account has been black-listed")]
    UserBlacklisted,
}

impl From<sqlx::Error> for ReservationError {
    fn from(e: sqlx::Error) -> Self {
        ReservationError::DatabaseError(e.to_string())
    }
}
