use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use pks_common::Cents;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CancelledBooking, NewBooking, UserStatus},
    events::{EventProducers, PaymentRequestedEvent},
    helpers::parse_booking_time,
    traits::{AccountManagement, Analytics, ReservationDatabase, ReservationError, SweepSummary},
};

/// What the caller gets back from a successful booking: the identifiers to show the user, and the amount
/// the payment agent will invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking_id: i64,
    pub spot_number: i64,
    pub amount: Cents,
}

/// `BookingFlowApi` is the availability coordinator: the single owner of the booking lifecycle and the
/// spot-availability state machine. Every transition (creation, user cancellation, admin release and the
/// sweeper's reclaims) goes through here.
pub struct BookingFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for BookingFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BookingFlowApi")
    }
}

impl<B> BookingFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> BookingFlowApi<B>
where B: ReservationDatabase + Analytics + AccountManagement
{
    /// Creates a booking.
    ///
    /// Validates the time window, refuses black-listed users, prices the window from the location's
    /// average hourly rate, and hands the storage backend the atomic reserve-and-insert. On success a
    /// `PaymentRequestedEvent` is published for the payment agent. Publication is best-effort: the
    /// booking stands even if no subscriber hears about it, because the sweeper will reclaim it if
    /// payment never arrives.
    pub async fn create_booking(&self, request: NewBooking) -> Result<BookingReceipt, ReservationError> {
        let start = parse_booking_time(&request.start_time)
            .map_err(|e| ReservationError::InvalidTimeRange(e.to_string()))?;
        let end =
            parse_booking_time(&request.end_time).map_err(|e| ReservationError::InvalidTimeRange(e.to_string()))?;
        if end <= start {
            return Err(ReservationError::InvalidTimeRange("end time must be after start time".to_string()));
        }
        let user = self
            .db
            .fetch_user_by_id(request.user_id)
            .await
            .map_err(|e| ReservationError::DatabaseError(e.to_string()))?;
        if user.map(|u| u.status) == Some(UserStatus::Black) {
            return Err(ReservationError::UserBlacklisted);
        }
        let duration_minutes = (end - start).num_seconds() as f64 / 60.0;
        let prices = self.db.fetch_location_prices().await?;
        let rate = prices
            .iter()
            .find(|p| p.address == request.address)
            .ok_or_else(|| ReservationError::LocationNotFound(request.address.clone()))?;
        let amount = Cents::from_fractional(duration_minutes * rate.price_per_minute * 100.0);
        let user_id = request.user_id;
        let (booking, spot_number) = self.db.create_booking(request).await?;
        debug!("🔄️📦️ Booking [{}] committed. Invoice amount is {amount}", booking.id);
        self.call_payment_requested_hook(user_id, booking.id, amount).await;
        Ok(BookingReceipt { booking_id: booking.id, spot_number, amount })
    }

    async fn call_payment_requested_hook(&self, user_id: i64, booking_id: i64, amount: Cents) {
        for emitter in &self.producers.payment_requested_producer {
            debug!("🔄️💰️ Notifying payment-requested hook subscribers for booking {booking_id}");
            let event = PaymentRequestedEvent::new(user_id, booking_id, amount);
            emitter.publish_event(event).await;
        }
    }

    /// User-initiated cancellation. Allowed up to 24 hours before the booking starts; the vehicle rows
    /// registered against the booking are deleted outright (the admin path only detaches them).
    pub async fn cancel_booking(&self, booking_id: i64) -> Result<(), ReservationError> {
        self.db.cancel_booking_for_user(booking_id, Utc::now().naive_utc()).await
    }

    /// Admin-initiated availability override. Freeing an occupied spot cancels each user's most recent
    /// booking on it (audit rows returned); occupying a spot is a bare flag flip with no booking side
    /// effects.
    pub async fn set_spot_availability(
        &self,
        spot_id: i64,
        available: bool,
    ) -> Result<Vec<CancelledBooking>, ReservationError> {
        if available {
            self.db.release_spot(spot_id).await
        } else {
            self.db.occupy_spot(spot_id).await?;
            Ok(Vec::new())
        }
    }

    pub async fn update_spot_price(&self, spot_id: i64, price: Cents) -> Result<(), ReservationError> {
        self.db.update_spot_price(spot_id, price).await
    }

    /// One sweeper cycle: reclaim unpaid bookings older than `grace`, then reclaim bookings whose window
    /// has lapsed. The two passes are independent and unordered.
    pub async fn sweep_expired_bookings(&self, grace: Duration) -> Result<SweepSummary, ReservationError> {
        self.db.sweep(grace, Utc::now().naive_utc()).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
