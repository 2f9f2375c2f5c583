//! `SqliteDatabase` is a concrete implementation of a Parkside reservation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
//!
//! Spot availability is the one invariant that needs cross-request isolation. Every path that flips it
//! does so inside a transaction, and booking creation specifically uses a compare-and-swap update
//! ([`spots::reserve_spot`]) so the availability check and the flag flip cannot interleave with a rival
//! booking of the same spot.
use std::fmt::Debug;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::*;
use pks_common::Cents;
use sqlx::SqlitePool;

use super::db::{analytics, bookings, cancellations, db_url, locations, new_pool, payments, spots, users, vehicles};
use crate::{
    db_types::{
        Booking,
        CancelledBooking,
        NewBooking,
        NewPayment,
        NewUser,
        NewVehicle,
        ParkingLocation,
        ParkingSpot,
        Payment,
        PaymentStatus,
        Role,
        User,
        UserStatus,
    },
    helpers::parse_booking_time,
    traits::{
        AccountApiError,
        AccountManagement,
        Analytics,
        AuthApiError,
        AuthManagement,
        BookingSummary,
        LocationBookingCount,
        LocationPrice,
        LoginIdentity,
        OccupiedLocation,
        PaymentApiError,
        PaymentLedger,
        ReservationDatabase,
        ReservationError,
        RevenueRow,
        SpotOverview,
        SpotUsage,
        UserProfile,
    },
};

const ADMIN_CANCEL_REASON: &str = "Cancelled by administrator";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database api object with a connection pool of size `max_connections` attached to
    /// the database at the canonical URL (`PKS_DATABASE_URL`, or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registers a new parking location. Seeding/admin tooling only; not part of the booking flow.
    pub async fn add_location(
        &self,
        address: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<ParkingLocation, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        locations::insert_location(address, latitude, longitude, &mut conn).await
    }

    /// Registers a new spot in a location. Seeding/admin tooling only.
    pub async fn add_spot(
        &self,
        location_id: i64,
        spot_number: i64,
        floor: Option<&str>,
        price: Cents,
    ) -> Result<ParkingSpot, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        spots::insert_spot(location_id, spot_number, floor, price, &mut conn).await
    }

    /// Promotes a user to the given role. Seeding/tooling only.
    pub async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AccountApiError> {
        let mut tx = self.pool.begin().await?;
        users::assign_role(user_id, role, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl ReservationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<(Booking, i64), ReservationError> {
        let mut tx = self.pool.begin().await?;
        let location_id = locations::fetch_location_id_by_address(&booking.address, &mut tx)
            .await?
            .ok_or_else(|| ReservationError::LocationNotFound(booking.address.clone()))?;
        // A flat location ignores whatever floor the front end sent along.
        let has_floors = spots::location_has_floors(location_id, &mut tx).await?;
        let floor = if has_floors { booking.floor.as_deref() } else { None };
        info!(
            "🅿️ Requesting spot: location={location_id}, number={}, floor={floor:?}",
            booking.spot_number
        );
        let spot = match spots::reserve_spot(location_id, booking.spot_number, floor, &mut tx).await? {
            Some(spot) => spot,
            None => {
                spots::log_reserve_miss(location_id, booking.spot_number, floor, &mut tx).await?;
                let floor_label =
                    floor.map(|f| format!("on floor {f}")).unwrap_or_else(|| "without a floor".to_string());
                return Err(ReservationError::SpotUnavailable {
                    address: booking.address,
                    spot_number: booking.spot_number,
                    floor_label,
                });
            },
        };
        let row =
            bookings::insert_booking(booking.user_id, spot.id, &booking.start_time, &booking.end_time, &mut tx)
                .await?;
        tx.commit().await?;
        info!(
            "🗃️ Booking {} created for user {}, spot {} (floor {:?})",
            row.id, booking.user_id, spot.spot_number, spot.floor
        );
        Ok((row, spot.spot_number))
    }

    async fn cancel_booking_for_user(&self, booking_id: i64, now: NaiveDateTime) -> Result<(), ReservationError> {
        let mut tx = self.pool.begin().await?;
        let booking = bookings::fetch_booking(booking_id, &mut tx)
            .await?
            .ok_or(ReservationError::BookingNotFound(booking_id))?;
        let start = parse_booking_time(&booking.start_time)
            .map_err(|e| ReservationError::InvalidTimeRange(e.to_string()))?;
        if now > start - Duration::days(1) {
            return Err(ReservationError::CancellationWindow);
        }
        let removed = vehicles::delete_vehicles_for_booking(booking_id, &mut tx).await?;
        if removed > 0 {
            debug!("🗑️ Deleted {removed} vehicle record(s) for booking {booking_id}");
        }
        spots::set_availability(booking.spot_id, true, &mut tx).await?;
        bookings::delete_booking(booking_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗑️ Booking {booking_id} cancelled by its user; spot {} freed", booking.spot_id);
        Ok(())
    }

    async fn release_spot(&self, spot_id: i64) -> Result<Vec<CancelledBooking>, ReservationError> {
        let mut tx = self.pool.begin().await?;
        spots::fetch_spot(spot_id, &mut tx).await?.ok_or(ReservationError::SpotNotFound(spot_id))?;
        let latest = bookings::latest_booking_per_user_for_spot(spot_id, &mut tx).await?;
        let mut cancellations_made = Vec::with_capacity(latest.len());
        for booking in &latest {
            let detached = vehicles::detach_vehicles_for_booking(booking.id, &mut tx).await?;
            if detached > 0 {
                info!("🚗️ Detached {detached} vehicle record(s) from booking {}", booking.id);
            }
            let audit =
                cancellations::insert_cancellation(booking.id, booking.user_id, ADMIN_CANCEL_REASON, &mut tx)
                    .await?;
            bookings::delete_booking(booking.id, &mut tx).await?;
            cancellations_made.push(audit);
        }
        spots::set_availability(spot_id, true, &mut tx).await?;
        tx.commit().await?;
        info!("🅿️ Spot {spot_id} released by admin; {} booking(s) cancelled", cancellations_made.len());
        Ok(cancellations_made)
    }

    async fn occupy_spot(&self, spot_id: i64) -> Result<(), ReservationError> {
        let mut conn = self.pool.acquire().await?;
        spots::set_availability(spot_id, false, &mut conn).await?;
        Ok(())
    }

    async fn update_spot_price(&self, spot_id: i64, price: Cents) -> Result<(), ReservationError> {
        if price.is_negative() {
            return Err(ReservationError::NegativePrice);
        }
        let mut conn = self.pool.acquire().await?;
        spots::update_price(spot_id, price, &mut conn).await?;
        info!("🅿️ Spot {spot_id} price updated to {price}");
        Ok(())
    }

    async fn reclaim_unpaid_bookings(
        &self,
        grace: Duration,
        now: NaiveDateTime,
    ) -> Result<Vec<Booking>, ReservationError> {
        let mut tx = self.pool.begin().await?;
        let all = bookings::fetch_all_bookings(&mut tx).await?;
        let mut reclaimed = Vec::new();
        for booking in all {
            if now <= booking.created_at.naive_utc() + grace {
                continue;
            }
            // The veto check runs here, inside the delete transaction: a payment that landed an instant
            // ago still saves the booking.
            if payments::exists_for_booking(booking.id, &mut tx).await? {
                continue;
            }
            info!("🕰️ Deleting expired booking {} (no payment within grace window)", booking.id);
            bookings::delete_booking(booking.id, &mut tx).await?;
            match spots::fetch_spot(booking.spot_id, &mut tx).await? {
                Some(spot) => {
                    spots::set_availability(spot.id, true, &mut tx).await?;
                },
                None => warn!("🕰️ No parking spot found for booking {}", booking.id),
            }
            reclaimed.push(booking);
        }
        tx.commit().await?;
        Ok(reclaimed)
    }

    async fn reclaim_lapsed_bookings(&self, now: NaiveDateTime) -> Result<Vec<Booking>, ReservationError> {
        let mut tx = self.pool.begin().await?;
        let all = bookings::fetch_all_bookings(&mut tx).await?;
        let mut reclaimed = Vec::new();
        for booking in all {
            let end = match parse_booking_time(&booking.end_time) {
                Ok(end) => end,
                Err(_) => {
                    error!("🕰️ Invalid end time format for booking {}: {}", booking.id, booking.end_time);
                    continue;
                },
            };
            if end >= now {
                continue;
            }
            info!("🕰️ Deleting booking {} with lapsed end time", booking.id);
            bookings::delete_booking(booking.id, &mut tx).await?;
            match spots::fetch_spot(booking.spot_id, &mut tx).await? {
                Some(spot) => {
                    spots::set_availability(spot.id, true, &mut tx).await?;
                },
                None => warn!("🕰️ No parking spot found for booking {}", booking.id),
            }
            reclaimed.push(booking);
        }
        tx.commit().await?;
        Ok(reclaimed)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn register_user(&self, user: NewUser) -> Result<i64, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let id = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_all_users(&self) -> Result<Vec<(User, Role)>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = users::fetch_all_users_with_roles(&mut conn).await?;
        Ok(result)
    }

    async fn update_user_status(&self, user_id: i64, status: UserStatus) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::update_status(user_id, status, &mut conn).await
    }

    async fn fetch_user_profile(&self, user_id: i64) -> Result<UserProfile, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user =
            users::fetch_user(user_id, &mut conn).await?.ok_or(AccountApiError::UserNotFound(user_id))?;
        let bookings = bookings::fetch_booking_summaries_for_user(user_id, &mut conn).await?;
        Ok(UserProfile { username: user.username, email: user.email, phone: user.phone, bookings })
    }

    async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<BookingSummary>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = bookings::fetch_booking_summaries_for_user(user_id, &mut conn).await?;
        Ok(result)
    }

    async fn add_vehicle(&self, vehicle: NewVehicle) -> Result<i64, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(vehicle.user_id, &mut conn)
            .await?
            .ok_or(AccountApiError::UserNotFound(vehicle.user_id))?;
        let row = vehicles::insert_vehicle(vehicle, &mut conn).await?;
        info!("🚗️ Vehicle {} registered for user {}", row.plate, row.user_id);
        Ok(row.id)
    }

    async fn consume_cancellation_notice(&self, user_id: i64) -> Result<Option<String>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let notice = cancellations::consume_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(notice)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_login_identity(&self, email: &str) -> Result<Option<LoginIdentity>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let identity = users::fetch_login_identity(email, &mut conn).await?;
        Ok(identity)
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_completed(payment, &mut conn).await
    }

    async fn fetch_payment_for_booking(&self, booking_id: i64) -> Result<Option<Payment>, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_latest_for_booking(booking_id, &mut conn).await?;
        Ok(payment)
    }

    async fn cancel_payment_for_booking(&self, booking_id: i64) -> Result<Payment, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::update_status_for_booking(booking_id, PaymentStatus::Cancelled, &mut conn).await?;
        info!("💰️ Payment for booking {booking_id} marked as cancelled by admin");
        Ok(payment)
    }
}

impl Analytics for SqliteDatabase {
    async fn fetch_all_locations(&self) -> Result<Vec<ParkingLocation>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = locations::fetch_all_locations(&mut conn).await?;
        Ok(result)
    }

    async fn fetch_spots_for_location(&self, location_id: i64) -> Result<Vec<ParkingSpot>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = spots::fetch_spots_for_location(location_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_occupied_locations(&self) -> Result<Vec<OccupiedLocation>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::occupied_locations(&mut conn).await?;
        Ok(result)
    }

    async fn fetch_spots_for_address(&self, address: &str) -> Result<Vec<SpotOverview>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::spots_for_address(address, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_location_prices(&self) -> Result<Vec<LocationPrice>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::location_prices(&mut conn).await?;
        Ok(result)
    }

    async fn bookings_per_location(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<LocationBookingCount>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::bookings_per_location(since, until, &mut conn).await?;
        Ok(result)
    }

    async fn busiest_spots(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<SpotUsage>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::busiest_spots(since, until, &mut conn).await?;
        Ok(result)
    }

    async fn revenue_by_location_and_day(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<RevenueRow>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        let result = analytics::revenue_by_location_and_day(since, until, &mut conn).await?;
        Ok(result)
    }
}
