use chrono::NaiveDate;

use crate::{
    db_types::{ParkingLocation, ParkingSpot},
    traits::{
        reservation_database::ReservationError,
        LocationBookingCount,
        LocationPrice,
        OccupiedLocation,
        RevenueRow,
        SpotOverview,
        SpotUsage,
    },
};

/// Read-only projections over the inventory and the booking history. None of these mutate state, and all
/// aggregation happens in SQL so results are deterministic for a fixed data set.
#[allow(async_fn_in_trait)]
pub trait Analytics {
    /// Every registered location. Admin console inventory view.
    async fn fetch_all_locations(&self) -> Result<Vec<ParkingLocation>, ReservationError>;

    /// Every spot in a location, floors first. Admin console inventory view.
    async fn fetch_spots_for_location(&self, location_id: i64) -> Result<Vec<ParkingSpot>, ReservationError>;

    /// Locations (grouped by address and floor) where no spot is currently available.
    async fn fetch_occupied_locations(&self) -> Result<Vec<OccupiedLocation>, ReservationError>;

    /// Every spot at the given address, with availability and price.
    async fn fetch_spots_for_address(&self, address: &str) -> Result<Vec<SpotOverview>, ReservationError>;

    /// Average hourly (and derived per-minute) price per location.
    async fn fetch_location_prices(&self) -> Result<Vec<LocationPrice>, ReservationError>;

    /// Booking counts per location for bookings starting inside the date range, busiest first.
    async fn bookings_per_location(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<LocationBookingCount>, ReservationError>;

    /// The five spots with the longest average booking duration in the date range.
    async fn busiest_spots(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<SpotUsage>, ReservationError>;

    /// Revenue per (location, calendar day): booked hours × the spot's hourly price.
    async fn revenue_by_location_and_day(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<RevenueRow>, ReservationError>;
}
