use chrono::NaiveDate;

use crate::{
    db_types::{ParkingLocation, ParkingSpot},
    traits::{
        Analytics,
        LocationBookingCount,
        LocationPrice,
        OccupiedLocation,
        ReservationError,
        RevenueRow,
        SpotOverview,
        SpotUsage,
    },
};

/// Read-only projections for the booking front end and the admin console. Range-taking operations
/// validate `since <= until` before touching storage.
#[derive(Debug, Clone)]
pub struct AnalyticsApi<B> {
    db: B,
}

impl<B> AnalyticsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AnalyticsApi<B>
where B: Analytics
{
    pub async fn all_locations(&self) -> Result<Vec<ParkingLocation>, ReservationError> {
        self.db.fetch_all_locations().await
    }

    pub async fn spots_for_location(&self, location_id: i64) -> Result<Vec<ParkingSpot>, ReservationError> {
        self.db.fetch_spots_for_location(location_id).await
    }

    pub async fn occupied_locations(&self) -> Result<Vec<OccupiedLocation>, ReservationError> {
        self.db.fetch_occupied_locations().await
    }

    pub async fn spots_for_address(&self, address: &str) -> Result<Vec<SpotOverview>, ReservationError> {
        self.db.fetch_spots_for_address(address).await
    }

    pub async fn location_prices(&self) -> Result<Vec<LocationPrice>, ReservationError> {
        self.db.fetch_location_prices().await
    }

    pub async fn bookings_per_location(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<LocationBookingCount>, ReservationError> {
        check_range(since, until)?;
        self.db.bookings_per_location(since, until).await
    }

    pub async fn busiest_spots(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<SpotUsage>, ReservationError> {
        check_range(since, until)?;
        self.db.busiest_spots(since, until).await
    }

    pub async fn revenue_by_location_and_day(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<RevenueRow>, ReservationError> {
        check_range(since, until)?;
        self.db.revenue_by_location_and_day(since, until).await
    }
}

fn check_range(since: NaiveDate, until: NaiveDate) -> Result<(), ReservationError> {
    if since > until {
        return Err(ReservationError::InvalidTimeRange("start date cannot be after end date".to_string()));
    }
    Ok(())
}
