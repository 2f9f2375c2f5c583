use pks_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Booking, Role, UserStatus};

/// The result of one sweeper cycle: bookings reclaimed because payment never arrived, and bookings
/// reclaimed because their window lapsed.
#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub unpaid: Vec<Booking>,
    pub lapsed: Vec<Booking>,
}

impl SweepSummary {
    pub fn unpaid_count(&self) -> usize {
        self.unpaid.len()
    }

    pub fn lapsed_count(&self) -> usize {
        self.lapsed.len()
    }

    pub fn total_count(&self) -> usize {
        self.unpaid.len() + self.lapsed.len()
    }
}

/// What the authentication flow learns about an asserted email.
#[derive(Debug, Clone)]
pub struct LoginIdentity {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
}

//--------------------------------------    Read projections  --------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupiedLocation {
    pub address: String,
    pub floors: Vec<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SpotOverview {
    pub spot_number: i64,
    pub floor: Option<String>,
    pub is_available: bool,
    pub price: Cents,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationPrice {
    pub address: String,
    pub price_per_hour: f64,
    pub price_per_minute: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LocationBookingCount {
    pub address: String,
    pub booking_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SpotUsage {
    pub spot_id: i64,
    pub spot_number: i64,
    pub address: String,
    pub floor: Option<String>,
    pub avg_hours: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevenueRow {
    pub address: String,
    pub date: String,
    pub revenue: Cents,
}

/// One row of a user's booking list: the booking joined with its location and any attached vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking_id: i64,
    pub address: String,
    pub spot_number: i64,
    pub floor: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub vehicle_plate: Option<String>,
    pub vehicle_brand: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub bookings: Vec<BookingSummary>,
}
