#![allow(dead_code)]
use chrono::{Duration, Utc};
use parkside_engine::{
    db_types::{NewBooking, NewUser},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountManagement,
    SqliteDatabase,
};
use pks_common::Cents;

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub struct SeededLot {
    pub db: SqliteDatabase,
    pub location_id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub address: String,
}

/// One location with a single floor-less spot and one registered user. Enough for most lifecycle tests.
pub async fn seed_single_spot_lot(address: &str, hourly_cents: i64) -> SeededLot {
    let db = new_test_db().await;
    let location = db.add_location(address, None, None).await.expect("Error adding location");
    let spot = db.add_spot(location.id, 1, None, Cents::from(hourly_cents)).await.expect("Error adding spot");
    let user_id = register_user(&db, "alice").await;
    SeededLot { db, location_id: location.id, spot_id: spot.id, user_id, address: address.to_string() }
}

pub async fn register_user(db: &SqliteDatabase, name: &str) -> i64 {
    let user = NewUser {
        username: name.to_string(),
        email: format!("{name}@example.com"),
        phone: format!("+7-900-{name}"),
        password_hash: format!("$fake$hash${name}"),
    };
    db.register_user(user).await.expect("Error registering user")
}

/// A timestamp `hours` from now, in the space-separated text format bookings carry.
pub fn hours_from_now(hours: i64) -> String {
    (Utc::now().naive_utc() + Duration::hours(hours)).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn booking_request(user_id: i64, address: &str, spot_number: i64, start_h: i64, end_h: i64) -> NewBooking {
    NewBooking {
        user_id,
        address: address.to_string(),
        floor: None,
        spot_number,
        start_time: hours_from_now(start_h),
        end_time: hours_from_now(end_h),
    }
}
