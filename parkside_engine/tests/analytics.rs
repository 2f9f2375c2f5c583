mod support;

use chrono::NaiveDate;
use parkside_engine::{AnalyticsApi, ReservationError};
use pks_common::Cents;
use support::{new_test_db, register_user};

async fn seed_two_locations() -> (parkside_engine::SqliteDatabase, i64) {
    let db = new_test_db().await;
    let north = db.add_location("1 North Rd", None, None).await.unwrap();
    let south = db.add_location("2 South Rd", None, None).await.unwrap();
    let n1 = db.add_spot(north.id, 1, None, Cents::from(100_00)).await.unwrap();
    let n2 = db.add_spot(north.id, 2, None, Cents::from(200_00)).await.unwrap();
    let s1 = db.add_spot(south.id, 1, Some("1"), Cents::from(50_00)).await.unwrap();
    let user = register_user(&db, "carol").await;

    let insert = |spot_id: i64, start: &'static str, end: &'static str| {
        let pool = db.pool().clone();
        async move {
            sqlx::query("INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, $3, $4)")
                .bind(user)
                .bind(spot_id)
                .bind(start)
                .bind(end)
                .execute(&pool)
                .await
                .unwrap();
        }
    };
    // North, 2024-03-01: 2h at 100.00 + 1.5h at 200.00 = 500.00
    insert(n1.id, "2024-03-01 08:00:00", "2024-03-01 10:00:00").await;
    insert(n2.id, "2024-03-01 12:00:00", "2024-03-01 13:30:00").await;
    // North, 2024-03-02: 30m at 100.00 = 50.00
    insert(n1.id, "2024-03-02 09:00:00", "2024-03-02 09:30:00").await;
    // South, 2024-03-01: 4h at 50.00 = 200.00 (ISO form on purpose)
    insert(s1.id, "2024-03-01T10:00:00", "2024-03-01T14:00:00").await;
    (db, user)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[tokio::test]
async fn revenue_aggregation_is_exact() {
    let (db, _) = seed_two_locations().await;
    let api = AnalyticsApi::new(db);
    let rows = api.revenue_by_location_and_day(day(1), day(31)).await.unwrap();

    assert_eq!(rows.len(), 3);
    let find = |address: &str, date: &str| {
        rows.iter().find(|r| r.address == address && r.date == date).map(|r| r.revenue).unwrap()
    };
    assert_eq!(find("1 North Rd", "2024-03-01"), Cents::from(500_00));
    assert_eq!(find("1 North Rd", "2024-03-02"), Cents::from(50_00));
    assert_eq!(find("2 South Rd", "2024-03-01"), Cents::from(200_00));
}

#[tokio::test]
async fn booking_counts_order_busiest_first() {
    let (db, _) = seed_two_locations().await;
    let api = AnalyticsApi::new(db);
    let rows = api.bookings_per_location(day(1), day(31)).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].address, "1 North Rd");
    assert_eq!(rows[0].booking_count, 3);
    assert_eq!(rows[1].booking_count, 1);
}

#[tokio::test]
async fn busiest_spots_rank_by_average_duration() {
    let (db, _) = seed_two_locations().await;
    let api = AnalyticsApi::new(db);
    let rows = api.busiest_spots(day(1), day(31)).await.unwrap();
    // South's single 4h booking beats everything in the north
    assert_eq!(rows[0].address, "2 South Rd");
    assert!((rows[0].avg_hours - 4.0).abs() < 1e-6);
}

#[tokio::test]
async fn date_range_outside_data_is_empty() {
    let (db, _) = seed_two_locations().await;
    let api = AnalyticsApi::new(db);
    let rows = api.revenue_by_location_and_day(day(10), day(20)).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn inverted_range_is_a_validation_error() {
    let (db, _) = seed_two_locations().await;
    let api = AnalyticsApi::new(db);
    let err = api.bookings_per_location(day(20), day(10)).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidTimeRange(_)));
}

#[tokio::test]
async fn occupied_locations_lists_fully_booked_floors_only() {
    let db = new_test_db().await;
    let east = db.add_location("3 East Rd", None, None).await.unwrap();
    db.add_spot(east.id, 1, Some("1"), Cents::from(10_00)).await.unwrap();
    db.add_spot(east.id, 2, Some("2"), Cents::from(10_00)).await.unwrap();
    sqlx::query("UPDATE parking_spots SET is_available = 0 WHERE floor = '1'")
        .execute(db.pool())
        .await
        .unwrap();

    let api = AnalyticsApi::new(db);
    let rows = api.occupied_locations().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].address, "3 East Rd");
    assert_eq!(rows[0].floors, vec!["1".to_string()]);
}
