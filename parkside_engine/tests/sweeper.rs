mod support;

use chrono::{Duration, Utc};
use parkside_engine::{
    db_types::NewPayment,
    events::EventProducers,
    Analytics,
    BookingFlowApi,
    PaymentLedger,
    ReservationDatabase,
};
use pks_common::Cents;
use support::{booking_request, seed_single_spot_lot};

#[tokio::test]
async fn unpaid_booking_is_reclaimed_after_grace() {
    let lot = seed_single_spot_lot("1 Sweep St", 100_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap();

    // one minute past the grace window
    let later = Utc::now().naive_utc() + Duration::minutes(61);
    let reclaimed = lot.db.reclaim_unpaid_bookings(Duration::minutes(60), later).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].id, receipt.booking_id);

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(spots[0].is_available);
}

#[tokio::test]
async fn paid_booking_survives_the_payment_timeout_pass() {
    let lot = seed_single_spot_lot("2 Sweep St", 100_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap();
    lot.db
        .insert_payment(NewPayment::new(receipt.booking_id, lot.user_id, "tg-tx-1".to_string(), receipt.amount))
        .await
        .unwrap();

    let later = Utc::now().naive_utc() + Duration::minutes(61);
    let reclaimed = lot.db.reclaim_unpaid_bookings(Duration::minutes(60), later).await.unwrap();
    assert!(reclaimed.is_empty());

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(!spots[0].is_available);
}

#[tokio::test]
async fn booking_inside_grace_is_left_alone() {
    let lot = seed_single_spot_lot("3 Sweep St", 100_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap();

    let soon = Utc::now().naive_utc() + Duration::minutes(59);
    let reclaimed = lot.db.reclaim_unpaid_bookings(Duration::minutes(60), soon).await.unwrap();
    assert!(reclaimed.is_empty());
}

#[tokio::test]
async fn lapsed_windows_are_reclaimed_in_both_text_formats() {
    let lot = seed_single_spot_lot("4 Sweep St", 100_00).await;
    let second_spot = lot.db.add_spot(lot.location_id, 2, None, Cents::from(100_00)).await.unwrap();

    // Historical rows land in storage in whichever format the front end used at the time.
    sqlx::query(
        "INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, '2020-01-01 08:00:00', '2020-01-01 10:00:00')",
    )
    .bind(lot.user_id)
    .bind(lot.spot_id)
    .execute(lot.db.pool())
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, '2020-01-02T08:00', '2020-01-02T10:00')",
    )
    .bind(lot.user_id)
    .bind(second_spot.id)
    .execute(lot.db.pool())
    .await
    .unwrap();
    sqlx::query("UPDATE parking_spots SET is_available = 0").execute(lot.db.pool()).await.unwrap();

    let reclaimed = lot.db.reclaim_lapsed_bookings(Utc::now().naive_utc()).await.unwrap();
    assert_eq!(reclaimed.len(), 2);

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(spots.iter().all(|s| s.is_available));
}

#[tokio::test]
async fn unparsable_end_time_is_skipped_not_fatal() {
    let lot = seed_single_spot_lot("5 Sweep St", 100_00).await;
    sqlx::query(
        "INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, '2020-01-01 08:00:00', 'whenever')",
    )
    .bind(lot.user_id)
    .bind(lot.spot_id)
    .execute(lot.db.pool())
    .await
    .unwrap();

    let reclaimed = lot.db.reclaim_lapsed_bookings(Utc::now().naive_utc()).await.unwrap();
    assert!(reclaimed.is_empty());
    // the row is still there for an operator to repair
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings").fetch_one(lot.db.pool()).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn window_expiry_reclaims_even_paid_bookings() {
    let lot = seed_single_spot_lot("6 Sweep St", 100_00).await;
    sqlx::query(
        "INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, '2020-01-01 08:00:00', '2020-01-01 10:00:00')",
    )
    .bind(lot.user_id)
    .bind(lot.spot_id)
    .execute(lot.db.pool())
    .await
    .unwrap();
    let booking_id: i64 = sqlx::query_scalar("SELECT id FROM bookings").fetch_one(lot.db.pool()).await.unwrap();
    lot.db
        .insert_payment(NewPayment::new(booking_id, lot.user_id, "tg-tx-2".to_string(), Cents::from(200_00)))
        .await
        .unwrap();

    let reclaimed = lot.db.reclaim_lapsed_bookings(Utc::now().naive_utc()).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
}
