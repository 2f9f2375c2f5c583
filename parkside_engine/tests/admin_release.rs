mod support;

use parkside_engine::{
    db_types::NewVehicle,
    events::EventProducers,
    AccountManagement,
    Analytics,
    BookingFlowApi,
    ReservationError,
};
use support::{register_user, seed_single_spot_lot};

/// Fabricates a historical booking row with a controlled creation time. Admin release acts on history,
/// which the public API (one active booking per spot) cannot produce on its own.
async fn insert_booking_at(
    db: &parkside_engine::SqliteDatabase,
    user_id: i64,
    spot_id: i64,
    created_at: &str,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO bookings (user_id, spot_id, start_time, end_time, created_at)
        VALUES ($1, $2, '2030-01-01 08:00:00', '2030-01-01 10:00:00', $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(spot_id)
    .bind(created_at)
    .fetch_one(db.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn admin_free_cancels_only_the_latest_booking_per_user() {
    let lot = seed_single_spot_lot("1 Admin St", 100_00).await;
    let user_b = register_user(&lot.db, "bob").await;

    let a_old = insert_booking_at(&lot.db, lot.user_id, lot.spot_id, "2024-01-01 10:00:00").await;
    let a_new = insert_booking_at(&lot.db, lot.user_id, lot.spot_id, "2024-02-01 10:00:00").await;
    let b_only = insert_booking_at(&lot.db, user_b, lot.spot_id, "2024-01-15 10:00:00").await;
    sqlx::query("UPDATE parking_spots SET is_available = 0 WHERE id = $1")
        .bind(lot.spot_id)
        .execute(lot.db.pool())
        .await
        .unwrap();
    // a vehicle rides on the booking that will be cancelled
    lot.db
        .add_vehicle(NewVehicle {
            user_id: lot.user_id,
            plate: "A123BC".to_string(),
            brand: "Lada".to_string(),
            booking_id: Some(a_new),
        })
        .await
        .unwrap();

    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let cancellations = api.set_spot_availability(lot.spot_id, true).await.unwrap();

    assert_eq!(cancellations.len(), 2);
    let mut cancelled_ids: Vec<i64> = cancellations.iter().map(|c| c.booking_id).collect();
    cancelled_ids.sort_unstable();
    let mut expected = vec![a_new, b_only];
    expected.sort_unstable();
    assert_eq!(cancelled_ids, expected);
    assert!(cancellations.iter().all(|c| c.reason == "Cancelled by administrator"));

    // the older booking dangles, by design
    let remaining: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM bookings ORDER BY id").fetch_all(lot.db.pool()).await.unwrap();
    assert_eq!(remaining, vec![a_old]);

    // the vehicle survives as an orphan
    let booking_ref: Option<i64> =
        sqlx::query_scalar("SELECT booking_id FROM vehicles WHERE plate = 'A123BC'")
            .fetch_one(lot.db.pool())
            .await
            .unwrap();
    assert_eq!(booking_ref, None);

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(spots[0].is_available);
}

#[tokio::test]
async fn cancellation_notices_are_consumed_once() {
    let lot = seed_single_spot_lot("2 Admin St", 100_00).await;
    insert_booking_at(&lot.db, lot.user_id, lot.spot_id, "2024-01-01 10:00:00").await;
    sqlx::query("UPDATE parking_spots SET is_available = 0 WHERE id = $1")
        .bind(lot.spot_id)
        .execute(lot.db.pool())
        .await
        .unwrap();

    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    api.set_spot_availability(lot.spot_id, true).await.unwrap();

    let notice = lot.db.consume_cancellation_notice(lot.user_id).await.unwrap();
    assert_eq!(notice.as_deref(), Some("Cancelled by administrator"));
    let again = lot.db.consume_cancellation_notice(lot.user_id).await.unwrap();
    assert_eq!(again, None);
}

#[tokio::test]
async fn admin_occupy_has_no_booking_side_effects() {
    let lot = seed_single_spot_lot("3 Admin St", 100_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());

    let cancellations = api.set_spot_availability(lot.spot_id, false).await.unwrap();
    assert!(cancellations.is_empty());
    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(!spots[0].is_available);

    // occupying an occupied spot stays a no-op
    api.set_spot_availability(lot.spot_id, false).await.unwrap();
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM cancelled_bookings").fetch_one(lot.db.pool()).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn releasing_an_unknown_spot_is_not_found() {
    let lot = seed_single_spot_lot("4 Admin St", 100_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let err = api.set_spot_availability(777, true).await.unwrap_err();
    assert!(matches!(err, ReservationError::SpotNotFound(777)));
}
