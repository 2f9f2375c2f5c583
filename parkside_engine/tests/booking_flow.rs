mod support;

use std::sync::{Arc, Mutex};

use parkside_engine::{
    db_types::UserStatus,
    events::{EventHandlers, EventHooks, EventProducers, PaymentRequestedEvent},
    AccountManagement,
    Analytics,
    BookingFlowApi,
    ReservationError,
};
use pks_common::Cents;
use support::{booking_request, register_user, seed_single_spot_lot};

#[tokio::test]
async fn booking_then_conflict_on_same_spot() {
    let lot = seed_single_spot_lot("10 Main St", 120_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());

    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap();
    assert_eq!(receipt.spot_number, 1);
    // 120 minutes at 2.00/min (the location average is the single spot's rate)
    assert_eq!(receipt.amount, Cents::from(240_00));

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(!spots[0].is_available);

    let rival = register_user(&lot.db, "bob").await;
    let err = api.create_booking(booking_request(rival, &lot.address, 1, 52, 54)).await.unwrap_err();
    assert!(matches!(err, ReservationError::SpotUnavailable { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn concurrent_bookings_cannot_both_win() {
    let lot = seed_single_spot_lot("11 Main St", 100_00).await;
    let rival = register_user(&lot.db, "bob").await;
    let api = Arc::new(BookingFlowApi::new(lot.db.clone(), EventProducers::default()));

    let a = {
        let api = Arc::clone(&api);
        let req = booking_request(lot.user_id, "11 Main St", 1, 48, 50);
        tokio::spawn(async move { api.create_booking(req).await })
    };
    let b = {
        let api = Arc::clone(&api);
        let req = booking_request(rival, "11 Main St", 1, 48, 50);
        tokio::spawn(async move { api.create_booking(req).await })
    };
    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two racing bookings may win: {ra:?} / {rb:?}");

    let spots = lot.db.fetch_spots_for_address("11 Main St").await.unwrap();
    assert!(!spots[0].is_available);
    let winner = if ra.is_ok() { lot.user_id } else { rival };
    let bookings = lot.db.fetch_bookings_for_user(winner).await.unwrap();
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn cancel_restores_availability() {
    let lot = seed_single_spot_lot("12 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());

    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap();
    api.cancel_booking(receipt.booking_id).await.unwrap();

    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert!(spots[0].is_available);
    assert!(lot.db.fetch_bookings_for_user(lot.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_inside_24h_window_is_refused() {
    let lot = seed_single_spot_lot("13 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());

    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 2, 4)).await.unwrap();
    let err = api.cancel_booking(receipt.booking_id).await.unwrap_err();
    assert!(matches!(err, ReservationError::CancellationWindow));
    // the booking is untouched
    assert_eq!(lot.db.fetch_bookings_for_user(lot.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_of_missing_booking_is_not_found() {
    let lot = seed_single_spot_lot("14 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let err = api.cancel_booking(9999).await.unwrap_err();
    assert!(matches!(err, ReservationError::BookingNotFound(9999)));
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let lot = seed_single_spot_lot("15 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let err = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 50, 48)).await.unwrap_err();
    assert!(matches!(err, ReservationError::InvalidTimeRange(_)));
}

#[tokio::test]
async fn price_update_rejects_negative_values() {
    let lot = seed_single_spot_lot("16 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());

    let err = api.update_spot_price(lot.spot_id, Cents::from(-1)).await.unwrap_err();
    assert!(matches!(err, ReservationError::NegativePrice));
    api.update_spot_price(lot.spot_id, Cents::from(0)).await.unwrap();
    let spots = lot.db.fetch_spots_for_address(&lot.address).await.unwrap();
    assert_eq!(spots[0].price, Cents::from(0));
}

#[tokio::test]
async fn blacklisted_user_cannot_book() {
    let lot = seed_single_spot_lot("17 Main St", 80_00).await;
    lot.db.update_user_status(lot.user_id, UserStatus::Black).await.unwrap();
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let err = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 50)).await.unwrap_err();
    assert!(matches!(err, ReservationError::UserBlacklisted));
}

#[tokio::test]
async fn floor_argument_is_ignored_for_flat_locations() {
    let lot = seed_single_spot_lot("18 Main St", 80_00).await;
    let api = BookingFlowApi::new(lot.db.clone(), EventProducers::default());
    let mut request = booking_request(lot.user_id, &lot.address, 1, 48, 50);
    // the front end sends a floor even though no spot here declares one
    request.floor = Some("2".to_string());
    let receipt = api.create_booking(request).await.unwrap();
    assert_eq!(receipt.spot_number, 1);
}

#[tokio::test]
async fn booking_publishes_a_payment_request() {
    let lot = seed_single_spot_lot("19 Main St", 60_00).await;
    let captured: Arc<Mutex<Vec<PaymentRequestedEvent>>> = Arc::default();
    let sink = Arc::clone(&captured);
    let mut hooks = EventHooks::default();
    hooks.on_payment_requested(move |ev| {
        let sink = Arc::clone(&sink);
        Box::pin(async move {
            sink.lock().unwrap().push(ev);
        })
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = BookingFlowApi::new(lot.db.clone(), producers);
    let receipt = api.create_booking(booking_request(lot.user_id, &lot.address, 1, 48, 49)).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let events = captured.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, lot.user_id);
    assert_eq!(events[0].booking_id, receipt.booking_id);
    assert_eq!(events[0].amount, Cents::from(60_00));
}
