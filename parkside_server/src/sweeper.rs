use std::time::Duration as StdDuration;

use chrono::Duration;
use log::*;
use parkside_engine::{db_types::Booking, events::EventProducers, BookingFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the expiry sweeper. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every tick runs two independent passes: reclaiming bookings that were never paid for within the grace
/// window, and reclaiming bookings whose time window has lapsed. Failures are logged and the sweep is
/// retried on the next tick; the sweeper itself never gives up.
pub fn start_sweeper(
    db: SqliteDatabase,
    producers: EventProducers,
    interval: StdDuration,
    payment_grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = BookingFlowApi::new(db, producers);
        info!("🕰️ Booking expiry sweeper started");
        loop {
            timer.tick().await;
            info!("🕰️ Running booking expiry sweep");
            match api.sweep_expired_bookings(payment_grace).await {
                Ok(result) => {
                    info!("🕰️ {} bookings reclaimed", result.total_count());
                    debug!(
                        "🕰️ {} reclaimed for missed payment: {}",
                        result.unpaid_count(),
                        booking_list(&result.unpaid)
                    );
                    debug!(
                        "🕰️ {} reclaimed for lapsed windows: {}",
                        result.lapsed_count(),
                        booking_list(&result.lapsed)
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running booking expiry sweep: {e}");
                },
            }
        }
    })
}

fn booking_list(bookings: &[Booking]) -> String {
    bookings
        .iter()
        .map(|b| format!("[{}] user: {} spot: {}", b.id, b.user_id, b.spot_id))
        .collect::<Vec<String>>()
        .join(", ")
}
