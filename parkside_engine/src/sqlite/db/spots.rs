use log::{debug, error};
use pks_common::Cents;
use sqlx::SqliteConnection;

use crate::{db_types::ParkingSpot, traits::ReservationError};

pub async fn fetch_spot(spot_id: i64, conn: &mut SqliteConnection) -> Result<Option<ParkingSpot>, sqlx::Error> {
    let spot =
        sqlx::query_as("SELECT * FROM parking_spots WHERE id = $1").bind(spot_id).fetch_optional(conn).await?;
    Ok(spot)
}

pub async fn fetch_spots_for_location(
    location_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ParkingSpot>, sqlx::Error> {
    let spots = sqlx::query_as("SELECT * FROM parking_spots WHERE location_id = $1 ORDER BY floor, spot_number")
        .bind(location_id)
        .fetch_all(conn)
        .await?;
    Ok(spots)
}

/// Whether any spot in the location declares a floor. Locations where none does are "flat" and a floor
/// argument in a booking request is ignored for them.
pub async fn location_has_floors(location_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM parking_spots WHERE location_id = $1 AND floor IS NOT NULL")
            .bind(location_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

/// The availability compare-and-swap. Flips exactly one matching *available* spot to unavailable and
/// returns it; returns `None` when no matching spot is free. Concurrent callers racing for the same spot
/// serialize here: only one UPDATE can see `is_available = 1`.
pub async fn reserve_spot(
    location_id: i64,
    spot_number: i64,
    floor: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<ParkingSpot>, sqlx::Error> {
    let spot = sqlx::query_as(
        r#"
            UPDATE parking_spots SET is_available = 0
            WHERE id = (
                SELECT id FROM parking_spots
                WHERE location_id = $1 AND spot_number = $2 AND floor IS $3 AND is_available = 1
                LIMIT 1
            )
            RETURNING *;
        "#,
    )
    .bind(location_id)
    .bind(spot_number)
    .bind(floor)
    .fetch_optional(conn)
    .await?;
    Ok(spot)
}

/// Logs why [`reserve_spot`] came up empty: the spot either exists but is taken, or does not exist at
/// all. The caller-visible error does not distinguish the two.
pub async fn log_reserve_miss(
    location_id: i64,
    spot_number: i64,
    floor: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let existing: Option<ParkingSpot> = sqlx::query_as(
        "SELECT * FROM parking_spots WHERE location_id = $1 AND spot_number = $2 AND floor IS $3 LIMIT 1",
    )
    .bind(location_id)
    .bind(spot_number)
    .bind(floor)
    .fetch_optional(conn)
    .await?;
    match existing {
        Some(spot) => error!(
            "🅿️ Spot found but not available: id={}, number={}, floor={:?}, is_available={}",
            spot.id, spot.spot_number, spot.floor, spot.is_available
        ),
        None => error!("🅿️ Spot does not exist: number={spot_number}, floor={floor:?}, location={location_id}"),
    }
    Ok(())
}

pub async fn set_availability(
    spot_id: i64,
    available: bool,
    conn: &mut SqliteConnection,
) -> Result<ParkingSpot, ReservationError> {
    let spot = sqlx::query_as("UPDATE parking_spots SET is_available = $1 WHERE id = $2 RETURNING *")
        .bind(available)
        .bind(spot_id)
        .fetch_optional(conn)
        .await?
        .ok_or(ReservationError::SpotNotFound(spot_id))?;
    debug!("🅿️ Spot {spot_id} availability set to {available}");
    Ok(spot)
}

pub async fn update_price(
    spot_id: i64,
    price: Cents,
    conn: &mut SqliteConnection,
) -> Result<ParkingSpot, ReservationError> {
    let spot = sqlx::query_as("UPDATE parking_spots SET price = $1 WHERE id = $2 RETURNING *")
        .bind(price)
        .bind(spot_id)
        .fetch_optional(conn)
        .await?
        .ok_or(ReservationError::SpotNotFound(spot_id))?;
    Ok(spot)
}

pub async fn insert_spot(
    location_id: i64,
    spot_number: i64,
    floor: Option<&str>,
    price: Cents,
    conn: &mut SqliteConnection,
) -> Result<ParkingSpot, ReservationError> {
    let spot = sqlx::query_as(
        r#"
            INSERT INTO parking_spots (location_id, spot_number, floor, price) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(location_id)
    .bind(spot_number)
    .bind(floor)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(spot)
}
