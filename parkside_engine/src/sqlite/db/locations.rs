use sqlx::SqliteConnection;

use crate::{db_types::ParkingLocation, traits::ReservationError};

pub async fn fetch_location_id_by_address(
    address: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT id FROM parking_locations WHERE address = $1")
        .bind(address)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

pub async fn fetch_all_locations(conn: &mut SqliteConnection) -> Result<Vec<ParkingLocation>, sqlx::Error> {
    let locations = sqlx::query_as("SELECT * FROM parking_locations ORDER BY address").fetch_all(conn).await?;
    Ok(locations)
}

pub async fn insert_location(
    address: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    conn: &mut SqliteConnection,
) -> Result<ParkingLocation, ReservationError> {
    let location = sqlx::query_as(
        r#"
            INSERT INTO parking_locations (address, latitude, longitude) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(address)
    .bind(latitude)
    .bind(longitude)
    .fetch_one(conn)
    .await?;
    Ok(location)
}
