use sqlx::SqliteConnection;

use crate::{
    db_types::{NewVehicle, Vehicle},
    traits::AccountApiError,
};

pub async fn insert_vehicle(vehicle: NewVehicle, conn: &mut SqliteConnection) -> Result<Vehicle, AccountApiError> {
    let vehicle = sqlx::query_as(
        r#"
            INSERT INTO vehicles (user_id, plate, brand, booking_id) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(vehicle.user_id)
    .bind(vehicle.plate)
    .bind(vehicle.brand)
    .bind(vehicle.booking_id)
    .fetch_one(conn)
    .await?;
    Ok(vehicle)
}

pub async fn fetch_vehicle_for_booking(
    booking_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Vehicle>, sqlx::Error> {
    let vehicle =
        sqlx::query_as("SELECT * FROM vehicles WHERE booking_id = $1").bind(booking_id).fetch_optional(conn).await?;
    Ok(vehicle)
}

/// The user-cancellation variant: the vehicle rows go away with the booking.
pub async fn delete_vehicles_for_booking(booking_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM vehicles WHERE booking_id = $1").bind(booking_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// The admin-cancellation variant: the booking reference is cleared but the vehicle record survives as
/// an orphan.
pub async fn detach_vehicles_for_booking(booking_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE vehicles SET booking_id = NULL WHERE booking_id = $1")
        .bind(booking_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
