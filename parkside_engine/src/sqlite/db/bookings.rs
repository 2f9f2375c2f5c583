use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::Booking,
    traits::{BookingSummary, ReservationError},
};

pub async fn insert_booking(
    user_id: i64,
    spot_id: i64,
    start_time: &str,
    end_time: &str,
    conn: &mut SqliteConnection,
) -> Result<Booking, ReservationError> {
    let booking: Booking = sqlx::query_as(
        r#"
            INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(spot_id)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Booking inserted with id {} for spot {spot_id}", booking.id);
    Ok(booking)
}

pub async fn fetch_booking(booking_id: i64, conn: &mut SqliteConnection) -> Result<Option<Booking>, sqlx::Error> {
    let booking =
        sqlx::query_as("SELECT * FROM bookings WHERE id = $1").bind(booking_id).fetch_optional(conn).await?;
    Ok(booking)
}

pub async fn fetch_all_bookings(conn: &mut SqliteConnection) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings = sqlx::query_as("SELECT * FROM bookings ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(bookings)
}

pub async fn fetch_bookings_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings = sqlx::query_as("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(bookings)
}

/// For each user holding bookings on the spot, that user's most recent booking (max `created_at`).
/// Older bookings by the same user on the same spot are not returned.
pub async fn latest_booking_per_user_for_spot(
    spot_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings = sqlx::query_as(
        r#"
            SELECT b.* FROM bookings b
            JOIN (
                SELECT user_id, MAX(created_at) AS last_created
                FROM bookings WHERE spot_id = $1 GROUP BY user_id
            ) latest ON b.user_id = latest.user_id AND b.created_at = latest.last_created
            WHERE b.spot_id = $1
        "#,
    )
    .bind(spot_id)
    .fetch_all(conn)
    .await?;
    Ok(bookings)
}

pub async fn delete_booking(booking_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM bookings WHERE id = $1").bind(booking_id).execute(conn).await?;
    Ok(())
}

/// A user's bookings joined with their location, spot and any attached vehicle.
pub async fn fetch_booking_summaries_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<BookingSummary>, sqlx::Error> {
    let rows: Vec<(i64, String, i64, Option<String>, String, String, Option<String>, Option<String>)> =
        sqlx::query_as(
            r#"
            SELECT b.id, pl.address, ps.spot_number, ps.floor, b.start_time, b.end_time, v.plate, v.brand
            FROM bookings b
            JOIN parking_spots ps ON ps.id = b.spot_id
            JOIN parking_locations pl ON pl.id = ps.location_id
            LEFT JOIN vehicles v ON v.booking_id = b.id
            WHERE b.user_id = $1
            ORDER BY b.created_at ASC
        "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    let summaries = rows
        .into_iter()
        .map(
            |(booking_id, address, spot_number, floor, start_time, end_time, vehicle_plate, vehicle_brand)| {
                BookingSummary {
                    booking_id,
                    address,
                    spot_number,
                    floor,
                    start_time,
                    end_time,
                    vehicle_plate,
                    vehicle_brand,
                }
            },
        )
        .collect();
    Ok(summaries)
}
