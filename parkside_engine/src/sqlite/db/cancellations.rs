use log::info;
use sqlx::SqliteConnection;

use crate::{db_types::CancelledBooking, traits::ReservationError};

pub async fn insert_cancellation(
    booking_id: i64,
    user_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<CancelledBooking, ReservationError> {
    let cancellation = sqlx::query_as(
        r#"
            INSERT INTO cancelled_bookings (booking_id, user_id, reason) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(booking_id)
    .bind(user_id)
    .bind(reason)
    .fetch_one(conn)
    .await?;
    Ok(cancellation)
}

/// Reads the user's oldest cancellation notice and deletes all of their notices. One shot per user: the
/// notification modal that consumes this shows a single message.
pub async fn consume_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let notice: Option<CancelledBooking> =
        sqlx::query_as("SELECT * FROM cancelled_bookings WHERE user_id = $1 ORDER BY id ASC LIMIT 1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(notice) = notice else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM cancelled_bookings WHERE user_id = $1").bind(user_id).execute(conn).await?;
    info!("🗑️ Consumed cancellation notices for user {user_id}");
    Ok(Some(notice.reason))
}
