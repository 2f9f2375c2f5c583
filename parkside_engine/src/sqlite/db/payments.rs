use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    traits::PaymentApiError,
};

/// Inserts a completed payment. This is the only code path that creates payment rows.
pub async fn insert_completed(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentApiError> {
    let txid = payment.txid.clone();
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (booking_id, user_id, txid, status, amount)
            VALUES ($1, $2, $3, 'Completed', $4) RETURNING *;
        "#,
    )
    .bind(payment.booking_id)
    .bind(payment.user_id)
    .bind(payment.txid)
    .bind(payment.amount)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => PaymentApiError::PaymentAlreadyExists(txid),
        _ => PaymentApiError::from(e),
    })?;
    debug!("💰️ Payment {} recorded for booking {}", payment.txid, payment.booking_id);
    Ok(payment)
}

/// The most recent payment row for a booking.
pub async fn fetch_latest_for_booking(
    booking_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1")
            .bind(booking_id)
            .fetch_optional(conn)
            .await?;
    Ok(payment)
}

/// Whether any payment row exists for the booking. The sweeper's veto check.
pub async fn exists_for_booking(booking_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn update_status_for_booking(
    booking_id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentApiError> {
    let payment = sqlx::query_as("UPDATE payments SET status = $1 WHERE booking_id = $2 RETURNING *")
        .bind(status.to_string())
        .bind(booking_id)
        .fetch_optional(conn)
        .await?
        .ok_or(PaymentApiError::PaymentNotFound(booking_id))?;
    Ok(payment)
}
