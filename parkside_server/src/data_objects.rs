//! Request and response shapes for the HTTP surface. These deliberately mirror what the front ends and
//! the payment bot already send; the engine's own types stay wire-format-agnostic.
use chrono::NaiveDate;
use pks_common::Cents;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Already hashed by the credential module.
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterUserResponse {
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub address: String,
    pub floor: Option<String>,
    pub spot_number: i64,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRequest {
    pub plate: String,
    pub brand: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationNoticeResponse {
    pub show_cancellation_modal: bool,
    pub cancellation_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotStatusUpdate {
    pub is_available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPriceUpdate {
    /// Hourly price in whole currency units, e.g. `120.50`.
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserStatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

/// The payment agent's confirmation callback: the structured facts of a successful external payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub booking_id: i64,
    pub amount: Cents,
    pub txid: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingPaymentResponse {
    pub user_id: i64,
    pub booking_id: i64,
    pub amount: Cents,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn ok<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}
