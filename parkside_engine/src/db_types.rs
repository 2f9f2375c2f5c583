use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pks_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        Role         ---------------------------------------------------------
/// The closed set of roles known to the platform. Authorization is an explicit predicate on this enum,
/// never a string comparison against request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Whether a bearer of this role may perform administrative operations.
    pub fn may_administer(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid role name: {value}. But this conversion cannot fail. Defaulting to User");
            Role::User
        })
    }
}

//--------------------------------------     UserStatus      ---------------------------------------------------------
/// White-listed users may log in and book; black-listed users are refused at authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum UserStatus {
    White,
    Black,
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::White => write!(f, "White"),
            UserStatus::Black => write!(f, "Black"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "White" => Ok(Self::White),
            "Black" => Ok(Self::Black),
            s => Err(ConversionError(format!("Invalid user status: {s}"))),
        }
    }
}

impl From<String> for UserStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid user status: {value}. But this conversion cannot fail. Defaulting to White");
            UserStatus::White
        })
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Opaque; hashing happens in the credential module, never here.
    pub password_hash: String,
}

//--------------------------------------   ParkingLocation   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingLocation {
    pub id: i64,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

//--------------------------------------     ParkingSpot     ---------------------------------------------------------
/// The unit of reservation. `is_available` is false exactly when one active booking references the spot;
/// only the coordinator operations may flip it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub location_id: i64,
    pub spot_number: i64,
    pub floor: Option<String>,
    pub is_available: bool,
    pub price: Cents,
}

//--------------------------------------       Booking       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub spot_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
}

/// A booking request as it arrives from the front end. The address and (spot_number, floor) pair are
/// resolved to a concrete spot row inside the creation transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub user_id: i64,
    pub address: String,
    pub floor: Option<String>,
    pub spot_number: i64,
    pub start_time: String,
    pub end_time: String,
}

//--------------------------------------  CancelledBooking   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CancelledBooking {
    pub id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

//--------------------------------------       Vehicle       ---------------------------------------------------------
/// A vehicle with a null `booking_id` is orphaned: its booking was reclaimed, the record survives.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vehicle {
    pub id: i64,
    pub user_id: i64,
    pub plate: String,
    pub brand: String,
    pub booking_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub user_id: i64,
    pub plate: String,
    pub brand: String,
    pub booking_id: Option<i64>,
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
/// The existence of a `Completed` payment row is the authoritative signal that the sweeper must not
/// reclaim the booking it references.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub txid: String,
    pub status: PaymentStatus,
    pub amount: Cents,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub booking_id: i64,
    pub user_id: i64,
    /// The transaction identifier as issued by the external payment provider.
    pub txid: String,
    pub amount: Cents,
}

impl NewPayment {
    pub fn new(booking_id: i64, user_id: i64, txid: String, amount: Cents) -> Self {
        Self { booking_id, user_id, txid, amount }
    }
}
