use thiserror::Error;

use crate::{
    db_types::{NewUser, NewVehicle, Role, User, UserStatus},
    traits::{BookingSummary, UserProfile},
};

/// User-account and profile storage. Registration enforces uniqueness of username, email and phone; each
/// violation surfaces as its own conflict variant so the front end can say which field clashed.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Registers a new user with the default `User` role. The password hash is stored opaquely; hashing
    /// is the credential module's business.
    async fn register_user(&self, user: NewUser) -> Result<i64, AccountApiError>;

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_all_users(&self) -> Result<Vec<(User, Role)>, AccountApiError>;

    /// Moves a user between the white and black lists.
    async fn update_user_status(&self, user_id: i64, status: UserStatus) -> Result<(), AccountApiError>;

    /// The user's profile together with their bookings and any vehicles attached to them.
    async fn fetch_user_profile(&self, user_id: i64) -> Result<UserProfile, AccountApiError>;

    /// All bookings for a user, joined with location and vehicle details. Used by the admin console.
    async fn fetch_bookings_for_user(&self, user_id: i64) -> Result<Vec<BookingSummary>, AccountApiError>;

    /// Registers a vehicle, optionally attached to a booking.
    async fn add_vehicle(&self, vehicle: NewVehicle) -> Result<i64, AccountApiError>;

    /// Reads and deletes the user's cancellation notices, returning the first reason if any existed.
    /// The read-then-delete shape mirrors the notification modal it feeds.
    async fn consume_cancellation_notice(&self, user_id: i64) -> Result<Option<String>, AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Phone number is already registered")]
    PhoneTaken,
    #[error("The requested user (id {0}) does not exist")]
    UserNotFound(i64),
    #[error("No booking is currently tracked for this user")]
    NoTrackedBooking,
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}
