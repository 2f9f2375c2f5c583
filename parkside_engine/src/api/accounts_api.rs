use crate::{
    db_types::{NewUser, NewVehicle, Role, User, UserStatus},
    traits::{AccountApiError, AccountManagement, BookingSummary, UserProfile},
};

/// User-account operations: registration, profiles, vehicles and the cancellation-notice flow.
#[derive(Debug, Clone)]
pub struct AccountApi<B> {
    db: B,
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub async fn register_user(&self, user: NewUser) -> Result<i64, AccountApiError> {
        self.db.register_user(user).await
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<UserProfile, AccountApiError> {
        self.db.fetch_user_profile(user_id).await
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<BookingSummary>, AccountApiError> {
        self.db.fetch_bookings_for_user(user_id).await
    }

    pub async fn all_users(&self) -> Result<Vec<(User, Role)>, AccountApiError> {
        self.db.fetch_all_users().await
    }

    pub async fn update_user_status(&self, user_id: i64, status: UserStatus) -> Result<(), AccountApiError> {
        self.db.update_user_status(user_id, status).await
    }

    pub async fn add_vehicle(&self, vehicle: NewVehicle) -> Result<i64, AccountApiError> {
        self.db.add_vehicle(vehicle).await
    }

    /// Reads and deletes the user's pending cancellation notices, returning the first reason. One shot:
    /// the front end shows a single modal per visit.
    pub async fn consume_cancellation_notice(&self, user_id: i64) -> Result<Option<String>, AccountApiError> {
        self.db.consume_cancellation_notice(user_id).await
    }
}
