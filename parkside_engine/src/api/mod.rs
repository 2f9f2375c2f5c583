//! The public-facing engine APIs. Each API struct is generic over the backend traits it needs, so the
//! HTTP layer and tests can drive any conforming backend.

pub mod accounts_api;
pub mod analytics_api;
pub mod auth_api;
pub mod booking_flow_api;
pub mod payments_api;

pub use accounts_api::AccountApi;
pub use analytics_api::AnalyticsApi;
pub use auth_api::AuthApi;
pub use booking_flow_api::{BookingFlowApi, BookingReceipt};
pub use payments_api::PaymentsApi;
