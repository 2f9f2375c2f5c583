//! Parkside Reservation Engine
//!
//! The engine holds the core logic of the Parkside parking-reservation platform: the booking lifecycle,
//! the spot-availability state machine, payment correlation with the external payment agent, and the
//! periodic reclamation of abandoned bookings. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the reference backend. You should
//!    never need to access the database directly; use the public APIs instead. The exception is the data
//!    types used in the database, which are defined in the `db_types` module and are public.
//! 2. The engine public APIs ([`mod@api`]): booking flow, accounts, authentication, the payment ledger
//!    and analytics. Backends implement the traits in [`mod@traits`] to power these APIs.
//! 3. The asynchronous plumbing that decouples booking creation from payment collection: the event
//!    channel ([`mod@events`]) and the payment-correlation stores ([`mod@correlation`]).
mod api;
pub mod correlation;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{AccountApi, AnalyticsApi, AuthApi, BookingFlowApi, BookingReceipt, PaymentsApi};
pub use traits::{
    AccountApiError,
    AccountManagement,
    Analytics,
    AuthApiError,
    AuthManagement,
    PaymentApiError,
    PaymentLedger,
    ReservationDatabase,
    ReservationError,
};
