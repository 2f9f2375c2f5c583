//! # Parkside server
//! This crate hosts the HTTP surface of the Parkside reservation platform. It is responsible for:
//! * serving the booking, account and admin request/response contracts over actix-web,
//! * exchanging credential-module login tokens for access tokens and enforcing role checks,
//! * wiring the payment correlation channel (event consumer + in-process caches), and
//! * running the background expiry sweeper.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod sweeper;

#[cfg(test)]
mod endpoint_tests;
