//! Assorted utility functions for the engine.

mod times;

pub use times::{parse_booking_time, TimeParseError};
