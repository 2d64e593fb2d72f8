//! Common types shared across the motherstream orchestrator service.
//!
//! **Purpose:** the user record model, the crate-wide error type used at
//! component boundaries, and small time-formatting helpers.

pub mod error;
pub mod time;
pub mod user;

pub use error::{Error, Result};
pub use user::{is_valid_stream_key, UserRecord};
