//! Quota normalization for AI-service credentials.
//!
//! [`quota`] turns raw provider responses into canonical quota states and
//! display rows. [`account_usage`] runs the fetch-and-store cycle against a
//! host-supplied management API.

pub mod account_usage;
pub mod config;
pub mod quota;
pub mod usage_reset;
