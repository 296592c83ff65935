//! Quota fetch-and-store cycle.
//!
//! This module drives the normalizers in [`crate::quota`]:
//! - Selects eligible auth files and resolves the ids each request needs
//! - Sends requests through a host-supplied [`api_client::ManagementApi`]
//! - Commits each settled state into a [`store::QuotaStore`], discarding
//!   results of superseded fetches

pub mod api_client;
pub mod credentials;
pub mod fetcher;
pub mod store;
pub mod types;
