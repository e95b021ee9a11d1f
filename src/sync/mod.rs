//! Sync module
//!
//! Client side of the progress synchronization service.

mod client;
mod types;

pub use client::{check_status, user_key, SyncClient, SyncError};
pub use types::{Device, SyncProgress, UpdateProgressResult};
