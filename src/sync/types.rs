//! Sync data types
//!
//! Wire types of the progress synchronization service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress record as stored by the sync service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncProgress {
    /// Document identity (content hash)
    pub document: String,
    /// Serialized pointer
    pub progress: String,
    /// Completion as a fraction in `0.0..=1.0`
    pub percentage: f64,
    /// Name of the device that wrote this record
    pub device: String,
    /// Identifier of the device that wrote this record
    pub device_id: String,
    /// Server-side write time, present on reads only
    #[serde(
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress[document={}, progress={}, percentage={:.2}%, device={}, device-id={}]",
            self.document,
            self.progress,
            self.percentage * 100.0,
            self.device,
            self.device_id
        )
    }
}

/// Response to a progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProgressResult {
    pub document: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Identity this bridge reports as when writing progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub id: String,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            name: "progress-bridge".to_string(),
            id: "progress-bridge".to_string(),
        }
    }
}
