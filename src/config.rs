//! Configuration management for Progress Bridge

use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::pointer::LedgerMode;
use crate::sync::{user_key, Device};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub sync: SyncConfig,
    pub http: HttpConfig,
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub api_root: String,
    pub api_key: String,
}

/// Sync service section. `user` and `key` may be empty when only the
/// catalog is used; the sync client refuses to start without them.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub api_root: String,
    pub user: String,
    /// User key sent as `X-Auth-Key` (MD5 hex of the password)
    pub key: String,
    pub device: Device,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionConfig {
    pub ledger_mode: LedgerMode,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            api_root: "http://localhost:25600".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_root: "https://sync.koreader.rocks".to_string(),
            user: String::new(),
            key: String::new(),
            device: Device::default(),
        }
    }
}

impl SyncConfig {
    pub fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.key.is_empty()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        let key = env::var("KOSYNC_KEY")
            .or_else(|_| env::var("KOSYNC_PASSWORD").map(|password| user_key(&password)))
            .unwrap_or_default();

        let ledger_mode = match env::var("SIBLING_LEDGER") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using {}", e, LedgerMode::default());
                LedgerMode::default()
            }),
            Err(_) => LedgerMode::default(),
        };

        Ok(Config {
            catalog: CatalogConfig {
                api_root: env::var("KOMGA_API_ROOT")?,
                api_key: env::var("KOMGA_API_KEY")?,
            },
            sync: SyncConfig {
                api_root: env::var("KOSYNC_API_ROOT").unwrap_or(defaults.sync.api_root),
                user: env::var("KOSYNC_USER").unwrap_or_default(),
                key,
                device: Device {
                    name: env::var("SYNC_DEVICE").unwrap_or(defaults.sync.device.name),
                    id: env::var("SYNC_DEVICE_ID").unwrap_or(defaults.sync.device.id),
                },
            },
            http: HttpConfig {
                timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            conversion: ConversionConfig { ledger_mode },
        })
    }
}
