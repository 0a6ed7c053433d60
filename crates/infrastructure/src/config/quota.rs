//! Daily quota configuration.

use std::fmt;

use domain::DEFAULT_DAILY_LIMIT;
use serde::{Deserialize, Serialize};

/// Where quota counts are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaStoreKind {
    /// Process memory; counts are lost on restart
    Memory,
    /// SQLite file from the `database` section
    #[default]
    Sqlite,
}

impl fmt::Display for QuotaStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Stories per identity per UTC day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    #[serde(default)]
    pub store: QuotaStoreKind,

    /// How often stale records are purged, in seconds (0 disables)
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

const fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

const fn default_purge_interval() -> u64 {
    3600
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            store: QuotaStoreKind::default(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}
