//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports: provider adapters for story text and
//! narration, SQLite and in-memory quota stores, configuration loading and
//! tracing setup.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AppConfig, DatabaseConfig, Environment, QuotaConfig, QuotaStoreKind, ServerConfig,
    StoryConfig, TelemetryConfig,
};
pub use persistence::{
    ConnectionPool, DatabaseError, InMemoryQuotaStore, SqliteQuotaStore, create_pool,
};
pub use telemetry::{LogFormat, TelemetryError, init_tracing};
