//! Persistence layer
//!
//! SQLite connection pooling, schema migrations and the two quota store
//! implementations.

pub mod connection;
pub mod memory_quota_store;
pub mod migrations;
pub mod quota_store;

pub use connection::{ConnectionPool, DatabaseError, PooledConn, create_pool};
pub use memory_quota_store::InMemoryQuotaStore;
pub use quota_store::SqliteQuotaStore;
