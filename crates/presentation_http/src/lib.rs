//! Talebox HTTP presentation layer
//!
//! JSON API for the story form: catalog, quota status and story creation,
//! plus health probes and the quota purge task.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tasks;

pub use error::ApiError;
pub use middleware::{ClientIdentity, IdentityResolver, SessionSigner, ValidatedJson};
pub use routes::create_router;
pub use state::AppState;
