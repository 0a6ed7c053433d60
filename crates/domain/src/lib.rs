//! Domain layer for Talebox
//!
//! Contains the story request vocabulary, quota records, story text and audio
//! entities, and domain errors. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
