//! Request extractors and middleware shared by the handlers

mod identity;
mod session;
mod validation;

pub use identity::{
    ClientIdentity, FORWARDED_FOR_HEADER, IdentityResolver, ResolvedClient, SESSION_HEADER,
    address_source, attach_identity,
};
pub use session::SessionSigner;
pub use validation::ValidatedJson;
