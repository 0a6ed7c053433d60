//! Anonymous requester identity used as the quota key

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Opaque quota key derived from a session token or client address
///
/// The raw value is hashed on construction so neither storage nor logs ever
/// see the address or token itself.
///
/// # Examples
///
/// ```
/// use domain::Identity;
///
/// let a = Identity::new("203.0.113.7").unwrap();
/// let b = Identity::new("203.0.113.7").unwrap();
/// assert_eq!(a, b);
/// assert!(!a.as_str().contains("203"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Hash a raw session token or address into an identity
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(DomainError::InvalidIdentity(
                "identity source is empty".to_string(),
            ));
        }
        Ok(Self(blake3::hash(raw.as_bytes()).to_hex().to_string()))
    }

    /// Rebuild an identity from an already-hashed key (storage round trip)
    #[must_use]
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}
