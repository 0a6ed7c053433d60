//! Server-issued session ids
//!
//! A session id is `<identity digest>.<hex HMAC-SHA256 of the digest>`. Only
//! ids whose signature verifies are honoured, so a client cannot pick its own
//! quota key; the digest is the address identity the id was minted for.

use std::fmt;

use domain::Identity;
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const DIGEST_HEX_LEN: usize = 64;

/// Mints and verifies session ids
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    /// Signer with a per-process secret; issued ids stop verifying on restart
    pub fn ephemeral() -> Result<Self, InvalidLength> {
        Self::new(rand::random::<[u8; 32]>())
    }

    /// Session id bound to `identity`
    #[must_use]
    pub fn mint(&self, identity: &Identity) -> String {
        let mut mac = self.mac.clone();
        mac.update(identity.as_str().as_bytes());
        format!(
            "{}.{}",
            identity.as_str(),
            hex::encode(mac.finalize().into_bytes())
        )
    }

    /// Identity carried by `token`, if this server signed it
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let (digest, signature) = token.trim().split_once('.')?;
        if digest.len() != DIGEST_HEX_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let Ok(signature) = hex::decode(signature) else {
            debug!("Session id signature is not hex");
            return None;
        };

        let mut mac = self.mac.clone();
        mac.update(digest.as_bytes());
        mac.verify_slice(&signature)
            .ok()
            .map(|()| Identity::from_digest(digest))
    }
}
