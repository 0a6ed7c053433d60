//! Requester identity resolution
//!
//! A verified `X-Session-Id` (see [`SessionSigner`]) keys the quota on the
//! identity it was issued for. Otherwise the key is the client address: the
//! first `X-Forwarded-For` entry when the server sits behind a trusted proxy,
//! else the socket peer, else the shared `anonymous` bucket. Every response
//! carries the caller's session id so clients can keep their quota across
//! address changes.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use domain::{DomainError, Identity};
use tracing::debug;

use super::session::SessionSigner;
use crate::error::ApiError;

pub const SESSION_HEADER: &str = "x-session-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const ANONYMOUS: &str = "anonymous";

/// Hashed identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub Identity);

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Raw address source for a request, before hashing
pub fn address_source(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    let forwarded = trust_forwarded_for
        .then(|| header_value(headers, FORWARDED_FOR_HEADER))
        .flatten()
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(first) = forwarded {
        return format!("ip:{first}");
    }

    match peer {
        Some(addr) => format!("ip:{}", addr.ip()),
        None => ANONYMOUS.to_string(),
    }
}

/// Caller identity plus the session id to hand back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClient {
    pub identity: Identity,
    pub session_id: String,
}

/// Turns request metadata into a quota identity
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    signer: SessionSigner,
    trust_forwarded_for: bool,
}

impl IdentityResolver {
    pub const fn new(signer: SessionSigner, trust_forwarded_for: bool) -> Self {
        Self {
            signer,
            trust_forwarded_for,
        }
    }

    pub fn resolve(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<ResolvedClient, DomainError> {
        let presented = header_value(headers, SESSION_HEADER);
        if let Some(identity) = presented.and_then(|token| self.signer.verify(token)) {
            return Ok(ResolvedClient {
                session_id: self.signer.mint(&identity),
                identity,
            });
        }
        if presented.is_some() {
            debug!("Ignoring session id this server did not issue");
        }

        let identity = Identity::new(address_source(headers, peer, self.trust_forwarded_for))?;
        Ok(ResolvedClient {
            session_id: self.signer.mint(&identity),
            identity,
        })
    }
}

/// Resolve the caller once per request and echo their session id
pub async fn attach_identity(
    State(resolver): State<Arc<IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = resolver.resolve(request.headers(), peer)?;
    debug!(identity = %client.identity, "Resolved client identity");

    request
        .extensions_mut()
        .insert(ClientIdentity(client.identity));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&client.session_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    Ok(response)
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("client identity was not resolved".to_string()))
    }
}
