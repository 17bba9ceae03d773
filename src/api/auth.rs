//! Verified-identity extraction for REST and WebSocket handlers.
//!
//! Ticket validation happens upstream: the SSO proxy exchanges the
//! campus ticket and forwards the verified identity triple as
//! `x-user-id`, `x-user-name`, and `x-user-email` headers. Handlers
//! that mutate state extract an [`AuthenticatedUser`] and reject with
//! 401 when the headers are absent.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::domain::UserProfile;
use crate::error::MarketError;

/// The verified identity of the calling user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(
    /// The verified profile forwarded by the SSO proxy.
    pub UserProfile,
);

/// Reads the identity triple from forwarded headers, if present.
///
/// `x-user-id` is mandatory; display name falls back to the id and
/// email to empty when the proxy omits them.
#[must_use]
pub fn profile_from_headers(headers: &HeaderMap) -> Option<UserProfile> {
    let id = headers.get("x-user-id")?.to_str().ok()?.trim();
    if id.is_empty() {
        return None;
    }
    let name = headers
        .get("x-user-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(id);
    let email = headers
        .get("x-user-email")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Some(UserProfile::new(id, name, email))
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        profile_from_headers(&parts.headers)
            .map(AuthenticatedUser)
            .ok_or(MarketError::Unauthenticated)
    }
}
