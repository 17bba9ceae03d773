//! Opaque user identity as issued by the campus SSO exchange.
//!
//! Identity issuance itself is external: the SSO proxy validates the
//! one-time ticket and forwards a verified `(id, name, email)` triple.
//! The core treats the id as an opaque roll-number-equivalent string.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque user identifier (roll-number-equivalent string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from an already-verified identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Verified identity triple from the external SSO exchange.
///
/// Captured at request time and denormalized onto the records a user
/// creates, so bid lists and contact-exchange notifications can carry a
/// display identity without a join against an identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Opaque user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

impl UserProfile {
    /// Creates a profile from its verified parts.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: email.into(),
        }
    }
}
