//! Marketplace error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Ownership and conflict checks live in the core (not the UI), so every
//! operation rejects with one of these variants before any write happens.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "duplicate bid: update the existing bid instead",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`MarketError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                       |
/// |-----------|----------------------|-----------------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request                   |
/// | 2000–2099 | State / Conflict     | 404 Not Found / 409 Conflict      |
/// | 2100–2199 | Identity / Ownership | 401 Unauthorized / 403 Forbidden  |
/// | 3000–3999 | Server               | 500 Internal Server Error         |
/// | 4000–4999 | Registration Service | 401 / 422 / 502                   |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Request validation failed before any write.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Listing with the given ID was not found (or already retired).
    #[error("listing not found: {0}")]
    ListingNotFound(uuid::Uuid),

    /// Bid with the given ID was not found on the listing.
    #[error("bid not found: {0}")]
    BidNotFound(uuid::Uuid),

    /// The buyer already has a bid on this listing; it must be updated
    /// in place rather than re-created.
    #[error("duplicate bid: update the existing bid instead")]
    DuplicateBid,

    /// The bid has already been accepted and can no longer be changed
    /// or withdrawn by the buyer.
    #[error("bid has already been accepted")]
    AlreadyAccepted,

    /// The bid has not been accepted, so the requested settlement step
    /// is out of order (`paid` is only ever set via accept → pay).
    #[error("bid has not been accepted")]
    NotAccepted,

    /// No verified identity headers were present on the request.
    #[error("missing or invalid identity")]
    Unauthenticated,

    /// The caller is not the seller of the listing.
    #[error("caller is not the seller of this listing")]
    NotSeller,

    /// The caller is not the buyer who owns the bid.
    #[error("caller is not the owner of this bid")]
    NotBuyer,

    /// The upstream registration credential is stale; the user must
    /// re-authenticate with the meal-registration service.
    #[error("registration credential expired; re-authentication required")]
    CredentialExpired,

    /// The user has no meal registration for the requested slot.
    #[error("no meal registration found: {0}")]
    NotRegistered(String),

    /// The meal-registration service could not be reached.
    #[error("registration service unavailable: {0}")]
    RegistrationUnavailable(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ListingNotFound(_) => 2001,
            Self::BidNotFound(_) => 2002,
            Self::DuplicateBid => 2003,
            Self::AlreadyAccepted => 2004,
            Self::NotAccepted => 2005,
            Self::Unauthenticated => 2100,
            Self::NotSeller => 2101,
            Self::NotBuyer => 2102,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
            Self::CredentialExpired => 4001,
            Self::NotRegistered(_) => 4002,
            Self::RegistrationUnavailable(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ListingNotFound(_) | Self::BidNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateBid | Self::AlreadyAccepted | Self::NotAccepted => StatusCode::CONFLICT,
            Self::Unauthenticated | Self::CredentialExpired => StatusCode::UNAUTHORIZED,
            Self::NotSeller | Self::NotBuyer => StatusCode::FORBIDDEN,
            Self::NotRegistered(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RegistrationUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(
            MarketError::DuplicateBid.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MarketError::AlreadyAccepted.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(MarketError::NotAccepted.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn ownership_errors_map_to_403() {
        assert_eq!(MarketError::NotSeller.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(MarketError::NotBuyer.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(MarketError::DuplicateBid.error_code(), 2003);
        assert_eq!(MarketError::NotSeller.error_code(), 2101);
        assert_eq!(MarketError::CredentialExpired.error_code(), 4001);
    }

    #[test]
    fn credential_expired_routes_to_reauth() {
        // Stale upstream credentials surface as 401, not 500, so the client
        // can route the user back through the registration login step.
        assert_eq!(
            MarketError::CredentialExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
