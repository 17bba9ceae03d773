//! Client for the external meal-registration service.
//!
//! Given a user, a date, and a meal slot, the upstream service reports
//! which mess the user is registered at and the redemption token for
//! that slot. The marketplace queries it at listing-creation time (to
//! auto-populate the venue) and at settlement time (to obtain the
//! transferable token from the seller's credential).

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::{MealType, UserId};
use crate::error::MarketError;

/// A user's meal registration for one slot.
#[derive(Debug, Clone, Deserialize)]
pub struct MessRegistration {
    /// The mess/venue the user is registered at for the slot.
    pub mess: String,
    /// Opaque redemption token for meal pickup.
    pub redemption_token: String,
}

/// Failure modes of the registration service.
///
/// `Unauthorized` and `NotRegistered` are recoverable, user-facing
/// conditions, not core failures.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The stored upstream credential is stale (HTTP 401); the user
    /// must re-authenticate with the registration portal.
    #[error("registration credential expired")]
    Unauthorized,

    /// The user has no registration for the requested slot (HTTP 404).
    #[error("no registration for {user} on {date} ({meal})")]
    NotRegistered {
        /// The user queried.
        user: UserId,
        /// The slot date.
        date: NaiveDate,
        /// The slot meal.
        meal: MealType,
    },

    /// The service could not be reached or answered unexpectedly.
    #[error("registration service error: {0}")]
    Transport(String),
}

impl From<RegistrationError> for MarketError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Unauthorized => Self::CredentialExpired,
            RegistrationError::NotRegistered { .. } => Self::NotRegistered(err.to_string()),
            RegistrationError::Transport(msg) => Self::RegistrationUnavailable(msg),
        }
    }
}

/// Lookup interface over the meal-registration service.
///
/// Object-safe so the service layer can hold an `Arc<dyn ...>` and
/// tests can substitute a canned implementation.
#[async_trait]
pub trait RegistrationProvider: Send + Sync + std::fmt::Debug {
    /// Fetches the user's registration for one meal slot.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] when the credential is stale,
    /// the user is not registered for the slot, or the service is
    /// unreachable.
    async fn registration(
        &self,
        user: &UserId,
        date: NaiveDate,
        meal: MealType,
    ) -> Result<MessRegistration, RegistrationError>;
}

/// HTTP implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRegistrationClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRegistrationClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Internal`] if the underlying HTTP
    /// client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MarketError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl RegistrationProvider for HttpRegistrationClient {
    async fn registration(
        &self,
        user: &UserId,
        date: NaiveDate,
        meal: MealType,
    ) -> Result<MessRegistration, RegistrationError> {
        let url = format!("{}/registrations/{}", self.base_url, user);
        let response = self
            .http
            .get(url)
            .query(&[("date", date.to_string()), ("meal", meal.to_string())])
            .send()
            .await
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(RegistrationError::Unauthorized),
            StatusCode::NOT_FOUND => Err(RegistrationError::NotRegistered {
                user: user.clone(),
                date,
                meal,
            }),
            status if status.is_success() => response
                .json::<MessRegistration>()
                .await
                .map_err(|e| RegistrationError::Transport(e.to_string())),
            status => Err(RegistrationError::Transport(format!(
                "unexpected status {status}"
            ))),
        }
    }
}
