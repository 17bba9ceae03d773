//! Service layer: business logic orchestration.
//!
//! [`MarketService`] coordinates the bid/listing lifecycle, drives the
//! settlement state machine and the expiry sweep, and emits events
//! through the [`crate::domain::EventBus`]. The [`Notifier`] handles
//! fire-and-forget notification fan-out, and [`registration`] wraps the
//! external meal-registration service.

pub mod market_service;
pub mod notifier;
pub mod registration;

pub use market_service::{BidOutcome, MarketService, SettlementOutcome};
pub use notifier::Notifier;
pub use registration::{HttpRegistrationClient, MessRegistration, RegistrationProvider};
