//! Domain layer: core types, stores, expiry policy, and event system.
//!
//! This module contains the marketplace domain model: typed record
//! identifiers, the meal/expiry policy, listings and bids with their
//! concurrent in-memory book, the write-once settlement ledger, typed
//! notifications, and the event bus that broadcasts state transitions.

pub mod bid;
pub mod event_bus;
pub mod expiry;
pub mod ids;
pub mod ledger;
pub mod listing;
pub mod listing_book;
pub mod market_event;
pub mod meal;
pub mod notification;
pub mod user;

pub use bid::Bid;
pub use event_bus::EventBus;
pub use expiry::{MarketClock, is_expired};
pub use ids::{BidId, ListingId, PurchaseId, TransactionId};
pub use ledger::{PurchaseRecord, PurchaseView, SettlementLedger, TransactionRecord};
pub use listing::{Listing, ListingSummary};
pub use listing_book::{ListingBook, ListingEntry};
pub use market_event::MarketEvent;
pub use meal::MealType;
pub use notification::{Notification, NotificationPayload};
pub use user::{UserId, UserProfile};
