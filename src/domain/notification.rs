//! Durable per-user notifications with closed, typed payloads.
//!
//! The notifier appends these to the recipient's feed and broadcasts
//! them on the event bus; live delivery is an adapter concern. The
//! payload is a closed tagged union keyed by notification type, so no
//! consumer ever sees an untyped grab-bag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BidId, ListingId, MealType, TransactionId, UserId};

/// A single entry in a user's notification feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: uuid::Uuid,
    /// Recipient.
    pub user_id: UserId,
    /// Short title for display.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Typed, variant-specific payload.
    pub payload: NotificationPayload,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification addressed to `user_id`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            title: title.into(),
            message: message.into(),
            payload,
            created_at: Utc::now(),
        }
    }

    /// Returns the payload discriminator as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Closed union of notification payloads, keyed by notification type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A bid was placed or re-priced on the recipient's listing.
    BidActivity {
        /// The listing that received the bid.
        listing_id: ListingId,
        /// The bid in question.
        bid_id: BidId,
        /// Bidder display name.
        bidder_name: String,
        /// Offered price.
        price: u32,
    },

    /// A bid was accepted; both parties receive each other's contact
    /// details to coordinate payment and handover.
    ContactExchange {
        /// The listing being settled.
        listing_id: ListingId,
        /// The accepted bid.
        bid_id: BidId,
        /// Counterparty display name.
        counterparty_name: String,
        /// Counterparty contact email.
        counterparty_email: String,
        /// Agreed price.
        price: u32,
    },

    /// The seller confirmed payment; the sale is recorded and the
    /// redemption token (if captured) is available on the purchase.
    PaymentConfirmed {
        /// The settled listing.
        listing_id: ListingId,
        /// The transaction that recorded the sale.
        transaction_id: TransactionId,
        /// Whether a redemption token was captured at settlement.
        token_available: bool,
    },

    /// The seller cancelled a previously accepted bid before payment;
    /// the buyer must not pay and has to re-bid to participate again.
    AcceptanceCancelled {
        /// The listing whose acceptance was reversed.
        listing_id: ListingId,
    },

    /// The listing's meal window passed and the sweep removed it.
    ListingExpired {
        /// The expired listing.
        listing_id: ListingId,
        /// Meal date of the expired slot.
        meal_date: NaiveDate,
        /// Meal slot of the expired slot.
        meal_type: MealType,
    },
}

impl NotificationPayload {
    /// Returns the payload discriminator as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BidActivity { .. } => "bid_activity",
            Self::ContactExchange { .. } => "contact_exchange",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::AcceptanceCancelled { .. } => "acceptance_cancelled",
            Self::ListingExpired { .. } => "listing_expired",
        }
    }
}
