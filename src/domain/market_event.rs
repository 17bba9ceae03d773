//! Domain events reflecting marketplace state transitions.
//!
//! Every state mutation emits a [`MarketEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers
//! and optionally appended to the PostgreSQL event log. Delivery is
//! best-effort and may lag the state change it describes; nothing in
//! the state machine waits on a subscriber.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::notification::Notification;
use super::{BidId, ListingId, MealType, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// Emitted when a seller creates a listing.
    ListingCreated {
        /// Listing identifier.
        listing_id: ListingId,
        /// Seller's opaque id.
        seller_id: UserId,
        /// Meal date.
        meal_date: NaiveDate,
        /// Meal slot.
        meal_type: MealType,
        /// Mess/venue name.
        mess: String,
        /// Minimum acceptable price.
        min_price: u32,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a seller edits the minimum price of an unsettled
    /// listing.
    ListingRepriced {
        /// Listing identifier.
        listing_id: ListingId,
        /// Previous minimum price.
        old_min_price: u32,
        /// New minimum price.
        new_min_price: u32,
        /// Edit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a seller withdraws an unsettled listing.
    ListingDelisted {
        /// Listing identifier.
        listing_id: ListingId,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a buyer places a first bid on a listing.
    BidPlaced {
        /// Target listing.
        listing_id: ListingId,
        /// New bid identifier.
        bid_id: BidId,
        /// Bidder's opaque id.
        buyer_id: UserId,
        /// Offered price.
        price: u32,
        /// Whether the offer is below the listing minimum.
        below_min: bool,
        /// Placement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a buyer re-prices an existing bid.
    BidUpdated {
        /// Target listing.
        listing_id: ListingId,
        /// The re-priced bid.
        bid_id: BidId,
        /// Previous price.
        old_price: u32,
        /// New price.
        new_price: u32,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a buyer withdraws an unaccepted bid.
    BidWithdrawn {
        /// Target listing.
        listing_id: ListingId,
        /// The withdrawn bid.
        bid_id: BidId,
        /// Withdrawal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the seller accepts a bid. Any previously accepted
    /// bid on the same listing has been un-accepted by the same write.
    BidAccepted {
        /// Target listing.
        listing_id: ListingId,
        /// The accepted bid.
        bid_id: BidId,
        /// The winning buyer.
        buyer_id: UserId,
        /// Accepted price.
        price: u32,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the seller reverses an acceptance before payment.
    /// The bid itself is deleted; the buyer must re-bid.
    AcceptanceCancelled {
        /// Target listing.
        listing_id: ListingId,
        /// The deleted bid.
        bid_id: BidId,
        /// The affected buyer.
        buyer_id: UserId,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when settlement completes: transaction and purchase
    /// recorded, bids cascaded, listing retired.
    ListingSettled {
        /// The settled listing.
        listing_id: ListingId,
        /// The winning bid.
        bid_id: BidId,
        /// Buyer's opaque id.
        buyer_id: UserId,
        /// Seller's opaque id.
        seller_id: UserId,
        /// Final sale price.
        sold_price: u32,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the expiry sweep removes a listing whose meal
    /// window has passed.
    ListingExpired {
        /// The expired listing.
        listing_id: ListingId,
        /// Meal date of the expired slot.
        meal_date: NaiveDate,
        /// Meal slot of the expired slot.
        meal_type: MealType,
        /// Sweep timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a notification is appended to a user's feed, so a
    /// live connection authenticated as that user can receive it
    /// immediately.
    NotificationPosted {
        /// Recipient.
        user_id: UserId,
        /// The full notification entry.
        notification: Notification,
    },
}

impl MarketEvent {
    /// Returns the listing this event concerns, if any.
    #[must_use]
    pub const fn listing_id(&self) -> Option<ListingId> {
        match self {
            Self::ListingCreated { listing_id, .. }
            | Self::ListingRepriced { listing_id, .. }
            | Self::ListingDelisted { listing_id, .. }
            | Self::BidPlaced { listing_id, .. }
            | Self::BidUpdated { listing_id, .. }
            | Self::BidWithdrawn { listing_id, .. }
            | Self::BidAccepted { listing_id, .. }
            | Self::AcceptanceCancelled { listing_id, .. }
            | Self::ListingSettled { listing_id, .. }
            | Self::ListingExpired { listing_id, .. } => Some(*listing_id),
            Self::NotificationPosted { .. } => None,
        }
    }

    /// Returns the recipient when the event addresses a single user.
    #[must_use]
    pub const fn addressed_to(&self) -> Option<&UserId> {
        match self {
            Self::NotificationPosted { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ListingCreated { .. } => "listing_created",
            Self::ListingRepriced { .. } => "listing_repriced",
            Self::ListingDelisted { .. } => "listing_delisted",
            Self::BidPlaced { .. } => "bid_placed",
            Self::BidUpdated { .. } => "bid_updated",
            Self::BidWithdrawn { .. } => "bid_withdrawn",
            Self::BidAccepted { .. } => "bid_accepted",
            Self::AcceptanceCancelled { .. } => "acceptance_cancelled",
            Self::ListingSettled { .. } => "listing_settled",
            Self::ListingExpired { .. } => "listing_expired",
            Self::NotificationPosted { .. } => "notification_posted",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn listing_events_expose_listing_id() {
        let id = ListingId::new();
        let event = MarketEvent::ListingDelisted {
            listing_id: id,
            timestamp: Utc::now(),
        };
        assert_eq!(event.listing_id(), Some(id));
        assert_eq!(event.event_type_str(), "listing_delisted");
    }

    #[test]
    fn bid_placed_serializes() {
        let event = MarketEvent::BidPlaced {
            listing_id: ListingId::new(),
            bid_id: BidId::new(),
            buyer_id: UserId::new("buyer1"),
            price: 40,
            below_min: true,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"bid_placed\""));
        assert!(json.contains("below_min"));
    }

    #[test]
    fn notification_posted_is_user_addressed() {
        let event = MarketEvent::NotificationPosted {
            user_id: UserId::new("buyer1"),
            notification: Notification::new(
                UserId::new("buyer1"),
                "t",
                "m",
                super::super::notification::NotificationPayload::AcceptanceCancelled {
                    listing_id: ListingId::new(),
                },
            ),
        };
        assert_eq!(event.listing_id(), None);
        assert_eq!(event.addressed_to(), Some(&UserId::new("buyer1")));
    }
}
