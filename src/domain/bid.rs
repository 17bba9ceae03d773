//! Bid: a buyer's price offer against a listing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BidId, ListingId, UserProfile};

/// A buyer's offer against a listing.
///
/// Exactly one bid may exist per (buyer, listing) pair; resubmission
/// mutates the price in place. `paid == true` implies
/// `accepted == true` — `paid` is only ever set via the accept → pay
/// path of the settlement state machine.
#[derive(Debug, Clone, Serialize)]
pub struct Bid {
    /// Unique bid identifier.
    pub id: BidId,

    /// The listing this bid targets.
    pub listing_id: ListingId,

    /// Buyer identity, denormalized at creation time.
    pub buyer: UserProfile,

    /// Offered price in whole rupees. May be below the listing's
    /// minimum (allowed, but flagged to the caller).
    pub price: u32,

    /// Set exclusively by the listing's seller; at most one bid per
    /// listing carries this flag at any observable instant.
    pub accepted: bool,

    /// Terminal settlement flag; set only on an accepted bid.
    pub paid: bool,

    /// Creation timestamp. Orders ties when bids share a price.
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a fresh unaccepted bid.
    #[must_use]
    pub fn new(listing_id: ListingId, buyer: UserProfile, price: u32) -> Self {
        Self {
            id: BidId::new(),
            listing_id,
            buyer,
            price,
            accepted: false,
            paid: false,
            created_at: Utc::now(),
        }
    }
}
