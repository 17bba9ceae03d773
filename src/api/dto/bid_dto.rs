//! Bid-related DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Bid, BidId, ListingId, UserId};

/// Request body for `POST /listings/{id}/bids`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceBidRequest {
    /// Offered price in whole rupees. May be below the listing
    /// minimum; the response flags that case.
    pub price: u32,
}

/// Request body for `PUT /listings/{id}/bids`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBidRequest {
    /// New offered price.
    pub price: u32,
}

/// Projection of a bid joined with its buyer's display identity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BidViewDto {
    /// Bid identifier.
    pub bid_id: BidId,
    /// The listing the bid targets.
    pub listing_id: ListingId,
    /// Bidder's opaque id.
    pub buyer_id: UserId,
    /// Bidder's display name.
    pub buyer_name: String,
    /// Offered price.
    pub price: u32,
    /// Whether the seller has accepted this bid.
    pub accepted: bool,
    /// Whether the offer is below the listing minimum (warning only;
    /// such bids are still valid).
    pub below_min: bool,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
}

impl BidViewDto {
    /// Builds the view for one bid. `below_min` is computed by the
    /// caller against the listing's minimum price.
    #[must_use]
    pub fn from_bid(bid: &Bid, below_min: bool) -> Self {
        Self {
            bid_id: bid.id,
            listing_id: bid.listing_id,
            buyer_id: bid.buyer.id.clone(),
            buyer_name: bid.buyer.name.clone(),
            price: bid.price,
            accepted: bid.accepted,
            below_min,
            created_at: bid.created_at,
        }
    }
}
