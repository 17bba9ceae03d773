//! Listing: a seller's offer to transfer one meal slot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ListingId, MealType, UserId, UserProfile};

/// A single seller's offer of one meal slot for sale.
///
/// Mutated only by its seller (minimum price edit) until a bid is
/// accepted; destroyed by settlement, seller withdrawal, or the expiry
/// sweep once the meal window has elapsed.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Unique listing identifier (immutable after creation).
    pub id: ListingId,

    /// Seller identity, denormalized at creation time.
    pub seller: UserProfile,

    /// Calendar date of the meal being sold.
    pub meal_date: NaiveDate,

    /// Which service slot the meal belongs to.
    pub meal_type: MealType,

    /// Mess/venue name where the meal is served.
    pub mess: String,

    /// Minimum acceptable price in whole rupees. Bids below this are
    /// allowed but flagged to the bidder.
    pub min_price: u32,

    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Creates a new listing with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(
        seller: UserProfile,
        meal_date: NaiveDate,
        meal_type: MealType,
        mess: String,
        min_price: u32,
    ) -> Self {
        Self {
            id: ListingId::new(),
            seller,
            meal_date,
            meal_type,
            mess,
            min_price,
            created_at: Utc::now(),
        }
    }
}

/// Lightweight listing projection for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingSummary {
    /// Listing identifier.
    pub listing_id: ListingId,
    /// Seller's opaque id.
    pub seller_id: UserId,
    /// Seller's display name.
    pub seller_name: String,
    /// Meal date.
    pub meal_date: NaiveDate,
    /// Meal slot.
    pub meal_type: MealType,
    /// Mess/venue name.
    pub mess: String,
    /// Minimum acceptable price.
    pub min_price: u32,
    /// Number of open bids on the listing.
    pub bid_count: usize,
    /// Whether some bid has been accepted.
    pub has_accepted_bid: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
