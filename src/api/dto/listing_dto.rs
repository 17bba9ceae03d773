//! Listing-related DTOs for create, get, list, and edit operations.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use super::bid_dto::BidViewDto;
use super::common_dto::PaginationMeta;
use crate::domain::{ListingSummary, MealType};

/// Request body for `POST /listings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    /// Calendar date of the meal being sold.
    pub meal_date: NaiveDate,
    /// Which service slot the meal belongs to.
    pub meal_type: MealType,
    /// Mess/venue name. Auto-populated from the seller's meal
    /// registration when omitted.
    #[serde(default)]
    pub mess: Option<String>,
    /// Minimum acceptable price in whole rupees.
    pub min_price: u32,
}

/// Request body for `PATCH /listings/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePriceRequest {
    /// New minimum acceptable price.
    pub min_price: u32,
}

/// Paginated list response for `GET /listings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingListResponse {
    /// Listing summaries, soonest meal first.
    pub data: Vec<ListingSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Single listing detail for `GET /listings/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingDetailResponse {
    /// The listing.
    pub listing: ListingSummary,
    /// Its bids, highest price first.
    pub bids: Vec<BidViewDto>,
}
