//! Bid handlers: place, re-price, list, withdraw.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{BidViewDto, PlaceBidRequest, UpdateBidRequest};
use crate::app_state::AppState;
use crate::domain::{BidId, ListingId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings/{id}/bids` — Place a first bid on a listing.
///
/// # Errors
///
/// Returns [`MarketError::DuplicateBid`] if the caller already has a
/// bid on the listing; the existing bid must be updated instead.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/bids",
    tag = "Bids",
    summary = "Place a bid",
    description = "Places a first bid. Offers below the listing minimum are accepted and flagged with `below_min` so the client can warn the bidder. One bid per buyer per listing.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = PlaceBidRequest,
    responses(
        (status = 201, description = "Bid placed", body = BidViewDto),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Caller already has a bid on this listing", body = ErrorResponse),
    )
)]
pub async fn place_bid(
    State(state): State<AppState>,
    AuthenticatedUser(buyer): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    let outcome = state
        .market_service
        .place_bid(buyer, listing_id, req.price)
        .await?;

    let view = BidViewDto::from_bid(&outcome.bid, outcome.below_min);
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /listings/{id}/bids` — Re-price the caller's existing bid.
///
/// # Errors
///
/// Returns [`MarketError::AlreadyAccepted`] once the bid has been
/// accepted; price changes are refused from that point on.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}/bids",
    tag = "Bids",
    summary = "Update a bid",
    description = "Re-prices the caller's existing bid on the listing. Refused once the bid is accepted.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = UpdateBidRequest,
    responses(
        (status = 200, description = "Bid updated", body = BidViewDto),
        (status = 404, description = "No bid to update", body = ErrorResponse),
        (status = 409, description = "Bid already accepted", body = ErrorResponse),
    )
)]
pub async fn update_bid(
    State(state): State<AppState>,
    AuthenticatedUser(buyer): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateBidRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    let outcome = state
        .market_service
        .update_bid(&buyer.id, listing_id, req.price)
        .await?;

    let view = BidViewDto::from_bid(&outcome.bid, outcome.below_min);
    Ok(Json(view))
}

/// `GET /listings/{id}/bids` — All bids on a listing, highest first.
///
/// # Errors
///
/// Returns [`MarketError::ListingNotFound`] for unknown listings.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/bids",
    tag = "Bids",
    summary = "List bids on a listing",
    description = "Returns the listing's bids ordered by price descending (ties by arrival), enriched with each buyer's display identity.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Bid list", body = Vec<BidViewDto>),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn list_bids(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    let (listing, bids) = state.market_service.listing_detail(listing_id).await?;

    let views: Vec<BidViewDto> = bids
        .iter()
        .map(|b| BidViewDto::from_bid(b, b.price < listing.min_price))
        .collect();
    Ok(Json(views))
}

/// `DELETE /bids/{bid_id}` — Withdraw the caller's bid.
///
/// # Errors
///
/// Returns [`MarketError::NotBuyer`] if the caller does not own the
/// bid and [`MarketError::AlreadyAccepted`] if it has been accepted.
/// Withdrawing an already-removed bid succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/bids/{bid_id}",
    tag = "Bids",
    summary = "Withdraw a bid",
    description = "Buyer-only and idempotent. Refused once the bid has been accepted; the seller must cancel the acceptance instead.",
    params(
        ("bid_id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 204, description = "Bid withdrawn"),
        (status = 403, description = "Caller does not own the bid", body = ErrorResponse),
        (status = 409, description = "Bid already accepted", body = ErrorResponse),
    )
)]
pub async fn withdraw_bid(
    State(state): State<AppState>,
    AuthenticatedUser(buyer): AuthenticatedUser,
    Path(bid_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let bid_id = BidId::from_uuid(bid_id);
    state.market_service.withdraw_bid(&buyer.id, bid_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bid routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/listings/{id}/bids",
            post(place_bid).put(update_bid).get(list_bids),
        )
        .route("/bids/{bid_id}", delete(withdraw_bid))
}
