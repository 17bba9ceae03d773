//! Settlement handlers: accept, cancel acceptance, mark paid.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::SettlementResponse;
use crate::app_state::AppState;
use crate::domain::{BidId, ListingId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings/{id}/bids/{bid_id}/accept` — Accept a bid.
///
/// # Errors
///
/// Returns [`MarketError::NotSeller`] or [`MarketError::BidNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/bids/{bid_id}/accept",
    tag = "Settlement",
    summary = "Accept a bid",
    description = "Seller-only. Clears the accepted flag from any other bid on the listing in the same serialized write, then notifies both parties with contact details.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
        ("bid_id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 204, description = "Bid accepted"),
        (status = 403, description = "Caller is not the seller", body = ErrorResponse),
        (status = 404, description = "Listing or bid not found", body = ErrorResponse),
    )
)]
pub async fn accept_bid(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((id, bid_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .market_service
        .accept_bid(
            ListingId::from_uuid(id),
            BidId::from_uuid(bid_id),
            &caller.id,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /listings/{id}/bids/{bid_id}/cancel` — Reverse an acceptance
/// before payment.
///
/// # Errors
///
/// Returns [`MarketError::NotSeller`], [`MarketError::BidNotFound`] or
/// [`MarketError::NotAccepted`].
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/bids/{bid_id}/cancel",
    tag = "Settlement",
    summary = "Cancel an accepted bid",
    description = "Seller-only. Deletes the bid outright (the buyer must re-bid) and tells the buyer that no payment should be made.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
        ("bid_id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 204, description = "Acceptance cancelled"),
        (status = 403, description = "Caller is not the seller", body = ErrorResponse),
        (status = 409, description = "Bid is not accepted", body = ErrorResponse),
    )
)]
pub async fn cancel_accepted_bid(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((id, bid_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .market_service
        .cancel_accepted_bid(
            ListingId::from_uuid(id),
            BidId::from_uuid(bid_id),
            &caller.id,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /listings/{id}/bids/{bid_id}/pay` — Terminal settlement step.
///
/// # Errors
///
/// Returns [`MarketError::NotSeller`], [`MarketError::BidNotFound`] or
/// [`MarketError::NotAccepted`].
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/bids/{bid_id}/pay",
    tag = "Settlement",
    summary = "Mark the accepted bid paid",
    description = "Seller-only attestation that payment was received. Records the transaction and purchase, cascades the listing's bids, retires the listing, and notifies both parties. A failed redemption-token fetch degrades the settlement instead of aborting it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
        ("bid_id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 200, description = "Settlement recorded", body = SettlementResponse),
        (status = 403, description = "Caller is not the seller", body = ErrorResponse),
        (status = 409, description = "Bid is not accepted", body = ErrorResponse),
    )
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((id, bid_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, MarketError> {
    let outcome = state
        .market_service
        .mark_paid(
            ListingId::from_uuid(id),
            BidId::from_uuid(bid_id),
            &caller.id,
        )
        .await?;
    Ok(Json(SettlementResponse::from(outcome)))
}

/// Settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/bids/{bid_id}/accept", post(accept_bid))
        .route(
            "/listings/{id}/bids/{bid_id}/cancel",
            post(cancel_accepted_bid),
        )
        .route("/listings/{id}/bids/{bid_id}/pay", post(mark_paid))
}
