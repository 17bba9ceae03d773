//! Listing handlers: create, list, get, edit price, delist.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{
    BidViewDto, CreateListingRequest, ListingDetailResponse, ListingListResponse, PaginationMeta,
    PaginationParams, UpdatePriceRequest,
};
use crate::app_state::AppState;
use crate::domain::ListingId;
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings` — Create a listing for one of the seller's slots.
///
/// # Errors
///
/// Returns [`MarketError`] on validation failure or when the venue
/// lookup against the registration service fails.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "Create a listing",
    description = "Creates a listing for a meal slot. The venue is auto-populated from the seller's meal registration when `mess` is omitted.",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = crate::domain::ListingSummary),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "No meal registration for the slot", body = ErrorResponse),
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(seller): AuthenticatedUser,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let summary = state
        .market_service
        .create_listing(seller, req.meal_date, req.meal_type, req.mess, req.min_price)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /listings` — List open listings with pagination.
///
/// # Errors
///
/// Returns [`MarketError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "List open listings",
    description = "Returns a paginated list of open listings, soonest meal first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated listing list", body = ListingListResponse),
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, MarketError> {
    let params = params.clamped();
    let summaries = state.market_service.list_open_listings().await;

    let total = summaries.len() as u32;
    let per_page = params.per_page;
    let page = params.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = ((page - 1) * per_page) as usize;
    let data = summaries
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Ok(Json(ListingListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /listings/{id}` — Listing detail with bids.
///
/// # Errors
///
/// Returns [`MarketError::ListingNotFound`] if the listing does not
/// exist or has been retired.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "Get listing detail",
    description = "Returns one listing together with its bids ordered by price descending (ties by arrival).",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Listing detail", body = ListingDetailResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    let (listing, bids) = state.market_service.listing_detail(listing_id).await?;

    let min_price = listing.min_price;
    let bids = bids
        .iter()
        .map(|b| BidViewDto::from_bid(b, b.price < min_price))
        .collect();

    Ok(Json(ListingDetailResponse { listing, bids }))
}

/// `PATCH /listings/{id}` — Edit the minimum price.
///
/// # Errors
///
/// Returns [`MarketError::NotSeller`] for non-owners and
/// [`MarketError::AlreadyAccepted`] once a bid has been accepted.
#[utoipa::path(
    patch,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "Edit the minimum price",
    description = "Seller-only. Refused once a bid has been accepted.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = UpdatePriceRequest,
    responses(
        (status = 200, description = "Listing updated", body = crate::domain::ListingSummary),
        (status = 403, description = "Caller is not the seller", body = ErrorResponse),
        (status = 409, description = "A bid is already accepted", body = ErrorResponse),
    )
)]
pub async fn update_listing(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdatePriceRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    let summary = state
        .market_service
        .update_min_price(listing_id, &caller.id, req.min_price)
        .await?;
    Ok(Json(summary))
}

/// `DELETE /listings/{id}` — Withdraw an unsettled listing.
///
/// # Errors
///
/// Returns [`MarketError::NotSeller`] if the caller does not own the
/// listing. Deleting an already-deleted listing succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    summary = "Delete a listing",
    description = "Seller-only and idempotent. Cascades all bids on the listing.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Caller is not the seller", body = ErrorResponse),
    )
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing_id = ListingId::from_uuid(id);
    state
        .market_service
        .delete_listing(listing_id, &caller.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Listing management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create_listing).get(list_listings))
        .route(
            "/listings/{id}",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
}
