//! Caller-scoped account views: active purchases, transaction history,
//! and the notification feed.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{
    NotificationListResponse, PurchaseListResponse, TransactionDto, TransactionListResponse,
};
use crate::app_state::AppState;
use crate::error::MarketError;

/// `GET /purchases` — The caller's active (still-redeemable) purchases.
///
/// # Errors
///
/// Returns [`MarketError::Unauthenticated`] without identity headers.
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    tag = "Account",
    summary = "List active purchases",
    description = "Returns the caller's purchases whose meal date has not yet passed on the pinned market clock. The filter is evaluated at query time; nothing is stored.",
    responses(
        (status = 200, description = "Active purchases", body = PurchaseListResponse),
    )
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, MarketError> {
    let data = state.market_service.active_purchases(&caller.id).await;
    Ok(Json(PurchaseListResponse { data }))
}

/// `GET /transactions` — The caller's settled sales and purchases.
///
/// # Errors
///
/// Returns [`MarketError::Unauthenticated`] without identity headers.
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "Account",
    summary = "List transaction history",
    description = "Returns every settled transaction where the caller was buyer or seller, newest first, including time-to-sale.",
    responses(
        (status = 200, description = "Transaction history", body = TransactionListResponse),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, MarketError> {
    let records = state.market_service.transactions_for(&caller.id).await;
    let data = records.iter().map(TransactionDto::from).collect();
    Ok(Json(TransactionListResponse { data }))
}

/// `GET /notifications` — The caller's notification feed.
///
/// # Errors
///
/// Returns [`MarketError::Unauthenticated`] without identity headers.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Account",
    summary = "List notifications",
    description = "Returns the caller's durable notification feed, newest first. Live delivery happens over the WebSocket.",
    responses(
        (status = 200, description = "Notification feed", body = NotificationListResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, MarketError> {
    let data = state.market_service.notifications_for(&caller.id).await;
    Ok(Json(NotificationListResponse { data }))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases))
        .route("/transactions", get(list_transactions))
        .route("/notifications", get(list_notifications))
}
