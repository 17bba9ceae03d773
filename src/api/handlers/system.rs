//! System endpoints: health check, meal-type catalog, expiry sweep.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::MealType;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Meal slot info.
#[derive(Debug, Serialize, ToSchema)]
struct MealTypeInfo {
    meal_type: &'static str,
    service_end_hour: u32,
}

/// `GET /config/meal-types` — List meal slots and their cutoffs.
#[utoipa::path(
    get,
    path = "/config/meal-types",
    tag = "System",
    summary = "List meal types",
    description = "Returns every meal slot the marketplace recognizes together with its end-of-service hour in the pinned market timezone.",
    responses(
        (status = 200, description = "Meal type catalog", body = Vec<MealTypeInfo>),
    )
)]
pub async fn meal_types_handler() -> impl IntoResponse {
    let types: Vec<MealTypeInfo> = MealType::all()
        .into_iter()
        .map(|meal| MealTypeInfo {
            meal_type: meal.as_str(),
            service_end_hour: meal.service_end_hour(),
        })
        .collect();
    (StatusCode::OK, Json(types))
}

/// Response body for `POST /admin/sweep`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SweepResponse {
    /// At least one listing was deleted.
    Deleted {
        /// Number of listings deleted (bids cascade).
        deleted: usize,
    },
    /// Nothing was expired.
    NoOp {
        /// Fixed no-op message.
        message: String,
    },
}

/// `POST /admin/sweep` — Delete every listing whose meal window has
/// passed.
///
/// The sweep has no internal scheduler; an external cron hits this
/// endpoint. Callers should treat any non-2xx response as retryable —
/// partial deletion is recovered by the next run.
#[utoipa::path(
    post,
    path = "/admin/sweep",
    tag = "System",
    summary = "Run the expiry sweep",
    description = "Deletes expired listings and their bids, notifying sellers and bidders. Idempotent: a second run with nothing newly expired deletes zero.",
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse),
    )
)]
pub async fn sweep_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.market_service.clock().now();
    let deleted = state.market_service.sweep(now).await;

    let body = if deleted == 0 {
        SweepResponse::NoOp {
            message: "none found".to_string(),
        }
    } else {
        SweepResponse::Deleted { deleted }
    };
    (StatusCode::OK, Json(body))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/meal-types", get(meal_types_handler))
        .route("/admin/sweep", post(sweep_handler))
}
