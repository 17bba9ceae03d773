//! REST API layer: route handlers, DTOs, identity extraction, and
//! router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; system endpoints
//! (`/health`, `/config/meal-types`, `/admin/sweep`) live at the root.

pub mod auth;
pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
