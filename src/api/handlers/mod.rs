//! REST endpoint handlers organized by resource.

pub mod account;
pub mod bid;
pub mod listing;
pub mod settlement;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(listing::routes())
        .merge(bid::routes())
        .merge(settlement::routes())
        .merge(account::routes())
}
