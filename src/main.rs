//! mess-market server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mess_market::api;
use mess_market::app_state::AppState;
use mess_market::config::MarketConfig;
use mess_market::domain::{EventBus, ListingBook, MarketClock, SettlementLedger};
use mess_market::persistence::PostgresPersistence;
use mess_market::service::{HttpRegistrationClient, MarketService};
use mess_market::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = MarketConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting mess-market");

    // Build domain layer
    let clock = MarketClock::from_offset_minutes(config.utc_offset_minutes)?;
    let book = Arc::new(ListingBook::new());
    let ledger = Arc::new(SettlementLedger::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Upstream registration client
    let registration = Arc::new(HttpRegistrationClient::new(
        config.registration_base_url.clone(),
        config.registration_timeout_secs,
    )?);

    // Optional persistence mirror
    let persistence = if config.persistence_enabled {
        Some(Arc::new(PostgresPersistence::connect(&config)?))
    } else {
        None
    };

    // Build service layer
    let market_service = Arc::new(MarketService::new(
        book,
        ledger,
        registration,
        event_bus.clone(),
        persistence.clone(),
        clock,
    ));

    // Event-log task: append every domain event to Postgres.
    if config.event_log_enabled
        && let Some(persistence) = persistence
    {
        let mut event_rx = event_bus.subscribe();
        tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        let Ok(payload) = serde_json::to_value(&event) else {
                            continue;
                        };
                        let listing_id = event.listing_id().map(|id| *id.as_uuid());
                        if let Err(e) = persistence
                            .save_event(listing_id, event.event_type_str(), &payload)
                            .await
                        {
                            tracing::warn!(error = %e, "event log append failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "event log task lagged behind event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // Build application state
    let app_state = AppState {
        market_service,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
