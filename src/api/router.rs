use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes — require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Markets & statistics
        .route("/api/markets", get(handlers::markets::list))
        .route("/api/markets/:id", get(handlers::markets::detail))
        .route("/api/markets/:id/refresh", post(handlers::markets::refresh))
        .route("/api/markets/:id/quote", post(handlers::markets::quote))
        // Wagers
        .route("/api/markets/:id/wagers", post(handlers::wagers::place))
        .route("/api/markets/:id/reveal", post(handlers::wagers::reveal))
        .route("/api/markets/:id/positions", get(handlers::positions::list))
        // Payouts
        .route("/api/markets/:id/payout", get(handlers::payouts::status))
        .route("/api/markets/:id/payout/request", post(handlers::payouts::request))
        .route("/api/markets/:id/payout/claim", post(handlers::payouts::claim))
        // Balance
        .route("/api/balance", get(handlers::balance::get).delete(handlers::balance::invalidate))
        .route("/api/balance/refresh", post(handlers::balance::refresh))
        // Session
        .route("/api/session", delete(handlers::balance::clear_session))
        .layer(middleware::from_fn(require_auth));

    // CORS: the engine fronts a browser UI on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
