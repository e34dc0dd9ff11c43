/// Application routes configuration
use axum::{Router, middleware, routing::get};

use crate::{
    handlers::{AppState, forecast, health, not_found, weather},
    rate_limit::limit_by_ip,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    // Only the current-weather path is rate limited.
    let limited = Router::new()
        .route("/weather", get(weather))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            limit_by_ip,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/forecast", get(forecast))
        .merge(limited)
        .fallback(not_found)
        .with_state(state)
}
