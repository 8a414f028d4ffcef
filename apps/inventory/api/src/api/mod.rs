//! Route composition for the inventory API.

mod health;
mod inventory;

use crate::state::AppState;
use axum::{Router, routing::get};

/// Creates all API routes, served under `/api` by `create_router`
pub fn routes(state: &AppState) -> Router {
    inventory::router(state)
}

/// Readiness probe backed by a real database round trip
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
