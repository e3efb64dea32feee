//! Pricing API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Pricing router
///
/// The configurator endpoints (config read, quote) are public so the
/// storefront can price a build before checkout; writes require
/// `settings.edit`.
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/pricing", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/config", get(handler::get_config))
        .route("/quote", post(handler::quote));

    let write_routes = Router::new()
        .route("/config", put(handler::update_config))
        .layer(middleware::from_fn(require_permission("settings.edit")));

    public_routes.merge(write_routes)
}
