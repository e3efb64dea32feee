//! Role API Module
//!
//! Gates per route:
//!
//! | Route | Gate |
//! |-------|------|
//! | GET `/`, `/permissions`, `/{id}` | `roles.view` |
//! | GET `/admin-users/list` | `users.view` |
//! | PUT `/assign/{user_id}` | `users.edit` |
//! | POST `/` | delegated `can_create_roles` (checked in the handler) |
//! | PUT `/{id}` | `roles.edit` (+ super-admin for system roles) |
//! | DELETE `/{id}` | super-admin only |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{require_permission, require_super_admin};
use crate::core::ServerState;

/// Role router - requires authentication and per-route permissions
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/roles", routes())
}

fn routes() -> Router<ServerState> {
    // Literal sub-paths must be registered before the `/{id}` wildcard
    // or they would be matched as an id lookup.
    let view_routes = Router::new()
        .route("/permissions", get(handler::list_permissions))
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("roles.view")));

    let admin_user_routes = Router::new()
        .route("/admin-users/list", get(handler::list_admin_users))
        .layer(middleware::from_fn(require_permission("users.view")));

    let assign_routes = Router::new()
        .route("/assign/{user_id}", put(handler::assign_role))
        .layer(middleware::from_fn(require_permission("users.edit")));

    // Creation is gated on the delegated can_create_roles flag, which
    // lives on the caller identity rather than a permission slug.
    let create_routes = Router::new().route("/", post(handler::create));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_permission("roles.edit")));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_super_admin));

    view_routes
        .merge(admin_user_routes)
        .merge(assign_routes)
        .merge(create_routes)
        .merge(edit_routes)
        .merge(delete_routes)
}
