//! End-to-end authorization over the assembled router: auth middleware,
//! permission gates, privilege-escalation stripping, system-role
//! protection, and the public pricing surface.

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use tower::ServiceExt;

use portal_server::auth::JwtConfig;
use portal_server::core::{Config, ServerState, build_router};
use portal_server::db::DbService;
use portal_server::db::repository::{permission, role, user};
use shared::models::{RoleCreate, User};
use sqlx::SqlitePool;

fn test_config() -> Config {
    let mut config = Config::with_overrides("/tmp/harbor-test", 0);
    config.jwt = JwtConfig {
        secret: "integration-test-secret-0123456789abcdef".to_string(),
        expiration_minutes: 60,
        issuer: "portal-server".to_string(),
        audience: "portal-clients".to_string(),
    };
    config
}

async fn setup() -> (ServerState, Router) {
    let pool = DbService::new_in_memory().await.unwrap().pool;
    let state = ServerState::with_pool(test_config(), pool);
    let router = build_router(state.clone());
    (state, router)
}

async fn make_user(
    state: &ServerState,
    email: &str,
    coarse_role: &str,
    role_id: Option<i64>,
) -> User {
    let u = user::create(&state.pool, email, email, "x", coarse_role, None)
        .await
        .unwrap();
    match role_id {
        Some(rid) => user::assign_role(&state.pool, u.id, Some(rid)).await.unwrap(),
        None => u,
    }
}

/// Create a non-system role holding the given permission slugs
async fn make_role(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    slugs: &[&str],
    can_create_roles: bool,
) -> i64 {
    let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();
    let ids: Vec<i64> = permission::find_by_slugs(pool, &slugs)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    let data = RoleCreate {
        name: name.to_string(),
        description: None,
        department: None,
        can_create_roles: false,
        permissions: Vec::new(),
    };
    role::create(pool, &data, slug, &ids, can_create_roles, None)
        .await
        .unwrap()
        .id
}

fn bearer(state: &ServerState, user: &User) -> String {
    format!("Bearer {}", state.jwt_service.generate_token(user).unwrap())
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ========== Authentication ==========

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (_state, router) = setup().await;

    let response = router.oneshot(get("/api/roles", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let (_state, router) = setup().await;

    let response = router
        .oneshot(get("/api/roles", Some("Bearer not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let (_state, router) = setup().await;

    let response = router.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_round_trip() {
    let (state, router) = setup().await;
    let hash = user::hash_password("correct horse battery").unwrap();
    user::create(&state.pool, "jo@example.com", "Jo", &hash, "admin", None)
        .await
        .unwrap();

    let ok = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"jo@example.com","password":"correct horse battery"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["is_super_admin"], true);

    // Wrong password and unknown email produce the same failure class
    let bad = router
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"jo@example.com","password":"wrong"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// ========== Permission gates ==========

#[tokio::test]
async fn test_no_role_fails_closed() {
    let (state, router) = setup().await;
    let u = make_user(&state, "nobody@example.com", "user", None).await;
    let token = bearer(&state, &u);

    let response = router
        .oneshot(get("/api/roles", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_roles_view_gate() {
    let (state, router) = setup().await;
    let viewer_role = make_role(&state.pool, "Viewer", "viewer", &["roles.view"], false).await;
    let u = make_user(&state, "viewer@example.com", "user", Some(viewer_role)).await;
    let token = bearer(&state, &u);

    let listing = router
        .clone()
        .oneshot(get("/api/roles", Some(&token)))
        .await
        .unwrap();
    assert_eq!(listing.status(), StatusCode::OK);

    // Literal sub-path resolves to the permission catalog, not an id
    let catalog = router
        .clone()
        .oneshot(get("/api/roles/permissions", Some(&token)))
        .await
        .unwrap();
    assert_eq!(catalog.status(), StatusCode::OK);
    let groups = body_json(catalog).await;
    assert!(groups.as_array().unwrap().len() >= 7);

    // roles.view does not grant users.view
    let admins = router
        .oneshot(get("/api/roles/admin-users/list", Some(&token)))
        .await
        .unwrap();
    assert_eq!(admins.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_admin_bypasses_all_gates() {
    let (state, router) = setup().await;
    let admin = make_user(&state, "root@example.com", "admin", None).await;
    let token = bearer(&state, &admin);

    for uri in [
        "/api/roles",
        "/api/roles/permissions",
        "/api/roles/admin-users/list",
    ] {
        let response = router
            .clone()
            .oneshot(get(uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    // Past the gate; the id itself does not resolve
    let response = router
        .oneshot(json_request("DELETE", "/api/roles/9999", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_role_requires_super_admin() {
    let (state, router) = setup().await;
    let editor_role = make_role(
        &state.pool,
        "Editor",
        "editor",
        &["roles.view", "roles.edit"],
        false,
    )
    .await;
    let doomed = make_role(&state.pool, "Doomed", "doomed", &[], false).await;
    let u = make_user(&state, "editor@example.com", "user", Some(editor_role)).await;
    let token = bearer(&state, &u);

    let response = router
        .oneshot(json_request(
            "DELETE",
            &format!("/api/roles/{doomed}"),
            Some(&token),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ========== Privilege escalation guard ==========

#[tokio::test]
async fn test_create_strips_reserved_slugs_for_delegated_admins() {
    let (state, router) = setup().await;
    let creator_role = make_role(
        &state.pool,
        "Team Lead",
        "team_lead",
        &["roles.view"],
        true, // delegated can_create_roles
    )
    .await;
    let u = make_user(&state, "lead@example.com", "user", Some(creator_role)).await;
    let token = bearer(&state, &u);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/roles",
            Some(&token),
            r#"{"name":"Sales Leads","permissions":["tickets.view","roles.edit","roles.view"],"can_create_roles":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = role::find_by_slug(&state.pool, "sales_leads")
        .await
        .unwrap()
        .expect("role was created");

    // roles.* silently dropped; the rest kept; delegation flag forced off
    let slugs = role::permission_slugs(&state.pool, created.id).await.unwrap();
    assert_eq!(slugs, vec!["tickets.view"]);
    assert!(!created.can_create_roles);
}

#[tokio::test]
async fn test_super_admin_may_grant_reserved_slugs() {
    let (state, router) = setup().await;
    let admin = make_user(&state, "root@example.com", "admin", None).await;
    let token = bearer(&state, &admin);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/roles",
            Some(&token),
            r#"{"name":"Role Admins","permissions":["roles.view","roles.edit"],"can_create_roles":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = role::find_by_slug(&state.pool, "role_admins")
        .await
        .unwrap()
        .unwrap();
    let slugs = role::permission_slugs(&state.pool, created.id).await.unwrap();
    assert_eq!(slugs, vec!["roles.edit", "roles.view"]);
    assert!(created.can_create_roles);
}

#[tokio::test]
async fn test_create_requires_delegation() {
    let (state, router) = setup().await;
    let plain_role = make_role(&state.pool, "Plain", "plain", &["roles.view"], false).await;
    let u = make_user(&state, "plain@example.com", "user", Some(plain_role)).await;
    let token = bearer(&state, &u);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/roles",
            Some(&token),
            r#"{"name":"Nope","permissions":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let (state, router) = setup().await;
    let admin = make_user(&state, "root@example.com", "admin", None).await;
    let token = bearer(&state, &admin);

    let first = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/roles",
            Some(&token),
            r#"{"name":"Night Shift","permissions":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Collides on the derived slug, not the raw name
    let second = router
        .oneshot(json_request(
            "POST",
            "/api/roles",
            Some(&token),
            r#"{"name":"night   SHIFT","permissions":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

// ========== System role protection ==========

#[tokio::test]
async fn test_system_role_updates_are_super_admin_only() {
    let (state, router) = setup().await;
    let admin_role = role::find_by_slug(&state.pool, "administrator")
        .await
        .unwrap()
        .unwrap();

    let editor_role = make_role(
        &state.pool,
        "Editor",
        "editor",
        &["roles.view", "roles.edit"],
        false,
    )
    .await;
    let editor = make_user(&state, "editor@example.com", "user", Some(editor_role)).await;
    let editor_token = bearer(&state, &editor);

    let denied = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/roles/{}", admin_role.id),
            Some(&editor_token),
            r#"{"description":"hijacked"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let root = make_user(&state, "root@example.com", "admin", None).await;
    let root_token = bearer(&state, &root);

    let allowed = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/roles/{}", admin_role.id),
            Some(&root_token),
            r#"{"description":"maintained"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assigning_system_role_requires_super_admin() {
    let (state, router) = setup().await;
    let admin_role = role::find_by_slug(&state.pool, "administrator")
        .await
        .unwrap()
        .unwrap();

    let hr_role = make_role(&state.pool, "HR", "hr", &["users.view", "users.edit"], false).await;
    let hr = make_user(&state, "hr@example.com", "user", Some(hr_role)).await;
    let target = make_user(&state, "t@example.com", "user", None).await;
    let token = bearer(&state, &hr);

    let denied = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/roles/assign/{}", target.id),
            Some(&token),
            &format!(r#"{{"role_id":{}}}"#, admin_role.id),
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    // Non-system roles are fair game for users.edit holders
    let allowed = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/roles/assign/{}", target.id),
            Some(&token),
            &format!(r#"{{"role_id":{hr_role}}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

// ========== Cache consistency through the write path ==========

#[tokio::test]
async fn test_role_edit_takes_effect_on_the_next_request() {
    let (state, router) = setup().await;
    let viewer_role = make_role(&state.pool, "Viewer", "viewer", &["roles.view"], false).await;
    let u = make_user(&state, "viewer@example.com", "user", Some(viewer_role)).await;
    let token = bearer(&state, &u);

    let before = router
        .clone()
        .oneshot(get("/api/roles", Some(&token)))
        .await
        .unwrap();
    assert_eq!(before.status(), StatusCode::OK);

    // Super-admin strips the role's permissions
    let root = make_user(&state, "root@example.com", "admin", None).await;
    let root_token = bearer(&state, &root);
    let update = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/roles/{viewer_role}"),
            Some(&root_token),
            r#"{"permissions":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::OK);

    // No stale-cache false positive
    let after = router
        .oneshot(get("/api/roles", Some(&token)))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::FORBIDDEN);
}

// ========== Pricing surface ==========

#[tokio::test]
async fn test_quote_is_public_and_priced() {
    let (_state, router) = setup().await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/pricing/quote",
            None,
            r#"{"cores":4,"ram_gb":8,"storage_gb":100,"bandwidth_tb":5,"backup_gb":50,
                "billing_term":"one_year","datacenter":"ams1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let quote = body_json(response).await;
    assert_eq!(quote["monthly_base"], 36.50);
    assert_eq!(quote["monthly_effective"], 32.85);
    assert_eq!(quote["total_for_term"], 394.20);
    assert_eq!(quote["term_months"], 12);
}

#[tokio::test]
async fn test_quote_rejects_off_step_values() {
    let (_state, router) = setup().await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/pricing/quote",
            None,
            r#"{"cores":4,"ram_gb":8,"storage_gb":105,"bandwidth_tb":5,
                "billing_term":"monthly","datacenter":"ams1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pricing_config_read_public_write_gated() {
    let (state, router) = setup().await;

    let read = router
        .clone()
        .oneshot(get("/api/pricing/config", None))
        .await
        .unwrap();
    assert_eq!(read.status(), StatusCode::OK);
    let config = body_json(read).await;
    assert_eq!(config["price_per_core"], 3.0);

    // Unauthenticated write is rejected before any gate
    let anonymous = router
        .clone()
        .oneshot(json_request("PUT", "/api/pricing/config", None, "{}"))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    // settings.edit holder may overwrite the table wholesale
    let pricing_role = make_role(
        &state.pool,
        "Pricing",
        "pricing",
        &["settings.view", "settings.edit"],
        false,
    )
    .await;
    let u = make_user(&state, "pricing@example.com", "user", Some(pricing_role)).await;
    let token = bearer(&state, &u);

    let write = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/pricing/config",
            Some(&token),
            r#"{"price_per_core":4.25}"#,
        ))
        .await
        .unwrap();
    assert_eq!(write.status(), StatusCode::OK);

    let reread = router
        .oneshot(get("/api/pricing/config", None))
        .await
        .unwrap();
    let config = body_json(reread).await;
    assert_eq!(config["price_per_core"], 4.25);
    // Unspecified fields fell back to defaults on the wholesale write
    assert_eq!(config["price_per_ram_gb"], 1.5);
}
