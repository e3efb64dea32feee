//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CallerIdentity, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，通过权限缓存
/// 解析 [`CallerIdentity`] 并注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login` (登录接口)
/// - `POST /api/pricing/quote`, `GET /api/pricing/config` (storefront configurator)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            return match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Malformed subject claim"))?;

    let identity = state
        .permission_cache
        .resolve(&state.pool, user_id)
        .await
        .map_err(AppError::from)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Public API routes that skip authentication entirely
fn is_public_api_route(method: &http::Method, path: &str) -> bool {
    path == "/api/auth/login"
        || path == "/api/pricing/quote"
        || (path == "/api/pricing/config" && method == http::Method::GET)
}

/// 权限检查中间件 - 要求特定权限
///
/// 超级管理员直接放行；角色绑定用户需要精确匹配的权限 slug。
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/roles", get(handler::list))
///     .layer(middleware::from_fn(require_permission("roles.view")));
/// ```
///
/// # 错误
///
/// 无权限返回 403 Forbidden
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let caller = req
                .extensions()
                .get::<Arc<CallerIdentity>>()
                .ok_or(AppError::unauthorized())?;

            if !caller.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = caller.user_id(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 权限检查中间件 - 要求任一指定权限
pub fn require_any_permission(
    permissions: &'static [&'static str],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let caller = req
                .extensions()
                .get::<Arc<CallerIdentity>>()
                .ok_or(AppError::unauthorized())?;

            if !caller.has_any_permission(permissions) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = caller.user_id(),
                    required_permission = permissions.join("|")
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: one of [{}] required",
                    permissions.join(", ")
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 超级管理员中间件
///
/// # 错误
///
/// 非超级管理员返回 403 Forbidden
pub async fn require_super_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<Arc<CallerIdentity>>()
        .ok_or(AppError::unauthorized())?;

    if !caller.is_super_admin() {
        security_log!(
            "WARN",
            "super_admin_required",
            user_id = caller.user_id()
        );
        return Err(AppError::forbidden("Super administrator required"));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use axum::{Router, body::Body, middleware, routing::get};
    use http::{Request as HttpRequest, StatusCode};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    /// Gate routes behind the permission middlewares, with a fixed
    /// identity injected the way `require_auth` would
    fn gated_router(identity: CallerIdentity) -> Router {
        let identity = Arc::new(identity);
        Router::new()
            .route(
                "/one",
                get(ok_handler).layer(middleware::from_fn(require_permission("roles.view"))),
            )
            .route(
                "/any",
                get(ok_handler).layer(middleware::from_fn(require_any_permission(&[
                    "users.view",
                    "users.edit",
                ]))),
            )
            .route(
                "/root",
                get(ok_handler).layer(middleware::from_fn(require_super_admin)),
            )
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let identity = identity.clone();
                async move {
                    req.extensions_mut().insert(identity);
                    Ok::<_, AppError>(next.run(req).await)
                }
            }))
    }

    async fn status(router: Router, path: &str) -> StatusCode {
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    fn role_bound(slugs: &[&str]) -> CallerIdentity {
        CallerIdentity::RoleBound {
            user_id: 7,
            role_id: 3,
            can_create_roles: false,
            permissions: slugs.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        }
    }

    #[tokio::test]
    async fn test_require_permission_exact_match() {
        let holder = gated_router(role_bound(&["roles.view"]));
        assert_eq!(status(holder, "/one").await, StatusCode::OK);

        let other = gated_router(role_bound(&["roles.edit"]));
        assert_eq!(status(other, "/one").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_any_permission_passes_on_either_slug() {
        let viewer = gated_router(role_bound(&["users.view"]));
        assert_eq!(status(viewer, "/any").await, StatusCode::OK);

        let editor = gated_router(role_bound(&["users.edit"]));
        assert_eq!(status(editor, "/any").await, StatusCode::OK);

        let neither = gated_router(role_bound(&["tickets.view"]));
        assert_eq!(status(neither, "/any").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unprivileged_denied_everywhere() {
        for path in ["/one", "/any", "/root"] {
            let router = gated_router(CallerIdentity::Unprivileged { user_id: 7 });
            assert_eq!(status(router, path).await, StatusCode::FORBIDDEN, "{path}");
        }
    }

    #[tokio::test]
    async fn test_super_admin_passes_every_gate() {
        for path in ["/one", "/any", "/root"] {
            let router = gated_router(CallerIdentity::SuperAdmin { user_id: 1 });
            assert_eq!(status(router, path).await, StatusCode::OK, "{path}");
        }
    }
}
