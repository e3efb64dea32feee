//! 认证授权模块
//!
//! 提供 JWT 认证、调用者身份解析、权限缓存和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CallerIdentity`] - 解析后的调用者身份
//! - [`PermissionCache`] - 权限缓存 (原子快照替换)
//! - [`require_auth`] / [`require_permission`] - 中间件

pub mod cache;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use cache::PermissionCache;
pub use identity::CallerIdentity;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{
    require_any_permission, require_auth, require_permission, require_super_admin,
};
