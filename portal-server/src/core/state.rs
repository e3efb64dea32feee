use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{JwtService, PermissionCache};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::user;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | permission_cache | 权限缓存 (原子快照替换) |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub permission_cache: Arc<PermissionCache>,
}

impl ServerState {
    /// 手动构造服务器状态 (测试与 [`Self::initialize`] 共用)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            pool,
            jwt_service,
            permission_cache: Arc::new(PermissionCache::new()),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/portal.db, 自动迁移)
    /// 3. 引导超级管理员
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("portal.db");
        let db = DbService::new(&db_path.to_string_lossy())
            .await
            .map_err(|e| ServerError::Startup(e.to_string()))?;

        // Ensure the legacy bootstrap super-admin exists
        let generated =
            user::ensure_bootstrap_admin(&db.pool, config.admin_password.as_deref())
                .await
                .map_err(|e| ServerError::Startup(e.to_string()))?;
        if let Some(password) = generated {
            tracing::warn!(
                "Generated bootstrap admin password: {password} (set ADMIN_PASSWORD to override)"
            );
        }

        Ok(Self::with_pool(config.clone(), db.pool))
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取权限缓存
    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.permission_cache
    }
}
