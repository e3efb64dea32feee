//! Harbor Portal Server - 主机托管商门户后端
//!
//! # 架构概述
//!
//! - **认证授权** (`auth`): JWT + Argon2，调用者身份解析与权限缓存
//! - **数据库** (`db`): SQLite (sqlx) 连接池与仓储层
//! - **定价** (`pricing`): 自定义 VPS 报价引擎
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! portal-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、身份、权限缓存、中间件
//! ├── db/            # 数据库层 (连接池、仓储)
//! ├── pricing/       # 报价引擎与费率表
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod pricing;
pub mod utils;

// Re-export 公共类型
pub use auth::{CallerIdentity, JwtService, PermissionCache};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
    ($level:expr, $event:expr) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event
        );
    };
}

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    utils::logger::init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __  __           __
   / / / /___ ______/ /_  ____  _____
  / /_/ / __ `/ ___/ __ \/ __ \/ ___/
 / __  / /_/ / /  / /_/ / /_/ / /
/_/ /_/\__,_/_/  /_.___/\____/_/
    "#
    );
}
