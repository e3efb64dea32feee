//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`auth`] - 认证相关接口
//! - [`roles`] - 角色管理接口
//! - [`pricing`] - 定价配置与报价接口

pub mod auth;
pub mod health;
pub mod pricing;
pub mod roles;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
