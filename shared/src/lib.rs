//! Shared models and helpers for the Harbor portal
//!
//! Kept free of server-only concerns so the types can be reused by
//! admin tooling and the portal-server crate alike. Database derives
//! are feature-gated behind `db`.

pub mod models;
pub mod util;

pub use models::permission::{Permission, PermissionGroup};
pub use models::pricing::{
    BillingTerm, Datacenter, PricingConfig, Quote, ResourceBounds, VpsConfig,
};
pub use models::role::{Department, Role, RoleCreate, RoleDetail, RoleSummary, RoleUpdate};
pub use models::user::{AdminUser, AssignRoleRequest, User, UserInfo, ROLE_ADMIN, ROLE_USER};
