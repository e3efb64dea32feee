//! Permission Policy
//!
//! Permission slugs take the form `<department>.<action>` and live as
//! seed data in the store. The `roles` department is reserved: granting
//! any `roles.*` slug through self-service role creation or editing is
//! how a delegated admin would mint their way to role administration,
//! so those slugs are governed by super-admin delegation only.

use crate::auth::CallerIdentity;

/// Department whose permissions only super-admins may grant
pub const RESERVED_DEPARTMENT: &str = "roles";

/// Is this slug in the reserved `roles.*` department?
pub fn is_reserved(slug: &str) -> bool {
    slug.strip_prefix(RESERVED_DEPARTMENT)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some()
}

/// Filter a requested permission list down to what the caller may
/// grant. For non-super-admin callers every `roles.*` slug is silently
/// dropped — deliberate policy, not an error, so self-service role
/// creation cannot escalate into role administration.
pub fn filter_grantable(caller: &CallerIdentity, requested: &[String]) -> Vec<String> {
    if caller.is_super_admin() {
        return requested.to_vec();
    }
    requested
        .iter()
        .filter(|slug| !is_reserved(slug))
        .cloned()
        .collect()
}
