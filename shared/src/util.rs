/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Derive a role slug from a display name.
///
/// Lowercase, runs of non-alphanumeric characters collapsed to a single
/// `_`, leading/trailing separators trimmed. Deterministic: two names
/// differing only by case or punctuation map to the same slug, which is
/// what the uniqueness check in the role store keys on.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_basic() {
        assert_eq!(derive_slug("Sales Manager"), "sales_manager");
    }

    #[test]
    fn test_slug_idempotent() {
        let first = derive_slug("Support / Level 2");
        let second = derive_slug("Support / Level 2");
        assert_eq!(first, second);
        assert_eq!(first, "support_level_2");
    }

    #[test]
    fn test_slug_collapses_runs_and_trims() {
        assert_eq!(derive_slug("  Billing!!!Admin  "), "billing_admin");
        assert_eq!(derive_slug("--wat--"), "wat");
    }

    #[test]
    fn test_slug_case_insensitive_collision() {
        // Names differing only by punctuation or case collide
        assert_eq!(derive_slug("sales manager"), derive_slug("Sales-Manager"));
    }

    #[test]
    fn test_slug_empty_and_symbols_only() {
        assert_eq!(derive_slug(""), "");
        assert_eq!(derive_slug("!!!"), "");
    }
}
