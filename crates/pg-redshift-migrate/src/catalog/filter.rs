//! Schema and table name filtering.
//!
//! Discovery results pass through these predicates before any DDL or export
//! work happens. Restriction lists are always intersected with discovery
//! output, never substituted for it.

/// Whether a discovered schema is eligible for replication.
///
/// A schema is selected when it matches one of the configured name prefixes
/// or appears in the explicit allow-list, and does not carry one of the
/// deny-listed suffixes (template/staging copies).
pub fn schema_selected(
    name: &str,
    prefixes: &[String],
    allow_list: &[String],
    deny_suffixes: &[String],
) -> bool {
    if deny_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
        return false;
    }
    prefixes.iter().any(|p| name.starts_with(p.as_str()))
        || allow_list.iter().any(|a| a == name)
}

/// Whether a discovered table is eligible for replication.
///
/// Tables matching temporary or materialized-view naming conventions are
/// excluded, as are PostgreSQL catalog relations.
pub fn table_selected(name: &str, deny_prefixes: &[String]) -> bool {
    if name.starts_with("pg_") {
        return false;
    }
    !deny_prefixes.iter().any(|p| name.starts_with(p.as_str()))
}

/// Intersect discovered names with an optional caller-supplied restriction
/// list, preserving discovery order.
///
/// With no restriction list, discovery output passes through unchanged. An
/// empty intersection is a legitimate "nothing to do" result.
pub fn restrict<'a>(discovered: Vec<String>, restriction: Option<&'a [String]>) -> Vec<String> {
    match restriction {
        None => discovered,
        Some(allowed) => discovered
            .into_iter()
            .filter(|name| allowed.iter().any(|a| a == name))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_prefix_and_allow_list() {
        let prefixes = strings(&["activity_"]);
        let allow = strings(&["shared_resources"]);
        let deny = strings(&["_template", "_staging"]);

        assert!(schema_selected("activity_demo", &prefixes, &allow, &deny));
        assert!(schema_selected("shared_resources", &prefixes, &allow, &deny));
        assert!(!schema_selected("public", &prefixes, &allow, &deny));
    }

    #[test]
    fn test_schema_deny_suffix_wins_over_prefix() {
        let prefixes = strings(&["activity_"]);
        let deny = strings(&["_template", "_staging"]);

        assert!(!schema_selected("activity_demo_template", &prefixes, &[], &deny));
        assert!(!schema_selected("activity_demo_staging", &prefixes, &[], &deny));
        assert!(schema_selected("activity_demo", &prefixes, &[], &deny));
    }

    #[test]
    fn test_table_deny_patterns() {
        let deny = strings(&["temp", "tmp", "mv_"]);
        let discovered = ["orders", "temp_orders", "mv_summary"];
        let kept: Vec<&str> = discovered
            .iter()
            .filter(|t| table_selected(t, &deny))
            .copied()
            .collect();
        assert_eq!(kept, vec!["orders"]);
    }

    #[test]
    fn test_catalog_relations_always_excluded() {
        assert!(!table_selected("pg_stat_statements", &[]));
    }

    #[test]
    fn test_restriction_is_strict_intersection() {
        let discovered = strings(&["a", "b", "c"]);
        let restriction = strings(&["c", "a", "zz"]);

        // Order comes from discovery; names absent from discovery never
        // appear even when the restriction list names them.
        assert_eq!(
            restrict(discovered, Some(&restriction)),
            strings(&["a", "c"])
        );
    }

    #[test]
    fn test_empty_intersection_is_empty_not_passthrough() {
        let discovered = strings(&["a", "b"]);
        let restriction = strings(&["x", "y"]);
        assert!(restrict(discovered, Some(&restriction)).is_empty());
    }

    #[test]
    fn test_no_restriction_passes_discovery_through() {
        let discovered = strings(&["a", "b"]);
        assert_eq!(restrict(discovered.clone(), None), discovered);
    }
}
