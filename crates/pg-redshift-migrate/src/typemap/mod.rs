//! Type mapping between PostgreSQL and Redshift.

/// Redshift's maximum VARCHAR length in bytes.
pub const REDSHIFT_VARCHAR_MAX: i32 = 65535;

/// Byte expansion factor for character lengths: PostgreSQL counts characters,
/// Redshift counts bytes, and a UTF-8 character is at most 4 bytes wide.
const CHAR_BYTE_FACTOR: i32 = 4;

/// Map a PostgreSQL data type to a Redshift-compatible type.
///
/// `char_max_length` is the declared maximum length for variable-length
/// character types (`None` when the source declares no limit).
///
/// Types without an explicit translation pass through verbatim. That keeps
/// unknown types from failing at planning time; a genuinely incompatible
/// type will surface as a COPY error at load time instead.
pub fn postgres_to_redshift(data_type: &str, char_max_length: Option<i32>) -> String {
    match data_type {
        "character varying" => {
            let limit = match char_max_length {
                Some(len) => (len * CHAR_BYTE_FACTOR).min(REDSHIFT_VARCHAR_MAX).to_string(),
                // No declared limit on the source side maps to the widest
                // VARCHAR Redshift supports.
                None => "MAX".to_string(),
            };
            format!("character varying({})", limit)
        }

        // Types Redshift has no native representation for are stored as
        // max-width VARCHAR.
        "text" | "json" | "jsonb" | "bytea" | "oid" | "ARRAY" | "USER-DEFINED" => {
            "CHARACTER VARYING(65535)".to_string()
        }

        "money" => "DECIMAL(19,2)".to_string(),
        "uuid" => "CHAR(36)".to_string(),
        "boolean" => "smallint".to_string(),

        // Default fallback: pass the source type through unchanged.
        other => other.to_string(),
    }
}

/// Whether projecting a column for export requires an explicit cast.
///
/// A cast is needed exactly when the mapped type differs textually from the
/// source type; identical types are referenced bare.
pub fn needs_cast(data_type: &str, target_type: &str) -> bool {
    data_type != target_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varchar_rescaling() {
        assert_eq!(
            postgres_to_redshift("character varying", Some(255)),
            "character varying(1020)"
        );
        assert_eq!(
            postgres_to_redshift("character varying", Some(20000)),
            "character varying(65535)"
        );
        assert_eq!(
            postgres_to_redshift("character varying", None),
            "character varying(MAX)"
        );
    }

    #[test]
    fn test_varchar_cap_is_exact() {
        // 16383 * 4 = 65532 stays below the cap, 16384 * 4 hits it.
        assert_eq!(
            postgres_to_redshift("character varying", Some(16383)),
            "character varying(65532)"
        );
        assert_eq!(
            postgres_to_redshift("character varying", Some(16384)),
            "character varying(65535)"
        );
    }

    #[test]
    fn test_translation_table() {
        assert_eq!(postgres_to_redshift("text", None), "CHARACTER VARYING(65535)");
        assert_eq!(postgres_to_redshift("json", None), "CHARACTER VARYING(65535)");
        assert_eq!(postgres_to_redshift("jsonb", None), "CHARACTER VARYING(65535)");
        assert_eq!(postgres_to_redshift("bytea", None), "CHARACTER VARYING(65535)");
        assert_eq!(postgres_to_redshift("oid", None), "CHARACTER VARYING(65535)");
        assert_eq!(postgres_to_redshift("ARRAY", None), "CHARACTER VARYING(65535)");
        assert_eq!(
            postgres_to_redshift("USER-DEFINED", None),
            "CHARACTER VARYING(65535)"
        );
        assert_eq!(postgres_to_redshift("money", None), "DECIMAL(19,2)");
        assert_eq!(postgres_to_redshift("uuid", None), "CHAR(36)");
        assert_eq!(postgres_to_redshift("boolean", None), "smallint");
    }

    #[test]
    fn test_unknown_types_pass_through() {
        assert_eq!(postgres_to_redshift("integer", None), "integer");
        assert_eq!(postgres_to_redshift("bigint", None), "bigint");
        assert_eq!(
            postgres_to_redshift("timestamp without time zone", None),
            "timestamp without time zone"
        );
        assert_eq!(postgres_to_redshift("inet", None), "inet");
    }

    #[test]
    fn test_cast_required_iff_types_differ() {
        assert!(needs_cast("uuid", "CHAR(36)"));
        assert!(needs_cast("text", "CHARACTER VARYING(65535)"));
        assert!(!needs_cast("integer", "integer"));
        assert!(!needs_cast(
            "timestamp without time zone",
            "timestamp without time zone"
        ));
    }
}
