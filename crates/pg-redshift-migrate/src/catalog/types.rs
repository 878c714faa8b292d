//! Typed schema descriptors and DDL construction.
//!
//! Catalog queries are converted into these structs once, at the catalog
//! boundary; everything downstream (DDL, export projections, load plans)
//! works from typed descriptors rather than dynamic rows.

use serde::{Deserialize, Serialize};

use crate::typemap::{needs_cast, postgres_to_redshift};

/// Quote a PostgreSQL/Redshift identifier.
///
/// Escapes embedded double quotes by doubling them. Identifiers here come
/// from the source catalog, not end-user input, so no further validation is
/// applied.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column name markers that flag internal/sensitive columns.
///
/// Columns carrying these markers are excluded from both DDL and the export
/// projection at `Table` construction time.
const SENSITIVE_MARKERS: &[&str] = &["_shadow_", "_replication_"];

/// Column metadata enriched with its Redshift target type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Source data type (information_schema `data_type`).
    pub data_type: String,

    /// Declared maximum length for variable-length character types.
    pub char_max_length: Option<i32>,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Redshift-compatible type used in target DDL.
    pub target_type: String,

    /// Whether the export projection must cast the column.
    pub needs_cast: bool,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

impl Column {
    /// Build a column descriptor, deriving the target type via the type map.
    pub fn new(
        name: String,
        data_type: String,
        char_max_length: Option<i32>,
        is_nullable: bool,
        ordinal_pos: i32,
    ) -> Self {
        let target_type = postgres_to_redshift(&data_type, char_max_length);
        let needs_cast = needs_cast(&data_type, &target_type);
        Self {
            name,
            data_type,
            char_max_length,
            is_nullable,
            target_type,
            needs_cast,
            ordinal_pos,
        }
    }

    /// Whether this column matches the sensitive/internal naming pattern.
    pub fn is_sensitive(name: &str) -> bool {
        SENSITIVE_MARKERS.iter().any(|m| name.contains(m))
    }

    /// DDL fragment for CREATE TABLE: `"name" type[ NOT NULL]`.
    pub fn ddl_fragment(&self) -> String {
        let null_constraint = if self.is_nullable { "" } else { " NOT NULL" };
        format!(
            "{} {}{}",
            quote_ident(&self.name),
            self.target_type,
            null_constraint
        )
    }

    /// Projection expression for the export COPY.
    ///
    /// Casts are applied here and only here; DDL always declares the target
    /// type directly.
    pub fn projection(&self) -> String {
        if self.needs_cast {
            format!(
                "CAST({} AS {}) AS {}",
                quote_ident(&self.name),
                self.target_type,
                self.name
            )
        } else {
            quote_ident(&self.name)
        }
    }
}

/// Table metadata.
///
/// Column order matches source ordinal position; primary-key column order
/// matches the source constraint-key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Schema name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions, sensitive columns already removed.
    pub columns: Vec<Column>,

    /// Primary key column names in constraint-key order.
    pub primary_key: Vec<String>,

    /// Whether the source object is a view.
    pub is_view: bool,
}

impl Table {
    /// Build a table descriptor, dropping sensitive columns.
    ///
    /// The drop happens once here and is irreversible for this instance.
    pub fn new(
        schema: String,
        name: String,
        is_view: bool,
        primary_key: Vec<String>,
        columns: Vec<Column>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .filter(|c| !Column::is_sensitive(&c.name))
            .collect();
        Self {
            schema,
            name,
            columns,
            primary_key,
            is_view,
        }
    }

    /// Name of the table in the target warehouse (currently identical).
    pub fn target_name(&self) -> &str {
        &self.name
    }

    /// Get the fully qualified source table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Column definition list for CREATE TABLE, including the primary key
    /// clause when the table has one.
    pub fn columns_for_create(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(Column::ddl_fragment).collect();
        if !self.primary_key.is_empty() {
            let cols: Vec<String> = self.primary_key.iter().map(|c| quote_ident(c)).collect();
            parts.push(format!("primary key({})", cols.join(",")));
        }
        parts.join(", ")
    }

    /// Projection list for the export COPY.
    pub fn columns_for_copy(&self) -> String {
        self.columns
            .iter()
            .map(Column::projection)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// CREATE TABLE IF NOT EXISTS statement for the target shell.
    pub fn create_if_not_exists_ddl(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {}.{} ({})",
            self.schema,
            self.target_name(),
            self.columns_for_create()
        )
    }

    /// CREATE TABLE statement used by the loader after the backup rename.
    ///
    /// Identical column shape to the shell DDL; the table must not exist at
    /// this point, so no IF NOT EXISTS.
    pub fn create_ddl(&self) -> String {
        format!(
            "CREATE TABLE {}.{} ({})",
            self.schema,
            quote_ident(self.target_name()),
            self.columns_for_create()
        )
    }
}
