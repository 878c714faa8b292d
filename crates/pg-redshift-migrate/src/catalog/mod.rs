//! Source catalog discovery.
//!
//! Queries the source's information schema and system catalogs, then
//! materializes typed [`Table`]/[`Column`] descriptors. Any query failure
//! here is fatal for the run; there is no partial-table continuation.

pub mod filter;
mod types;

pub use types::{quote_ident, Column, Table};

use crate::config::FilterConfig;
use crate::error::Result;
use crate::source::PgSourcePool;
use tracing::debug;

/// Catalog reader over the source connection pool.
pub struct Catalog<'a> {
    source: &'a PgSourcePool,
    filters: &'a FilterConfig,
}

impl<'a> Catalog<'a> {
    pub fn new(source: &'a PgSourcePool, filters: &'a FilterConfig) -> Self {
        Self { source, filters }
    }

    /// List schemas eligible for replication.
    ///
    /// Applies the configured prefix/allow/deny filters, then intersects
    /// with the explicit restriction list when one is configured.
    pub async fn schemas(&self) -> Result<Vec<String>> {
        let client = self.source.client().await?;

        let query = r#"
            SELECT DISTINCT table_schema
            FROM information_schema.tables
            ORDER BY table_schema
        "#;

        let rows = client.query(query, &[]).await?;

        let discovered: Vec<String> = rows
            .iter()
            .map(|row| row.get::<_, String>(0))
            .filter(|name| {
                filter::schema_selected(
                    name,
                    &self.filters.schema_prefixes,
                    &self.filters.schema_allow_list,
                    &self.filters.schema_deny_suffixes,
                )
            })
            .collect();

        let selected = filter::restrict(discovered, self.filters.schemas.as_deref());
        debug!("Selected {} schemas", selected.len());
        Ok(selected)
    }

    /// List tables in a schema, with columns and ordered primary keys.
    ///
    /// Base tables always qualify; views only when `include_views` is set.
    /// The primary key arrives as one ordered list per table, aggregated in
    /// constraint-key order (not alphabetical).
    pub async fn tables(&self, schema: &str) -> Result<Vec<Table>> {
        let client = self.source.client().await?;

        let query = r#"
            SELECT
                t.table_name,
                t.table_type,
                COALESCE(pk.cols, '{}'::text[])
            FROM information_schema.tables t
            LEFT JOIN (
                SELECT
                    n.nspname AS schema_name,
                    cl.relname AS table_name,
                    array_agg(a.attname::text
                              ORDER BY array_position(con.conkey, a.attnum)) AS cols
                FROM pg_catalog.pg_constraint con
                JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
                JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
                JOIN pg_catalog.pg_attribute a
                    ON a.attrelid = cl.oid AND a.attnum = ANY (con.conkey)
                WHERE con.contype = 'p'
                GROUP BY n.nspname, cl.relname
            ) pk ON pk.schema_name = t.table_schema AND pk.table_name = t.table_name
            WHERE t.table_schema = $1
              AND t.table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY t.table_name
        "#;

        let rows = client.query(query, &[&schema]).await?;
        drop(client);

        let mut discovered: Vec<(String, bool, Vec<String>)> = Vec::new();
        for row in rows {
            let name: String = row.get(0);
            let table_type: String = row.get(1);
            let primary_key: Vec<String> = row.get(2);

            if !filter::table_selected(&name, &self.filters.table_deny_prefixes) {
                continue;
            }
            let is_view = table_type == "VIEW";
            if is_view && !self.filters.include_views {
                continue;
            }
            discovered.push((name, is_view, primary_key));
        }

        let names: Vec<String> = discovered.iter().map(|(n, _, _)| n.clone()).collect();
        let selected = filter::restrict(names, self.filters.tables.as_deref());

        let mut tables = Vec::with_capacity(selected.len());
        for (name, is_view, primary_key) in discovered {
            if !selected.contains(&name) {
                continue;
            }
            let columns = self.columns(schema, &name).await?;
            tables.push(Table::new(
                schema.to_string(),
                name,
                is_view,
                primary_key,
                columns,
            ));
        }

        debug!("Selected {} tables in schema {}", tables.len(), schema);
        Ok(tables)
    }

    /// List columns for a table in ordinal order.
    pub async fn columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        let client = self.source.client().await?;

        let query = r#"
            SELECT
                column_name,
                data_type,
                character_maximum_length::int4,
                CASE WHEN is_nullable = 'YES' THEN true ELSE false END,
                ordinal_position::int4
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let rows = client.query(query, &[&schema, &table]).await?;

        let columns = rows
            .iter()
            .map(|row| {
                Column::new(
                    row.get::<_, String>(0),
                    row.get::<_, String>(1),
                    row.get::<_, Option<i32>>(2),
                    row.get::<_, bool>(3),
                    row.get::<_, i32>(4),
                )
            })
            .collect();

        Ok(columns)
    }
}
