//! Table export: COPY stream → gzip chunks → object storage.

use crate::catalog::{quote_ident, Table};
use crate::error::{MigrateError, Result};
use crate::source::PgSourcePool;
use crate::storage::ObjectStore;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::StreamExt;
use std::io::Write;
use tracing::{debug, info};

/// Field delimiter shared by the export COPY and the bulk-load statement.
///
/// Export and load must agree on this byte; both sides reference this
/// constant. Pipe never occurs in-band for the supported type projections.
pub const FIELD_DELIMITER: char = '|';

/// Object key for a chunk: `<prefix>/<schema>.<table>.psv.gz[.<index>]`.
///
/// Chunk 0 carries no index suffix. Keys are deterministic from their
/// inputs, so a re-run overwrites prior objects for the same table.
pub fn chunk_key(prefix: &str, schema: &str, table: &str, index: u32) -> String {
    let mut key = format!("{}/{}.{}.psv.gz", prefix, schema, table);
    if index > 0 {
        key.push_str(&format!(".{}", index));
    }
    key
}

/// Gzip spool for one table's row stream.
///
/// Rows are written whole; after each row the running *uncompressed* byte
/// count is checked against the threshold, and a crossing finalizes the
/// current chunk and opens a fresh encoder. The counter is maintained here
/// explicitly rather than read from the compressor, pinning the threshold
/// to pre-compression bytes.
///
/// The encoder and its buffer live inside this struct, so every exit path
/// (including errors propagating out of [`write_row`]) releases them.
pub struct ChunkSpooler<'a> {
    store: &'a dyn ObjectStore,
    threshold: u64,
    prefix: String,
    schema: String,
    table: String,
    encoder: GzEncoder<Vec<u8>>,
    uncompressed_bytes: u64,
    chunk_index: u32,
    keys: Vec<String>,
}

impl<'a> ChunkSpooler<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        threshold: u64,
        prefix: &str,
        schema: &str,
        table: &str,
    ) -> Self {
        Self {
            store,
            threshold,
            prefix: prefix.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
            uncompressed_bytes: 0,
            chunk_index: 0,
            keys: Vec::new(),
        }
    }

    /// Append one complete row and rotate the chunk if the threshold was
    /// crossed. A row is never split across chunks.
    pub async fn write_row(&mut self, row: &[u8]) -> Result<()> {
        self.encoder.write_all(row)?;
        self.uncompressed_bytes += row.len() as u64;

        if self.uncompressed_bytes > self.threshold {
            self.rotate().await?;
        }
        Ok(())
    }

    /// Finalize the current chunk, upload it, and open a fresh spool.
    async fn rotate(&mut self) -> Result<()> {
        let encoder = std::mem::replace(
            &mut self.encoder,
            GzEncoder::new(Vec::new(), Compression::default()),
        );
        let compressed = encoder.finish()?;

        let key = chunk_key(&self.prefix, &self.schema, &self.table, self.chunk_index);
        debug!(
            "Chunk {} for {}.{}: {} compressed bytes",
            self.chunk_index,
            self.schema,
            self.table,
            compressed.len()
        );
        self.store.put_object(&key, compressed).await?;

        self.keys.push(key);
        self.chunk_index += 1;
        self.uncompressed_bytes = 0;
        Ok(())
    }

    /// Upload the final (possibly sole, possibly sub-threshold) chunk and
    /// return all chunk keys in order.
    pub async fn finish(mut self) -> Result<Vec<String>> {
        self.rotate().await?;
        Ok(self.keys)
    }
}

/// Streams table contents out of the source and into object storage.
pub struct Exporter<'a> {
    source: &'a PgSourcePool,
    store: &'a dyn ObjectStore,
    prefix: &'a str,
    chunk_size_bytes: u64,
}

impl<'a> Exporter<'a> {
    pub fn new(
        source: &'a PgSourcePool,
        store: &'a dyn ObjectStore,
        prefix: &'a str,
        chunk_size_bytes: u64,
    ) -> Self {
        Self {
            source,
            store,
            prefix,
            chunk_size_bytes,
        }
    }

    /// Export one table as a pipe-delimited gzip chunk series.
    ///
    /// Returns the uploaded chunk keys in order. Upload failures propagate;
    /// already-uploaded chunks are left in place and will be overwritten by
    /// the next run of the same table.
    pub async fn export(&self, table: &Table) -> Result<Vec<String>> {
        let client = self.source.client().await?;

        let copy_sql = format!(
            "COPY (SELECT {} FROM {}.{}) TO STDOUT WITH DELIMITER '{}'",
            table.columns_for_copy(),
            table.schema,
            quote_ident(&table.name),
            FIELD_DELIMITER
        );
        info!("Exporting {}", table.full_name());
        debug!("Export COPY: {}", copy_sql);

        let stream = client
            .copy_out(&copy_sql)
            .await
            .map_err(|e| MigrateError::export(table.full_name(), format!("initiating COPY: {}", e)))?;
        tokio::pin!(stream);

        let mut spooler = ChunkSpooler::new(
            self.store,
            self.chunk_size_bytes,
            self.prefix,
            &table.schema,
            table.target_name(),
        );

        // Text-format COPY emits one CopyData frame per row, so frame
        // boundaries are row boundaries and chunks never split a row.
        while let Some(data) = stream.next().await {
            let row = data.map_err(|e| {
                MigrateError::export(table.full_name(), format!("reading COPY data: {}", e))
            })?;
            spooler.write_row(&row).await?;
        }

        let keys = spooler.finish().await?;
        info!("Exported {} in {} chunk(s)", table.full_name(), keys.len());

        // Dropping the client recycles the source connection, bounding
        // cursor lifetime between tables.
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Mutex;

    /// In-memory object store capturing uploads in order.
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        order: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ObjectStore for MemoryStore {
        async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
            self.objects.lock().unwrap().insert(key.to_string(), body);
            self.order.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn bucket(&self) -> &str {
            "test-bucket"
        }
    }

    impl MemoryStore {
        fn decompressed(&self, key: &str) -> String {
            let objects = self.objects.lock().unwrap();
            let body = objects.get(key).unwrap();
            let mut out = String::new();
            GzDecoder::new(body.as_slice())
                .read_to_string(&mut out)
                .unwrap();
            out
        }
    }

    #[test]
    fn test_chunk_key_format() {
        assert_eq!(
            chunk_key("export", "activity_demo", "users", 0),
            "export/activity_demo.users.psv.gz"
        );
        assert_eq!(
            chunk_key("export", "activity_demo", "users", 1),
            "export/activity_demo.users.psv.gz.1"
        );
        assert_eq!(
            chunk_key("export", "activity_demo", "users", 12),
            "export/activity_demo.users.psv.gz.12"
        );
    }

    #[tokio::test]
    async fn test_single_chunk_below_threshold() {
        let store = MemoryStore::default();
        let mut spooler = ChunkSpooler::new(&store, 1024, "export", "s", "t");

        spooler.write_row(b"1|alice\n").await.unwrap();
        spooler.write_row(b"2|bob\n").await.unwrap();
        let keys = spooler.finish().await.unwrap();

        assert_eq!(keys, vec!["export/s.t.psv.gz"]);
        assert_eq!(store.decompressed(&keys[0]), "1|alice\n2|bob\n");
    }

    #[tokio::test]
    async fn test_rotation_never_splits_a_row() {
        let store = MemoryStore::default();
        // 6-byte rows against a 10-byte threshold: rotation happens after
        // the row that crosses the boundary, never inside it.
        let mut spooler = ChunkSpooler::new(&store, 10, "export", "s", "t");

        for row in [b"aaaaa\n", b"bbbbb\n", b"ccccc\n"] {
            spooler.write_row(row).await.unwrap();
        }
        let keys = spooler.finish().await.unwrap();

        assert_eq!(keys, vec!["export/s.t.psv.gz", "export/s.t.psv.gz.1"]);
        assert_eq!(store.decompressed(&keys[0]), "aaaaa\nbbbbb\n");
        assert_eq!(store.decompressed(&keys[1]), "ccccc\n");
    }

    #[tokio::test]
    async fn test_chunk_count_is_ceil_of_bytes_over_threshold() {
        let store = MemoryStore::default();
        let mut spooler = ChunkSpooler::new(&store, 100, "export", "s", "t");

        // 35 rows of 10 bytes = 350 uncompressed bytes, threshold 100:
        // ceil(350/100) = 4 chunks.
        for i in 0..35 {
            let row = format!("{:08}|\n", i);
            spooler.write_row(row.as_bytes()).await.unwrap();
        }
        let keys = spooler.finish().await.unwrap();
        assert_eq!(keys.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_stream_still_uploads_sole_chunk() {
        let store = MemoryStore::default();
        let spooler = ChunkSpooler::new(&store, 1024, "export", "s", "empty");
        let keys = spooler.finish().await.unwrap();

        assert_eq!(keys, vec!["export/s.empty.psv.gz"]);
        assert_eq!(store.decompressed(&keys[0]), "");
    }
}
