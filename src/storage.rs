use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bincode::config::standard as bincode_config;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::constants::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION, SNAPSHOT_ZSTD_LEVEL};
use crate::types::{DatasetKind, RecordSet, Value};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SnapshotFile {
    magic: [u8; 4],
    version: u16,
    payload: ColumnarRecords,
}

/// Column-major serialization of a record set: one value column per field.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ColumnarRecords {
    fields: Vec<String>,
    row_count: u64,
    columns: Vec<Vec<Value>>,
}

impl ColumnarRecords {
    fn from_records(records: &RecordSet) -> Self {
        let field_count = records.fields().len();
        let mut columns: Vec<Vec<Value>> = (0..field_count)
            .map(|_| Vec::with_capacity(records.len()))
            .collect();
        for row in records.rows() {
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(row.get(idx).cloned().unwrap_or(Value::Null));
            }
        }
        Self {
            fields: records.fields().to_vec(),
            row_count: records.len() as u64,
            columns,
        }
    }

    fn into_records(self) -> Result<RecordSet> {
        if self.columns.len() != self.fields.len() {
            bail!(
                "Snapshot column count {} does not match field count {}",
                self.columns.len(),
                self.fields.len()
            );
        }
        for (field, column) in self.fields.iter().zip(self.columns.iter()) {
            if column.len() as u64 != self.row_count {
                bail!(
                    "Snapshot column {} has {} values, expected {}",
                    field,
                    column.len(),
                    self.row_count
                );
            }
        }

        let mut records = RecordSet::new(self.fields);
        for row_idx in 0..self.row_count as usize {
            let row: Vec<Value> = self
                .columns
                .iter()
                .map(|column| column[row_idx].clone())
                .collect();
            records.push_row(row);
        }
        Ok(records)
    }
}

/// On-disk snapshot store, one file per dataset under a fixed directory.
/// A readable snapshot is authoritative; anything unreadable is a miss.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, dataset: DatasetKind) -> PathBuf {
        self.dir.join(format!("{}.snap.zst", dataset.file_stem()))
    }

    /// Returns the persisted snapshot, or `None` when the file is missing
    /// or fails to decode. Decode failures are logged and treated as a
    /// cache miss so the caller rebuilds from source.
    pub async fn load(&self, dataset: DatasetKind) -> Option<RecordSet> {
        let path = self.path(dataset);
        if !path.exists() {
            return None;
        }
        match load_snapshot_file(&path).await {
            Ok(records) => {
                info!(
                    "Loaded {} snapshot ({} rows) from {}",
                    dataset.label(),
                    records.len(),
                    path.display()
                );
                Some(records)
            }
            Err(error) => {
                warn!(
                    "Invalid {} snapshot {}, rebuilding: {error:#}",
                    dataset.label(),
                    path.display()
                );
                None
            }
        }
    }

    /// Overwrites the snapshot unconditionally, via tmp file + rename.
    pub async fn save(&self, dataset: DatasetKind, records: &RecordSet) -> Result<()> {
        let file = SnapshotFile {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            payload: ColumnarRecords::from_records(records),
        };

        let encoded = encode_to_vec(&file, bincode_config()).context("Failed to encode snapshot")?;
        let compressed = zstd::stream::encode_all(Cursor::new(encoded), SNAPSHOT_ZSTD_LEVEL)
            .context("Failed to zstd-compress snapshot")?;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path(dataset);
        let tmp_path = self.dir.join(format!("{}.tmp", dataset.file_stem()));

        fs::write(&tmp_path, compressed)
            .await
            .with_context(|| format!("Failed writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).await.with_context(|| {
            format!(
                "Failed renaming {} -> {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        info!(
            "Persisted {} snapshot ({} rows) to {}",
            dataset.label(),
            records.len(),
            path.display()
        );
        Ok(())
    }
}

async fn load_snapshot_file(path: &Path) -> Result<RecordSet> {
    let compressed = fs::read(path)
        .await
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    let decompressed = zstd::stream::decode_all(Cursor::new(compressed))
        .context("Failed to decompress snapshot")?;
    let (snapshot_file, _): (SnapshotFile, usize) =
        decode_from_slice(&decompressed, bincode_config()).context("Failed to decode snapshot")?;

    if snapshot_file.magic != SNAPSHOT_MAGIC {
        bail!("Invalid snapshot magic");
    }
    if snapshot_file.version != SNAPSHOT_VERSION {
        bail!("Unsupported snapshot version {}", snapshot_file.version);
    }

    snapshot_file.payload.into_records()
}
