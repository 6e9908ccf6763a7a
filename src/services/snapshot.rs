use crate::domain::models::{BusinessKey, Category, Record, SnapshotSummary, Table};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where and how a snapshot was written.
#[derive(Debug, Clone)]
pub struct SavedSnapshot {
    pub path: PathBuf,
    pub rows: usize,
    pub sha256: String,
}

/// One CSV file per category holding the last fetched table.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, category: Category) -> PathBuf {
        self.dir.join(category.snapshot_file())
    }

    /// Last persisted table, or an empty one before the first run.
    pub fn load(&self, category: Category) -> anyhow::Result<Table> {
        let path = self.path(category);
        if !path.exists() {
            debug!(%category, path = %path.display(), "no snapshot yet");
            return Ok(Table::new());
        }
        let raw = std::fs::read(&path)?;
        decode_csv(&raw)
    }

    /// Replace the category's snapshot with `table`. The file is written next
    /// to its destination and renamed into place, so readers see either the
    /// old or the new content.
    pub fn save(&self, category: Category, table: &Table) -> anyhow::Result<SavedSnapshot> {
        std::fs::create_dir_all(&self.dir)?;
        let bytes = encode_csv(table)?;
        let path = self.path(category);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;
        debug!(%category, rows = table.len(), path = %path.display(), "snapshot saved");
        Ok(SavedSnapshot {
            path,
            rows: table.len(),
            sha256: sha256_hex(&bytes),
        })
    }

    /// Remove the snapshot file. Returns whether one existed.
    pub fn clear(&self, category: Category) -> anyhow::Result<bool> {
        let path = self.path(category);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    pub fn summary(&self, category: Category, limit: usize) -> anyhow::Result<SnapshotSummary> {
        let path = self.path(category);
        let exists = path.exists();
        let (table, sha256) = if exists {
            let raw = std::fs::read(&path)?;
            (decode_csv(&raw)?, Some(sha256_hex(&raw)))
        } else {
            (Table::new(), None)
        };

        let mut keys: Vec<BusinessKey> = table.rows().iter().map(BusinessKey::of).collect();
        keys.sort_by(|a, b| {
            b.vary_date
                .cmp(&a.vary_date)
                .then_with(|| b.declare_date.cmp(&a.declare_date))
        });

        Ok(SnapshotSummary {
            category,
            path: path.to_string_lossy().to_string(),
            exists,
            rows: table.len(),
            columns: table.columns().to_vec(),
            sha256,
            latest_keys: keys.into_iter().take(limit).map(|k| k.to_string()).collect(),
        })
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// CSV with a header row, prefixed with a UTF-8 BOM so spreadsheet tools pick
/// the right encoding. A table without columns encodes to an empty file.
pub fn encode_csv(table: &Table) -> anyhow::Result<Vec<u8>> {
    if table.columns().is_empty() {
        return Ok(Vec::new());
    }
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(table.columns().iter().map(|c| row.field(c)))?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}

pub fn decode_csv(raw: &[u8]) -> anyhow::Result<Table> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Ok(Table::new());
    }

    let mut table = Table::with_columns(headers.clone());
    for result in rdr.records() {
        let record = result?;
        let mut row = Record::default();
        for (i, h) in headers.iter().enumerate() {
            row.insert(h.as_str(), record.get(i).unwrap_or(""));
        }
        table.push(row);
    }
    Ok(table)
}
