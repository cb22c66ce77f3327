//! Cumulative CSV checkpoints
//!
//! Each completed chunk produces `checkpoint_<processed>.csv`, holding every
//! record gathered since the start of the crawl. Files are written under a
//! `.partial` name and renamed into place, and an existing checkpoint is
//! never replaced.

use crate::record::Record;
use crate::{Result, SweepError};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const CHECKPOINT_PREFIX: &str = "checkpoint_";
const CHECKPOINT_EXTENSION: &str = ".csv";
const PARTIAL_SUFFIX: &str = ".partial";
const UTF8_BOM: &str = "\u{feff}";

/// Sidecar file holding the hash of the config that produced the checkpoints
pub const CONFIG_HASH_FILE: &str = "config.sha256";

/// A checkpoint found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointFile {
    pub path: PathBuf,

    /// Identifiers covered from the start of the range
    pub processed: u64,
}

/// File name for a checkpoint covering `processed` identifiers
pub fn checkpoint_file_name(processed: u64) -> String {
    format!("{}{}{}", CHECKPOINT_PREFIX, processed, CHECKPOINT_EXTENSION)
}

/// Parses `checkpoint_<n>.csv` back into `n`
pub fn parse_checkpoint_name(name: &str) -> Option<u64> {
    name.strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(CHECKPOINT_EXTENSION)?
        .parse()
        .ok()
}

/// Writes checkpoints into one directory
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    dir: PathBuf,
}

impl CheckpointWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the checkpoint directory if it does not exist
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Writes the cumulative record set as a new checkpoint
    ///
    /// # Arguments
    ///
    /// * `records` - Every record gathered so far
    /// * `processed` - Identifiers covered so far; names the file
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the new checkpoint
    /// * `Err(SweepError::CheckpointExists)` - A checkpoint with that name exists
    /// * `Err(SweepError)` - Any I/O or CSV failure; the run should stop
    pub fn write(&self, records: &[Record], processed: u64) -> Result<PathBuf> {
        let name = checkpoint_file_name(processed);
        let path = self.dir.join(&name);
        if path.exists() {
            return Err(SweepError::CheckpointExists { path });
        }

        let partial = self.dir.join(format!("{}{}", name, PARTIAL_SUFFIX));
        let mut file = File::create(&partial)?;
        file.write_all(UTF8_BOM.as_bytes())?;

        let columns = union_columns(records);
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut writer = csv::Writer::from_writer(file);
        if !columns.is_empty() {
            writer.write_record(&columns)?;
        }

        for record in records {
            let mut row = vec![String::new(); columns.len()];
            for (column, value) in record.fields() {
                if let Some(&i) = positions.get(column.as_str()) {
                    row[i] = value.to_string();
                }
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| SweepError::Io(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        fs::rename(&partial, &path)?;
        tracing::info!(
            "Wrote checkpoint {} ({} records, {} columns)",
            path.display(),
            records.len(),
            columns.len()
        );
        Ok(path)
    }
}

/// Column names across all records, in order of first appearance
pub fn union_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for (column, _) in record.fields() {
            if seen.insert(column.clone()) {
                columns.push(column);
            }
        }
    }
    columns
}

/// Lists checkpoints in a directory, lowest coverage first
///
/// A missing directory has no checkpoints. Partial files and unrelated
/// names are ignored.
pub fn list_checkpoints(dir: &Path) -> Result<Vec<CheckpointFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut checkpoints = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(processed) = name.to_str().and_then(parse_checkpoint_name) {
            checkpoints.push(CheckpointFile {
                path: entry.path(),
                processed,
            });
        }
    }

    checkpoints.sort_by_key(|c| c.processed);
    Ok(checkpoints)
}

/// Returns the checkpoint covering the most identifiers, if any
pub fn latest_checkpoint(dir: &Path) -> Result<Option<CheckpointFile>> {
    Ok(list_checkpoints(dir)?.pop())
}

/// Loads every record from a checkpoint
pub fn load_checkpoint(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let record = Record::from_columns(headers.iter().zip(row.iter())).ok_or_else(|| {
            SweepError::MalformedCheckpoint {
                path: path.to_path_buf(),
                message: format!("row {} has no url", line + 1),
            }
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Reads the stored config hash, if one was recorded
pub fn read_config_hash(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(CONFIG_HASH_FILE);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?.trim().to_string()))
}

/// Records the hash of the config driving the current run
pub fn write_config_hash(dir: &Path, hash: &str) -> Result<()> {
    fs::write(dir.join(CONFIG_HASH_FILE), format!("{}\n", hash))?;
    Ok(())
}
