//! [`Sink`] implementations.
//!
//! - **[`FileSink`]** — one append-only UTF-8 text file per state,
//!   `{output_dir}/{state}_links.txt`, one record per line.
//! - **[`MemorySink`]** — keeps records in memory; used by tests and by
//!   library callers that want the records back.
//!
//! Both hold a mutex across the whole write of a record, so concurrent
//! workers never interleave lines.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::LeafRecord;
use crate::traits::Sink;

/// File name used for a state's records.
pub fn links_file_name(state: &str) -> String {
    format!("{}_links.txt", state)
}

/// Appends records to `{state}_links.txt` files under one directory.
///
/// Files are opened in create+append mode the first time a state is seen
/// and kept open for the lifetime of the sink. Existing content is never
/// truncated, so repeated runs add to the same file.
pub struct FileSink {
    dir: PathBuf,
    files: Mutex<HashMap<String, File>>,
}

impl FileSink {
    /// Create a sink writing under `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Path of the file that records for `state` go to.
    pub fn path_for(&self, state: &str) -> PathBuf {
        self.dir.join(links_file_name(state))
    }
}

impl Sink for FileSink {
    fn append(&self, record: &LeafRecord) -> Result<()> {
        let mut line = record.to_line();
        line.push('\n');

        let mut files = self
            .files
            .lock()
            .map_err(|_| anyhow!("file sink lock poisoned"))?;

        if !files.contains_key(&record.state) {
            let path = self.path_for(&record.state);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            files.insert(record.state.clone(), file);
        }
        let file = files
            .get_mut(&record.state)
            .ok_or_else(|| anyhow!("no open file for state {}", record.state))?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| {
                format!(
                    "Failed to write record to {}",
                    self.path_for(&record.state).display()
                )
            })
    }
}

/// Keeps every appended record in order.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<LeafRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far.
    pub fn records(&self) -> Vec<LeafRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// The records rendered exactly as [`FileSink`] would write them.
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(LeafRecord::to_line).collect()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn append(&self, record: &LeafRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
