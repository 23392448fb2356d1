use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::entry::FeedbackEntry;
use super::error::{FeedbackError, FeedbackResult};

/// Append-only JSONL feedback log, mirrored in memory.
///
/// Malformed lines are skipped on open. Concurrent writers from several
/// processes must be coordinated by the caller.
#[derive(Debug)]
pub struct FeedbackLog {
    path: Option<PathBuf>,
    entries: Vec<FeedbackEntry>,
    skipped_lines: usize,
}

impl FeedbackLog {
    pub fn open<P: Into<PathBuf>>(path: P) -> FeedbackResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| FeedbackError::io(parent, e))?;
        }

        let mut log = Self {
            path: Some(path.clone()),
            entries: Vec::new(),
            skipped_lines: 0,
        };

        if path.exists() {
            let file = File::open(&path).map_err(|e| FeedbackError::io(&path, e))?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| FeedbackError::io(&path, e))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<FeedbackEntry>(&line) {
                    Ok(entry) => log.entries.push(entry),
                    Err(e) => {
                        log.skipped_lines += 1;
                        warn!(line = line_no + 1, error = %e, "Skipping malformed feedback line");
                    }
                }
            }
        }

        info!(
            path = %path.display(),
            entries = log.entries.len(),
            skipped_lines = log.skipped_lines,
            "Feedback log opened"
        );
        Ok(log)
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            skipped_lines: 0,
        }
    }

    pub fn append(&mut self, entry: FeedbackEntry) -> FeedbackResult<()> {
        if let Some(path) = &self.path {
            let mut line = serde_json::to_string(&entry)?;
            line.push('\n');
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| FeedbackError::io(path, e))?;
            file.write_all(line.as_bytes())
                .map_err(|e| FeedbackError::io(path, e))?;
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[FeedbackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}
