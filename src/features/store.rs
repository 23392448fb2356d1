use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::BASE_FEATURE_NAMES;

use super::error::{StoreError, StoreResult};
use super::record::MatchingRecord;

/// Labeled features and their 0/1 labels, index-aligned.
pub type LabeledData = (Vec<HashMap<String, f64>>, Vec<u8>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreStatistics {
    pub total: usize,
    pub labeled: usize,
    pub unlabeled: usize,
    pub positive: usize,
    pub negative: usize,
}

/// Append-only JSONL log of [`MatchingRecord`]s keyed by `pair_id`.
///
/// Every write appends a full record line. On open the log is replayed and the
/// last line for each `pair_id` wins; the file is never compacted. Writers in
/// different processes are not serialized against each other.
#[derive(Debug)]
pub struct MatchingStore {
    path: Option<PathBuf>,
    records: Vec<MatchingRecord>,
    index: HashMap<String, usize>,
    skipped_lines: usize,
}

impl MatchingStore {
    /// Opens (or creates) the log at `path` and replays it.
    pub fn open<P: Into<PathBuf>>(path: P) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut store = Self {
            path: Some(path.clone()),
            records: Vec::new(),
            index: HashMap::new(),
            skipped_lines: 0,
        };

        if path.exists() {
            store.replay(&path)?;
        }

        info!(
            path = %path.display(),
            records = store.records.len(),
            skipped_lines = store.skipped_lines,
            "Matching store opened"
        );

        Ok(store)
    }

    /// A store with no backing file (writes only update memory).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Vec::new(),
            index: HashMap::new(),
            skipped_lines: 0,
        }
    }

    fn replay(&mut self, path: &Path) -> StoreResult<()> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MatchingRecord>(&line) {
                Ok(record) => self.upsert(record),
                Err(e) => {
                    self.skipped_lines += 1;
                    warn!(line = line_no + 1, error = %e, "Skipping malformed record line");
                }
            }
        }
        Ok(())
    }

    fn upsert(&mut self, record: MatchingRecord) {
        match self.index.get(&record.pair_id) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.index.insert(record.pair_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    fn append_line(&self, record: &MatchingRecord) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        // One write per line keeps a single writer's lines whole.
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(path, e))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of log lines dropped as malformed during replay.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current records in first-seen order.
    pub fn records(&self) -> &[MatchingRecord] {
        &self.records
    }

    pub fn get(&self, pair_id: &str) -> Option<&MatchingRecord> {
        self.index.get(pair_id).map(|&idx| &self.records[idx])
    }

    pub fn add(&mut self, record: MatchingRecord) -> StoreResult<()> {
        self.append_line(&record)?;
        debug!(pair_id = %record.pair_id, "Record appended");
        self.upsert(record);
        Ok(())
    }

    /// Sets the match label on a known pair. Returns `false` for unknown pairs.
    pub fn add_feedback(&mut self, pair_id: &str, is_match: bool) -> StoreResult<bool> {
        self.add_feedback_with(pair_id, is_match, None, None)
    }

    pub fn add_feedback_with(
        &mut self,
        pair_id: &str,
        is_match: bool,
        user_feedback: Option<String>,
        match_quality: Option<f64>,
    ) -> StoreResult<bool> {
        let Some(current) = self.get(pair_id) else {
            debug!(pair_id, "Feedback for unknown pair ignored by store");
            return Ok(false);
        };

        let updated = current.labeled(is_match, user_feedback, match_quality);
        self.add(updated)?;
        Ok(true)
    }

    pub fn labeled_records(&self) -> impl Iterator<Item = &MatchingRecord> {
        self.records.iter().filter(|r| r.is_labeled())
    }

    pub fn unlabeled_records(&self) -> impl Iterator<Item = &MatchingRecord> {
        self.records.iter().filter(|r| !r.is_labeled())
    }

    pub fn unlabeled_count(&self) -> usize {
        self.unlabeled_records().count()
    }

    pub fn labeled_data(&self) -> LabeledData {
        self.labeled_records()
            .filter_map(|r| r.is_match.map(|label| (r.feature_map(), u8::from(label))))
            .unzip()
    }

    pub fn statistics(&self) -> StoreStatistics {
        let mut stats = StoreStatistics {
            total: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            match record.is_match {
                Some(true) => stats.positive += 1,
                Some(false) => stats.negative += 1,
                None => stats.unlabeled += 1,
            }
        }
        stats.labeled = stats.positive + stats.negative;
        stats
    }

    /// Writes all current records as CSV and returns the row count.
    pub fn export_csv(&self, path: &Path) -> StoreResult<usize> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec!["pair_id", "text1", "text2", "category1", "category2"];
        header.extend(BASE_FEATURE_NAMES);
        header.extend(["is_match", "user_feedback"]);
        writer.write_record(&header)?;

        for record in &self.records {
            let mut row = vec![
                record.pair_id.clone(),
                record.text1.clone(),
                record.text2.clone(),
                record.category1.clone(),
                record.category2.clone(),
            ];
            row.extend(record.features.to_vec().iter().map(|v| v.to_string()));
            row.push(match record.is_match {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => String::new(),
            });
            row.push(record.user_feedback.clone().unwrap_or_default());
            writer.write_record(&row)?;
        }
        writer.flush().map_err(|e| StoreError::io(path, e))?;

        info!(path = %path.display(), rows = self.records.len(), "Exported records to CSV");
        Ok(self.records.len())
    }
}
