use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::medal::Medal;
use crate::round::{RoundState, RoundStatus};
use crate::util::date_key;

/// One finished round, as written to `results.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub played_at: String,
    pub puzzle_date: String,
    pub won: bool,
    pub elapsed_secs: u64,
    pub mistakes: u32,
    pub solved_groups: usize,
    pub medal: Option<Medal>,
}

impl ResultEntry {
    /// `None` while the round is still active.
    pub fn from_state(puzzle_date: NaiveDate, state: &RoundState) -> Option<Self> {
        let elapsed_secs = state.elapsed_seconds()?;
        let won = state.status() == RoundStatus::Won;
        Some(Self {
            played_at: Local::now().to_rfc3339(),
            puzzle_date: date_key(puzzle_date),
            won,
            elapsed_secs,
            mistakes: state.mistakes_made(),
            solved_groups: state.solved_count(),
            medal: won.then(|| Medal::classify(elapsed_secs, state.mistakes_made())),
        })
    }
}

/// Append-only CSV log of finished rounds
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::results_log_path().unwrap_or_else(|| PathBuf::from("results.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, entry: &ResultEntry) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> csv::Result<Vec<ResultEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let entries = reader.deserialize::<ResultEntry>().collect();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(won: bool) -> ResultEntry {
        ResultEntry {
            played_at: "2026-10-14T09:00:00+00:00".into(),
            puzzle_date: "2026-10-14".into(),
            won,
            elapsed_secs: 75,
            mistakes: 2,
            solved_groups: if won { 4 } else { 1 },
            medal: won.then_some(Medal::Silver),
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("results.csv");
        let log = ResultsLog::with_path(&path);
        log.append(&entry(true)).unwrap();
        log.append(&entry(false)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("played_at").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn entries_read_back() {
        let dir = tempdir().unwrap();
        let log = ResultsLog::with_path(dir.path().join("results.csv"));
        assert!(log.read_all().unwrap().is_empty());

        log.append(&entry(true)).unwrap();
        log.append(&entry(false)).unwrap();
        let all = log.read_all().unwrap();
        assert_eq!(all, vec![entry(true), entry(false)]);
        assert_eq!(all[1].medal, None);
    }
}
