use chrono::{Duration, Local, NaiveDate};
use llm_client::BoxError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Retained history cap; oldest entries are dropped first beyond this.
pub const MAX_HISTORY: usize = 1000;

/// One previously selected topic, at local-day granularity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub query: String,
    pub score: f64,
}

/// Bounded append-only topic history, persisted as a JSON array.
///
/// Loaded fully per operation and rewritten whole on save. Runs are
/// cron-cadence and the file is capped, so the round trip is cheap.
/// Not safe for concurrent multi-process invocations (last writer wins).
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: MAX_HISTORY,
        }
    }

    #[cfg(test)]
    fn with_max_entries(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
        }
    }

    /// Read persisted records. A missing or corrupt file is empty history,
    /// never an error: a broken history must not abort the run.
    pub fn load(&self) -> Vec<HistoryRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unparseable history file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite persisted state, truncated to the newest `max_entries`.
    pub fn save(&self, mut records: Vec<HistoryRecord>) -> Result<(), BoxError> {
        if records.len() > self.max_entries {
            let excess = records.len() - self.max_entries;
            records.drain(..excess);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, serde_json::to_vec_pretty(&records)?)?;
        Ok(())
    }

    /// Distinct queries used within the last `days` days, inclusive of the
    /// window boundary. Calendar-date comparison in local time.
    pub fn recently_used(&self, days: i64) -> HashSet<String> {
        let cutoff = Local::now().date_naive() - Duration::days(days);
        self.load()
            .into_iter()
            .filter(|r| r.date >= cutoff)
            .map(|r| r.query)
            .collect()
    }

    /// Append one record dated today, enforcing the cap.
    pub fn append(&self, query: &str, score: f64) -> Result<(), BoxError> {
        let mut records = self.load();
        records.push(HistoryRecord {
            date: Local::now().date_naive(),
            query: query.to_string(),
            score,
        });
        self.save(records)
    }
}
