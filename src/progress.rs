//! Per-level progress records
//!
//! Persisted to a JSON file, tracks best score and best completion time
//! for every level the player has attempted.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::SessionReport;

/// Best results achieved on a single level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LevelRecord {
    /// Whether the finish marker was ever reached
    pub completed: bool,
    /// Best pickup total across all attempts
    pub best_score: u32,
    /// Fastest completion in seconds; None until the level is completed
    pub best_time: Option<f32>,
}

/// Progress table keyed by level name
///
/// BTreeMap keeps the saved JSON stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Progress {
    pub levels: BTreeMap<String, LevelRecord>,
}

impl Progress {
    /// Create an empty progress table
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Merge one session's results into the table.
    /// Returns true if any record improved.
    pub fn record(&mut self, level: &str, report: &SessionReport) -> bool {
        let score = report.carrots + report.radishes;
        let entry = self.levels.entry(level.to_string()).or_default();
        let mut improved = false;

        if score > entry.best_score {
            entry.best_score = score;
            improved = true;
        }
        if report.completed {
            if !entry.completed {
                entry.completed = true;
                improved = true;
            }
            let beats = entry
                .best_time
                .map(|t| report.elapsed_seconds < t)
                .unwrap_or(true);
            if beats {
                entry.best_time = Some(report.elapsed_seconds);
                improved = true;
            }
        }

        improved
    }

    /// Best results for a level, if it was ever attempted
    pub fn level(&self, name: &str) -> Option<&LevelRecord> {
        self.levels.get(name)
    }

    /// Whether a level has ever been completed
    pub fn is_completed(&self, name: &str) -> bool {
        self.levels.get(name).map(|r| r.completed).unwrap_or(false)
    }

    /// Number of completed levels
    pub fn completed_count(&self) -> usize {
        self.levels.values().filter(|r| r.completed).count()
    }

    /// Load progress from a JSON file; missing or unreadable files
    /// start a fresh table.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Progress>(&json) {
                Ok(progress) => {
                    log::info!("Loaded progress for {} levels", progress.levels.len());
                    progress
                }
                Err(err) => {
                    log::warn!("Progress file {} is corrupt: {err}", path.display());
                    Self::new()
                }
            },
            Err(_) => {
                log::info!("No progress file found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save progress to a JSON file
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Progress saved ({} levels)", self.levels.len());
        Ok(())
    }
}
