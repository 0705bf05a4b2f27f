use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Number of entries kept in the table.
pub const CAPACITY: usize = 9;
/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 15;
/// Placeholder name for unfilled slots.
pub const PLACEHOLDER_NAME: &str = "---";
/// Time recorded for unfilled slots (ten minutes).
pub const PLACEHOLDER_TIME_MS: u64 = 600_000;

const FILE_VERSION: u8 = 1;

/// Receives finished-race scores. Returns the 0-based rank when the score made the table.
pub trait HighscoreSink {
    fn submit_score(&mut self, name: &str, time_ms: u64) -> Option<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighscoreEntry {
    pub name: String,
    pub time_ms: u64,
}

impl HighscoreEntry {
    fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            time_ms: PLACEHOLDER_TIME_MS,
        }
    }
}

/// Fixed-size table sorted ascending by time (lower is better).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighscoreTable {
    entries: Vec<HighscoreEntry>,
}

impl Default for HighscoreTable {
    fn default() -> Self {
        Self {
            entries: vec![HighscoreEntry::placeholder(); CAPACITY],
        }
    }
}

impl HighscoreTable {
    /// Build a table from arbitrary entries: sorted, truncated and padded to capacity.
    pub fn from_entries(mut entries: Vec<HighscoreEntry>) -> Self {
        for entry in &mut entries {
            entry.name = normalize_name(&entry.name);
        }
        entries.sort_by_key(|e| e.time_ms);
        entries.truncate(CAPACITY);
        entries.resize(CAPACITY, HighscoreEntry::placeholder());
        Self { entries }
    }

    pub fn entries(&self) -> &[HighscoreEntry] {
        &self.entries
    }

    /// Whether `time_ms` would enter the table.
    pub fn qualifies(&self, time_ms: u64) -> bool {
        self.entries.last().is_none_or(|worst| time_ms < worst.time_ms)
    }

    /// Insert a score, evicting the worst entry. Ties rank behind existing entries.
    pub fn submit(&mut self, name: &str, time_ms: u64) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|e| e.time_ms > time_ms)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            rank,
            HighscoreEntry {
                name: normalize_name(name),
                time_ms,
            },
        );
        self.entries.truncate(CAPACITY);
        (rank < CAPACITY).then_some(rank)
    }
}

impl HighscoreSink for HighscoreTable {
    fn submit_score(&mut self, name: &str, time_ms: u64) -> Option<usize> {
        self.submit(name, time_ms)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HighscoreFile {
    version: u8,
    entries: Vec<HighscoreEntry>,
}

/// High-score table persisted as JSON.
pub struct HighscoreStore {
    path: PathBuf,
    table: HighscoreTable,
}

impl HighscoreStore {
    /// Open the store, falling back to the default table when the file is
    /// missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = load_table(&path);
        Self { path, table }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &HighscoreTable {
        &self.table
    }

    /// Write the table, creating parent directories as needed.
    pub fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let payload = HighscoreFile {
            version: FILE_VERSION,
            entries: self.table.entries.clone(),
        };
        let text = serde_json::to_string_pretty(&payload).map_err(std::io::Error::other)?;
        fs::write(&self.path, text)
    }
}

impl HighscoreSink for HighscoreStore {
    fn submit_score(&mut self, name: &str, time_ms: u64) -> Option<usize> {
        let rank = self.table.submit(name, time_ms);
        if let Err(e) = self.save() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save highscores");
        }
        rank
    }
}

fn load_table(path: &Path) -> HighscoreTable {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::info!(path = %path.display(), "No highscore file, using defaults");
            } else {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read highscores");
            }
            return HighscoreTable::default();
        },
    };
    match serde_json::from_str::<HighscoreFile>(&text) {
        Ok(file) if file.version == FILE_VERSION => HighscoreTable::from_entries(file.entries),
        Ok(file) => {
            tracing::warn!(
                path = %path.display(),
                version = file.version,
                "Unsupported highscore file version, using defaults"
            );
            HighscoreTable::default()
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Malformed highscores, using defaults"
            );
            HighscoreTable::default()
        },
    }
}

fn normalize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if trimmed.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        trimmed
    }
}
