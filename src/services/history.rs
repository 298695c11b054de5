use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{ConfirmedMatch, MatchHistory, PairKey};

/// Errors that can occur with the match history file
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to read match history {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt match history {path} line {line}: `{content}`")]
    Corrupt {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Failed to write match history {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Line-oriented store of past pairs, one `email_a&email_b` per line
///
/// Lines are written as normalized pair keys. Older lines in either order
/// are accepted on load.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every recorded pair
    ///
    /// A missing file is an empty history (first run). An unreadable file
    /// or a line that is not a pair aborts the run.
    pub fn load(&self) -> Result<MatchHistory, HistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No match history at {}, starting fresh", self.path.display());
                return Ok(MatchHistory::new());
            }
            Err(source) => {
                return Err(HistoryError::Load {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut history = MatchHistory::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let key = PairKey::parse(line).ok_or_else(|| HistoryError::Corrupt {
                path: self.path.clone(),
                line: i + 1,
                content: line.to_string(),
            })?;
            history.insert(key);
        }

        tracing::info!("Loaded {} past matches from {}", history.len(), self.path.display());
        Ok(history)
    }

    /// Append this session's matches, creating the file if needed
    pub fn append(&self, matches: &[ConfirmedMatch]) -> Result<(), HistoryError> {
        if matches.is_empty() {
            return Ok(());
        }

        let write_err = |source| HistoryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut contents = String::new();
        for m in matches {
            contents.push_str(&m.key().to_string());
            contents.push('\n');
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(contents.as_bytes()))
            .map_err(write_err)?;

        tracing::info!("Recorded {} new matches in {}", matches.len(), self.path.display());
        Ok(())
    }
}
