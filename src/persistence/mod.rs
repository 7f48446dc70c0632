//! Score persistence
//!
//! The simulation core never selects a backing store; it hands the final
//! score to whatever [`ScoreStore`] was injected at startup. A failing
//! primary store (an unreachable remote leaderboard, a read-only disk)
//! degrades to the fallback - persistence trouble never ends a run.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::highscores::{HighScoreEntry, HighScores};

/// Score store failure modes
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Where a submitted score ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredRank {
    /// 1-indexed leaderboard position
    Ranked(usize),
    /// Stored but outside the leaderboard cutoff
    Unranked,
}

/// Injected persistence capability: the core submits `(name, score)` and
/// gets back where it landed. Implementations decide the backing
/// technology.
pub trait ScoreStore {
    fn save(&mut self, name: &str, score: u64) -> Result<StoredRank, StoreError>;

    /// Current top entries, best first
    fn top(&self, limit: usize) -> Result<Vec<HighScoreEntry>, StoreError>;
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory store; the default when nothing else is configured and the
/// recovery target in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    board: HighScores,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn save(&mut self, name: &str, score: u64) -> Result<StoredRank, StoreError> {
        Ok(match self.board.add_score(name, score, now_ms()) {
            Some(rank) => StoredRank::Ranked(rank),
            None => StoredRank::Unranked,
        })
    }

    fn top(&self, limit: usize) -> Result<Vec<HighScoreEntry>, StoreError> {
        Ok(self.board.entries.iter().take(limit).cloned().collect())
    }
}

/// JSON-file-backed store. Missing files mean an empty board; a corrupt
/// file is logged and treated as empty rather than blocking submission.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HighScores {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(board) => board,
                Err(err) => {
                    log::warn!(
                        "score file {} is corrupt ({err}), starting fresh",
                        self.path.display()
                    );
                    HighScores::new()
                }
            },
            Err(_) => HighScores::new(),
        }
    }
}

impl ScoreStore for JsonFileStore {
    fn save(&mut self, name: &str, score: u64) -> Result<StoredRank, StoreError> {
        let mut board = self.load();
        let rank = board.add_score(name, score, now_ms());
        let json = serde_json::to_string(&board)?;
        std::fs::write(&self.path, json)?;
        log::info!(
            "saved score {score} for {name} to {} ({} entries)",
            self.path.display(),
            board.entries.len()
        );
        Ok(match rank {
            Some(rank) => StoredRank::Ranked(rank),
            None => StoredRank::Unranked,
        })
    }

    fn top(&self, limit: usize) -> Result<Vec<HighScoreEntry>, StoreError> {
        Ok(self.load().entries.into_iter().take(limit).collect())
    }
}

/// Primary store with a local fallback: submissions that fail against the
/// primary are recovered into the fallback instead of surfacing to the
/// caller.
#[derive(Debug)]
pub struct FallbackStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P: ScoreStore, F: ScoreStore> FallbackStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ScoreStore, F: ScoreStore> ScoreStore for FallbackStore<P, F> {
    fn save(&mut self, name: &str, score: u64) -> Result<StoredRank, StoreError> {
        match self.primary.save(name, score) {
            Ok(rank) => Ok(rank),
            Err(err) => {
                log::warn!("primary score store failed ({err}), using fallback");
                self.fallback.save(name, score)
            }
        }
    }

    fn top(&self, limit: usize) -> Result<Vec<HighScoreEntry>, StoreError> {
        match self.primary.top(limit) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                log::warn!("primary score store failed ({err}), reading fallback");
                self.fallback.top(limit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A store that always fails, standing in for an unreachable remote.
    struct DeadStore;

    impl ScoreStore for DeadStore {
        fn save(&mut self, _name: &str, _score: u64) -> Result<StoredRank, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn top(&self, _limit: usize) -> Result<Vec<HighScoreEntry>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_memory_store_ranks() {
        let mut store = MemoryStore::new();
        assert_eq!(store.save("ada", 100).unwrap(), StoredRank::Ranked(1));
        assert_eq!(store.save("brn", 200).unwrap(), StoredRank::Ranked(1));
        assert_eq!(store.save("cal", 50).unwrap(), StoredRank::Ranked(3));
        let top = store.top(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].score, 200);
    }

    #[test]
    fn test_fallback_recovers_dead_primary() {
        let mut store = FallbackStore::new(DeadStore, MemoryStore::new());
        let rank = store.save("ada", 400).expect("fallback should absorb the failure");
        assert_eq!(rank, StoredRank::Ranked(1));
        assert_eq!(store.top(10).unwrap().len(), 1);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "windjammer_scores_test_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.save("ada", 120).unwrap(), StoredRank::Ranked(1));
        assert_eq!(store.save("brn", 60).unwrap(), StoredRank::Ranked(2));

        // A second store over the same file sees the persisted board.
        let store2 = JsonFileStore::new(&path);
        let top = store2.top(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "ada");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_json_file_store_tolerates_corrupt_file() {
        let path = std::env::temp_dir().join(format!(
            "windjammer_scores_corrupt_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "not json at all").unwrap();

        let mut store = JsonFileStore::new(&path);
        // Corrupt data is discarded, not fatal.
        assert_eq!(store.save("ada", 10).unwrap(), StoredRank::Ranked(1));

        let _ = std::fs::remove_file(&path);
    }
}
