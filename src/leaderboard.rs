//! Course-scoped best-time leaderboard.
//!
//! One stored blob per course holding up to [`MAX_ENTRIES`] entries sorted
//! ascending by time. Submitting always replaces a player's existing entry
//! with the new time, so the board reflects each player's latest run.

use crate::storage::{leaderboard_key, DurableStorage};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MAX_ENTRIES: usize = 50;
pub const TOP_DISPLAY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub username: String,
    pub time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredLeaderboard {
    entries: Vec<LeaderboardEntry>,
}

pub struct LeaderboardStore {
    storage: Arc<dyn DurableStorage>,
    course_id: String,
    entries: Vec<LeaderboardEntry>,
}

impl LeaderboardStore {
    pub fn new(storage: Arc<dyn DurableStorage>, course_id: impl Into<String>) -> Self {
        Self {
            storage,
            course_id: course_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    /// Point at a different course. The cached board belongs to the old
    /// course and is dropped; call [`load`](Self::load) before reading.
    pub fn set_course_id(&mut self, id: impl Into<String>) {
        self.course_id = id.into();
        self.entries.clear();
    }

    /// Replace the cached board with the stored one for the active course.
    /// Entries are re-sorted on load so a hand-edited blob still reads sanely.
    pub async fn load(&mut self) {
        let key = leaderboard_key(&self.course_id);
        let stored = match self.storage.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<StoredLeaderboard>(value) {
                Ok(s) => s,
                Err(e) => {
                    warn!("malformed leaderboard at {}: {} – starting empty", key, e);
                    StoredLeaderboard::default()
                }
            },
            Ok(None) => StoredLeaderboard::default(),
            Err(e) => {
                warn!("failed to load leaderboard {}: {}", key, e);
                StoredLeaderboard::default()
            }
        };
        self.entries = stored.entries;
        self.entries.sort_by_key(|e| e.time_ms);
        self.entries.truncate(MAX_ENTRIES);
    }

    /// Submit a finish time. The player's previous entry (if any) is removed
    /// first, the new one inserted in sorted position, and the board capped
    /// at [`MAX_ENTRIES`]. Returns the 1-indexed rank if the entry made the
    /// board.
    pub async fn submit(
        &mut self,
        player_id: &str,
        username: &str,
        time_ms: u64,
    ) -> Option<usize> {
        self.entries.retain(|e| e.player_id != player_id);
        self.entries.push(LeaderboardEntry {
            player_id: player_id.to_string(),
            username: username.to_string(),
            time_ms,
        });
        self.entries.sort_by_key(|e| e.time_ms);
        self.entries.truncate(MAX_ENTRIES);

        self.persist().await;
        self.get_player_rank(player_id)
    }

    async fn persist(&self) {
        let key = leaderboard_key(&self.course_id);
        let stored = StoredLeaderboard {
            entries: self.entries.clone(),
        };
        let value = match serde_json::to_value(&stored) {
            Ok(v) => v,
            Err(e) => {
                warn!("failed to serialize leaderboard {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&key, value).await {
            warn!("failed to persist leaderboard {}: {}", key, e);
        }
    }

    /// 1-indexed rank, or None if the player is not on the board.
    pub fn get_player_rank(&self, player_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.player_id == player_id)
            .map(|i| i + 1)
    }

    pub fn get_player_time(&self, player_id: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.player_id == player_id)
            .map(|e| e.time_ms)
    }

    /// The display slice shown on the results board.
    pub fn top10(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.entries.len().min(TOP_DISPLAY)]
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }
}
