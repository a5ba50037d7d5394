//! Per-player durable progression, scoped by the active course.
//!
//! Operations follow a read-mutate-flush pattern over an in-memory cache.
//! Flushes are full-record overwrites; a failed write is logged and the
//! cache stays authoritative until the next successful flush (§ eventual
//! consistency – this is a progression system, not a ledger). Mutators on
//! unknown/uncached players are no-ops returning a neutral result.

use crate::cosmetics::{CosmeticDef, CosmeticKind};
use crate::ghost::GhostRecording;
use crate::storage::{player_key, DurableStorage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Durable per-player record. Every field has a serde default so partial
/// stored blobs merge field-by-field over defaults on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgressionRecord {
    pub xp: u64,
    /// Derived from xp; recomputed on load and on every xp change, never
    /// trusted from storage.
    pub level: u64,
    pub wins: u64,
    pub podiums: u64,
    pub best_time_ms: Option<u64>,
    pub best_respawns: Option<u32>,
    pub ghost: Option<GhostRecording>,
    pub coins: u64,
    pub owned_cosmetics: Vec<String>,
    pub equipped_trail_id: Option<String>,
    pub equipped_finish_effect_id: Option<String>,
}

/// Outcome of an [`PersistenceStore::add_xp`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XpGain {
    pub new_level: u64,
    pub leveled: bool,
    pub coins_awarded: u64,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct PersistenceStore {
    storage: Arc<dyn DurableStorage>,
    cache: HashMap<String, PlayerProgressionRecord>,
    course_id: String,
    xp_per_level: u64,
    coins_per_level_up: u64,
}

impl PersistenceStore {
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        course_id: impl Into<String>,
        xp_per_level: u64,
        coins_per_level_up: u64,
    ) -> Self {
        Self {
            storage,
            cache: HashMap::new(),
            course_id: course_id.into(),
            xp_per_level: xp_per_level.max(1),
            coins_per_level_up,
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    /// Point subsequent loads/saves at a different course namespace. Cached
    /// records belong to the old course and are dropped; callers reload the
    /// players they still track.
    pub fn set_course_id(&mut self, id: impl Into<String>) {
        self.course_id = id.into();
        self.cache.clear();
    }

    fn level_for(&self, xp: u64) -> u64 {
        xp / self.xp_per_level
    }

    // -----------------------------------------------------------------------
    // Load / save
    // -----------------------------------------------------------------------

    /// Load a player's record for the active course, merging the stored blob
    /// over defaults. An unreadable blob is replaced wholesale by defaults.
    pub async fn load(&mut self, player: &str) -> PlayerProgressionRecord {
        let key = player_key(&self.course_id, player);
        let mut record = match self.storage.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<PlayerProgressionRecord>(value) {
                Ok(r) => r,
                Err(e) => {
                    warn!("malformed progression record at {}: {} – using defaults", key, e);
                    PlayerProgressionRecord::default()
                }
            },
            Ok(None) => PlayerProgressionRecord::default(),
            Err(e) => {
                warn!("failed to load progression record {}: {}", key, e);
                PlayerProgressionRecord::default()
            }
        };

        record.level = self.level_for(record.xp);
        debug!("loaded progression for {} on {}", player, self.course_id);
        self.cache.insert(player.to_string(), record.clone());
        record
    }

    pub fn get(&self, player: &str) -> Option<&PlayerProgressionRecord> {
        self.cache.get(player)
    }

    /// Evict a player from the cache (their durable copy survives).
    pub fn remove_player(&mut self, player: &str) {
        self.cache.remove(player);
    }

    /// Write a player's cached record to durable storage. Failures are
    /// logged; the next flush retries the full current state.
    pub async fn flush(&self, player: &str) {
        let Some(record) = self.cache.get(player) else {
            return;
        };
        let key = player_key(&self.course_id, player);
        let value = match serde_json::to_value(record) {
            Ok(v) => v,
            Err(e) => {
                warn!("failed to serialize progression record {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&key, value).await {
            warn!("failed to persist progression record {}: {}", key, e);
        }
    }

    // -----------------------------------------------------------------------
    // Mutators (read-mutate-flush)
    // -----------------------------------------------------------------------

    /// Add XP, recompute level, and award `levels_gained × coins_per_level`
    /// coins on level-up.
    pub async fn add_xp(&mut self, player: &str, amount: u64) -> XpGain {
        let Some(record) = self.cache.get_mut(player) else {
            return XpGain::default();
        };

        let old_level = record.level;
        record.xp += amount;
        record.level = record.xp / self.xp_per_level;

        let leveled = record.level > old_level;
        let coins_awarded = if leveled {
            (record.level - old_level) * self.coins_per_level_up
        } else {
            0
        };
        record.coins += coins_awarded;
        let new_level = record.level;

        self.flush(player).await;
        XpGain {
            new_level,
            leveled,
            coins_awarded,
        }
    }

    /// Replace the best time/respawns if this run beat the prior best (or no
    /// prior best exists). Returns whether it was an improvement.
    pub async fn update_best_time(&mut self, player: &str, time_ms: u64, respawns: u32) -> bool {
        let Some(record) = self.cache.get_mut(player) else {
            return false;
        };
        let improved = record.best_time_ms.map_or(true, |best| time_ms < best);
        if !improved {
            return false;
        }
        record.best_time_ms = Some(time_ms);
        record.best_respawns = Some(respawns);
        self.flush(player).await;
        true
    }

    pub async fn save_ghost(&mut self, player: &str, ghost: GhostRecording) {
        let Some(record) = self.cache.get_mut(player) else {
            return;
        };
        record.ghost = Some(ghost);
        self.flush(player).await;
    }

    pub async fn add_win(&mut self, player: &str) {
        let Some(record) = self.cache.get_mut(player) else {
            return;
        };
        record.wins += 1;
        self.flush(player).await;
    }

    pub async fn add_podium(&mut self, player: &str) {
        let Some(record) = self.cache.get_mut(player) else {
            return;
        };
        record.podiums += 1;
        self.flush(player).await;
    }

    /// Purchase a cosmetic: fails on insufficient coins or duplicate
    /// ownership, otherwise deducts the price and records ownership.
    pub async fn buy_cosmetic(&mut self, player: &str, cosmetic_id: &str, price: u64) -> bool {
        let Some(record) = self.cache.get_mut(player) else {
            return false;
        };
        if record.coins < price || record.owned_cosmetics.iter().any(|c| c == cosmetic_id) {
            return false;
        }
        record.coins -= price;
        record.owned_cosmetics.push(cosmetic_id.to_string());
        self.flush(player).await;
        true
    }

    /// Equip an owned cosmetic into the slot matching its kind.
    pub async fn equip_cosmetic(&mut self, player: &str, cosmetic: &CosmeticDef) -> bool {
        let Some(record) = self.cache.get_mut(player) else {
            return false;
        };
        if !record.owned_cosmetics.iter().any(|c| *c == cosmetic.id) {
            return false;
        }
        match cosmetic.kind {
            CosmeticKind::Trail => record.equipped_trail_id = Some(cosmetic.id.clone()),
            CosmeticKind::FinishEffect => {
                record.equipped_finish_effect_id = Some(cosmetic.id.clone())
            }
        }
        self.flush(player).await;
        true
    }
}
