//! Session event payloads.
//!
//! This module owns **every message the session emits to its consumers**
//! (HUD overlays, chat announcers, spectator feeds…). A consumer drains the
//! [`TickEvents`] returned by each `GameSession::tick` call and renders or
//! broadcasts as it sees fit.
//!
//! ## Design rules
//!
//! 1. Every type is `Serialize + Deserialize` with snake_case JSON.
//! 2. No internal handles leak out — players are referenced by id string.
//! 3. Times cross the boundary in milliseconds; display formatting is the
//!    consumer's job ([`crate::timer::format_time`] helps).

use crate::state::GameState;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One discrete thing that happened during a tick or player observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The round state machine moved to a new state.
    StateChanged { prev: GameState, next: GameState },
    /// A player crossed the start pad and their run clock began.
    RunStarted { player_id: String },
    /// A player reached checkpoint `index` (0-based).
    CheckpointReached { player_id: String, index: usize },
    /// A player crossed the finish gate.
    RunFinished {
        player_id: String,
        time_ms: u64,
        respawns: u32,
        new_pb: bool,
        /// 1-indexed leaderboard rank, if the time made the board.
        rank: Option<usize>,
    },
    /// A player fell out of bounds and was returned to their last checkpoint.
    Respawned { player_id: String, respawns: u32 },
    /// The round modifier was chosen for the starting round.
    ModifierSelected { id: String, label: String },
    /// A player fired their modifier-granted ability.
    AbilityFired { player_id: String, modifier_id: String },
    /// End-of-round summary: podium order and per-player XP awards.
    RoundResults {
        podium: Vec<PodiumEntry>,
        awards: Vec<XpAwardEvent>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PodiumEntry {
    pub player_id: String,
    pub username: String,
    /// 1-indexed placement among finishers.
    pub placement: u32,
    pub time_ms: u64,
    /// `MM:SS.CC` rendering of `time_ms` for direct display.
    pub time_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XpAwardEvent {
    pub player_id: String,
    pub amount: u64,
    pub reasons: Vec<String>,
    pub new_level: u64,
    pub leveled: bool,
    pub coins_awarded: u64,
}

// ---------------------------------------------------------------------------
// Ghost frames
// ---------------------------------------------------------------------------

/// One replay entity's pose for this tick. Emitted separately from
/// [`SessionEvent`] because frames are high-rate positional data, not
/// discrete happenings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostFrameEvent {
    pub player_id: String,
    pub position: crate::types::Vec3,
    pub orientation: crate::types::Quat,
}

// ---------------------------------------------------------------------------
// Tick result
// ---------------------------------------------------------------------------

/// Everything produced by a single `GameSession::tick` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickEvents {
    /// The tick counter that produced this set of events.
    pub tick: u64,
    /// The round state after this tick.
    pub state: GameState,
    /// Seconds remaining on the current state's timer.
    pub state_timer: u32,
    /// Discrete events since the previous tick, in occurrence order.
    pub events: Vec<SessionEvent>,
    /// Ghost replay poses for this tick.
    pub ghost_frames: Vec<GhostFrameEvent>,
}

// ---------------------------------------------------------------------------
// Join snapshot
// ---------------------------------------------------------------------------

/// Full per-player state handed back when a player joins, so the client HUD
/// can hydrate before any incremental events arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub username: String,
    pub xp: u64,
    pub level: u64,
    pub coins: u64,
    pub wins: u64,
    pub podiums: u64,
    pub best_time_ms: Option<u64>,
    /// `MM:SS.CC` rendering of the best time, if one exists.
    pub best_time_formatted: Option<String>,
    pub owned_cosmetics: Vec<String>,
    pub equipped_trail_id: Option<String>,
    pub equipped_finish_effect_id: Option<String>,
    /// The course currently in rotation.
    pub course_id: String,
    pub state: GameState,
}
