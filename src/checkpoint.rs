//! Checkpoint progression: start pad, ordered checkpoints, finish gate, and
//! out-of-bounds recovery.
//!
//! All trigger checks use a strict squared-distance comparison – a position
//! exactly on the radius boundary does not trigger. Per tick the session runs
//! the checks in a fixed order (start → checkpoint → finish → bounds), so one
//! tick can legitimately carry a player through several gates.

use crate::course::CourseDefinition;
use crate::types::Vec3;
use log::debug;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Per-player state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlayerCheckpointState {
    /// Index of the next checkpoint to reach (0..=N; N = all cleared).
    pub next_checkpoint: usize,
    /// Has the player crossed the start pad this round?
    pub started: bool,
    pub finished: bool,
    /// Out-of-bounds respawns this run.
    pub respawns: u32,
    /// Where the player respawns: last checkpoint (or start pad) raised by
    /// the spawn offset.
    pub respawn_position: Vec3,
}

pub type StartFn = Box<dyn FnMut(&str) + Send>;
pub type CheckpointFn = Box<dyn FnMut(&str, usize) + Send>;
pub type FinishFn = Box<dyn FnMut(&str, u32) + Send>;
pub type RespawnFn = Box<dyn FnMut(&str, u32) + Send>;

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct CheckpointTracker {
    course: CourseDefinition,
    spawn_y_offset: f32,
    players: HashMap<String, PlayerCheckpointState>,
    on_start: Vec<StartFn>,
    on_checkpoint: Vec<CheckpointFn>,
    on_finish: Vec<FinishFn>,
    on_respawn: Vec<RespawnFn>,
}

impl CheckpointTracker {
    pub fn new(course: CourseDefinition, spawn_y_offset: f32) -> Self {
        Self {
            course,
            spawn_y_offset,
            players: HashMap::new(),
            on_start: Vec::new(),
            on_checkpoint: Vec::new(),
            on_finish: Vec::new(),
            on_respawn: Vec::new(),
        }
    }

    pub fn course(&self) -> &CourseDefinition {
        &self.course
    }

    pub fn total_checkpoints(&self) -> usize {
        self.course.checkpoint_positions.len()
    }

    /// Swap the active course (between rounds). Existing player state is not
    /// touched; callers reset it separately.
    pub fn set_course(&mut self, course: CourseDefinition) {
        self.course = course;
    }

    // -----------------------------------------------------------------------
    // Listener registration. All registries invoke in registration order;
    // a panicking listener propagates (nothing is swallowed).
    // -----------------------------------------------------------------------

    pub fn on_start(&mut self, cb: impl FnMut(&str) + Send + 'static) {
        self.on_start.push(Box::new(cb));
    }

    pub fn on_checkpoint(&mut self, cb: impl FnMut(&str, usize) + Send + 'static) {
        self.on_checkpoint.push(Box::new(cb));
    }

    pub fn on_finish(&mut self, cb: impl FnMut(&str, u32) + Send + 'static) {
        self.on_finish.push(Box::new(cb));
    }

    pub fn on_respawn(&mut self, cb: impl FnMut(&str, u32) + Send + 'static) {
        self.on_respawn.push(Box::new(cb));
    }

    // -----------------------------------------------------------------------
    // Player lifecycle
    // -----------------------------------------------------------------------

    /// Initialise fresh round state for a player.
    pub fn reset_player(&mut self, id: &str) {
        let spawn = self.raised(self.course.start_pad_position);
        self.players.insert(
            id.to_string(),
            PlayerCheckpointState {
                next_checkpoint: 0,
                started: false,
                finished: false,
                respawns: 0,
                respawn_position: spawn,
            },
        );
    }

    pub fn remove_player(&mut self, id: &str) {
        self.players.remove(id);
    }

    pub fn player_state(&self, id: &str) -> Option<&PlayerCheckpointState> {
        self.players.get(id)
    }

    /// Discard all player state (between rounds).
    pub fn reset_all(&mut self) {
        self.players.clear();
    }

    // -----------------------------------------------------------------------
    // Trigger checks
    // -----------------------------------------------------------------------

    /// Start-pad check; no-op unless the player is tracked and not yet
    /// started. Returns whether the run started this call.
    pub fn check_start_pad(&mut self, id: &str, pos: Vec3) -> bool {
        let Some(data) = self.players.get_mut(id) else {
            return false;
        };
        if data.started {
            return false;
        }

        if is_near(pos, self.course.start_pad_position, self.course.start_trigger_radius) {
            data.started = true;
            debug!("{} crossed start pad", id);
            for cb in &mut self.on_start {
                cb(id);
            }
            true
        } else {
            false
        }
    }

    /// Next-checkpoint check; advances by exactly one on trigger and returns
    /// the 0-indexed checkpoint just reached. Positions of later checkpoints
    /// never advance the index.
    pub fn check_checkpoints(&mut self, id: &str, pos: Vec3) -> Option<usize> {
        let course = &self.course;
        let data = self.players.get_mut(id)?;
        if !data.started || data.finished {
            return None;
        }

        let idx = data.next_checkpoint;
        let cp = *course.checkpoint_positions.get(idx)?;
        if !is_near(pos, cp, course.checkpoint_trigger_radius) {
            return None;
        }

        data.next_checkpoint = idx + 1;
        data.respawn_position = Vec3::new(cp.x, cp.y + self.spawn_y_offset, cp.z);
        debug!(
            "{} hit checkpoint {}/{}",
            id,
            idx + 1,
            course.checkpoint_positions.len()
        );
        for cb in &mut self.on_checkpoint {
            cb(id, idx);
        }
        Some(idx)
    }

    /// Finish-gate check; only succeeds once every checkpoint is cleared.
    /// Returns the run's accumulated respawn count on trigger.
    pub fn check_finish(&mut self, id: &str, pos: Vec3) -> Option<u32> {
        let course = &self.course;
        let data = self.players.get_mut(id)?;
        if !data.started || data.finished {
            return None;
        }
        if data.next_checkpoint < course.checkpoint_positions.len() {
            return None;
        }

        if !is_near(pos, course.finish_gate_position, course.finish_trigger_radius) {
            return None;
        }

        data.finished = true;
        let respawns = data.respawns;
        debug!("{} finished ({} respawns)", id, respawns);
        for cb in &mut self.on_finish {
            cb(id, respawns);
        }
        Some(respawns)
    }

    /// Out-of-bounds check; independent of started/finished state. Increments
    /// the respawn counter and returns true when below the course threshold.
    pub fn check_out_of_bounds(&mut self, id: &str, pos: Vec3) -> bool {
        let Some(data) = self.players.get_mut(id) else {
            return false;
        };

        if pos.y < self.course.out_of_bounds_y {
            data.respawns += 1;
            let respawns = data.respawns;
            debug!("{} fell out of bounds, respawn #{}", id, respawns);
            for cb in &mut self.on_respawn {
                cb(id, respawns);
            }
            true
        } else {
            false
        }
    }

    /// Where to put a player back after falling. Unknown players fall back to
    /// the raised start-pad position.
    pub fn respawn_position(&self, id: &str) -> Vec3 {
        self.players
            .get(id)
            .map(|d| d.respawn_position)
            .unwrap_or_else(|| self.raised(self.course.start_pad_position))
    }

    fn raised(&self, pos: Vec3) -> Vec3 {
        Vec3::new(pos.x, pos.y + self.spawn_y_offset, pos.z)
    }
}

/// Strict proximity test: true iff the squared distance is strictly below
/// `radius²`.
pub fn is_near(pos: Vec3, target: Vec3, radius: f32) -> bool {
    pos.distance_squared(&target) < radius * radius
}
