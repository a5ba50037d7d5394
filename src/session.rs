//! GameSession – the composition root that wires every subsystem into one
//! tick-driven round loop.
//!
//! ## Ownership
//!
//! | Subsystem            | Owned as                | Drives                     |
//! |----------------------|-------------------------|----------------------------|
//! | [`RoundStateMachine`]| `state`                 | round lifecycle            |
//! | [`CheckpointTracker`]| `checkpoints`           | trigger volumes, respawns  |
//! | [`TimerTracker`]     | `timers`                | per-player run clocks      |
//! | [`GhostRecorder`]    | `ghosts`                | PB recording + replays     |
//! | [`ModifierEngine`]   | `modifiers`             | round modifier + abilities |
//! | [`PersistenceStore`] | `persistence`           | durable progression        |
//! | [`LeaderboardStore`] | `leaderboard`           | course best times          |
//! | [`CourseRotation`]   | `rotation`              | course cycling             |
//!
//! The session keeps its own millisecond clock, accumulated from tick
//! deltas, and hands it to every time-sensitive subsystem. Nothing in here
//! reads wall-clock time, which keeps round flows replayable in tests.
//!
//! The host engine calls [`GameSession::tick`] once per server tick and
//! [`GameSession::observe_player`] once per tracked player per tick with
//! that player's current pose and ability input. Side effects on the world
//! (gravity, lights, teleports, impulses) go out through [`WorldHooks`].

use crate::checkpoint::CheckpointTracker;
use crate::cosmetics::CosmeticCatalog;
use crate::course::{CourseRotation, ModifierMode};
use crate::events::{
    GhostFrameEvent, PlayerSnapshot, PodiumEntry, SessionEvent, TickEvents, XpAwardEvent,
};
use crate::ghost::GhostRecorder;
use crate::leaderboard::LeaderboardStore;
use crate::modifier::{AbilityInput, ModifierEngine, WorldHooks};
use crate::persistence::PersistenceStore;
use crate::progression::{ProgressionCalculator, RoundResult};
use crate::state::{GameState, RoundStateMachine, Transition};
use crate::storage::DurableStorage;
use crate::timer::{format_time, TimerTracker};
use crate::types::{GameConfig, Quat, Vec3};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Per-player session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PlayerEntry {
    username: String,
    /// Finish time for the current round, if the player has finished.
    finish_time_ms: Option<u64>,
    new_pb: bool,
}

/// Work scheduled against the session clock (currently only delayed
/// respawn teleports).
#[derive(Debug, Clone)]
struct DeferredRespawn {
    due_ms: u64,
    player_id: String,
}

/// Point-in-time values a client HUD renders every frame.
#[derive(Debug, Clone)]
pub struct HudSnapshot {
    pub state: GameState,
    /// Seconds remaining on the current state's timer.
    pub state_timer_sec: u32,
    pub modifier_label: String,
    /// Live run clock, 0 before the start pad is crossed.
    pub elapsed_ms: u64,
    pub next_checkpoint: usize,
    pub total_checkpoints: usize,
    pub respawns: u32,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct GameSession {
    config: GameConfig,
    state: RoundStateMachine,
    checkpoints: CheckpointTracker,
    timers: TimerTracker,
    ghosts: GhostRecorder,
    modifiers: ModifierEngine,
    progression: ProgressionCalculator,
    persistence: PersistenceStore,
    leaderboard: LeaderboardStore,
    rotation: CourseRotation,
    cosmetics: CosmeticCatalog,
    players: HashMap<String, PlayerEntry>,
    deferred: Vec<DeferredRespawn>,
    events: Vec<SessionEvent>,
    clock_ms: u64,
    tick_count: u64,
}

impl GameSession {
    pub fn new(
        config: GameConfig,
        rotation: CourseRotation,
        cosmetics: CosmeticCatalog,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let course = rotation.active().clone();
        let checkpoints = CheckpointTracker::new(course.clone(), config.spawn_y_offset);
        let persistence = PersistenceStore::new(
            Arc::clone(&storage),
            course.id.clone(),
            config.xp_per_level,
            config.coins_per_level_up,
        );
        let leaderboard = LeaderboardStore::new(storage, course.id.clone());

        Self {
            state: RoundStateMachine::new(&config),
            checkpoints,
            timers: TimerTracker::new(),
            ghosts: GhostRecorder::new(config.ghost),
            modifiers: ModifierEngine::with_defaults(config.physics, config.abilities),
            progression: ProgressionCalculator::new(config.xp),
            persistence,
            leaderboard,
            rotation,
            cosmetics,
            players: HashMap::new(),
            deferred: Vec::new(),
            events: Vec::new(),
            clock_ms: 0,
            tick_count: 0,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state.state()
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn course_id(&self) -> &str {
        &self.checkpoints.course().id
    }

    pub fn cosmetics(&self) -> &CosmeticCatalog {
        &self.cosmetics
    }

    pub fn leaderboard(&self) -> &LeaderboardStore {
        &self.leaderboard
    }

    pub fn progression(&self) -> &PersistenceStore {
        &self.persistence
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn hud_snapshot(&self, player_id: &str) -> HudSnapshot {
        let cp = self.checkpoints.player_state(player_id);
        HudSnapshot {
            state: self.state.state(),
            state_timer_sec: self.state.timer().ceil() as u32,
            modifier_label: self.modifiers.active_label(),
            elapsed_ms: self.timers.elapsed(player_id, self.clock_ms),
            next_checkpoint: cp.map(|s| s.next_checkpoint).unwrap_or(0),
            total_checkpoints: self.checkpoints.total_checkpoints(),
            respawns: cp.map(|s| s.respawns).unwrap_or(0),
        }
    }

    // -----------------------------------------------------------------------
    // Join / leave
    // -----------------------------------------------------------------------

    /// Register a player and hand back a hydration snapshot built from their
    /// durable record. Joining mid-round drops the player into the lobby as
    /// a spectator of sorts – they receive the active modifier's movement
    /// effects but cannot start a run until the next round.
    pub async fn player_joined(
        &mut self,
        player_id: &str,
        username: &str,
        hooks: &mut dyn WorldHooks,
    ) -> PlayerSnapshot {
        info!("player {} ({}) joined", player_id, username);
        self.players.insert(
            player_id.to_string(),
            PlayerEntry {
                username: username.to_string(),
                finish_time_ms: None,
                new_pb: false,
            },
        );
        self.checkpoints.reset_player(player_id);

        let record = self.persistence.load(player_id).await;
        hooks.teleport(player_id, self.checkpoints.course().lobby_spawn);

        if let Some(t) = self.state.player_joined(player_id) {
            self.handle_transition(t, hooks).await;
        }
        if self.state.state() == GameState::RoundActive {
            self.modifiers.apply_to_player(hooks, player_id);
        }

        PlayerSnapshot {
            player_id: player_id.to_string(),
            username: username.to_string(),
            xp: record.xp,
            level: record.level,
            coins: record.coins,
            wins: record.wins,
            podiums: record.podiums,
            best_time_ms: record.best_time_ms,
            best_time_formatted: record.best_time_ms.map(format_time),
            owned_cosmetics: record.owned_cosmetics,
            equipped_trail_id: record.equipped_trail_id,
            equipped_finish_effect_id: record.equipped_finish_effect_id,
            course_id: self.checkpoints.course().id.clone(),
            state: self.state.state(),
        }
    }

    /// Flush and evict a departing player from every subsystem.
    pub async fn player_left(&mut self, player_id: &str, hooks: &mut dyn WorldHooks) {
        info!("player {} left", player_id);
        self.persistence.flush(player_id).await;
        self.persistence.remove_player(player_id);
        self.timers.remove_player(player_id);
        self.checkpoints.remove_player(player_id);
        self.ghosts.cancel_recording(player_id);
        self.ghosts.despawn_replay(player_id);
        self.modifiers.remove_player(player_id);
        self.deferred.retain(|d| d.player_id != player_id);
        self.players.remove(player_id);

        if let Some(t) = self.state.player_left(player_id) {
            self.handle_transition(t, hooks).await;
        }
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance the session by one tick.
    ///
    /// Returns [`TickEvents`] describing everything that happened so the
    /// host can broadcast the corresponding messages.
    pub async fn tick(&mut self, delta_sec: f32, hooks: &mut dyn WorldHooks) -> TickEvents {
        self.tick_count += 1;
        self.clock_ms += (delta_sec * 1000.0).round() as u64;

        self.run_deferred(hooks);

        if let Some(t) = self.state.tick(delta_sec) {
            self.handle_transition(t, hooks).await;
        }

        let ghost_frames = self
            .ghosts
            .tick_replays(self.clock_ms)
            .into_iter()
            .map(|f| GhostFrameEvent {
                player_id: f.player,
                position: f.position,
                orientation: f.orientation,
            })
            .collect();

        TickEvents {
            tick: self.tick_count,
            state: self.state.state(),
            state_timer: self.state.timer().ceil() as u32,
            events: std::mem::take(&mut self.events),
            ghost_frames,
        }
    }

    /// Feed one player's current pose and ability input through every
    /// per-player check. Call once per tracked player per tick; outside
    /// `RoundActive` this is a no-op.
    pub async fn observe_player(
        &mut self,
        player_id: &str,
        position: Vec3,
        orientation: Quat,
        input: AbilityInput,
        hooks: &mut dyn WorldHooks,
    ) {
        if self.state.state() != GameState::RoundActive {
            return;
        }
        if !self.players.contains_key(player_id) {
            return;
        }
        let finished = self
            .checkpoints
            .player_state(player_id)
            .map(|s| s.finished)
            .unwrap_or(false);
        if finished {
            return;
        }

        self.ghosts
            .record_sample(player_id, position, orientation, self.clock_ms);

        // Gate checks run in sequence every tick, so one observation can
        // carry a player through several gates at once (start pad stacked on
        // the first checkpoint, final checkpoint inside the finish gate).
        // Each check no-ops internally when its precondition doesn't hold.
        if self.checkpoints.check_start_pad(player_id, position) {
            self.timers.start(player_id, self.clock_ms);
            self.ghosts.start_recording(player_id, self.clock_ms);
            self.events.push(SessionEvent::RunStarted {
                player_id: player_id.to_string(),
            });
        }

        if let Some(index) = self.checkpoints.check_checkpoints(player_id, position) {
            self.events.push(SessionEvent::CheckpointReached {
                player_id: player_id.to_string(),
                index,
            });
        }

        if let Some(respawns) = self.checkpoints.check_finish(player_id, position) {
            self.finish_run(player_id, respawns, hooks).await;
            return;
        }

        if self.checkpoints.check_out_of_bounds(player_id, position) {
            let respawns = self
                .checkpoints
                .player_state(player_id)
                .map(|s| s.respawns)
                .unwrap_or(0);
            self.events.push(SessionEvent::Respawned {
                player_id: player_id.to_string(),
                respawns,
            });
            self.deferred.push(DeferredRespawn {
                due_ms: self.clock_ms + self.config.respawn_delay_ms,
                player_id: player_id.to_string(),
            });
        }

        if self
            .modifiers
            .tick_ability(player_id, &input, self.clock_ms, hooks)
        {
            if let Some(active) = self.modifiers.active() {
                self.events.push(SessionEvent::AbilityFired {
                    player_id: player_id.to_string(),
                    modifier_id: active.id.clone(),
                });
            }
        }
    }

    async fn finish_run(&mut self, player_id: &str, respawns: u32, hooks: &mut dyn WorldHooks) {
        let time_ms = self.timers.stop(player_id, self.clock_ms);
        let recording = self.ghosts.stop_recording(player_id, self.clock_ms);

        let new_pb = self
            .persistence
            .update_best_time(player_id, time_ms, respawns)
            .await;
        if new_pb {
            if let Some(recording) = recording {
                self.persistence.save_ghost(player_id, recording).await;
            }
        }

        let username = self
            .players
            .get(player_id)
            .map(|p| p.username.clone())
            .unwrap_or_default();
        let rank = self.leaderboard.submit(player_id, &username, time_ms).await;

        if let Some(entry) = self.players.get_mut(player_id) {
            entry.finish_time_ms = Some(time_ms);
            entry.new_pb = new_pb;
        }
        self.events.push(SessionEvent::RunFinished {
            player_id: player_id.to_string(),
            time_ms,
            respawns,
            new_pb,
            rank,
        });
        debug!("player {} finished in {} ms (rank {:?})", player_id, time_ms, rank);

        // Everyone done: skip the rest of the round clock.
        if self.players.values().all(|p| p.finish_time_ms.is_some()) {
            if let Some(t) = self.state.force_results() {
                self.handle_transition(t, hooks).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Deferred work
    // -----------------------------------------------------------------------

    fn run_deferred(&mut self, hooks: &mut dyn WorldHooks) {
        if self.deferred.is_empty() {
            return;
        }
        let clock = self.clock_ms;
        let due: Vec<DeferredRespawn> = {
            let (due, pending): (Vec<DeferredRespawn>, Vec<DeferredRespawn>) = self
                .deferred
                .drain(..)
                .partition(|d| d.due_ms <= clock);
            self.deferred = pending;
            due
        };
        for task in due {
            // A round reset between scheduling and firing clears the queue,
            // so a due task always targets the current round's checkpoints.
            let pos = self.checkpoints.respawn_position(&task.player_id);
            hooks.teleport(&task.player_id, pos);
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    async fn handle_transition(&mut self, t: Transition, hooks: &mut dyn WorldHooks) {
        self.events.push(SessionEvent::StateChanged {
            prev: t.prev,
            next: t.next,
        });

        match t.next {
            GameState::LobbyIdle => self.enter_lobby(hooks).await,
            GameState::LobbyCountdown => {}
            GameState::RoundStarting => self.enter_round_starting(hooks),
            GameState::RoundActive => self.enter_round_active(hooks),
            GameState::RoundResults => self.enter_round_results(hooks).await,
        }
    }

    /// Full reset: revert world effects, clear every per-round structure,
    /// rotate to the next course, and reload course-scoped stores.
    async fn enter_lobby(&mut self, hooks: &mut dyn WorldHooks) {
        let ids: Vec<String> = self.players.keys().cloned().collect();

        self.modifiers.reset(hooks, &ids);
        self.deferred.clear();
        self.timers.reset_all();
        self.ghosts.cancel_all_recordings();
        self.ghosts.despawn_all_replays();

        let course = self.rotation.advance().clone();
        info!("rotating to course {} ({})", course.id, course.name);
        self.checkpoints.set_course(course.clone());
        self.persistence.set_course_id(&course.id);
        self.leaderboard.set_course_id(&course.id);
        self.leaderboard.load().await;
        for id in &ids {
            self.persistence.load(id).await;
        }

        for (id, entry) in self.players.iter_mut() {
            entry.finish_time_ms = None;
            entry.new_pb = false;
            hooks.teleport(id, course.lobby_spawn);
        }
        self.checkpoints.reset_all();
    }

    /// Freeze phase: pick the round modifier, stage everyone on the start
    /// pad, and spawn personal-best ghost replays.
    fn enter_round_starting(&mut self, hooks: &mut dyn WorldHooks) {
        let course = self.checkpoints.course().clone();

        let def = match (&course.modifier_mode, &course.fixed_modifier_id) {
            (ModifierMode::Fixed, Some(id)) => self.modifiers.select_fixed(id),
            _ => self.modifiers.select_random(),
        };
        self.events.push(SessionEvent::ModifierSelected {
            id: def.id,
            label: def.label,
        });

        self.timers.reset_all();
        self.checkpoints.reset_all();
        let spawn = Vec3::new(
            course.start_pad_position.x,
            course.start_pad_position.y + self.config.spawn_y_offset,
            course.start_pad_position.z,
        );
        let ids: Vec<String> = self.players.keys().cloned().collect();
        for id in &ids {
            self.checkpoints.reset_player(id);
            self.players
                .entry(id.clone())
                .and_modify(|e| {
                    e.finish_time_ms = None;
                    e.new_pb = false;
                });
            hooks.teleport(id, spawn);
        }

        for id in ids {
            let ghost = self.persistence.get(&id).and_then(|r| r.ghost.clone());
            if let Some(ghost) = ghost {
                self.ghosts.spawn_replay(&id, ghost, self.clock_ms);
            }
        }
    }

    fn enter_round_active(&mut self, hooks: &mut dyn WorldHooks) {
        let ids: Vec<String> = self.players.keys().cloned().collect();
        self.modifiers.apply(hooks, &ids);
    }

    /// Close out the round: rank finishers, persist wins/podiums, award XP,
    /// and publish the results payload.
    async fn enter_round_results(&mut self, _hooks: &mut dyn WorldHooks) {
        // Anyone still mid-run is a DNF; their partial recording and running
        // timer are discarded rather than left dangling.
        let dnf_ids: Vec<String> = self
            .players
            .iter()
            .filter(|(_, e)| e.finish_time_ms.is_none())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dnf_ids {
            self.ghosts.cancel_recording(id);
            self.timers.remove_player(id);
        }
        self.ghosts.despawn_all_replays();

        let mut finishers: Vec<(String, u64)> = self
            .players
            .iter()
            .filter_map(|(id, e)| e.finish_time_ms.map(|t| (id.clone(), t)))
            .collect();
        finishers.sort_by_key(|(_, t)| *t);

        let placement_of = |id: &str| -> usize {
            finishers
                .iter()
                .position(|(f, _)| f == id)
                .map(|i| i + 1)
                .unwrap_or(0)
        };

        let results: Vec<RoundResult> = self
            .players
            .iter()
            .map(|(id, e)| RoundResult {
                player: id.clone(),
                finished: e.finish_time_ms.is_some(),
                time_ms: e.finish_time_ms,
                new_pb: e.new_pb,
                placement: placement_of(id),
            })
            .collect();

        for (i, (id, _)) in finishers.iter().enumerate() {
            if i == 0 {
                self.persistence.add_win(id).await;
            }
            if i < 3 {
                self.persistence.add_podium(id).await;
            }
        }

        let awards = self
            .progression
            .award_round(&results, &mut self.persistence)
            .await;

        let podium: Vec<PodiumEntry> = finishers
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, (id, t))| PodiumEntry {
                player_id: id.clone(),
                username: self
                    .players
                    .get(id)
                    .map(|p| p.username.clone())
                    .unwrap_or_default(),
                placement: (i + 1) as u32,
                time_ms: *t,
                time_formatted: format_time(*t),
            })
            .collect();

        self.events.push(SessionEvent::RoundResults {
            podium,
            awards: awards
                .into_iter()
                .map(|a| XpAwardEvent {
                    player_id: a.player,
                    amount: a.amount,
                    reasons: a.reasons,
                    new_level: a.new_level,
                    leveled: a.leveled,
                    coins_awarded: a.coins_awarded,
                })
                .collect(),
        });
    }

    // -----------------------------------------------------------------------
    // Store passthroughs (shop / cosmetics)
    // -----------------------------------------------------------------------

    /// Purchase a catalog cosmetic for a player. Unknown ids fail.
    pub async fn buy_cosmetic(&mut self, player_id: &str, cosmetic_id: &str) -> bool {
        let Some(def) = self.cosmetics.get(cosmetic_id) else {
            return false;
        };
        let price = def.price;
        self.persistence
            .buy_cosmetic(player_id, cosmetic_id, price)
            .await
    }

    /// Equip an owned cosmetic into its kind's slot.
    pub async fn equip_cosmetic(&mut self, player_id: &str, cosmetic_id: &str) -> bool {
        let Some(def) = self.cosmetics.get(cosmetic_id) else {
            return false;
        };
        let def = def.clone();
        self.persistence.equip_cosmetic(player_id, &def).await
    }
}
