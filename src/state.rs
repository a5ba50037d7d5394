//! Round state machine.
//!
//! States cycle `LOBBY_IDLE → LOBBY_COUNTDOWN → ROUND_STARTING → ROUND_ACTIVE
//! → ROUND_RESULTS → LOBBY_IDLE`. Every state except `LOBBY_IDLE` carries a
//! countdown timer in seconds; `tick` decrements it (clamped at zero) and
//! fires at most one transition per call.

use crate::types::GameConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    LobbyIdle,
    LobbyCountdown,
    RoundStarting,
    RoundActive,
    RoundResults,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameState::LobbyIdle => "LOBBY_IDLE",
            GameState::LobbyCountdown => "LOBBY_COUNTDOWN",
            GameState::RoundStarting => "ROUND_STARTING",
            GameState::RoundActive => "ROUND_ACTIVE",
            GameState::RoundResults => "ROUND_RESULTS",
        };
        f.write_str(s)
    }
}

/// A completed state change, handed to the owning session so it can react
/// without re-entering the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub prev: GameState,
    pub next: GameState,
}

pub type StateChangeFn = Box<dyn FnMut(GameState, GameState) + Send>;

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct RoundStateMachine {
    state: GameState,
    /// Seconds remaining in the current timed state (0 in `LOBBY_IDLE`).
    timer: f32,
    members: HashSet<String>,
    listeners: Vec<StateChangeFn>,
    min_players: usize,
    lobby_countdown_sec: f32,
    starting_freeze_sec: f32,
    round_duration_sec: f32,
    results_duration_sec: f32,
}

impl RoundStateMachine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: GameState::LobbyIdle,
            timer: 0.0,
            members: HashSet::new(),
            listeners: Vec::new(),
            min_players: config.min_players,
            lobby_countdown_sec: config.lobby_countdown_sec,
            starting_freeze_sec: config.starting_freeze_sec,
            round_duration_sec: config.round_duration_sec,
            results_duration_sec: config.results_duration_sec,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Seconds remaining in the current state, never negative.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn members(&self) -> &HashSet<String> {
        &self.members
    }

    /// Register a transition listener. Listeners run synchronously in
    /// registration order with `(prev, next)`; a panicking listener
    /// propagates. Listeners must not call back into this machine.
    pub fn on_state_change(&mut self, cb: impl FnMut(GameState, GameState) + Send + 'static) {
        self.listeners.push(Box::new(cb));
    }

    /// Add a player to the membership set. Starts the lobby countdown when
    /// the minimum is reached while idle.
    pub fn player_joined(&mut self, id: &str) -> Option<Transition> {
        self.members.insert(id.to_string());
        if self.state == GameState::LobbyIdle && self.members.len() >= self.min_players {
            self.timer = self.lobby_countdown_sec;
            return self.transition(GameState::LobbyCountdown);
        }
        None
    }

    /// Remove a player. Cancels the countdown if membership drops below the
    /// minimum before it expires.
    pub fn player_left(&mut self, id: &str) -> Option<Transition> {
        self.members.remove(id);
        if self.state == GameState::LobbyCountdown && self.members.len() < self.min_players {
            self.timer = 0.0;
            return self.transition(GameState::LobbyIdle);
        }
        None
    }

    /// Advance the round clock by `delta_sec`. Fires at most one transition,
    /// evaluated against the post-decrement timer.
    pub fn tick(&mut self, delta_sec: f32) -> Option<Transition> {
        if self.timer > 0.0 {
            self.timer = (self.timer - delta_sec).max(0.0);
        }

        match self.state {
            GameState::LobbyIdle => {
                if self.members.len() >= self.min_players {
                    self.timer = self.lobby_countdown_sec;
                    self.transition(GameState::LobbyCountdown)
                } else {
                    None
                }
            }
            GameState::LobbyCountdown => {
                if self.members.len() < self.min_players {
                    self.timer = 0.0;
                    self.transition(GameState::LobbyIdle)
                } else if self.timer <= 0.0 {
                    self.timer = self.starting_freeze_sec;
                    self.transition(GameState::RoundStarting)
                } else {
                    None
                }
            }
            GameState::RoundStarting => {
                if self.timer <= 0.0 {
                    self.timer = self.round_duration_sec;
                    self.transition(GameState::RoundActive)
                } else {
                    None
                }
            }
            GameState::RoundActive => {
                if self.timer <= 0.0 {
                    self.timer = self.results_duration_sec;
                    self.transition(GameState::RoundResults)
                } else {
                    None
                }
            }
            GameState::RoundResults => {
                if self.timer <= 0.0 {
                    self.timer = 0.0;
                    self.transition(GameState::LobbyIdle)
                } else {
                    None
                }
            }
        }
    }

    /// End the round early (all players finished). No-op unless the current
    /// state is exactly `ROUND_ACTIVE`.
    pub fn force_results(&mut self) -> Option<Transition> {
        if self.state == GameState::RoundActive {
            self.timer = self.results_duration_sec;
            self.transition(GameState::RoundResults)
        } else {
            None
        }
    }

    fn transition(&mut self, next: GameState) -> Option<Transition> {
        let prev = self.state;
        if prev == next {
            return None;
        }
        self.state = next;
        debug!("state {} -> {}", prev, next);
        for cb in &mut self.listeners {
            cb(prev, next);
        }
        Some(Transition { prev, next })
    }
}
