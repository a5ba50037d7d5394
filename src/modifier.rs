//! Round modifiers: weighted selection, apply/revert side effects, and
//! per-tick ability hooks.
//!
//! Effects are a lookup table keyed by modifier id – adding a modifier is a
//! data addition (`register_modifier`), not a new dispatch branch. The table
//! entries drive the out-of-scope physics/rendering layer through the
//! [`WorldHooks`] boundary trait.

use crate::types::{AbilityTuning, PhysicsTuning, Quat, Vec3};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Boundary trait
// ---------------------------------------------------------------------------

/// Side effects the core triggers but does not implement: world physics and
/// presentation knobs owned by the host engine.
pub trait WorldHooks {
    fn set_gravity(&mut self, gravity: Vec3);
    fn set_ambient_light(&mut self, intensity: f32);
    fn set_directional_light(&mut self, intensity: f32);
    fn set_move_speed(&mut self, player: &str, walk: f32, run: f32);
    fn apply_impulse(&mut self, player: &str, impulse: Vec3);
    fn teleport(&mut self, player: &str, position: Vec3);
}

/// Hook implementation that discards everything (headless runs).
#[derive(Debug, Default)]
pub struct NoopWorldHooks;

impl WorldHooks for NoopWorldHooks {
    fn set_gravity(&mut self, _gravity: Vec3) {}
    fn set_ambient_light(&mut self, _intensity: f32) {}
    fn set_directional_light(&mut self, _intensity: f32) {}
    fn set_move_speed(&mut self, _player: &str, _walk: f32, _run: f32) {}
    fn apply_impulse(&mut self, _player: &str, _impulse: Vec3) {}
    fn teleport(&mut self, _player: &str, _position: Vec3) {}
}

// ---------------------------------------------------------------------------
// Catalog types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifierDef {
    pub id: String,
    pub label: String,
    /// Relative selection weight for random draws.
    pub weight: f32,
}

/// Transient per-player ability bookkeeping, cleared every round.
#[derive(Debug, Default)]
pub struct AbilityState {
    /// One-shot flag (e.g. the mid-air jump already used before landing).
    pub used: bool,
    /// Session time the ability last fired, for cooldown-gated abilities.
    pub last_fired_ms: Option<u64>,
    /// Previous tick's key state, for edge detection.
    pub prev_pressed: bool,
}

/// Per-tick input snapshot for the active modifier's ability key (the jump
/// key for double jump, the blink key for blink pads).
#[derive(Debug, Clone, Copy)]
pub struct AbilityInput {
    pub pressed: bool,
    pub grounded: bool,
    pub position: Vec3,
    pub orientation: Quat,
}

pub type EffectFn = Box<dyn Fn(&mut dyn WorldHooks, &[String]) + Send + Sync>;
pub type AbilityFn =
    Box<dyn Fn(&mut AbilityState, &str, &AbilityInput, u64, &mut dyn WorldHooks) -> bool + Send + Sync>;

/// One entry in the effect table.
pub struct ModifierEffect {
    /// One-time round-start side effects.
    pub apply: EffectFn,
    /// Restores this entry's concern to defaults. `reset` runs every
    /// registered revert, so together they restore the whole world.
    pub revert: EffectFn,
    /// Optional per-tick ability hook; returns whether the ability fired.
    pub ability: Option<AbilityFn>,
}

fn noop_effect() -> EffectFn {
    Box::new(|_, _| {})
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ModifierEngine {
    catalog: Vec<ModifierDef>,
    effects: HashMap<String, ModifierEffect>,
    active: Option<ModifierDef>,
    ability_state: HashMap<String, AbilityState>,
}

impl ModifierEngine {
    /// Build an engine over an explicit catalog and effect table. The catalog
    /// must not be empty – selection always returns a modifier.
    pub fn new(catalog: Vec<ModifierDef>, effects: HashMap<String, ModifierEffect>) -> Self {
        assert!(!catalog.is_empty(), "modifier catalog must not be empty");
        Self {
            catalog,
            effects,
            active: None,
            ability_state: HashMap::new(),
        }
    }

    /// The stock engine: the six built-in modifiers wired to effects derived
    /// from the given tuning values.
    pub fn with_defaults(physics: PhysicsTuning, abilities: AbilityTuning) -> Self {
        Self::new(default_catalog(), default_effects(physics, abilities))
    }

    /// Register (or replace) a modifier and its effect in one step.
    pub fn register_modifier(&mut self, def: ModifierDef, effect: ModifierEffect) {
        self.effects.insert(def.id.clone(), effect);
        if let Some(existing) = self.catalog.iter_mut().find(|m| m.id == def.id) {
            *existing = def;
        } else {
            self.catalog.push(def);
        }
    }

    pub fn catalog(&self) -> &[ModifierDef] {
        &self.catalog
    }

    pub fn active(&self) -> Option<&ModifierDef> {
        self.active.as_ref()
    }

    pub fn active_label(&self) -> String {
        self.active
            .as_ref()
            .map(|m| m.label.clone())
            .unwrap_or_else(|| "None".to_string())
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Weighted-random draw: roll in `[0, total_weight)`, walk the catalog
    /// subtracting weights and take the entry where the remainder hits zero.
    /// Falls back to the first entry if rounding exhausts the walk.
    pub fn select_random_with(&mut self, rng: &mut impl Rng) -> ModifierDef {
        let total: f32 = self.catalog.iter().map(|m| m.weight).sum();
        let mut roll = rng.gen::<f32>() * total;
        let mut chosen = None;
        for m in &self.catalog {
            roll -= m.weight;
            if roll <= 0.0 {
                chosen = Some(m.clone());
                break;
            }
        }
        let chosen = chosen.unwrap_or_else(|| self.catalog[0].clone());
        debug!("selected modifier '{}'", chosen.label);
        self.active = Some(chosen.clone());
        chosen
    }

    pub fn select_random(&mut self) -> ModifierDef {
        self.select_random_with(&mut rand::thread_rng())
    }

    /// Select the modifier with the given id; unknown ids fall back to a
    /// random draw so gameplay continues on misconfiguration.
    pub fn select_fixed(&mut self, id: &str) -> ModifierDef {
        match self.catalog.iter().find(|m| m.id == id).cloned() {
            Some(m) => {
                debug!("selected fixed modifier '{}'", m.label);
                self.active = Some(m.clone());
                m
            }
            None => {
                debug!("fixed modifier '{}' not in catalog, selecting random", id);
                self.select_random()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Apply / reset
    // -----------------------------------------------------------------------

    /// Run the active modifier's round-start side effects for the given
    /// players. Clears stale ability state first. Modifiers without a table
    /// entry are inert.
    pub fn apply(&mut self, hooks: &mut dyn WorldHooks, players: &[String]) {
        self.ability_state.clear();
        let Some(active) = &self.active else {
            return;
        };
        match self.effects.get(&active.id) {
            Some(fx) => (fx.apply)(hooks, players),
            None => debug!("no effect registered for modifier '{}'", active.id),
        }
    }

    /// Apply the active modifier's effects to one player joining mid-round.
    pub fn apply_to_player(&mut self, hooks: &mut dyn WorldHooks, player: &str) {
        let Some(active) = &self.active else {
            return;
        };
        if let Some(fx) = self.effects.get(&active.id) {
            let players = [player.to_string()];
            (fx.apply)(hooks, &players);
        }
    }

    /// Unconditionally restore all modifier-affected values to defaults and
    /// clear the selection plus all per-player ability state. Runs every
    /// registered revert, not just the active one, so the restore is total.
    pub fn reset(&mut self, hooks: &mut dyn WorldHooks, players: &[String]) {
        for fx in self.effects.values() {
            (fx.revert)(hooks, players);
        }
        self.active = None;
        self.ability_state.clear();
    }

    // -----------------------------------------------------------------------
    // Per-tick abilities
    // -----------------------------------------------------------------------

    /// Drive the active modifier's ability hook for one player. Returns
    /// whether the ability fired this tick (the hook already applied its
    /// physical effect through `hooks`).
    pub fn tick_ability(
        &mut self,
        player: &str,
        input: &AbilityInput,
        now_ms: u64,
        hooks: &mut dyn WorldHooks,
    ) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        let Some(fx) = self.effects.get(&active.id) else {
            return false;
        };
        let Some(ability) = &fx.ability else {
            return false;
        };
        let state = self.ability_state.entry(player.to_string()).or_default();
        ability(state, player, input, now_ms, hooks)
    }

    pub fn remove_player(&mut self, id: &str) {
        self.ability_state.remove(id);
    }
}

// ---------------------------------------------------------------------------
// Built-in catalog & effects
// ---------------------------------------------------------------------------

pub fn default_catalog() -> Vec<ModifierDef> {
    [
        ("low_gravity", "Low Gravity"),
        ("ice_floor", "Ice Floor"),
        ("speed_boost", "Speed Boost"),
        ("double_jump", "Double Jump"),
        ("blink_pads", "Blink Pads"),
        ("dark_mode", "Dark Mode"),
    ]
    .into_iter()
    .map(|(id, label)| ModifierDef {
        id: id.into(),
        label: label.into(),
        weight: 1.0,
    })
    .collect()
}

/// Effect table for the built-in modifiers, with all magnitudes captured from
/// the supplied tuning values.
pub fn default_effects(
    physics: PhysicsTuning,
    abilities: AbilityTuning,
) -> HashMap<String, ModifierEffect> {
    let mut table = HashMap::new();

    table.insert(
        "low_gravity".to_string(),
        ModifierEffect {
            apply: Box::new(move |hooks, _| hooks.set_gravity(physics.low_gravity)),
            revert: Box::new(move |hooks, _| hooks.set_gravity(physics.default_gravity)),
            ability: None,
        },
    );

    table.insert(
        "ice_floor".to_string(),
        ModifierEffect {
            apply: Box::new(move |hooks, players| {
                for p in players {
                    hooks.set_move_speed(p, physics.ice_walk_speed, physics.ice_run_speed);
                }
            }),
            revert: Box::new(move |hooks, players| {
                for p in players {
                    hooks.set_move_speed(p, physics.default_walk_speed, physics.default_run_speed);
                }
            }),
            ability: None,
        },
    );

    table.insert(
        "speed_boost".to_string(),
        ModifierEffect {
            apply: Box::new(move |hooks, players| {
                let walk = (physics.default_walk_speed * physics.speed_boost_factor).round();
                let run = (physics.default_run_speed * physics.speed_boost_factor).round();
                for p in players {
                    hooks.set_move_speed(p, walk, run);
                }
            }),
            revert: Box::new(move |hooks, players| {
                for p in players {
                    hooks.set_move_speed(p, physics.default_walk_speed, physics.default_run_speed);
                }
            }),
            ability: None,
        },
    );

    table.insert(
        "double_jump".to_string(),
        ModifierEffect {
            apply: noop_effect(),
            revert: noop_effect(),
            ability: Some(Box::new(move |state, player, input, _now, hooks| {
                let edge = input.pressed && !state.prev_pressed;
                state.prev_pressed = input.pressed;

                // Landing re-arms the second jump.
                if input.grounded {
                    state.used = false;
                    return false;
                }
                if edge && !state.used {
                    state.used = true;
                    hooks.apply_impulse(
                        player,
                        Vec3::new(0.0, abilities.double_jump_impulse, 0.0),
                    );
                    return true;
                }
                false
            })),
        },
    );

    table.insert(
        "blink_pads".to_string(),
        ModifierEffect {
            apply: noop_effect(),
            revert: noop_effect(),
            ability: Some(Box::new(move |state, player, input, now_ms, hooks| {
                let edge = input.pressed && !state.prev_pressed;
                state.prev_pressed = input.pressed;
                if !edge {
                    return false;
                }
                if let Some(last) = state.last_fired_ms {
                    if now_ms.saturating_sub(last) < abilities.blink_cooldown_ms {
                        return false;
                    }
                }
                state.last_fired_ms = Some(now_ms);

                let forward = input.orientation.yaw_forward();
                hooks.teleport(
                    player,
                    Vec3::new(
                        input.position.x + forward.x * abilities.blink_distance,
                        input.position.y + abilities.blink_rise,
                        input.position.z + forward.z * abilities.blink_distance,
                    ),
                );
                true
            })),
        },
    );

    table.insert(
        "dark_mode".to_string(),
        ModifierEffect {
            apply: Box::new(move |hooks, _| {
                hooks.set_ambient_light(physics.dark_ambient_intensity);
                hooks.set_directional_light(physics.dark_directional_intensity);
            }),
            revert: Box::new(move |hooks, _| {
                hooks.set_ambient_light(physics.default_ambient_intensity);
                hooks.set_directional_light(physics.default_directional_intensity);
            }),
            ability: None,
        },
    );

    table
}
