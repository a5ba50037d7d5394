//! Core math and configuration types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn distance_squared(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Position quantized to 2 decimal places (persisted-ghost precision).
    pub fn quantized(&self) -> Vec3 {
        Vec3::new(quantize2(self.x), quantize2(self.y), quantize2(self.z))
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Orientation quaternion, `w` first to match the sample wire order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quat {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Orientation quantized to 3 decimal places (persisted-ghost precision).
    pub fn quantized(&self) -> Quat {
        Quat::new(
            quantize3(self.w),
            quantize3(self.x),
            quantize3(self.y),
            quantize3(self.z),
        )
    }

    /// Horizontal forward direction (yaw only): the entity's local -Z axis
    /// projected onto the ground plane. Used for blink teleports.
    pub fn yaw_forward(&self) -> Vec3 {
        let sin_y = 2.0 * (self.w * self.y + self.x * self.z);
        let cos_y = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        Vec3::new(-sin_y, 0.0, -cos_y)
    }
}

pub fn quantize2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

pub fn quantize3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Tuning / configuration
// ---------------------------------------------------------------------------

/// XP amounts awarded for round outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct XpValues {
    pub finish: u64,
    pub top1: u64,
    pub top2: u64,
    pub top3: u64,
    pub new_pb: u64,
    pub dnf: u64,
}

impl Default for XpValues {
    fn default() -> Self {
        Self {
            finish: 30,
            top1: 20,
            top2: 10,
            top3: 5,
            new_pb: 25,
            dnf: 10,
        }
    }
}

/// Ghost recording cadence and buffer bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostTuning {
    /// Minimum gap between accepted samples.
    pub sample_interval_ms: u64,
    /// Recording length cap; bounds the buffer at
    /// `max_duration_ms / sample_interval_ms` samples.
    pub max_duration_ms: u64,
}

impl GhostTuning {
    pub fn max_samples(&self) -> usize {
        (self.max_duration_ms / self.sample_interval_ms.max(1)) as usize
    }
}

impl Default for GhostTuning {
    fn default() -> Self {
        Self {
            sample_interval_ms: 250,
            max_duration_ms: 60_000,
        }
    }
}

/// Per-tick modifier ability tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    /// Upward impulse applied by the mid-air second jump.
    pub double_jump_impulse: f32,
    /// Forward distance of a blink teleport.
    pub blink_distance: f32,
    /// Small vertical lift added to each blink so the target clears the ground.
    pub blink_rise: f32,
    /// Cooldown window between blinks for one player.
    pub blink_cooldown_ms: u64,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            double_jump_impulse: 8.0,
            blink_distance: 5.0,
            blink_rise: 0.5,
            blink_cooldown_ms: 2_000,
        }
    }
}

/// World-level values modifiers move away from and reset restores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub default_gravity: Vec3,
    pub low_gravity: Vec3,
    pub default_walk_speed: f32,
    pub default_run_speed: f32,
    pub ice_walk_speed: f32,
    pub ice_run_speed: f32,
    pub speed_boost_factor: f32,
    pub default_ambient_intensity: f32,
    pub default_directional_intensity: f32,
    pub dark_ambient_intensity: f32,
    pub dark_directional_intensity: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            default_gravity: Vec3::new(0.0, -32.0, 0.0),
            low_gravity: Vec3::new(0.0, -12.0, 0.0),
            default_walk_speed: 4.0,
            default_run_speed: 8.0,
            ice_walk_speed: 6.0,
            ice_run_speed: 12.0,
            speed_boost_factor: 1.15,
            default_ambient_intensity: 1.0,
            default_directional_intensity: 1.0,
            dark_ambient_intensity: 0.05,
            dark_directional_intensity: 0.1,
        }
    }
}

/// Master session configuration. Injected into constructors – never ambient
/// global state – so tests can substitute fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Players required before the lobby countdown starts.
    pub min_players: usize,
    pub lobby_countdown_sec: f32,
    pub starting_freeze_sec: f32,
    pub round_duration_sec: f32,
    pub results_duration_sec: f32,
    /// Vertical offset applied to start/checkpoint positions when used as
    /// spawn points, so players drop onto the pad instead of inside it.
    pub spawn_y_offset: f32,
    /// Delay between an out-of-bounds event and the respawn teleport.
    pub respawn_delay_ms: u64,
    pub xp: XpValues,
    pub xp_per_level: u64,
    pub coins_per_level_up: u64,
    pub ghost: GhostTuning,
    pub abilities: AbilityTuning,
    pub physics: PhysicsTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            lobby_countdown_sec: 15.0,
            starting_freeze_sec: 3.0,
            round_duration_sec: 180.0,
            results_duration_sec: 10.0,
            spawn_y_offset: 2.0,
            respawn_delay_ms: 1_000,
            xp: XpValues::default(),
            xp_per_level: 100,
            coins_per_level_up: 25,
            ghost: GhostTuning::default(),
            abilities: AbilityTuning::default(),
            physics: PhysicsTuning::default(),
        }
    }
}
