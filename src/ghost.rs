//! Ghost recording and replay.
//!
//! During a run each player's position/orientation is sampled at a fixed
//! cadence into a bounded, quantized buffer. A personal-best recording is
//! replayed later by advancing a read cursor from elapsed session time; the
//! core emits [`GhostFrame`] values and leaves entity rendering to the
//! presentation layer.

use crate::types::{GhostTuning, Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Recording data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GhostSample {
    pub position: Vec3,
    pub orientation: Quat,
}

/// A finished run trace: quantized samples plus total duration. Persisted
/// when the run beats the player's prior best.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GhostRecording {
    pub samples: Vec<GhostSample>,
    pub time_ms: u64,
}

/// One replay position update to apply to a ghost entity this tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostFrame {
    pub player: String,
    pub position: Vec3,
    pub orientation: Quat,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct ActiveRecording {
    samples: Vec<GhostSample>,
    start_ms: u64,
    /// Session time of the last accepted sample; `None` until the first one,
    /// which is always accepted.
    last_sample_ms: Option<u64>,
}

struct GhostReplay {
    samples: Vec<GhostSample>,
    start_ms: u64,
    cursor: usize,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

pub struct GhostRecorder {
    tuning: GhostTuning,
    recordings: HashMap<String, ActiveRecording>,
    replays: HashMap<String, GhostReplay>,
}

impl GhostRecorder {
    pub fn new(tuning: GhostTuning) -> Self {
        Self {
            tuning,
            recordings: HashMap::new(),
            replays: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Open a fresh sample buffer for a player.
    pub fn start_recording(&mut self, id: &str, now_ms: u64) {
        self.recordings.insert(
            id.to_string(),
            ActiveRecording {
                samples: Vec::new(),
                start_ms: now_ms,
                last_sample_ms: None,
            },
        );
    }

    /// Offer a sample. Accepted only if the sample interval has elapsed since
    /// the last accepted sample and the buffer is below its cap; accepted
    /// samples are quantized before storage. Returns whether it was stored.
    pub fn record_sample(&mut self, id: &str, pos: Vec3, rot: Quat, now_ms: u64) -> bool {
        let Some(rec) = self.recordings.get_mut(id) else {
            return false;
        };

        if let Some(last) = rec.last_sample_ms {
            if now_ms.saturating_sub(last) < self.tuning.sample_interval_ms {
                return false;
            }
        }
        if rec.samples.len() >= self.tuning.max_samples() {
            return false;
        }

        rec.samples.push(GhostSample {
            position: pos.quantized(),
            orientation: rot.quantized(),
        });
        rec.last_sample_ms = Some(now_ms);
        true
    }

    /// Finalise a recording. Returns `None` for unknown ids or runs that
    /// captured zero samples.
    pub fn stop_recording(&mut self, id: &str, now_ms: u64) -> Option<GhostRecording> {
        let rec = self.recordings.remove(id)?;
        if rec.samples.is_empty() {
            return None;
        }
        Some(GhostRecording {
            samples: rec.samples,
            time_ms: now_ms.saturating_sub(rec.start_ms),
        })
    }

    /// Discard a single in-progress recording without producing a trace.
    pub fn cancel_recording(&mut self, id: &str) {
        self.recordings.remove(id);
    }

    pub fn cancel_all_recordings(&mut self) {
        self.recordings.clear();
    }

    pub fn is_recording(&self, id: &str) -> bool {
        self.recordings.contains_key(id)
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Start replaying a stored recording for a player, replacing any replay
    /// already active for them. Empty recordings are ignored.
    pub fn spawn_replay(&mut self, id: &str, recording: GhostRecording, now_ms: u64) {
        if recording.samples.is_empty() {
            return;
        }
        debug!("spawning ghost for {} ({} samples)", id, recording.samples.len());
        self.replays.insert(
            id.to_string(),
            GhostReplay {
                samples: recording.samples,
                start_ms: now_ms,
                cursor: 0,
            },
        );
    }

    /// Advance every replay cursor and emit a frame for each replay whose
    /// target sample changed. A replay that runs past its last sample loops
    /// by resetting its start time (the ghost snaps back to the beginning).
    pub fn tick_replays(&mut self, now_ms: u64) -> Vec<GhostFrame> {
        let interval = self.tuning.sample_interval_ms.max(1);
        let mut frames = Vec::new();

        for (id, replay) in &mut self.replays {
            let elapsed = now_ms.saturating_sub(replay.start_ms);
            let target = (elapsed / interval) as usize;

            if target >= replay.samples.len() {
                replay.start_ms = now_ms;
                replay.cursor = 0;
                continue;
            }

            if target != replay.cursor {
                replay.cursor = target;
                let sample = replay.samples[target];
                frames.push(GhostFrame {
                    player: id.clone(),
                    position: sample.position,
                    orientation: sample.orientation,
                });
            }
        }

        frames
    }

    pub fn despawn_replay(&mut self, id: &str) {
        self.replays.remove(id);
    }

    pub fn despawn_all_replays(&mut self) {
        self.replays.clear();
    }

    pub fn replay_count(&self) -> usize {
        self.replays.len()
    }
}
