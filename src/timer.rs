//! Per-player race stopwatch.
//!
//! All instants are milliseconds on the session clock, supplied by the
//! caller; the tracker itself never reads wall-clock time, which keeps the
//! whole core deterministic under tick-driven tests.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct TimerState {
    start_ms: u64,
    /// Set once the player finishes; elapsed is frozen from then on.
    finish_ms: Option<u64>,
    elapsed_ms: u64,
}

#[derive(Debug, Default)]
pub struct TimerTracker {
    timers: HashMap<String, TimerState>,
}

impl TimerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a player's timer, clearing any prior finish marker.
    pub fn start(&mut self, id: &str, now_ms: u64) {
        self.timers.insert(
            id.to_string(),
            TimerState {
                start_ms: now_ms,
                finish_ms: None,
                elapsed_ms: 0,
            },
        );
    }

    /// Stop a player's timer and return the frozen elapsed time. Idempotent:
    /// once stopped, later calls return the cached value unchanged. Unknown
    /// ids return 0.
    pub fn stop(&mut self, id: &str, now_ms: u64) -> u64 {
        let Some(data) = self.timers.get_mut(id) else {
            return 0;
        };
        if data.finish_ms.is_some() {
            return data.elapsed_ms;
        }
        data.finish_ms = Some(now_ms);
        data.elapsed_ms = now_ms.saturating_sub(data.start_ms);
        data.elapsed_ms
    }

    /// Live elapsed time while running, frozen value after stop, 0 for
    /// unknown ids.
    pub fn elapsed(&self, id: &str, now_ms: u64) -> u64 {
        match self.timers.get(id) {
            Some(data) if data.finish_ms.is_some() => data.elapsed_ms,
            Some(data) => now_ms.saturating_sub(data.start_ms),
            None => 0,
        }
    }

    /// Final time; `None` until the player has finished.
    pub fn finish_time(&self, id: &str) -> Option<u64> {
        let data = self.timers.get(id)?;
        data.finish_ms.map(|_| data.elapsed_ms)
    }

    pub fn is_running(&self, id: &str) -> bool {
        matches!(self.timers.get(id), Some(d) if d.finish_ms.is_none())
    }

    pub fn remove_player(&mut self, id: &str) {
        self.timers.remove(id);
    }

    pub fn reset_all(&mut self) {
        self.timers.clear();
    }
}

/// Render milliseconds as `MM:SS.CC` – zero-padded minutes, seconds and
/// hundredths. Minutes widen past two digits rather than wrapping.
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let hundredths = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
}
