//! Ghost Sprint
//!
//! Session-orchestration core of a checkpoint racing minigame, running as a
//! headless tick-driven service.
//!
//! ## Architecture
//!
//! ```text
//! GameSession  (session.rs)          ← composition root, session clock
//!   ├── RoundStateMachine (state.rs) ← lobby/countdown/round lifecycle
//!   ├── CheckpointTracker (checkpoint.rs)
//!   ├── TimerTracker      (timer.rs)
//!   ├── GhostRecorder     (ghost.rs) ← PB recording + replays
//!   ├── ModifierEngine    (modifier.rs)
//!   ├── PersistenceStore  (persistence.rs)
//!   └── LeaderboardStore  (leaderboard.rs)
//! ```
//!
//! The core never touches physics or rendering – those side effects go out
//! through the [`modifier::WorldHooks`] boundary trait, which the host
//! engine implements. Durable state goes through [`storage::DurableStorage`].

// Core gameplay modules are always available (no server feature needed).
pub mod checkpoint;
pub mod cosmetics;
pub mod course;
pub mod events;
pub mod ghost;
pub mod modifier;
pub mod progression;
pub mod state;
pub mod timer;
pub mod types;

// Async persistence and the session root require the `server` feature.
#[cfg(feature = "server")]
pub mod leaderboard;
#[cfg(feature = "server")]
pub mod persistence;
#[cfg(feature = "server")]
pub mod session;
#[cfg(feature = "server")]
pub mod storage;

// Convenience re-exports
pub use course::{CourseCatalog, CourseDefinition, CourseRotation};
pub use events::{PlayerSnapshot, SessionEvent, TickEvents};
pub use modifier::{ModifierEngine, NoopWorldHooks, WorldHooks};
pub use state::{GameState, RoundStateMachine};
pub use types::{GameConfig, Quat, Vec3};

#[cfg(feature = "server")]
pub use session::GameSession;
#[cfg(feature = "server")]
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
