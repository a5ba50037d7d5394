//! ghost-sprint-server binary
//!
//! Runs the session core as a headless service: ticks the round loop at a
//! fixed rate, persists progression to a file-backed store, and emits every
//! session event as a JSON log line for downstream consumers.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                        | Default             | Description                    |
//! |----------------------------|---------------------|--------------------------------|
//! | `GHOST_SPRINT_CONFIG`      | *(none)*            | TOML file with `GameConfig`    |
//! | `GHOST_SPRINT_COURSES`     | *(builtin)*         | JSON file of course definitions|
//! | `GHOST_SPRINT_DATA_DIR`    | `./data`            | Durable storage root           |
//! | `GHOST_SPRINT_TICK_RATE_HZ`| `20`                | Session tick rate              |
//!
//! Any `GameConfig` field can also be overridden directly through the
//! environment, e.g. `GHOST_SPRINT_MIN_PLAYERS=4`.

use anyhow::{Context, Result};
use clap::Parser;
use ghost_sprint::course::{CourseCatalog, CourseDefinition, CourseRotation};
use ghost_sprint::cosmetics::CosmeticCatalog;
use ghost_sprint::modifier::WorldHooks;
use ghost_sprint::session::GameSession;
use ghost_sprint::storage::FileStorage;
use ghost_sprint::types::{GameConfig, Vec3};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "ghost-sprint-server", about = "Ghost Sprint session core", version)]
struct Args {
    /// TOML config file (GameConfig fields)
    #[arg(long, env = "GHOST_SPRINT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file with an array of course definitions
    #[arg(long, env = "GHOST_SPRINT_COURSES")]
    courses: Option<PathBuf>,

    /// Durable storage root directory
    #[arg(long, env = "GHOST_SPRINT_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Tick rate (Hz)
    #[arg(long, env = "GHOST_SPRINT_TICK_RATE_HZ", default_value_t = 20.0)]
    tick_rate_hz: f32,
}

// ---------------------------------------------------------------------------
// World hooks
// ---------------------------------------------------------------------------

/// Headless stand-in for the host engine: logs every world side effect the
/// session requests so operators can trace round flow without a client.
#[derive(Debug, Default)]
struct LoggingWorldHooks;

impl WorldHooks for LoggingWorldHooks {
    fn set_gravity(&mut self, gravity: Vec3) {
        log::debug!("world: gravity -> {}", gravity);
    }
    fn set_ambient_light(&mut self, intensity: f32) {
        log::debug!("world: ambient light -> {}", intensity);
    }
    fn set_directional_light(&mut self, intensity: f32) {
        log::debug!("world: directional light -> {}", intensity);
    }
    fn set_move_speed(&mut self, player: &str, walk: f32, run: f32) {
        log::debug!("world: move speed for {} -> walk {} run {}", player, walk, run);
    }
    fn apply_impulse(&mut self, player: &str, impulse: Vec3) {
        log::debug!("world: impulse on {} -> {}", player, impulse);
    }
    fn teleport(&mut self, player: &str, position: Vec3) {
        log::debug!("world: teleport {} -> {}", player, position);
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

fn load_game_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.clone()));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix("GHOST_SPRINT"))
        .build()
        .context("Failed to assemble configuration")?;
    settings
        .try_deserialize::<GameConfig>()
        .context("Failed to deserialize GameConfig")
}

fn load_courses(path: Option<&PathBuf>) -> Result<CourseCatalog> {
    let Some(path) = path else {
        return Ok(CourseCatalog::builtin());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read course file {}", path.display()))?;
    let courses: Vec<CourseDefinition> =
        serde_json::from_str(&raw).context("Failed to parse course definitions")?;
    CourseCatalog::new(courses).context("Invalid course catalog")
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ghost_sprint=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let game_config = load_game_config(args.config.as_ref())?;
    let catalog = load_courses(args.courses.as_ref())?;

    log::info!(
        "Starting ghost-sprint-server (courses={}, min_players={}, data_dir={})",
        catalog.len(),
        game_config.min_players,
        args.data_dir.display(),
    );

    let storage = Arc::new(FileStorage::new(args.data_dir.clone()));
    let mut session = GameSession::new(
        game_config,
        CourseRotation::new(catalog),
        CosmeticCatalog::builtin(),
        storage,
    );
    let mut hooks = LoggingWorldHooks;

    let tick_delta = 1.0 / args.tick_rate_hz;

    // Run the tick loop until SIGINT. The loop stays on the main task: the
    // session borrows the world hooks across awaits, so its future is not
    // `Send` and cannot be spawned.
    let tick_loop = async {
        let interval = std::time::Duration::from_secs_f32(tick_delta);
        let mut timer = tokio::time::interval(interval);
        loop {
            timer.tick().await;

            let events = session.tick(tick_delta, &mut hooks).await;

            for event in &events.events {
                match serde_json::to_string(event) {
                    Ok(json) => log::info!("event {}", json),
                    Err(e) => log::warn!("failed to serialize event: {}", e),
                }
            }
        }
    };

    tokio::select! {
        () = tick_loop => {
            log::error!("Session tick loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("ghost-sprint-server shutting down (SIGINT)");
        }
    }

    Ok(())
}
