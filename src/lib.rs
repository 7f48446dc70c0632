//! Windjammer - a block-programmed sailing survival game
//!
//! Core modules:
//! - `program`: the block-program tree built by the visual editor
//! - `sim`: deterministic simulation (interpreter, physics, obstacles, scoring)
//! - `highscores`: leaderboard bookkeeping
//! - `persistence`: score store capability with local fallback
//! - `settings`: player preferences (game speed)
//!
//! The renderer and editor are external collaborators: the editor hands a
//! validated [`Program`] to [`sim::Run`], and the renderer consumes the
//! read-only [`sim::Snapshot`] each frame.

pub mod highscores;
pub mod persistence;
pub mod program;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use program::{ActionKind, Condition, Node, Program, ProgramError};
pub use settings::Settings;

/// Game tuning constants
pub mod consts {
    /// Fixed simulation tick rate
    pub const TICKS_PER_SECOND: u32 = 180;
    /// Wall-clock milliseconds per simulation tick
    pub const MS_PER_TICK: f64 = 1000.0 / TICKS_PER_SECOND as f64;

    /// World dimensions (the renderer scales to fit)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
    /// Height of the water band at the bottom of the world
    pub const WATER_DEPTH: f32 = 130.0;
    /// Y coordinate of the waterline
    pub const WATER_Y: f32 = WORLD_HEIGHT - WATER_DEPTH;

    /// Agent defaults - fixed x lane, square hitbox
    pub const AGENT_X: f32 = 100.0;
    pub const AGENT_SIZE: f32 = 60.0;

    /// Jump impulse (negative = up) and per-tick gravity
    pub const JUMP_IMPULSE: f32 = -10.0;
    pub const GRAVITY_PER_TICK: f32 = 0.25;
    /// Bob impulse (positive = down) and per-tick buoyancy pulling back up
    pub const BOB_IMPULSE: f32 = 3.0;
    pub const BUOYANCY_PER_TICK: f32 = 0.07;

    /// Cannon
    pub const CANNON_COOLDOWN_TICKS: u32 = 30;
    pub const PROJECTILE_SIZE: f32 = 10.0;
    pub const PROJECTILE_SPEED: f32 = 8.0;

    /// Obstacles
    pub const OBSTACLE_SPEED: f32 = 3.0;
    pub const MAX_LIVE_OBSTACLES: usize = 3;
    /// Ticks between spawns, and the earlier gate for the first spawn of a run
    pub const SPAWN_INTERVAL_TICKS: u64 = 120;
    pub const FIRST_SPAWN_TICK: u64 = 30;
    /// Obstacles spawn this far past the right edge and retire this far past the left
    pub const SPAWN_MARGIN: f32 = 50.0;
    /// Score at which the tougher obstacle types (Boat, Shark) unlock
    pub const TIER_TWO_SCORE: u64 = 500;

    /// Storm timed event
    pub const STORM_DURATION_TICKS: u64 = 1200;
    pub const STORM_GRACE_TICKS: u64 = 240;
    pub const STORM_FADE_OUT_TICKS: u64 = 240;
    pub const STORM_COOLDOWN_TICKS: u64 = 600;
    pub const STORM_MIN_RUN_IN_TICKS: u64 = 200;
    pub const STORM_CHANCE_PER_TICK: f32 = 0.001;

    /// Base score accrual per tick (before the sail multiplier)
    pub const SCORE_PER_TICK: f64 = 1.0 / 6.0;

    /// Vertical clearance required to jump over an obstacle's hitbox
    pub const JUMP_CLEARANCE: f32 = 10.0;
    /// Smaller clearance for bird flocks (they can also be bobbed under)
    pub const BIRD_CLEARANCE: f32 = 5.0;
    /// Horizontal band in which a jumping agent triggers a shark leap
    pub const SHARK_BAND_AHEAD: f32 = 150.0;
    pub const SHARK_BAND_BEHIND: f32 = -100.0;
}

/// Convert a block duration in milliseconds to whole simulation ticks.
///
/// Rounds down but always waits at least one tick, so a tiny wait still
/// yields for a tick instead of degenerating to a no-op.
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    let ticks = (ms as f64 / 1000.0 * consts::TICKS_PER_SECOND as f64).floor() as u64;
    ticks.max(1)
}
