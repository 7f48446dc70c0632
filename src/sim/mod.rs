//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (obstacles oldest first)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod interp;
pub mod state;
pub mod tick;
pub mod world;

pub use interp::eval_condition;
pub use state::{
    Agent, AgentState, Avoidance, EndReason, Hitbox, Obstacle, ObstacleKind, Projectile,
    RunPhase, RunState, SailLevel, Snapshot, StormState, WaitState, WorldSense,
};
pub use tick::{FrameClock, FrameReport, Run, TickReport, tick};
