//! Fixed timestep tick orchestration and the frame-driven game loop
//!
//! One tick runs the components in a fixed order: interpreter, agent
//! physics, spawner, obstacle movement, shark tracking, storm event, world
//! sense, scoring, collision resolution. A tick either applies completely
//! or the run was already over before it began.

use crate::consts::*;
use crate::program::Program;
use crate::sim::state::{EndReason, RunPhase, RunState, Snapshot};
use crate::sim::{agent, collision, interp, world};

/// What one tick produced
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    /// Whole points added this tick (0 most ticks)
    pub points: u64,
    /// Set when this tick ended the run
    pub ended: Option<EndReason>,
}

/// Advance the run by one simulation tick. A no-op unless the run is in
/// the `Running` phase.
pub fn tick(program: &Program, state: &mut RunState) -> TickReport {
    if state.phase != RunPhase::Running {
        return TickReport::default();
    }

    state.tick += 1;

    interp::step(program, state);
    agent::update_agent(state);
    world::spawn_obstacles(state);
    world::update_obstacles(state);
    world::update_sharks(state);
    world::update_storm(state);
    world::update_world_sense(state);
    let points = collision::accrue_score(state);
    let ended = collision::resolve_collisions(state);

    if let Some(reason) = ended {
        state.finish(reason);
        log::info!(
            "run ended at tick {}: {} (score {})",
            state.tick,
            reason.message(),
            state.score
        );
    }

    TickReport { points, ended }
}

/// Converts wall-clock frame times into a number of due simulation ticks,
/// scaled by the current speed multiplier.
///
/// When a frame arrives late (a stall, a backgrounded window) several
/// ticks are due at once; the catch-up burst is capped so a long stall
/// cannot trigger a runaway storm of ticks. Speed scales both the
/// conversion and the cap.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last_time_ms: f64,
}

impl FrameClock {
    pub fn new(now_ms: f64) -> Self {
        Self {
            last_time_ms: now_ms,
        }
    }

    /// Ticks to run for the frame at `now_ms`. The reference time only
    /// advances once at least one tick is due, so sub-tick frames
    /// accumulate instead of being lost to rounding.
    pub fn ticks_due(&mut self, now_ms: f64, speed: f32) -> u32 {
        let elapsed = now_ms - self.last_time_ms;
        let due = (elapsed / MS_PER_TICK * speed as f64).floor();
        if due < 1.0 {
            return 0;
        }
        self.last_time_ms = now_ms;
        (due as u64).min(Self::catch_up_cap(speed) as u64) as u32
    }

    /// Maximum ticks a single frame may process
    pub fn catch_up_cap(speed: f32) -> u32 {
        ((speed * 5.0).ceil() as u32).max(5)
    }
}

/// What one rendered frame produced
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameReport {
    /// Simulation ticks actually run this frame
    pub ticks: u32,
    /// Integer score after the frame
    pub score: u64,
    /// True when the integer score increased during the frame
    pub score_changed: bool,
    /// Set when the run ended during the frame
    pub ended: Option<EndReason>,
}

/// One run of the game: the immutable program plus the state it drives.
///
/// The embedding shell calls [`Run::advance_frame`] once per rendered
/// frame and hands [`Run::snapshot`] to the renderer; when a frame reports
/// the run ended, the final score goes to the score store collaborator.
#[derive(Debug, Clone)]
pub struct Run {
    program: Program,
    state: RunState,
    clock: FrameClock,
}

impl Run {
    /// Start a run. `now_ms` is the wall-clock reference for the first
    /// frame; speed is supplied per-frame so it can change mid-run.
    pub fn new(program: Program, seed: u64, now_ms: f64) -> Self {
        let mut state = RunState::new(seed);
        state.begin();
        log::info!("run started (seed {seed})");
        Self {
            program,
            state,
            clock: FrameClock::new(now_ms),
        }
    }

    /// Process one rendered frame: run however many ticks are due at the
    /// current speed, stopping early if the run ends mid-burst.
    pub fn advance_frame(&mut self, now_ms: f64, speed: f32) -> FrameReport {
        let mut report = FrameReport {
            score: self.state.score,
            ..Default::default()
        };
        if self.state.phase != RunPhase::Running {
            return report;
        }

        let due = self.clock.ticks_due(now_ms, speed);
        for _ in 0..due {
            let tr = tick(&self.program, &mut self.state);
            report.ticks += 1;
            if tr.points > 0 {
                report.score_changed = true;
            }
            if tr.ended.is_some() {
                report.ended = tr.ended;
                break;
            }
        }
        report.score = self.state.score;
        report
    }

    /// External stop: ends the run immediately with no collision. No
    /// further ticks will be scheduled.
    pub fn force_stop(&mut self) {
        if self.state.phase == RunPhase::Running {
            self.state.finish(EndReason::Forced);
            log::info!("run force-stopped at tick {}", self.state.tick);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == RunPhase::Running
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.state.end
    }

    /// Read-only per-frame view for the renderer
    pub fn snapshot(&self) -> Snapshot<'_> {
        self.state.snapshot()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Test/scripting access to the underlying state
    pub fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }
}
