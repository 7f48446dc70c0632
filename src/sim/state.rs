//! Run state and core simulation types
//!
//! Everything one run of the game owns lives here. The state is mutated
//! only by the step functions in this module's siblings, never by the
//! renderer or editor.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Agent locomotion state. At most one airborne/submerged state at a time,
/// enforced by the enum itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    /// On the waterline
    Sailing,
    /// Airborne after a jump, falling back under gravity
    Jumping,
    /// Ducked underwater, buoyancy bringing it back up
    Bobbing,
}

/// Sail trim. Derives the score multiplier: raised sails earn faster but
/// sink the ship in a storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SailLevel {
    Lowered,
    Normal,
    Raised,
}

impl SailLevel {
    /// Score multiplier for this trim
    pub fn multiplier(self) -> f64 {
        match self {
            SailLevel::Lowered => 0.5,
            SailLevel::Normal => 1.0,
            SailLevel::Raised => 1.5,
        }
    }
}

/// A cannonball in flight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    /// Horizontal speed per tick (rightward)
    pub speed: f32,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Top-left corner; x is a fixed lane, y moves with jumps and bobs
    pub pos: Vec2,
    pub size: Vec2,
    pub state: AgentState,
    pub jump_vel: f32,
    pub bob_vel: f32,
    pub sail: SailLevel,
    /// Ticks until the cannon may fire again
    pub cannon_cooldown: u32,
    pub projectiles: Vec<Projectile>,
}

impl Agent {
    pub fn new(water_y: f32) -> Self {
        let size = Vec2::splat(AGENT_SIZE);
        Self {
            pos: Vec2::new(AGENT_X, water_y - size.y),
            size,
            state: AgentState::Sailing,
            jump_vel: 0.0,
            bob_vel: 0.0,
            sail: SailLevel::Normal,
            cannon_cooldown: 0,
            projectiles: Vec::new(),
        }
    }

    /// Right edge of the hull
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    /// Resting y for the hull top when sitting on the waterline
    pub fn surface_y(&self, water_y: f32) -> f32 {
        water_y - self.size.y
    }
}

/// Avoidance rule an obstacle demands of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Avoidance {
    /// Jump clear over it
    Jump,
    /// Destroy it with the cannon before it arrives; never dodgeable
    Cannon,
    /// Jump over or bob under
    JumpOrBob,
    /// Stay on the surface; bobbing is fatal
    NoBob,
    /// Lower the sails (storms only; resolved by the timed event, not
    /// positionally)
    LowerSails,
}

/// Obstacle hitbox: a smaller rectangle offset inside the visual bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hitbox {
    pub offset: Vec2,
    pub size: Vec2,
}

/// Obstacle types. Each variant carries its own geometry and avoidance
/// rule, so an obstacle cannot be built with a contradictory rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObstacleKind {
    Wave,
    Boat,
    Storm,
    BirdFlock,
    Mines,
    Shark,
}

impl ObstacleKind {
    pub fn avoidance(self) -> Avoidance {
        match self {
            ObstacleKind::Wave | ObstacleKind::Mines => Avoidance::Jump,
            ObstacleKind::Boat => Avoidance::Cannon,
            ObstacleKind::Storm => Avoidance::LowerSails,
            ObstacleKind::BirdFlock => Avoidance::JumpOrBob,
            ObstacleKind::Shark => Avoidance::NoBob,
        }
    }

    /// On-screen sprite bounds. Collision uses [`ObstacleKind::hitbox`].
    pub fn visual_size(self) -> Vec2 {
        match self {
            ObstacleKind::Wave => Vec2::new(120.0, 120.0),
            ObstacleKind::Boat => Vec2::new(70.0, 50.0),
            ObstacleKind::Storm => Vec2::new(100.0, 150.0),
            ObstacleKind::BirdFlock => Vec2::new(100.0, 100.0),
            ObstacleKind::Mines => Vec2::new(40.0, 40.0),
            ObstacleKind::Shark => Vec2::new(120.0, 120.0),
        }
    }

    pub fn hitbox(self) -> Hitbox {
        let size = match self {
            ObstacleKind::Wave => Vec2::new(60.0, 40.0),
            ObstacleKind::Boat => Vec2::new(70.0, 50.0),
            ObstacleKind::Storm => Vec2::new(100.0, 150.0),
            ObstacleKind::BirdFlock => Vec2::new(60.0, 30.0),
            ObstacleKind::Mines => Vec2::new(20.0, 20.0),
            ObstacleKind::Shark => Vec2::new(60.0, 30.0),
        };
        Hitbox {
            offset: Vec2::ZERO,
            size,
        }
    }

    /// Spawn y for the top of the sprite, relative to the waterline
    pub fn spawn_y(self, water_y: f32) -> f32 {
        match self {
            ObstacleKind::Wave => water_y - 75.0,
            ObstacleKind::Boat => water_y - 50.0,
            ObstacleKind::Storm => water_y - 150.0,
            ObstacleKind::BirdFlock => water_y - 120.0,
            ObstacleKind::Mines => water_y - 20.0,
            ObstacleKind::Shark => water_y + 10.0,
        }
    }

    /// Starting health; only boats take cannon damage
    pub fn health(self) -> Option<u8> {
        match self {
            ObstacleKind::Boat => Some(1),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ObstacleKind::Wave => "wave",
            ObstacleKind::Boat => "boat",
            ObstacleKind::Storm => "storm",
            ObstacleKind::BirdFlock => "bird flock",
            ObstacleKind::Mines => "mine",
            ObstacleKind::Shark => "shark",
        }
    }
}

/// A live obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Base (non-bobbing) top-left position; the renderer applies its own
    /// wave-motion offset, collision math always uses this.
    pub pos: Vec2,
    pub size: Vec2,
    pub hitbox: Hitbox,
    /// Leftward speed per tick
    pub speed: f32,
    pub health: Option<u8>,
}

impl Obstacle {
    /// Create an obstacle of the given kind just past the right world edge.
    pub fn spawn(kind: ObstacleKind, id: u32, world_w: f32, water_y: f32) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::new(world_w + SPAWN_MARGIN, kind.spawn_y(water_y)),
            size: kind.visual_size(),
            hitbox: kind.hitbox(),
            speed: OBSTACLE_SPEED,
            health: kind.health(),
        }
    }

    /// Hitbox bounds at the base position: (left, right, top, bottom)
    pub fn hitbox_bounds(&self) -> (f32, f32, f32, f32) {
        let left = self.pos.x + self.hitbox.offset.x;
        let top = self.pos.y + self.hitbox.offset.y;
        (
            left,
            left + self.hitbox.size.x,
            top,
            top + self.hitbox.size.y,
        )
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == Some(0)
    }
}

/// Storm timed-event state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StormState {
    pub active: bool,
    pub start_tick: u64,
    /// Tick the most recent storm ended (0 = none yet); drives the
    /// fade-out ramp
    pub end_tick: u64,
    /// Enforces the cooldown before another storm may start
    pub last_end_tick: u64,
}

impl StormState {
    /// True once an active storm is past its grace period and can sink
    /// ships with raised sails.
    pub fn damaging(&self, tick: u64) -> bool {
        self.active && tick.saturating_sub(self.start_tick) > STORM_GRACE_TICKS
    }

    /// Visual intensity in [0, 1]: ramps up over the grace period while
    /// active, ramps back down over the fade-out window after the storm
    /// ends.
    pub fn intensity(&self, tick: u64) -> f32 {
        if self.active {
            let since_start = tick.saturating_sub(self.start_tick) as f32;
            (since_start / STORM_GRACE_TICKS as f32).min(1.0)
        } else if self.end_tick > 0 {
            let since_end = tick.saturating_sub(self.end_tick) as f32;
            if since_end < STORM_FADE_OUT_TICKS as f32 {
                1.0 - since_end / STORM_FADE_OUT_TICKS as f32
            } else {
                0.0
            }
        } else {
            0.0
        }
    }
}

/// Derived per-tick view of the nearest obstacle ahead, consumed by the
/// condition evaluator. Recomputed from scratch every tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldSense {
    /// Horizontal gap to the nearest obstacle ahead; infinity when the
    /// water ahead is clear
    pub distance: f32,
    pub kind: Option<ObstacleKind>,
    pub height: f32,
}

impl Default for WorldSense {
    fn default() -> Self {
        Self {
            distance: f32::INFINITY,
            kind: None,
            height: 0.0,
        }
    }
}

/// Run lifecycle. Terminal once `Ended`; there is no resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    NotStarted,
    Running,
    Ended,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    StormSunk,
    HitWave,
    BoatRammed,
    BirdStruck,
    MineHit,
    SharkSurface,
    SharkUnderwater,
    SharkLeap,
    /// External stop (navigation away, "End Game" button)
    Forced,
}

impl EndReason {
    /// Player-facing death/end message
    pub fn message(self) -> &'static str {
        match self {
            EndReason::StormSunk => {
                "Your ship was destroyed by the storm! Lower your sails next time!"
            }
            EndReason::HitWave => "You crashed into a wave!",
            EndReason::BoatRammed => "An enemy boat rammed into you!",
            EndReason::BirdStruck => "You were hit by a flock of birds!",
            EndReason::MineHit => "You hit a mine!",
            EndReason::SharkSurface => "A shark got you!",
            EndReason::SharkUnderwater => "A shark got you underwater!",
            EndReason::SharkLeap => "A shark jumped out of the water and ate you!",
            EndReason::Forced => "Game ended manually",
        }
    }

    /// The obstacle type responsible, if any
    pub fn obstacle(self) -> Option<ObstacleKind> {
        match self {
            EndReason::StormSunk => Some(ObstacleKind::Storm),
            EndReason::HitWave => Some(ObstacleKind::Wave),
            EndReason::BoatRammed => Some(ObstacleKind::Boat),
            EndReason::BirdStruck => Some(ObstacleKind::BirdFlock),
            EndReason::MineHit => Some(ObstacleKind::Mines),
            EndReason::SharkSurface | EndReason::SharkUnderwater | EndReason::SharkLeap => {
                Some(ObstacleKind::Shark)
            }
            EndReason::Forced => None,
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// A pending `Wait` block: interpretation is suspended until
/// `duration_ticks` have elapsed since `start_tick`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaitState {
    pub start_tick: u64,
    pub duration_ticks: u64,
}

/// Complete state of one run. Owned by the simulation loop; step
/// functions mutate it, the renderer only ever sees a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: RunPhase,
    /// Simulation tick counter
    pub tick: u64,
    pub score: u64,
    /// Fractional score carried between ticks
    pub score_accumulator: f64,
    pub agent: Agent,
    /// Live obstacles, oldest first (stable iteration order)
    pub obstacles: Vec<Obstacle>,
    pub storm: StormState,
    pub sense: WorldSense,
    pub waiting: Option<WaitState>,
    pub last_spawn_tick: u64,
    pub end: Option<EndReason>,
    pub world_w: f32,
    pub water_y: f32,
    next_id: u32,
}

impl RunState {
    /// Create a fresh run with the given seed, not yet started.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RunPhase::NotStarted,
            tick: 0,
            score: 0,
            score_accumulator: 0.0,
            agent: Agent::new(WATER_Y),
            obstacles: Vec::new(),
            storm: StormState::default(),
            sense: WorldSense::default(),
            waiting: None,
            last_spawn_tick: 0,
            end: None,
            world_w: WORLD_WIDTH,
            water_y: WATER_Y,
            next_id: 1,
        }
    }

    /// Transition `NotStarted -> Running`. A no-op in any other phase.
    pub fn begin(&mut self) {
        if self.phase == RunPhase::NotStarted {
            self.phase = RunPhase::Running;
        }
    }

    /// Allocate a monotonic obstacle id
    pub fn next_obstacle_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Mark the run ended with the given reason. Idempotent: the first
    /// reason wins.
    pub fn finish(&mut self, reason: EndReason) {
        if self.phase != RunPhase::Ended {
            self.phase = RunPhase::Ended;
            self.end = Some(reason);
        }
    }

    /// Read-only view handed to the renderer each frame
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            tick: self.tick,
            score: self.score,
            agent: &self.agent,
            obstacles: &self.obstacles,
            projectiles: &self.agent.projectiles,
            storm_active: self.storm.active,
            storm_intensity: self.storm.intensity(self.tick),
        }
    }
}

/// Per-frame read-only view of the world for the external renderer.
/// Rendering never feeds back into the simulation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub score: u64,
    pub agent: &'a Agent,
    pub obstacles: &'a [Obstacle],
    pub projectiles: &'a [Projectile],
    pub storm_active: bool,
    /// Fade in/out ramp in [0, 1] for the storm's visual treatment
    pub storm_intensity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sail_multiplier() {
        assert_eq!(SailLevel::Lowered.multiplier(), 0.5);
        assert_eq!(SailLevel::Normal.multiplier(), 1.0);
        assert_eq!(SailLevel::Raised.multiplier(), 1.5);
    }

    #[test]
    fn test_obstacle_ids_monotonic() {
        let mut state = RunState::new(7);
        let a = state.next_obstacle_id();
        let b = state.next_obstacle_id();
        assert!(b > a);
    }

    #[test]
    fn test_finish_first_reason_wins() {
        let mut state = RunState::new(7);
        state.begin();
        state.finish(EndReason::HitWave);
        state.finish(EndReason::MineHit);
        assert_eq!(state.phase, RunPhase::Ended);
        assert_eq!(state.end, Some(EndReason::HitWave));
    }

    #[test]
    fn test_storm_intensity_ramp() {
        let storm = StormState {
            active: true,
            start_tick: 100,
            ..Default::default()
        };
        assert_eq!(storm.intensity(100), 0.0);
        assert!((storm.intensity(100 + STORM_GRACE_TICKS / 2) - 0.5).abs() < 1e-6);
        assert_eq!(storm.intensity(100 + STORM_GRACE_TICKS), 1.0);
        assert_eq!(storm.intensity(100 + STORM_GRACE_TICKS * 4), 1.0);
    }

    #[test]
    fn test_storm_intensity_fade_out() {
        let storm = StormState {
            active: false,
            start_tick: 100,
            end_tick: 1300,
            last_end_tick: 1300,
        };
        assert_eq!(storm.intensity(1300), 1.0);
        assert!((storm.intensity(1300 + STORM_FADE_OUT_TICKS / 2) - 0.5).abs() < 1e-6);
        assert_eq!(storm.intensity(1300 + STORM_FADE_OUT_TICKS), 0.0);
    }

    #[test]
    fn test_storm_damaging_respects_grace() {
        let storm = StormState {
            active: true,
            start_tick: 50,
            ..Default::default()
        };
        assert!(!storm.damaging(50 + STORM_GRACE_TICKS));
        assert!(storm.damaging(50 + STORM_GRACE_TICKS + 1));
    }

    #[test]
    fn test_obstacle_spawns_off_right_edge() {
        let obstacle = Obstacle::spawn(ObstacleKind::Wave, 1, WORLD_WIDTH, WATER_Y);
        assert!(obstacle.pos.x > WORLD_WIDTH);
        assert_eq!(obstacle.health, None);

        let boat = Obstacle::spawn(ObstacleKind::Boat, 2, WORLD_WIDTH, WATER_Y);
        assert_eq!(boat.health, Some(1));
    }

    #[test]
    fn test_hitbox_smaller_than_visual() {
        for kind in [ObstacleKind::Wave, ObstacleKind::Mines, ObstacleKind::Shark] {
            let hb = kind.hitbox().size;
            let visual = kind.visual_size();
            assert!(hb.x <= visual.x && hb.y <= visual.y, "{:?}", kind);
        }
    }
}
