//! Obstacle spawning, movement, storm timed event, and world sense
//!
//! All randomness draws from the run's seeded RNG, so a run replays
//! identically from its seed.

use rand::Rng;

use crate::consts::*;
use crate::sim::state::{Agent, AgentState, Obstacle, ObstacleKind, RunState, WorldSense};

/// Try to spawn one obstacle this tick.
///
/// Spawns are gated three ways: at most [`MAX_LIVE_OBSTACLES`] alive, a
/// minimum tick interval since the last spawn (with a shorter gate for the
/// first obstacle of a run), and a score-unlocked type pool. Storms never
/// spawn here; they are driven by the timed event.
pub fn spawn_obstacles(state: &mut RunState) {
    if state.obstacles.is_empty() {
        if state.tick < FIRST_SPAWN_TICK {
            return;
        }
    } else if state.tick.saturating_sub(state.last_spawn_tick) < SPAWN_INTERVAL_TICKS {
        return;
    }
    if state.obstacles.len() >= MAX_LIVE_OBSTACLES {
        return;
    }

    let pool = unlocked_pool(state.score);
    let kind = pool[state.rng.random_range(0..pool.len())];
    let id = state.next_obstacle_id();
    let obstacle = Obstacle::spawn(kind, id, state.world_w, state.water_y);

    if spawn_is_avoidable(&obstacle, &state.obstacles, &state.agent) {
        log::debug!(
            "spawned {} #{} at tick {} (x={})",
            kind.label(),
            obstacle.id,
            state.tick,
            obstacle.pos.x
        );
        state.obstacles.push(obstacle);
        state.last_spawn_tick = state.tick;
    }
}

/// Obstacle types available at the given score.
fn unlocked_pool(score: u64) -> Vec<ObstacleKind> {
    let mut pool = vec![
        ObstacleKind::Wave,
        ObstacleKind::BirdFlock,
        ObstacleKind::Mines,
    ];
    if score >= TIER_TWO_SCORE {
        pool.push(ObstacleKind::Boat);
        pool.push(ObstacleKind::Shark);
    }
    pool
}

/// Policy point: whether a freshly rolled obstacle may enter the world.
/// Currently every obstacle is considered avoidable; the hook exists so a
/// sequence-solvability policy can slot in without touching the spawner.
fn spawn_is_avoidable(_new: &Obstacle, _existing: &[Obstacle], _agent: &Agent) -> bool {
    true
}

/// Advect all obstacles leftward; retire those fully past the left edge.
pub fn update_obstacles(state: &mut RunState) {
    state.obstacles.retain_mut(|o| {
        o.pos.x -= o.speed;
        o.pos.x + o.size.x > -SPAWN_MARGIN
    });
}

/// Shark vertical tracking: a shark near a jumping agent leaps to the
/// agent's height (the catch is guaranteed); otherwise it holds its
/// surface position.
pub fn update_sharks(state: &mut RunState) {
    let agent_right = state.agent.right();
    let agent_y = state.agent.pos.y;
    let jumping = state.agent.state == AgentState::Jumping;
    let water_y = state.water_y;

    for o in &mut state.obstacles {
        if o.kind != ObstacleKind::Shark {
            continue;
        }
        let gap = o.pos.x - agent_right;
        let close = gap < SHARK_BAND_AHEAD && gap > SHARK_BAND_BEHIND;
        o.pos.y = if jumping && close {
            agent_y
        } else {
            o.kind.spawn_y(water_y)
        };
    }
}

/// Storm timed event: end an expired storm, otherwise roll the per-tick
/// activation chance once the run-in and cooldown gates are both clear.
pub fn update_storm(state: &mut RunState) {
    if state.storm.active
        && state.tick.saturating_sub(state.storm.start_tick) >= STORM_DURATION_TICKS
    {
        state.storm.active = false;
        state.storm.end_tick = state.tick;
        state.storm.last_end_tick = state.tick;
        log::info!("storm ended at tick {}", state.tick);
    }

    let can_start = !state.storm.active
        && state.tick > STORM_MIN_RUN_IN_TICKS
        && state.tick.saturating_sub(state.storm.last_end_tick) >= STORM_COOLDOWN_TICKS;

    if can_start && state.rng.random::<f32>() < STORM_CHANCE_PER_TICK {
        state.storm.active = true;
        state.storm.start_tick = state.tick;
        state.storm.end_tick = 0;
        log::info!("storm started at tick {}", state.tick);
    }
}

/// Recompute the world sense from scratch: the nearest obstacle strictly
/// ahead of the agent, or an empty horizon.
pub fn update_world_sense(state: &mut RunState) {
    let agent = &state.agent;
    let mut nearest: Option<&Obstacle> = None;
    let mut min_distance = f32::INFINITY;

    for o in &state.obstacles {
        if o.pos.x > agent.pos.x {
            let distance = o.pos.x - agent.right();
            if distance < min_distance {
                min_distance = distance;
                nearest = Some(o);
            }
        }
    }

    state.sense = match nearest {
        Some(o) => WorldSense {
            distance: min_distance,
            kind: Some(o.kind),
            height: o.size.y,
        },
        None => WorldSense::default(),
    };
}
