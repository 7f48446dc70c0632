//! Agent action effects and physics
//!
//! Action effects fire when the interpreter executes an action block; each
//! is guarded so repeating the block every tick (the normal case under a
//! `Forever`) applies the effect once. Physics advances every tick
//! regardless of what the program did.

use glam::Vec2;

use crate::consts::*;
use crate::program::ActionKind;
use crate::sim::state::{AgentState, Projectile, RunState, SailLevel};

/// Apply one action block's effect to the agent.
pub fn apply_action(kind: ActionKind, state: &mut RunState) {
    let agent = &mut state.agent;
    match kind {
        ActionKind::Jump => {
            // Only from a settled sail: mid-air or underwater re-jumps are
            // ignored.
            if agent.state == AgentState::Sailing
                && agent.jump_vel == 0.0
                && agent.bob_vel == 0.0
            {
                agent.jump_vel = JUMP_IMPULSE;
                agent.state = AgentState::Jumping;
            }
        }
        ActionKind::Bob => {
            if agent.state == AgentState::Sailing && agent.jump_vel == 0.0 {
                agent.bob_vel = BOB_IMPULSE;
                agent.state = AgentState::Bobbing;
                log::debug!("bob started at tick {}", state.tick);
            }
        }
        ActionKind::Cannon => {
            if agent.cannon_cooldown == 0 {
                agent.projectiles.push(Projectile {
                    pos: Vec2::new(agent.right(), agent.pos.y + agent.size.y / 2.0),
                    size: PROJECTILE_SIZE,
                    speed: PROJECTILE_SPEED,
                });
                agent.cannon_cooldown = CANNON_COOLDOWN_TICKS;
            }
        }
        ActionKind::SailUp => {
            if agent.sail != SailLevel::Raised {
                agent.sail = SailLevel::Raised;
            }
        }
        ActionKind::SailDown => {
            if agent.sail != SailLevel::Lowered {
                agent.sail = SailLevel::Lowered;
            }
        }
    }
}

/// Advance agent kinematics by one tick: cooldown, projectiles, gravity
/// while jumping, buoyancy while bobbing.
pub fn update_agent(state: &mut RunState) {
    let retire_x = state.world_w + SPAWN_MARGIN;
    let surface = state.agent.surface_y(state.water_y);
    let agent = &mut state.agent;

    if agent.cannon_cooldown > 0 {
        agent.cannon_cooldown -= 1;
    }

    agent.projectiles.retain_mut(|p| {
        p.pos.x += p.speed;
        p.pos.x < retire_x
    });

    match agent.state {
        AgentState::Jumping => {
            agent.jump_vel += GRAVITY_PER_TICK;
            agent.pos.y += agent.jump_vel;
            if agent.pos.y >= surface {
                agent.pos.y = surface;
                agent.jump_vel = 0.0;
                agent.state = AgentState::Sailing;
            }
        }
        AgentState::Bobbing => {
            agent.bob_vel -= BUOYANCY_PER_TICK;
            agent.pos.y += agent.bob_vel;
            if agent.pos.y <= surface {
                agent.pos.y = surface;
                agent.bob_vel = 0.0;
                agent.state = AgentState::Sailing;
                log::debug!("bob ended at tick {}", state.tick);
            }
        }
        AgentState::Sailing => {}
    }
}
