//! Block-program interpreter
//!
//! The program tree is re-interpreted from the top every tick; there is no
//! instruction pointer. `Forever` bodies simply run again next tick, which
//! gives block programs continuous-control semantics: an `If` is a standing
//! rule, not a one-shot branch. The only thing that persists across ticks
//! is a pending `Wait`.

use crate::ms_to_ticks;
use crate::program::{Condition, Node, Program};
use crate::sim::agent;
use crate::sim::state::{RunState, WaitState, WorldSense};

/// Evaluate a condition against the current world sense. Pure and total:
/// an empty horizon (infinite distance) makes `DistanceLessThan` false and
/// `DistanceGreaterThan` true.
pub fn eval_condition(condition: &Condition, sense: &WorldSense, storm_active: bool) -> bool {
    match *condition {
        Condition::DistanceLessThan { value } => sense.distance < value,
        Condition::DistanceGreaterThan { value } => sense.distance > value,
        Condition::ObstacleTypeEquals { value } => sense.kind == Some(value),
        Condition::StormActive => storm_active,
    }
}

/// Signal threaded out of nested bodies when a `Wait` suspends the rest of
/// the tick's interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Suspended,
}

/// One interpreter step for the current tick.
///
/// While a wait is pending this only checks whether it has elapsed;
/// execution resumes from the top of the tree on the following tick.
pub fn step(program: &Program, state: &mut RunState) {
    if let Some(wait) = state.waiting {
        if state.tick.saturating_sub(wait.start_tick) >= wait.duration_ticks {
            state.waiting = None;
        }
        return;
    }
    exec_nodes(program.nodes(), state);
}

fn exec_nodes(nodes: &[Node], state: &mut RunState) -> Flow {
    for node in nodes {
        match node {
            Node::Action { kind } => agent::apply_action(*kind, state),
            Node::Wait { duration_ms } => {
                // Only one wait can be pending; a nested second wait is a
                // no-op and neither resets nor extends the first.
                if state.waiting.is_none() {
                    state.waiting = Some(WaitState {
                        start_tick: state.tick,
                        duration_ticks: ms_to_ticks(*duration_ms),
                    });
                    return Flow::Suspended;
                }
            }
            Node::Forever { body } => {
                if exec_nodes(body, state) == Flow::Suspended {
                    return Flow::Suspended;
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                let flow = if eval_condition(condition, &state.sense, state.storm.active) {
                    exec_nodes(then_body, state)
                } else if let Some(body) = else_body {
                    exec_nodes(body, state)
                } else {
                    Flow::Continue
                };
                if flow == Flow::Suspended {
                    return Flow::Suspended;
                }
            }
        }
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ActionKind;
    use crate::sim::state::{AgentState, ObstacleKind, SailLevel};

    fn running_state() -> RunState {
        let mut state = RunState::new(42);
        state.begin();
        state
    }

    fn action(kind: ActionKind) -> Node {
        Node::Action { kind }
    }

    #[test]
    fn test_distance_conditions_against_empty_horizon() {
        let sense = WorldSense::default();
        assert!(!eval_condition(
            &Condition::DistanceLessThan { value: 100.0 },
            &sense,
            false
        ));
        assert!(eval_condition(
            &Condition::DistanceGreaterThan { value: 100.0 },
            &sense,
            false
        ));
        assert!(!eval_condition(
            &Condition::ObstacleTypeEquals {
                value: ObstacleKind::Wave
            },
            &sense,
            false
        ));
    }

    #[test]
    fn test_distance_comparisons_are_strict() {
        let sense = WorldSense {
            distance: 100.0,
            kind: Some(ObstacleKind::Wave),
            height: 120.0,
        };
        assert!(!eval_condition(
            &Condition::DistanceLessThan { value: 100.0 },
            &sense,
            false
        ));
        assert!(!eval_condition(
            &Condition::DistanceGreaterThan { value: 100.0 },
            &sense,
            false
        ));
        assert!(eval_condition(
            &Condition::DistanceLessThan { value: 100.1 },
            &sense,
            false
        ));
    }

    #[test]
    fn test_storm_condition() {
        let sense = WorldSense::default();
        assert!(eval_condition(&Condition::StormActive, &sense, true));
        assert!(!eval_condition(&Condition::StormActive, &sense, false));
    }

    #[test]
    fn test_forever_body_executes_once_per_tick() {
        // A forever-wrapped jump fires its effect exactly once per tick:
        // the first tick puts the agent in Jumping, later ticks are
        // guarded no-ops rather than accumulating impulses.
        let program = Program::new(vec![Node::Forever {
            body: vec![action(ActionKind::Jump)],
        }])
        .unwrap();
        let mut state = running_state();

        step(&program, &mut state);
        assert_eq!(state.agent.state, AgentState::Jumping);
        let vel_after_first = state.agent.jump_vel;

        step(&program, &mut state);
        assert_eq!(state.agent.jump_vel, vel_after_first);
    }

    #[test]
    fn test_wait_suspends_rest_of_tick() {
        let program = Program::new(vec![
            action(ActionKind::SailUp),
            Node::Wait { duration_ms: 100 },
            action(ActionKind::SailDown),
        ])
        .unwrap();
        let mut state = running_state();
        state.tick = 1;

        step(&program, &mut state);
        // SailUp ran, SailDown did not: the wait aborted the tick.
        assert_eq!(state.agent.sail, SailLevel::Raised);
        let wait = state.waiting.expect("wait should be pending");
        assert_eq!(wait.start_tick, 1);
        assert_eq!(wait.duration_ticks, ms_to_ticks(100));
    }

    #[test]
    fn test_wait_blocks_until_elapsed() {
        let program = Program::new(vec![
            Node::Wait { duration_ms: 100 },
            action(ActionKind::SailDown),
        ])
        .unwrap();
        let mut state = running_state();
        let wait_ticks = ms_to_ticks(100);

        state.tick = 1;
        step(&program, &mut state);
        assert!(state.waiting.is_some());

        // During the wait nothing executes.
        for t in 2..(1 + wait_ticks) {
            state.tick = t;
            step(&program, &mut state);
            assert_eq!(state.agent.sail, SailLevel::Normal);
        }

        // The tick the wait elapses only clears it; execution resumes the
        // tick after.
        state.tick = 1 + wait_ticks;
        step(&program, &mut state);
        assert!(state.waiting.is_none());
        assert_eq!(state.agent.sail, SailLevel::Normal);

        state.tick = 2 + wait_ticks;
        step(&program, &mut state);
        // Re-executed from the top: a fresh wait is pending again.
        assert!(state.waiting.is_some());
    }

    #[test]
    fn test_second_wait_does_not_reset_pending_wait() {
        let mut state = running_state();
        state.tick = 5;
        state.waiting = Some(WaitState {
            start_tick: 2,
            duration_ticks: 50,
        });

        // Direct body execution with a wait already pending (the external
        // reset path): the pending wait must be left untouched.
        let nodes = vec![Node::Wait { duration_ms: 9000 }];
        exec_nodes(&nodes, &mut state);
        let wait = state.waiting.unwrap();
        assert_eq!(wait.start_tick, 2);
        assert_eq!(wait.duration_ticks, 50);
    }

    #[test]
    fn test_wait_inside_forever_suspends_outer_levels() {
        let program = Program::new(vec![
            Node::Forever {
                body: vec![Node::Wait { duration_ms: 50 }],
            },
            action(ActionKind::SailUp),
        ])
        .unwrap();
        let mut state = running_state();
        step(&program, &mut state);
        assert!(state.waiting.is_some());
        assert_eq!(state.agent.sail, SailLevel::Normal);
    }

    #[test]
    fn test_if_else_branches() {
        let program = Program::new(vec![Node::If {
            condition: Condition::DistanceLessThan { value: 100.0 },
            then_body: vec![action(ActionKind::SailDown)],
            else_body: Some(vec![action(ActionKind::SailUp)]),
        }])
        .unwrap();

        let mut state = running_state();
        step(&program, &mut state);
        assert_eq!(state.agent.sail, SailLevel::Raised);

        let mut state = running_state();
        state.sense = WorldSense {
            distance: 50.0,
            kind: Some(ObstacleKind::Wave),
            height: 120.0,
        };
        step(&program, &mut state);
        assert_eq!(state.agent.sail, SailLevel::Lowered);
    }
}
