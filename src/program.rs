//! Block-program model
//!
//! The typed form of what the visual editor produces: a tree of action,
//! wait, forever, and if/else nodes. Built once before a run, validated up
//! front, and immutable while the simulation executes it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::ObstacleKind;

/// Maximum container nesting the editor can produce; anything deeper is
/// rejected at build time rather than risking a blown stack mid-tick.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Action block kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    SailUp,
    SailDown,
    Jump,
    Cannon,
    Bob,
}

/// Condition attached to an if/if-else block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    /// Nearest obstacle ahead is strictly closer than `value`
    DistanceLessThan { value: f32 },
    /// Nearest obstacle ahead is strictly farther than `value`
    /// (also true when nothing is ahead)
    DistanceGreaterThan { value: f32 },
    /// Nearest obstacle ahead is of the given type
    ObstacleTypeEquals { value: ObstacleKind },
    /// A storm is currently active
    StormActive,
}

/// A single block in the program tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Node {
    Action {
        kind: ActionKind,
    },
    Wait {
        duration_ms: u32,
    },
    Forever {
        body: Vec<Node>,
    },
    If {
        condition: Condition,
        then_body: Vec<Node>,
        #[serde(default)]
        else_body: Option<Vec<Node>>,
    },
}

/// Errors surfaced when building a program, before a run ever starts
#[derive(Debug, Error, PartialEq)]
pub enum ProgramError {
    #[error("program has no blocks")]
    Empty,
    #[error("blocks nested deeper than {MAX_NESTING_DEPTH} levels")]
    TooDeep,
    #[error("distance operand must be finite and non-negative (got {0})")]
    BadDistance(f32),
    #[error("unparseable program: {0}")]
    Parse(String),
}

/// A validated, immutable block program. Construction always goes through
/// validation; there is no way to smuggle an unchecked tree into a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    /// Validate and seal a block tree.
    pub fn new(nodes: Vec<Node>) -> Result<Self, ProgramError> {
        if nodes.is_empty() {
            return Err(ProgramError::Empty);
        }
        validate_nodes(&nodes, 0)?;
        Ok(Self { nodes })
    }

    /// Parse the editor's JSON export and validate it.
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        let nodes: Vec<Node> =
            serde_json::from_str(json).map_err(|err| ProgramError::Parse(err.to_string()))?;
        Self::new(nodes)
    }

    /// Top-level block list, in execution order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

fn validate_nodes(nodes: &[Node], depth: usize) -> Result<(), ProgramError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ProgramError::TooDeep);
    }
    for node in nodes {
        match node {
            Node::Action { .. } | Node::Wait { .. } => {}
            Node::Forever { body } => validate_nodes(body, depth + 1)?,
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                validate_condition(condition)?;
                validate_nodes(then_body, depth + 1)?;
                if let Some(body) = else_body {
                    validate_nodes(body, depth + 1)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_condition(condition: &Condition) -> Result<(), ProgramError> {
    match *condition {
        Condition::DistanceLessThan { value } | Condition::DistanceGreaterThan { value } => {
            if !value.is_finite() || value < 0.0 {
                return Err(ProgramError::BadDistance(value));
            }
        }
        Condition::ObstacleTypeEquals { .. } | Condition::StormActive => {}
    }
    Ok(())
}
