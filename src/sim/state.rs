//! Agent runtime state carried between frames
//!
//! The caller owns the [`AgentStates`] map. Each resolution reads the previous
//! frame's map and returns the next one; nothing here is long-lived.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::expr::{Evaluator, ObjectScope, Scope};
use crate::scene::{BehaviorConfig, SceneObject};

/// Per-agent physics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Wander heading accumulator (radians)
    pub wander_angle: f32,
    /// Current waypoint for follow_path
    pub path_index: usize,
    /// Replaces the authored behaviors until changed by a later event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_override: Option<Vec<BehaviorConfig>>,
    /// Exact position injected by playback for one frame only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframe_pos: Option<Vec2>,
}

/// Agent id -> state. Ordered so neighbor scans are deterministic
pub type AgentStates = BTreeMap<String, AgentState>;

impl AgentState {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            wander_angle: 0.0,
            path_index: 0,
            behavior_override: None,
            keyframe_pos: None,
        }
    }

    /// Initial state from the object's authored values.
    ///
    /// Position formulas are evaluated at frame 0 / t 0 whatever the current
    /// frame, so an agent spawned mid-simulation lands where it would have at
    /// the start.
    pub fn spawn(obj: &SceneObject, ctx: &FrameContext, evaluator: &Evaluator) -> Self {
        let objects = ObjectScope::new();
        let scope = Scope {
            frame: 0,
            t: 0.0,
            width: ctx.width,
            height: ctx.height,
            objects: &objects,
            parent: None,
        };
        let pos = Vec2::new(
            evaluator.eval_number(obj.x.as_ref(), 0.0, &scope),
            evaluator.eval_number(obj.y.as_ref(), 0.0, &scope),
        );
        let vel = obj
            .agent()
            .map(|a| Vec2::new(a.vx.unwrap_or(0.0), a.vy.unwrap_or(0.0)))
            .filter(|v| v.is_finite())
            .unwrap_or(Vec2::ZERO);
        let mut rng = spawn_rng(ctx.seed, &obj.id);

        Self {
            pos,
            vel,
            wander_angle: rng.random::<f32>() * std::f32::consts::TAU,
            ..Self::at(pos)
        }
    }
}

/// Frame being resolved and the canvas it is resolved for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub frame: u64,
    /// Elapsed seconds
    pub t: f32,
    pub width: f32,
    pub height: f32,
    /// Seed for wander randomness
    pub seed: u64,
}

impl FrameContext {
    pub fn new(frame: u64, t: f32, width: f32, height: f32) -> Self {
        Self {
            frame,
            t,
            width,
            height,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// FNV-1a, stable across platforms and releases
fn stream_id(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// RNG for one agent on one frame; identical inputs give identical draws
pub fn agent_rng(seed: u64, frame: u64, id: &str) -> Pcg32 {
    let mixed = seed ^ frame.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ stream_id(id);
    Pcg32::seed_from_u64(mixed)
}

fn spawn_rng(seed: u64, id: &str) -> Pcg32 {
    Pcg32::seed_from_u64(seed ^ stream_id(id))
}
