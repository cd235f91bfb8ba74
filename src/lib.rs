//! Gameball - declarative frame-based 2D scene engine
//!
//! Core modules:
//! - `expr`: Formula language evaluated per frame for animated properties
//! - `scene`: Scene data model (objects, behaviors, events, keyframes)
//! - `sim`: Deterministic resolution (dependency order, steering physics, playback)
//! - `renderer`: Draw command handoff to an external renderer
//! - `driver`: Fixed-rate frame driver
//! - `session`: Owned scene + agent state with mutation and stepping

pub mod coords;
pub mod driver;
pub mod error;
pub mod expr;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod settings;
pub mod sim;

pub use coords::{CourtSide, CourtTransform, CourtVariant, Transform2D, transform_nba_stats_shot};
pub use driver::FrameDriver;
pub use error::{Result, SessionError};
pub use expr::{Evaluator, Scope, Value};
pub use renderer::{DrawCommand, ResolvedObject, TrailRecorder};
pub use scene::{BehaviorConfig, GameEvent, Keyframe, SceneConfig, SceneObject};
pub use session::{RunSummary, Session, StepOutput};
pub use settings::Settings;
pub use sim::{AgentState, AgentStates, FrameContext, ResolveResult, resolve_scene};

use glam::Vec2;

/// Engine defaults
pub mod consts {
    /// Canvas size used when a scene does not specify one
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 600.0;
    pub const DEFAULT_FPS: f32 = 60.0;
    pub const DEFAULT_BACKGROUND: &str = "#05050f";

    /// Agent physics defaults
    pub const DEFAULT_MASS: f32 = 1.0;
    pub const DEFAULT_MAX_SPEED: f32 = 4.0;
    pub const DEFAULT_MAX_FORCE: f32 = 0.3;
    pub const DEFAULT_DAMPING: f32 = 1.0;
    pub const DEFAULT_AGENT_SIZE: f32 = 16.0;

    /// Behavior parameter defaults
    pub const DEFAULT_WEIGHT: f32 = 1.0;
    pub const DEFAULT_SLOW_RADIUS: f32 = 60.0;
    pub const DEFAULT_SEPARATE_RADIUS: f32 = 30.0;
    pub const DEFAULT_NEIGHBOR_RADIUS: f32 = 50.0;
    pub const DEFAULT_WANDER_STRENGTH: f32 = 0.4;
    pub const DEFAULT_WANDER_SPEED: f32 = 1.0;

    /// Arrive stops steering inside this distance
    pub const ARRIVE_EPSILON: f32 = 1.0;
    /// Path follower advances to the next point inside this distance
    pub const PATH_REACH_RADIUS: f32 = 20.0;
    /// Wander circle projected ahead of the agent
    pub const WANDER_CIRCLE_DISTANCE: f32 = 40.0;
    pub const WANDER_CIRCLE_RADIUS: f32 = 30.0;
    /// Guard / screen arrival radii
    pub const GUARD_SLOW_RADIUS: f32 = 20.0;
    pub const SCREEN_SLOW_RADIUS: f32 = 8.0;
    /// Ball arrival radius for possession events
    pub const POSSESSION_SLOW_RADIUS: f32 = 6.0;

    /// Default ball id targeted by possession/pass/shot events
    pub const BALL_ID: &str = "ball";
}

/// Scale `v` down to `max` length if it is longer
#[inline]
pub fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    let len = v.length();
    if len > max && len > 0.0 {
        v * (max / len)
    } else {
        v
    }
}

/// Wrap a coordinate that left `[0, extent]` back onto the canvas
#[inline]
pub fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 || (0.0..=extent).contains(&value) {
        value
    } else {
        value.rem_euclid(extent)
    }
}

/// Use `value` if it is finite and accepted by `valid`, otherwise `fallback`
#[inline]
pub fn sanitize(value: Option<f32>, fallback: f32, valid: impl Fn(f32) -> bool) -> f32 {
    match value {
        Some(v) if v.is_finite() && valid(v) => v,
        _ => fallback,
    }
}
