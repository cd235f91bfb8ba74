//! Steering behavior configuration attached to agents

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_WEIGHT;

/// A literal coordinate in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// What a behavior steers relative to: another object or a fixed point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Id(String),
    Point(Point),
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Id(id.to_string())
    }
}

impl From<Point> for Target {
    fn from(p: Point) -> Self {
        Target::Point(p)
    }
}

/// Region an agent should stay inside; rect zones are centered on (x, y)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Zone {
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

/// One steering behavior and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Behavior {
    Seek {
        target: Target,
    },
    Flee {
        target: Target,
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
    },
    Arrive {
        target: Target,
        #[serde(rename = "slowRadius", skip_serializing_if = "Option::is_none")]
        slow_radius: Option<f32>,
    },
    Pursue {
        target: String,
    },
    Evade {
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
    },
    Wander {
        #[serde(skip_serializing_if = "Option::is_none")]
        strength: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<f32>,
    },
    Separate {
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
    },
    Align {
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
    },
    Cohere {
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
    },
    FollowPath {
        path: Vec<Point>,
        #[serde(rename = "loop", default)]
        looped: bool,
    },
    MaintainZone {
        zone: Zone,
    },
    /// Shadow another agent closely
    Guard {
        target: String,
    },
    DefendZone {
        zone: Zone,
    },
    /// Full-speed run at a target
    FastBreak {
        target: Target,
    },
    /// Hold a spot offset from the ball handler
    SetScreen {
        #[serde(rename = "ballHandler")]
        ball_handler: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<Point>,
    },
    /// A behavior type this engine does not know; contributes no force
    #[serde(other)]
    Unknown,
}

/// A behavior plus the weight its force is scaled by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    #[serde(flatten)]
    pub behavior: Behavior,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    DEFAULT_WEIGHT
}

impl BehaviorConfig {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn weighted(behavior: Behavior, weight: f32) -> Self {
        Self { behavior, weight }
    }
}

impl From<Behavior> for BehaviorConfig {
    fn from(behavior: Behavior) -> Self {
        Self::new(behavior)
    }
}
