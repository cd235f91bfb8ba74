//! Scripted playback data: frame-addressed events and agent keyframes

use serde::{Deserialize, Serialize};

use super::behavior::BehaviorConfig;

/// What an event does when its frame is reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Ball follows the player in possession
    Possession {
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ball: Option<String>,
    },
    /// Ball flies to the recipient
    Pass {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ball: Option<String>,
    },
    /// Ball flies to a court location (domain coordinates)
    Shot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ball: Option<String>,
    },
    /// Every agent coasts to rest
    Timeout,
    /// Install an arbitrary behavior override on one agent
    Behavior {
        agent: String,
        behaviors: Vec<BehaviorConfig>,
    },
    /// Drop override(s) so authored behaviors resume; all agents when `agent` is absent
    Release {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },
    /// Score, foul, etc. Carried for consumers, no physics effect
    #[serde(other)]
    Other,
}

/// A scripted event fired on one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl GameEvent {
    pub fn new(frame: u64, kind: EventKind) -> Self {
        Self { frame, kind }
    }
}

/// An exact agent position at a frame, in the scene's domain coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: u64,
    #[serde(alias = "agentId")]
    pub agent: String,
    pub x: f32,
    pub y: f32,
}

impl Keyframe {
    pub fn new(frame: u64, agent: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            frame,
            agent: agent.into(),
            x,
            y,
        }
    }
}
