//! Scene data model
//!
//! A scene is plain data authored as JSON: canvas settings, an ordered list of
//! objects, and optional scripted playback (events and keyframes). The engine
//! only reads it; mutation belongs to the owning [`Session`](crate::Session).

pub mod behavior;
pub mod object;
pub mod playback;

use serde::{Deserialize, Serialize};

pub use behavior::{Behavior, BehaviorConfig, Point, Target, Zone};
pub use object::{
    AgentProps, ArcProps, EdgePolicy, EllipseProps, LineProps, ObjectKind, Paint, RectProps,
    SceneObject, TextAlign, TextProps, TrailConfig,
};
pub use playback::{EventKind, GameEvent, Keyframe};

use crate::coords::CourtTransform;
use crate::settings::Settings;

/// Complete description of a scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyframes: Vec<Keyframe>,
    /// Domain-to-canvas mapping written by scene compilers; used by playback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_transform: Option<CourtTransform>,
}

impl SceneConfig {
    /// Parse a scene from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn find(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Canvas size, falling back to configured defaults for missing or non-positive values
    pub fn canvas_size(&self, settings: &Settings) -> (f32, f32) {
        let pick = |v: Option<f32>, d: f32| v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(d);
        (pick(self.width, settings.width), pick(self.height, settings.height))
    }

    pub fn frame_rate(&self, settings: &Settings) -> f32 {
        self.fps
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(settings.fps)
    }

    /// Agent objects in declaration order
    pub fn agents(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_agent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_defaults() {
        let scene = SceneConfig::from_json(r#"{"objects": []}"#).unwrap();
        let settings = Settings::default();
        assert_eq!(scene.canvas_size(&settings), (800.0, 600.0));
        assert_eq!(scene.frame_rate(&settings), 60.0);
        assert!(scene.events.is_empty());
        assert!(scene.court_transform.is_none());
    }

    #[test]
    fn test_scene_with_playback() {
        let scene = SceneConfig::from_json(
            r#"{
                "width": 1000, "height": 0, "fps": 30,
                "objects": [{"id": "ball", "type": "agent"}, {"id": "r", "type": "rect"}],
                "events": [{"frame": 3, "type": "timeout"}],
                "keyframes": [{"frame": 0, "agent": "ball", "x": 0, "y": 0}],
                "courtTransform": {"sport": "basketball", "variant": "half"}
            }"#,
        )
        .unwrap();
        let settings = Settings::default();
        assert_eq!(scene.canvas_size(&settings), (1000.0, 600.0));
        assert_eq!(scene.frame_rate(&settings), 30.0);
        assert_eq!(scene.agents().count(), 1);
        assert!(scene.contains("r"));
        assert_eq!(scene.keyframes.len(), 1);
        assert!(scene.court_transform.is_some());
    }
}
