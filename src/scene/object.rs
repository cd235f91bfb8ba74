//! Scene objects: drawable primitives, groups and physics agents

use serde::{Deserialize, Serialize};

use super::behavior::BehaviorConfig;
use crate::expr::{Animatable, AnimatableColor};

/// Deserialize a present field as `Some`, so a literal `null` is kept as a value
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Fading history line drawn behind a moving object by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    pub length: usize,
    pub color: String,
    pub opacity: f32,
    pub width: f32,
}

/// Stroke and fill shared by filled shapes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fill: Option<AnimatableColor>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stroke: Option<AnimatableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Animatable<f32>>,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<Animatable<f32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stroke: Option<AnimatableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_x: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_y: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_angle: Option<Animatable<f32>>,
    #[serde(default)]
    pub counterclockwise: bool,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Animatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fill: Option<AnimatableColor>,
    #[serde(default)]
    pub align: TextAlign,
}

/// What happens when an agent crosses the canvas edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Teleport to the opposite edge
    Wrap,
    /// No clamping; agents may leave the visible canvas
    #[default]
    #[serde(rename = "none")]
    Open,
}

/// Physics-driven object steered by behaviors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Animatable<f32>>,
    #[serde(flatten)]
    pub paint: Paint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_force: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f32>,
    /// Initial velocity, used only when the agent has no state yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f32>,
    #[serde(default)]
    pub edges: EdgePolicy,
    #[serde(default)]
    pub behaviors: Vec<BehaviorConfig>,
}

/// Kind-specific part of a scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Ellipse(EllipseProps),
    Rect(RectProps),
    Line(LineProps),
    Arc(ArcProps),
    Text(TextProps),
    Group,
    Agent(AgentProps),
    /// An object type this engine does not know; never drawn
    #[serde(other)]
    Unknown,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Ellipse(_) => "ellipse",
            ObjectKind::Rect(_) => "rect",
            ObjectKind::Line(_) => "line",
            ObjectKind::Arc(_) => "arc",
            ObjectKind::Text(_) => "text",
            ObjectKind::Group => "group",
            ObjectKind::Agent(_) => "agent",
            ObjectKind::Unknown => "unknown",
        }
    }
}

/// One object in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<Animatable<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Animatable<bool>>,
    /// Render order; equal layers keep declaration order
    #[serde(default)]
    pub layer: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail: Option<TrailConfig>,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            parent: None,
            x: None,
            y: None,
            opacity: None,
            visible: None,
            layer: 0.0,
            trail: None,
            kind,
        }
    }

    /// Builder: literal or formula position
    pub fn at(mut self, x: impl Into<Animatable<f32>>, y: impl Into<Animatable<f32>>) -> Self {
        self.x = Some(x.into());
        self.y = Some(y.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn on_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }

    pub fn agent(&self) -> Option<&AgentProps> {
        match &self.kind {
            ObjectKind::Agent(props) => Some(props),
            _ => None,
        }
    }

    pub fn agent_mut(&mut self) -> Option<&mut AgentProps> {
        match &mut self.kind {
            ObjectKind::Agent(props) => Some(props),
            _ => None,
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.kind, ObjectKind::Agent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::behavior::Behavior;

    #[test]
    fn test_object_json_round_trip_fields() {
        let json = r##"{
            "id": "m1", "type": "ellipse", "parent": "p1",
            "x": {"formula": "objects.p1.x + 24"}, "y": 10,
            "width": 5, "height": 5,
            "fill": "#8ab8f0", "stroke": null, "opacity": 0.9, "layer": 3,
            "trail": {"length": 55, "color": "#4a9eff", "opacity": 0.5, "width": 2}
        }"##;
        let obj: SceneObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.parent.as_deref(), Some("p1"));
        assert_eq!(obj.x, Some(Animatable::formula("objects.p1.x + 24")));
        assert_eq!(obj.layer, 3.0);
        assert_eq!(obj.trail.as_ref().map(|t| t.length), Some(55));
        match &obj.kind {
            ObjectKind::Ellipse(props) => {
                assert_eq!(props.paint.fill, Some(Animatable::Literal(Some("#8ab8f0".to_string()))));
                // Explicit null is kept apart from an absent stroke
                assert_eq!(props.paint.stroke, Some(Animatable::Literal(None)));
                assert_eq!(props.width, Some(Animatable::Literal(5.0)));
            }
            other => panic!("Expected ellipse, got {other:?}"),
        }
    }

    #[test]
    fn test_agent_json() {
        let json = r#"{
            "id": "a", "type": "agent", "x": 100, "y": 100,
            "maxSpeed": 3, "maxForce": 0.2, "edges": "wrap", "vx": 1,
            "behaviors": [{"type": "wander", "strength": 0.5}]
        }"#;
        let obj: SceneObject = serde_json::from_str(json).unwrap();
        let agent = obj.agent().unwrap();
        assert_eq!(agent.max_speed, Some(3.0));
        assert_eq!(agent.edges, EdgePolicy::Wrap);
        assert_eq!(agent.vx, Some(1.0));
        assert_eq!(
            agent.behaviors[0].behavior,
            Behavior::Wander {
                strength: Some(0.5),
                speed: None
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_kept_as_unknown() {
        let json = r#"{"id": "future", "type": "spline", "points": [1, 2, 3]}"#;
        let obj: SceneObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.id, "future");
        assert_eq!(obj.kind, ObjectKind::Unknown);
    }

    #[test]
    fn test_group_and_edges_default() {
        let obj: SceneObject = serde_json::from_str(r#"{"id": "g", "type": "group", "x": 5}"#).unwrap();
        assert_eq!(obj.kind, ObjectKind::Group);
        let agent: SceneObject = serde_json::from_str(r#"{"id": "a", "type": "agent"}"#).unwrap();
        assert_eq!(agent.agent().unwrap().edges, EdgePolicy::Open);
    }
}
