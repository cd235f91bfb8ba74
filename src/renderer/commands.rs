//! Draw commands: the only data handed to a renderer
//!
//! Every command is self-contained: absolute pixel positions, concrete
//! colors, no formulas and no references into the scene.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::scene::{Point, TextAlign};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseCommand {
    pub object_id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub opacity: f32,
    pub layer: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectCommand {
    pub object_id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub border_radius: f32,
    pub opacity: f32,
    pub layer: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCommand {
    pub object_id: String,
    pub x: f32,
    pub y: f32,
    pub x2: f32,
    pub y2: f32,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub opacity: f32,
    pub layer: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCommand {
    pub object_id: String,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    pub fill: Option<String>,
    pub align: TextAlign,
    pub opacity: f32,
    pub layer: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcCommand {
    pub object_id: String,
    pub x: f32,
    pub y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Radians
    pub start_angle: f32,
    pub end_angle: f32,
    pub counterclockwise: bool,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub opacity: f32,
    pub layer: f32,
}

/// Polyline of an object's recent positions, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailCommand {
    pub object_id: String,
    pub points: Vec<Point>,
    pub color: String,
    pub opacity: f32,
    pub width: f32,
    pub layer: f32,
}

/// One renderer-ready primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawCommand {
    Ellipse(EllipseCommand),
    Rect(RectCommand),
    Line(LineCommand),
    Text(TextCommand),
    Arc(ArcCommand),
    Trail(TrailCommand),
}

impl DrawCommand {
    pub fn layer(&self) -> f32 {
        match self {
            DrawCommand::Ellipse(c) => c.layer,
            DrawCommand::Rect(c) => c.layer,
            DrawCommand::Line(c) => c.layer,
            DrawCommand::Text(c) => c.layer,
            DrawCommand::Arc(c) => c.layer,
            DrawCommand::Trail(c) => c.layer,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            DrawCommand::Ellipse(c) => c.opacity,
            DrawCommand::Rect(c) => c.opacity,
            DrawCommand::Line(c) => c.opacity,
            DrawCommand::Text(c) => c.opacity,
            DrawCommand::Arc(c) => c.opacity,
            DrawCommand::Trail(c) => c.opacity,
        }
    }

    pub fn object_id(&self) -> &str {
        match self {
            DrawCommand::Ellipse(c) => &c.object_id,
            DrawCommand::Rect(c) => &c.object_id,
            DrawCommand::Line(c) => &c.object_id,
            DrawCommand::Text(c) => &c.object_id,
            DrawCommand::Arc(c) => &c.object_id,
            DrawCommand::Trail(c) => &c.object_id,
        }
    }

    /// Anchor position; trails have none
    pub fn position(&self) -> Option<Vec2> {
        let (x, y) = match self {
            DrawCommand::Ellipse(c) => (c.x, c.y),
            DrawCommand::Rect(c) => (c.x, c.y),
            DrawCommand::Line(c) => (c.x, c.y),
            DrawCommand::Text(c) => (c.x, c.y),
            DrawCommand::Arc(c) => (c.x, c.y),
            DrawCommand::Trail(_) => return None,
        };
        Some(Vec2::new(x, y))
    }
}

/// Stable sort by layer; equal layers keep their current order
pub fn sort_by_layer(commands: &mut [DrawCommand]) {
    commands.sort_by(|a, b| a.layer().total_cmp(&b.layer()));
}

/// Renderer-independent summary of one visible object this frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub layer: f32,
}

impl ResolvedObject {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, layer: f32) -> DrawCommand {
        DrawCommand::Line(LineCommand {
            object_id: id.to_string(),
            x: 0.0,
            y: 0.0,
            x2: 1.0,
            y2: 1.0,
            stroke: Some("#fff".to_string()),
            stroke_width: 1.0,
            opacity: 1.0,
            layer,
        })
    }

    #[test]
    fn test_sort_by_layer_is_stable() {
        let mut cmds = vec![line("a", 2.0), line("b", 0.0), line("c", 2.0), line("d", -1.0), line("e", 0.0)];
        sort_by_layer(&mut cmds);
        let ids: Vec<&str> = cmds.iter().map(DrawCommand::object_id).collect();
        assert_eq!(ids, ["d", "b", "e", "a", "c"]);
    }

    #[test]
    fn test_command_json_shape() {
        let value = serde_json::to_value(line("l1", 3.0)).unwrap();
        assert_eq!(value["type"], "line");
        assert_eq!(value["objectId"], "l1");
        assert_eq!(value["strokeWidth"], 1.0);
        assert_eq!(value["layer"], 3.0);

        let resolved = ResolvedObject {
            id: "g".to_string(),
            kind: "group".to_string(),
            x: 1.0,
            y: 2.0,
            opacity: 1.0,
            layer: 0.0,
        };
        assert_eq!(serde_json::to_value(&resolved).unwrap()["type"], "group");
    }
}
