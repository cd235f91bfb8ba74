//! Position history for objects with a trail

use std::collections::{HashMap, VecDeque};

use super::commands::{DrawCommand, ResolvedObject, TrailCommand};
use crate::scene::{Point, SceneConfig};

/// Trails draw just beneath their owner
const TRAIL_LAYER_OFFSET: f32 = 0.5;

/// Rolling per-object history, fed with each frame's resolved objects
#[derive(Debug, Clone, Default)]
pub struct TrailRecorder {
    history: HashMap<String, VecDeque<Point>>,
}

impl TrailRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append this frame's positions and return the trail commands to draw.
    ///
    /// Objects not resolved this frame are skipped and keep their history.
    /// History of objects whose trail was removed (or has zero length) is
    /// dropped.
    pub fn record<'a>(
        &mut self,
        scene: &SceneConfig,
        resolved: impl Fn(&str) -> Option<&'a ResolvedObject>,
    ) -> Vec<DrawCommand> {
        self.retain_scene(scene);
        let mut commands = Vec::new();
        for obj in &scene.objects {
            let Some(trail) = obj.trail.as_ref().filter(|t| t.length > 0) else {
                continue;
            };
            let Some(current) = resolved(&obj.id) else { continue };

            let history = self.history.entry(obj.id.clone()).or_default();
            history.push_back(Point::new(current.x, current.y));
            while history.len() > trail.length {
                history.pop_front();
            }

            commands.push(DrawCommand::Trail(TrailCommand {
                object_id: obj.id.clone(),
                points: history.iter().copied().collect(),
                color: trail.color.clone(),
                opacity: trail.opacity,
                width: trail.width,
                layer: obj.layer - TRAIL_LAYER_OFFSET,
            }));
        }
        commands
    }

    /// Recorded points for one object, oldest first
    pub fn points(&self, id: &str) -> impl Iterator<Item = Point> + '_ {
        self.history.get(id).into_iter().flatten().copied()
    }

    /// Drop history of objects that no longer draw a trail in `scene`
    pub fn retain_scene(&mut self, scene: &SceneConfig) {
        self.history.retain(|id, _| {
            scene
                .find(id)
                .and_then(|obj| obj.trail.as_ref())
                .is_some_and(|trail| trail.length > 0)
        });
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
