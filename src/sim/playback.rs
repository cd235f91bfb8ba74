//! Scripted playback injection
//!
//! Runs once per frame before resolution. Events install persistent behavior
//! overrides; keyframes inject a one-frame exact position that the resolver
//! consumes and clears.

use std::collections::BTreeMap;

use glam::Vec2;

use super::state::{AgentState, AgentStates, FrameContext};
use crate::consts::{BALL_ID, POSSESSION_SLOW_RADIUS};
use crate::coords::Transform2D;
use crate::expr::Evaluator;
use crate::scene::{Behavior, BehaviorConfig, EventKind, GameEvent, Keyframe, SceneConfig, Target};

/// Domain-to-canvas mapping for event and keyframe coordinates.
///
/// Without a court transform the coordinates are already canvas pixels.
pub fn domain_transform(scene: &SceneConfig, ctx: &FrameContext) -> Transform2D {
    scene
        .court_transform
        .as_ref()
        .map(|court| court.to_transform(ctx.width, ctx.height))
        .unwrap_or(Transform2D::IDENTITY)
}

/// Mutable state of a scene agent, seeded from its authored values if it has none yet
fn agent_state<'s>(
    scene: &SceneConfig,
    ctx: &FrameContext,
    states: &'s mut AgentStates,
    evaluator: &Evaluator,
    id: &str,
) -> Option<&'s mut AgentState> {
    let Some(obj) = scene.find(id).filter(|o| o.is_agent()) else {
        log::debug!("playback target '{id}' is not an agent in this scene");
        return None;
    };
    Some(
        states
            .entry(id.to_string())
            .or_insert_with(|| AgentState::spawn(obj, ctx, evaluator)),
    )
}

fn set_override(
    scene: &SceneConfig,
    ctx: &FrameContext,
    states: &mut AgentStates,
    evaluator: &Evaluator,
    id: &str,
    behaviors: Vec<BehaviorConfig>,
) {
    if let Some(state) = agent_state(scene, ctx, states, evaluator, id) {
        state.behavior_override = Some(behaviors);
    }
}

fn apply_event(
    event: &GameEvent,
    scene: &SceneConfig,
    ctx: &FrameContext,
    states: &mut AgentStates,
    evaluator: &Evaluator,
) {
    log::debug!("frame {}: applying {:?}", ctx.frame, event.kind);
    match &event.kind {
        EventKind::Possession { agent, ball } => {
            let arrive = Behavior::Arrive {
                target: Target::Id(agent.clone()),
                slow_radius: Some(POSSESSION_SLOW_RADIUS),
            };
            let ball = ball.as_deref().unwrap_or(BALL_ID);
            set_override(scene, ctx, states, evaluator, ball, vec![arrive.into()]);
        }
        EventKind::Pass { to, ball, .. } => {
            let fly = Behavior::FastBreak {
                target: Target::Id(to.clone()),
            };
            let ball = ball.as_deref().unwrap_or(BALL_ID);
            set_override(scene, ctx, states, evaluator, ball, vec![fly.into()]);
        }
        EventKind::Shot { x, y, ball, .. } => {
            let (Some(x), Some(y)) = (x, y) else {
                log::debug!("shot at frame {} has no location", event.frame);
                return;
            };
            let target = domain_transform(scene, ctx).apply(Vec2::new(*x, *y));
            let fly = Behavior::FastBreak {
                target: Target::Point(target.into()),
            };
            let ball = ball.as_deref().unwrap_or(BALL_ID);
            set_override(scene, ctx, states, evaluator, ball, vec![fly.into()]);
        }
        EventKind::Timeout => {
            for obj in scene.agents() {
                set_override(scene, ctx, states, evaluator, &obj.id, Vec::new());
            }
        }
        EventKind::Behavior { agent, behaviors } => {
            set_override(scene, ctx, states, evaluator, agent, behaviors.clone());
        }
        EventKind::Release { agent: Some(agent) } => {
            if let Some(state) = states.get_mut(agent) {
                state.behavior_override = None;
            }
        }
        EventKind::Release { agent: None } => {
            for state in states.values_mut() {
                state.behavior_override = None;
            }
        }
        EventKind::Other => {}
    }
}

/// Apply every event scheduled for `ctx.frame`, in list order
pub fn process_events(
    scene: &SceneConfig,
    ctx: &FrameContext,
    states: &mut AgentStates,
    evaluator: &Evaluator,
) {
    for event in scene.events.iter().filter(|e| e.frame == ctx.frame) {
        apply_event(event, scene, ctx, states, evaluator);
    }
}

/// Keyframes per agent, sorted by frame (stable for equal frames)
pub fn group_keyframes(keyframes: &[Keyframe]) -> BTreeMap<&str, Vec<&Keyframe>> {
    let mut by_agent: BTreeMap<&str, Vec<&Keyframe>> = BTreeMap::new();
    for kf in keyframes {
        by_agent.entry(kf.agent.as_str()).or_default().push(kf);
    }
    for frames in by_agent.values_mut() {
        frames.sort_by_key(|kf| kf.frame);
    }
    by_agent
}

/// Position at `frame` from one agent's sorted keyframes.
///
/// Holds the first position up to the first keyframe, interpolates linearly
/// between bracketing keyframes and returns `None` after the last one.
pub fn interpolate_keyframes(frames: &[&Keyframe], frame: u64) -> Option<Vec2> {
    let first = frames.first()?;
    let last = frames.last()?;
    if frame <= first.frame {
        return Some(Vec2::new(first.x, first.y));
    }
    if frame > last.frame {
        return None;
    }
    let (a, b) = frames
        .windows(2)
        .map(|w| (w[0], w[1]))
        .find(|(a, b)| a.frame <= frame && frame <= b.frame)?;
    let start = Vec2::new(a.x, a.y);
    if a.frame == b.frame {
        return Some(start);
    }
    let t = (frame - a.frame) as f32 / (b.frame - a.frame) as f32;
    Some(start.lerp(Vec2::new(b.x, b.y), t))
}

/// Inject this frame's keyframe positions into `keyframe_pos`
pub fn process_keyframes(
    scene: &SceneConfig,
    ctx: &FrameContext,
    states: &mut AgentStates,
    evaluator: &Evaluator,
) {
    if scene.keyframes.is_empty() {
        return;
    }
    let transform = domain_transform(scene, ctx);
    for (agent, frames) in group_keyframes(&scene.keyframes) {
        let Some(world) = interpolate_keyframes(&frames, ctx.frame) else {
            continue;
        };
        if let Some(state) = agent_state(scene, ctx, states, evaluator, agent) {
            state.keyframe_pos = Some(transform.apply(world));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{CourtTransform, CourtVariant};
    use crate::scene::{AgentProps, ObjectKind, SceneObject};

    fn agent(id: &str, x: f32, y: f32) -> SceneObject {
        SceneObject::new(id, ObjectKind::Agent(AgentProps::default())).at(x, y)
    }

    fn scene() -> SceneConfig {
        SceneConfig {
            objects: vec![
                agent("ball", 10.0, 10.0),
                agent("p1", 100.0, 100.0),
                agent("p2", 200.0, 50.0),
                SceneObject::new("hoop", ObjectKind::Group),
            ],
            ..Default::default()
        }
    }

    fn ctx(frame: u64) -> FrameContext {
        FrameContext::new(frame, frame as f32 / 60.0, 800.0, 600.0)
    }

    #[test]
    fn test_interpolation() {
        let kfs = [Keyframe::new(0, "p1", 0.0, 0.0), Keyframe::new(10, "p1", 10.0, 10.0)];
        let frames: Vec<&Keyframe> = kfs.iter().collect();
        assert_eq!(interpolate_keyframes(&frames, 0), Some(Vec2::ZERO));
        assert_eq!(interpolate_keyframes(&frames, 5), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(interpolate_keyframes(&frames, 10), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(interpolate_keyframes(&frames, 11), None);
        assert_eq!(interpolate_keyframes(&[], 3), None);
    }

    #[test]
    fn test_hold_before_first_and_duplicate_frames() {
        let kfs = [
            Keyframe::new(20, "p1", 7.0, 7.0),
            Keyframe::new(5, "p1", 1.0, 2.0),
            Keyframe::new(20, "p1", 9.0, 9.0),
        ];
        let grouped = group_keyframes(&kfs);
        let frames = &grouped["p1"];
        assert_eq!(frames[0].frame, 5);
        assert_eq!(interpolate_keyframes(frames, 0), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(interpolate_keyframes(frames, 20), Some(Vec2::new(7.0, 7.0)));
    }

    #[test]
    fn test_possession_installs_persistent_override() {
        let mut scene = scene();
        scene.events = vec![GameEvent::new(
            10,
            EventKind::Possession {
                agent: "p1".into(),
                ball: None,
            },
        )];
        let ev = Evaluator::new();
        let mut states = AgentStates::new();

        process_events(&scene, &ctx(9), &mut states, &ev);
        assert!(states.is_empty());

        process_events(&scene, &ctx(10), &mut states, &ev);
        let ball = &states["ball"];
        // Seeded from the authored position, not the origin
        assert_eq!(ball.pos, Vec2::new(10.0, 10.0));
        let expected = vec![BehaviorConfig::new(Behavior::Arrive {
            target: Target::Id("p1".into()),
            slow_radius: Some(POSSESSION_SLOW_RADIUS),
        })];
        assert_eq!(ball.behavior_override.as_ref(), Some(&expected));

        // No event on later frames leaves the override untouched
        process_events(&scene, &ctx(11), &mut states, &ev);
        process_events(&scene, &ctx(12), &mut states, &ev);
        assert_eq!(states["ball"].behavior_override.as_ref(), Some(&expected));
    }

    #[test]
    fn test_timeout_and_release() {
        let mut scene = scene();
        scene.events = vec![
            GameEvent::new(1, EventKind::Timeout),
            GameEvent::new(2, EventKind::Release { agent: Some("p2".into()) }),
            GameEvent::new(3, EventKind::Release { agent: None }),
        ];
        let ev = Evaluator::new();
        let mut states = AgentStates::new();
        process_events(&scene, &ctx(1), &mut states, &ev);
        assert_eq!(states.len(), 3);
        assert!(states.values().all(|s| s.behavior_override == Some(Vec::new())));

        process_events(&scene, &ctx(2), &mut states, &ev);
        assert!(states["p2"].behavior_override.is_none());
        assert!(states["p1"].behavior_override.is_some());

        process_events(&scene, &ctx(3), &mut states, &ev);
        assert!(states.values().all(|s| s.behavior_override.is_none()));
    }

    #[test]
    fn test_shot_uses_court_transform() {
        let mut scene = scene();
        scene.court_transform = Some(CourtTransform::new(CourtVariant::Full));
        scene.events = vec![GameEvent::new(
            0,
            EventKind::Shot {
                from: Some("p1".into()),
                x: Some(0.0),
                y: Some(0.0),
                ball: None,
            },
        )];
        let ev = Evaluator::new();
        let mut states = AgentStates::new();
        process_events(&scene, &ctx(0), &mut states, &ev);
        let overrides = states["ball"].behavior_override.clone().unwrap();
        assert_eq!(
            overrides[0].behavior,
            Behavior::FastBreak {
                target: Target::Point(crate::scene::Point::new(400.0, 300.0))
            }
        );
    }

    #[test]
    fn test_non_agent_targets_are_skipped() {
        let mut scene = scene();
        scene.events = vec![GameEvent::new(
            0,
            EventKind::Pass {
                from: None,
                to: "p2".into(),
                ball: Some("hoop".into()),
            },
        )];
        scene.keyframes = vec![Keyframe::new(0, "nobody", 1.0, 1.0)];
        let ev = Evaluator::new();
        let mut states = AgentStates::new();
        process_events(&scene, &ctx(0), &mut states, &ev);
        process_keyframes(&scene, &ctx(0), &mut states, &ev);
        assert!(states.is_empty());
    }

    #[test]
    fn test_keyframes_inject_canvas_positions() {
        let mut scene = scene();
        scene.keyframes = vec![Keyframe::new(0, "p1", 0.0, 0.0), Keyframe::new(10, "p1", 10.0, 10.0)];
        let ev = Evaluator::new();
        let mut states = AgentStates::new();
        process_keyframes(&scene, &ctx(5), &mut states, &ev);
        assert_eq!(states["p1"].keyframe_pos, Some(Vec2::new(5.0, 5.0)));

        states.clear();
        process_keyframes(&scene, &ctx(11), &mut states, &ev);
        assert!(states.is_empty());

        scene.court_transform = Some(CourtTransform::new(CourtVariant::Full));
        process_keyframes(&scene, &ctx(0), &mut states, &ev);
        assert_eq!(states["p1"].keyframe_pos, Some(Vec2::new(400.0, 300.0)));
    }
}
