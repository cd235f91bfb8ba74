//! Per-frame scene resolution
//!
//! One call turns a scene plus the previous frame's agent states into draw
//! commands and the next agent states. The inputs are never mutated.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;

use super::order::dependency_order;
use super::state::{AgentState, AgentStates, FrameContext, agent_rng};
use super::steering::{AgentParams, SteeringContext, compute_steering};
use crate::consts::DEFAULT_AGENT_SIZE;
use crate::expr::{Evaluator, Fields, ObjectScope, Scope};
use crate::renderer::{
    ArcCommand, DrawCommand, EllipseCommand, LineCommand, RectCommand, ResolvedObject, TextCommand,
    sort_by_layer,
};
use crate::scene::{
    AgentProps, ArcProps, EdgePolicy, EllipseProps, LineProps, ObjectKind, RectProps, SceneConfig,
    SceneObject, TextProps,
};
use crate::{clamp_length, wrap_coordinate};

const DEFAULT_SHAPE_SIZE: f32 = 20.0;
const DEFAULT_ARC_RADIUS: f32 = 20.0;
const DEFAULT_FONT_SIZE: f32 = 16.0;
const DEFAULT_FONT_FAMILY: &str = "sans-serif";
const WHITE: &str = "#ffffff";

/// Output of one frame
#[derive(Debug, Clone, Default)]
pub struct ResolveResult {
    /// Sorted by layer, declaration order within a layer
    pub commands: Vec<DrawCommand>,
    /// Every object that was visible this frame
    pub objects: BTreeMap<String, ResolvedObject>,
    /// Input for the next frame
    pub agent_states: AgentStates,
}

/// Start-of-frame state for every agent in the scene
fn snapshot_agents(
    ordered: &[&SceneObject],
    prev: &AgentStates,
    ctx: &FrameContext,
    evaluator: &Evaluator,
) -> AgentStates {
    ordered
        .iter()
        .filter(|obj| obj.is_agent())
        .map(|obj| {
            let state = prev
                .get(&obj.id)
                .cloned()
                .unwrap_or_else(|| AgentState::spawn(obj, ctx, evaluator));
            (obj.id.clone(), state)
        })
        .collect()
}

/// Integrate one agent for one frame.
///
/// A keyframe position wins over physics and zeroes velocity. The keyframe
/// is consumed either way; the behavior override carries forward.
fn step_agent(
    obj: &SceneObject,
    props: &AgentProps,
    snapshot: &AgentStates,
    objects: &ObjectScope,
    ctx: &FrameContext,
) -> AgentState {
    let mut state = snapshot
        .get(&obj.id)
        .cloned()
        .unwrap_or_else(|| AgentState::at(Vec2::ZERO));

    if let Some(pos) = state.keyframe_pos.take() {
        state.pos = pos;
        state.vel = Vec2::ZERO;
        return state;
    }

    let params = AgentParams::from_props(props);
    let steering = SteeringContext {
        id: &obj.id,
        params,
        snapshot,
        objects,
    };
    let behaviors = state
        .behavior_override
        .clone()
        .unwrap_or_else(|| props.behaviors.clone());
    let mut rng = agent_rng(ctx.seed, ctx.frame, &obj.id);
    let force = compute_steering(&behaviors, &steering, &mut state, &mut rng);

    let vel = clamp_length((state.vel + force / params.mass) * params.damping, params.max_speed);
    let mut pos = state.pos + vel;
    if props.edges == EdgePolicy::Wrap {
        pos = Vec2::new(wrap_coordinate(pos.x, ctx.width), wrap_coordinate(pos.y, ctx.height));
    }
    state.pos = pos;
    state.vel = vel;
    state
}

fn ellipse(obj: &SceneObject, props: &EllipseProps, ev: &Evaluator, scope: &Scope<'_>) -> EllipseCommand {
    EllipseCommand {
        object_id: obj.id.clone(),
        x: ev.eval_number(obj.x.as_ref(), 0.0, scope),
        y: ev.eval_number(obj.y.as_ref(), 0.0, scope),
        width: ev.eval_number(props.width.as_ref(), DEFAULT_SHAPE_SIZE, scope),
        height: ev.eval_number(props.height.as_ref(), DEFAULT_SHAPE_SIZE, scope),
        fill: ev.eval_color(props.paint.fill.as_ref(), Some(WHITE), scope),
        stroke: ev.eval_color(props.paint.stroke.as_ref(), None, scope),
        stroke_width: props.paint.stroke_width.unwrap_or(1.0),
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

fn rect(obj: &SceneObject, props: &RectProps, ev: &Evaluator, scope: &Scope<'_>) -> RectCommand {
    RectCommand {
        object_id: obj.id.clone(),
        x: ev.eval_number(obj.x.as_ref(), 0.0, scope),
        y: ev.eval_number(obj.y.as_ref(), 0.0, scope),
        width: ev.eval_number(props.width.as_ref(), DEFAULT_SHAPE_SIZE, scope),
        height: ev.eval_number(props.height.as_ref(), DEFAULT_SHAPE_SIZE, scope),
        fill: ev.eval_color(props.paint.fill.as_ref(), Some(WHITE), scope),
        stroke: ev.eval_color(props.paint.stroke.as_ref(), None, scope),
        stroke_width: props.paint.stroke_width.unwrap_or(1.0),
        border_radius: props.border_radius.unwrap_or(0.0),
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

fn line(obj: &SceneObject, props: &LineProps, ev: &Evaluator, scope: &Scope<'_>) -> LineCommand {
    LineCommand {
        object_id: obj.id.clone(),
        x: ev.eval_number(obj.x.as_ref(), 0.0, scope),
        y: ev.eval_number(obj.y.as_ref(), 0.0, scope),
        x2: ev.eval_number(props.x2.as_ref(), 0.0, scope),
        y2: ev.eval_number(props.y2.as_ref(), 0.0, scope),
        stroke: ev.eval_color(props.stroke.as_ref(), Some(WHITE), scope),
        stroke_width: props.stroke_width.unwrap_or(1.0),
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

fn text(obj: &SceneObject, props: &TextProps, ev: &Evaluator, scope: &Scope<'_>) -> TextCommand {
    TextCommand {
        object_id: obj.id.clone(),
        x: ev.eval_number(obj.x.as_ref(), 0.0, scope),
        y: ev.eval_number(obj.y.as_ref(), 0.0, scope),
        text: ev.eval_string(props.text.as_ref(), "", scope),
        font_size: props.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        font_family: props
            .font_family
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        fill: ev.eval_color(props.fill.as_ref(), Some(WHITE), scope),
        align: props.align,
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

fn arc(obj: &SceneObject, props: &ArcProps, ev: &Evaluator, scope: &Scope<'_>) -> ArcCommand {
    let radius_x = ev.eval_number(props.radius_x.as_ref(), DEFAULT_ARC_RADIUS, scope);
    ArcCommand {
        object_id: obj.id.clone(),
        x: ev.eval_number(obj.x.as_ref(), 0.0, scope),
        y: ev.eval_number(obj.y.as_ref(), 0.0, scope),
        radius_x,
        radius_y: ev.eval_number(props.radius_y.as_ref(), radius_x, scope),
        start_angle: ev.eval_number(props.start_angle.as_ref(), 0.0, scope),
        end_angle: ev.eval_number(props.end_angle.as_ref(), TAU, scope),
        counterclockwise: props.counterclockwise,
        fill: ev.eval_color(props.paint.fill.as_ref(), None, scope),
        stroke: ev.eval_color(props.paint.stroke.as_ref(), Some(WHITE), scope),
        stroke_width: props.paint.stroke_width.unwrap_or(1.0),
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

fn agent_command(
    obj: &SceneObject,
    props: &AgentProps,
    state: &AgentState,
    ev: &Evaluator,
    scope: &Scope<'_>,
) -> EllipseCommand {
    EllipseCommand {
        object_id: obj.id.clone(),
        x: state.pos.x,
        y: state.pos.y,
        width: ev.eval_number(props.width.as_ref(), DEFAULT_AGENT_SIZE, scope),
        height: ev.eval_number(props.height.as_ref(), DEFAULT_AGENT_SIZE, scope),
        fill: ev.eval_color(props.paint.fill.as_ref(), Some(WHITE), scope),
        stroke: ev.eval_color(props.paint.stroke.as_ref(), None, scope),
        stroke_width: props.paint.stroke_width.unwrap_or(1.0),
        opacity: ev.eval_number(obj.opacity.as_ref(), 1.0, scope),
        layer: obj.layer,
    }
}

/// Resolve one frame of `config`.
///
/// Objects are processed parents first. Each visible object publishes its
/// numeric fields so later objects can read them through `objects.<id>`.
/// Agents integrate against a snapshot taken before any agent moves.
pub fn resolve_scene(
    config: &SceneConfig,
    ctx: &FrameContext,
    prev: &AgentStates,
    evaluator: &Evaluator,
) -> ResolveResult {
    let ordered = dependency_order(&config.objects);
    let snapshot = snapshot_agents(&ordered, prev, ctx, evaluator);

    let mut published = ObjectScope::new();
    let mut commands = Vec::with_capacity(ordered.len());
    let mut objects = BTreeMap::new();
    let mut agent_states = AgentStates::new();

    for obj in ordered {
        let parent = obj
            .parent
            .as_deref()
            .and_then(|p| objects.get(p))
            .map(ResolvedObject::position);
        let scope = Scope {
            frame: ctx.frame,
            t: ctx.t,
            width: ctx.width,
            height: ctx.height,
            objects: &published,
            parent,
        };

        if !evaluator.eval_bool(obj.visible.as_ref(), true, &scope) {
            // Hidden agents keep their state for when they reappear, minus
            // this frame's keyframe, which is consumed either way
            if let Some(state) = snapshot.get(&obj.id) {
                let mut carried = state.clone();
                carried.keyframe_pos = None;
                agent_states.insert(obj.id.clone(), carried);
            }
            continue;
        }

        let (command, fields): (Option<DrawCommand>, Fields) = match &obj.kind {
            ObjectKind::Ellipse(props) => {
                let c = ellipse(obj, props, evaluator, &scope);
                let fields = Fields::from([
                    ("x", c.x),
                    ("y", c.y),
                    ("width", c.width),
                    ("height", c.height),
                    ("opacity", c.opacity),
                ]);
                (Some(DrawCommand::Ellipse(c)), fields)
            }
            ObjectKind::Rect(props) => {
                let c = rect(obj, props, evaluator, &scope);
                let fields = Fields::from([
                    ("x", c.x),
                    ("y", c.y),
                    ("width", c.width),
                    ("height", c.height),
                    ("opacity", c.opacity),
                ]);
                (Some(DrawCommand::Rect(c)), fields)
            }
            ObjectKind::Line(props) => {
                let c = line(obj, props, evaluator, &scope);
                let fields = Fields::from([
                    ("x", c.x),
                    ("y", c.y),
                    ("x2", c.x2),
                    ("y2", c.y2),
                    ("opacity", c.opacity),
                ]);
                (Some(DrawCommand::Line(c)), fields)
            }
            ObjectKind::Text(props) => {
                let c = text(obj, props, evaluator, &scope);
                let fields = Fields::from([("x", c.x), ("y", c.y), ("opacity", c.opacity)]);
                (Some(DrawCommand::Text(c)), fields)
            }
            ObjectKind::Arc(props) => {
                let c = arc(obj, props, evaluator, &scope);
                let fields = Fields::from([
                    ("x", c.x),
                    ("y", c.y),
                    ("radiusX", c.radius_x),
                    ("radiusY", c.radius_y),
                    ("opacity", c.opacity),
                ]);
                (Some(DrawCommand::Arc(c)), fields)
            }
            ObjectKind::Group => {
                let x = evaluator.eval_number(obj.x.as_ref(), 0.0, &scope);
                let y = evaluator.eval_number(obj.y.as_ref(), 0.0, &scope);
                let opacity = evaluator.eval_number(obj.opacity.as_ref(), 1.0, &scope);
                (None, Fields::from([("x", x), ("y", y), ("opacity", opacity)]))
            }
            ObjectKind::Agent(props) => {
                let next = step_agent(obj, props, &snapshot, &published, ctx);
                let c = agent_command(obj, props, &next, evaluator, &scope);
                let fields = Fields::from([
                    ("x", next.pos.x),
                    ("y", next.pos.y),
                    ("vx", next.vel.x),
                    ("vy", next.vel.y),
                    ("width", c.width),
                    ("height", c.height),
                ]);
                agent_states.insert(obj.id.clone(), next);
                (Some(DrawCommand::Ellipse(c)), fields)
            }
            ObjectKind::Unknown => {
                log::debug!("skipping object '{}' of unknown type", obj.id);
                continue;
            }
        };

        let x = fields.get("x").copied().unwrap_or(0.0);
        let y = fields.get("y").copied().unwrap_or(0.0);
        let opacity = command
            .as_ref()
            .map(DrawCommand::opacity)
            .or_else(|| fields.get("opacity").copied())
            .unwrap_or(1.0);
        objects.insert(
            obj.id.clone(),
            ResolvedObject {
                id: obj.id.clone(),
                kind: obj.kind.name().to_string(),
                x,
                y,
                opacity,
                layer: obj.layer,
            },
        );
        published.insert(obj.id.clone(), fields);
        commands.extend(command);
    }

    sort_by_layer(&mut commands);
    ResolveResult {
        commands,
        objects,
        agent_states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Animatable;
    use crate::scene::{Behavior, BehaviorConfig, Keyframe};
    use crate::sim::playback::process_keyframes;
    use proptest::prelude::*;

    fn ctx(frame: u64) -> FrameContext {
        FrameContext::new(frame, frame as f32 / 60.0, 800.0, 600.0)
    }

    fn agent(id: &str, props: AgentProps) -> SceneObject {
        SceneObject::new(id, ObjectKind::Agent(props))
    }

    fn with_behaviors(behaviors: Vec<BehaviorConfig>) -> AgentProps {
        AgentProps {
            behaviors,
            ..Default::default()
        }
    }

    fn states(entries: &[(&str, Vec2, Vec2)]) -> AgentStates {
        entries
            .iter()
            .map(|(id, pos, vel)| {
                (
                    id.to_string(),
                    AgentState {
                        vel: *vel,
                        ..AgentState::at(*pos)
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_separation_moves_apart() {
        let scene = SceneConfig {
            objects: vec![
                agent("a", with_behaviors(vec![Behavior::Separate { radius: Some(30.0) }.into()])),
                agent("b", AgentProps::default()),
            ],
            ..Default::default()
        };
        let prev = states(&[
            ("a", Vec2::new(100.0, 100.0), Vec2::ZERO),
            ("b", Vec2::new(110.0, 100.0), Vec2::ZERO),
        ]);
        let before = prev["a"].pos.distance(prev["b"].pos);
        let out = resolve_scene(&scene, &ctx(1), &prev, &Evaluator::new());
        let after = out.agent_states["a"].pos.distance(out.agent_states["b"].pos);
        assert!(after > before, "{after} should exceed {before}");
        assert_eq!(out.agent_states["b"].pos, Vec2::new(110.0, 100.0));
    }

    #[test]
    fn test_wrap_at_right_edge() {
        let mut props = AgentProps {
            max_speed: Some(10.0),
            ..Default::default()
        };
        props.edges = EdgePolicy::Wrap;
        let scene = SceneConfig {
            objects: vec![agent("a", props)],
            ..Default::default()
        };
        let prev = states(&[("a", Vec2::new(799.0, 300.0), Vec2::new(5.0, 0.0))]);
        let out = resolve_scene(&scene, &ctx(1), &prev, &Evaluator::new());
        let pos = out.agent_states["a"].pos;
        assert!((pos.x - 4.0).abs() < 1e-3, "x = {}", pos.x);
        assert_eq!(pos.y, 300.0);
    }

    #[test]
    fn test_open_edges_leave_canvas() {
        let scene = SceneConfig {
            objects: vec![agent("a", AgentProps::default())],
            ..Default::default()
        };
        let prev = states(&[("a", Vec2::new(799.0, 300.0), Vec2::new(3.0, 0.0))]);
        let out = resolve_scene(&scene, &ctx(1), &prev, &Evaluator::new());
        assert_eq!(out.agent_states["a"].pos.x, 802.0);
    }

    #[test]
    fn test_zero_behaviors_decelerate() {
        let props = AgentProps {
            damping: Some(0.9),
            ..Default::default()
        };
        let scene = SceneConfig {
            objects: vec![agent("a", props)],
            ..Default::default()
        };
        let ev = Evaluator::new();
        let mut prev = states(&[("a", Vec2::ZERO, Vec2::new(3.0, 4.0))]);
        let mut speed = 5.0;
        for frame in 0..20 {
            prev = resolve_scene(&scene, &ctx(frame), &prev, &ev).agent_states;
            let next = prev["a"].vel.length();
            assert!(next < speed);
            speed = next;
        }
    }

    #[test]
    fn test_empty_override_stops_steering() {
        let props = with_behaviors(vec![
            Behavior::Seek {
                target: crate::scene::Point::new(0.0, 0.0).into(),
            }
            .into(),
        ]);
        let scene = SceneConfig {
            objects: vec![agent("a", props)],
            ..Default::default()
        };
        let mut prev = states(&[("a", Vec2::new(100.0, 0.0), Vec2::new(1.0, 0.0))]);
        prev.get_mut("a").unwrap().behavior_override = Some(Vec::new());
        let out = resolve_scene(&scene, &ctx(1), &prev, &Evaluator::new());
        let next = &out.agent_states["a"];
        assert_eq!(next.vel, Vec2::new(1.0, 0.0));
        assert_eq!(next.behavior_override, Some(Vec::new()));
    }

    #[test]
    fn test_keyframe_overrides_and_is_consumed() {
        let props = with_behaviors(vec![Behavior::Wander { strength: None, speed: None }.into()]);
        let scene = SceneConfig {
            objects: vec![agent("a", props)],
            ..Default::default()
        };
        let mut prev = states(&[("a", Vec2::ZERO, Vec2::new(2.0, 2.0))]);
        prev.get_mut("a").unwrap().keyframe_pos = Some(Vec2::new(50.0, 60.0));
        let ev = Evaluator::new();
        let out = resolve_scene(&scene, &ctx(3), &prev, &ev);
        let state = &out.agent_states["a"];
        assert_eq!(state.pos, Vec2::new(50.0, 60.0));
        assert_eq!(state.vel, Vec2::ZERO);
        assert!(state.keyframe_pos.is_none());
        // Input is untouched
        assert!(prev["a"].keyframe_pos.is_some());
    }

    #[test]
    fn test_hidden_agent_drops_keyframe() {
        let mut obj = agent(
            "a",
            AgentProps {
                vx: Some(1.0),
                ..Default::default()
            },
        )
        .at(100.0, 100.0);
        obj.visible = Some(Animatable::formula("frame >= 2"));
        let scene = SceneConfig {
            objects: vec![obj],
            keyframes: vec![Keyframe::new(0, "a", 50.0, 50.0), Keyframe::new(1, "a", 60.0, 60.0)],
            ..Default::default()
        };
        let ev = Evaluator::new();
        let mut states = AgentStates::new();
        for frame in 0..2 {
            process_keyframes(&scene, &ctx(frame), &mut states, &ev);
            states = resolve_scene(&scene, &ctx(frame), &states, &ev).agent_states;
            assert!(states["a"].keyframe_pos.is_none());
        }

        // No keyframe applies at frame 2, so physics resumes from the carried state
        process_keyframes(&scene, &ctx(2), &mut states, &ev);
        let out = resolve_scene(&scene, &ctx(2), &states, &ev);
        assert_eq!(out.agent_states["a"].pos, Vec2::new(101.0, 100.0));
        assert_eq!(out.agent_states["a"].vel, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_formula_fallback_and_references() {
        let scene = SceneConfig {
            objects: vec![
                SceneObject::new("bad", ObjectKind::Ellipse(EllipseProps::default()))
                    .at(Animatable::formula("nonexistent * 2"), Animatable::formula("sin(")),
                SceneObject::new("sun", ObjectKind::Ellipse(EllipseProps::default()))
                    .at(Animatable::formula("width / 2"), Animatable::formula("height / 2")),
                SceneObject::new("moon", ObjectKind::Ellipse(EllipseProps::default()))
                    .with_parent("sun")
                    .at(Animatable::formula("parent.x + 50"), Animatable::formula("objects.sun.y")),
            ],
            ..Default::default()
        };
        let out = resolve_scene(&scene, &ctx(0), &AgentStates::new(), &Evaluator::new());
        assert_eq!(out.commands.len(), 3);
        assert_eq!(out.objects["bad"].position(), Vec2::ZERO);
        assert_eq!(out.objects["moon"].position(), Vec2::new(450.0, 300.0));
    }

    #[test]
    fn test_child_declared_first_sees_parent() {
        let scene = SceneConfig {
            objects: vec![
                SceneObject::new("child", ObjectKind::Text(TextProps::default()))
                    .with_parent("g")
                    .at(Animatable::formula("parent.x + 1"), 0.0),
                SceneObject::new("g", ObjectKind::Group).at(10.0, 20.0),
            ],
            ..Default::default()
        };
        let out = resolve_scene(&scene, &ctx(0), &AgentStates::new(), &Evaluator::new());
        assert_eq!(out.objects["child"].x, 11.0);
        // Groups publish but never draw
        assert_eq!(out.commands.len(), 1);
        assert!(out.objects.contains_key("g"));
    }

    #[test]
    fn test_visibility_and_unknown_kinds() {
        let mut hidden = agent("hidden", AgentProps::default());
        hidden.visible = Some(Animatable::formula("frame > 100"));
        let scene = SceneConfig {
            objects: vec![
                hidden,
                SceneObject::new("future", ObjectKind::Unknown),
                SceneObject::new("r", ObjectKind::Rect(RectProps::default()))
                    .at(Animatable::formula("objects.hidden.x"), 0.0),
            ],
            ..Default::default()
        };
        let prev = states(&[("hidden", Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0)), ("gone", Vec2::ZERO, Vec2::ZERO)]);
        let out = resolve_scene(&scene, &ctx(0), &prev, &Evaluator::new());
        assert_eq!(out.commands.len(), 1);
        assert!(!out.objects.contains_key("hidden"));
        // Hidden objects are not published: the reference falls back
        assert_eq!(out.objects["r"].x, 0.0);
        assert_eq!(out.agent_states["hidden"], prev["hidden"]);
        assert!(!out.agent_states.contains_key("gone"));
    }

    #[test]
    fn test_layers_sorted_stably() {
        let scene = SceneConfig {
            objects: vec![
                SceneObject::new("top", ObjectKind::Rect(RectProps::default())).on_layer(5.0),
                SceneObject::new("first", ObjectKind::Rect(RectProps::default())),
                SceneObject::new("second", ObjectKind::Ellipse(EllipseProps::default())),
                SceneObject::new("bottom", ObjectKind::Line(LineProps::default())).on_layer(-1.0),
            ],
            ..Default::default()
        };
        let out = resolve_scene(&scene, &ctx(0), &AgentStates::new(), &Evaluator::new());
        let ids: Vec<&str> = out.commands.iter().map(DrawCommand::object_id).collect();
        assert_eq!(ids, ["bottom", "first", "second", "top"]);
    }

    #[test]
    fn test_spawn_and_arc_defaults() {
        let scene = SceneConfig {
            objects: vec![
                agent("a", AgentProps::default()).at(Animatable::formula("width / 4 + frame"), 10.0),
                SceneObject::new("arc", ObjectKind::Arc(ArcProps::default())),
            ],
            ..Default::default()
        };
        let out = resolve_scene(&scene, &ctx(42), &AgentStates::new(), &Evaluator::new());
        assert_eq!(out.agent_states["a"].pos, Vec2::new(200.0, 10.0));
        match &out.commands[1] {
            DrawCommand::Arc(c) => {
                assert_eq!(c.radius_y, DEFAULT_ARC_RADIUS);
                assert_eq!(c.end_angle, TAU);
                assert_eq!(c.fill, None);
                assert_eq!(c.stroke.as_deref(), Some(WHITE));
            }
            other => panic!("Expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let props = with_behaviors(vec![Behavior::Wander { strength: Some(1.0), speed: None }.into()]);
        let scene = SceneConfig {
            objects: vec![agent("w", props).at(400.0, 300.0)],
            ..Default::default()
        };
        let ev = Evaluator::new();
        let c = ctx(7).with_seed(99);
        let a = resolve_scene(&scene, &c, &AgentStates::new(), &ev);
        let b = resolve_scene(&scene, &c, &AgentStates::new(), &ev);
        assert_eq!(a.agent_states, b.agent_states);
        assert_eq!(a.commands, b.commands);
    }

    proptest! {
        #[test]
        fn prop_speed_never_exceeds_max_speed(
            max_speed in 0.0f32..10.0,
            mass in 0.1f32..5.0,
            vx in -20.0f32..20.0,
            vy in -20.0f32..20.0,
            tx in 0.0f32..800.0,
            ty in 0.0f32..600.0,
        ) {
            let props = AgentProps {
                max_speed: Some(max_speed),
                max_force: Some(5.0),
                mass: Some(mass),
                behaviors: vec![
                    Behavior::Seek { target: crate::scene::Point::new(tx, ty).into() }.into(),
                    Behavior::Wander { strength: Some(3.0), speed: Some(2.0) }.into(),
                ],
                ..Default::default()
            };
            let scene = SceneConfig { objects: vec![agent("a", props)], ..Default::default() };
            let prev = states(&[("a", Vec2::new(400.0, 300.0), Vec2::new(vx, vy))]);
            let out = resolve_scene(&scene, &ctx(1), &prev, &Evaluator::new());
            prop_assert!(out.agent_states["a"].vel.length() <= max_speed * (1.0 + 1e-5) + 1e-6);
        }
    }
}
