//! Steering behaviors
//!
//! Each behavior is a function of the agent's scratch state and its resolved
//! target, returning an unweighted force. [`compute_steering`] weights, sums
//! and clamps them. Neighbor queries read the start-of-frame snapshot only.

use glam::Vec2;
use rand::Rng;

use super::state::{AgentState, AgentStates};
use crate::consts::*;
use crate::expr::ObjectScope;
use crate::scene::{AgentProps, Behavior, BehaviorConfig, Point, Target, Zone};
use crate::{clamp_length, sanitize};

/// Sanitized physics parameters of one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParams {
    pub mass: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub damping: f32,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            max_speed: DEFAULT_MAX_SPEED,
            max_force: DEFAULT_MAX_FORCE,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl AgentParams {
    /// Out-of-range authored values fall back to the defaults
    pub fn from_props(props: &AgentProps) -> Self {
        Self {
            mass: sanitize(props.mass, DEFAULT_MASS, |m| m > 0.0),
            max_speed: sanitize(props.max_speed, DEFAULT_MAX_SPEED, |s| s >= 0.0),
            max_force: sanitize(props.max_force, DEFAULT_MAX_FORCE, |f| f >= 0.0),
            damping: sanitize(props.damping, DEFAULT_DAMPING, |d| d >= 0.0),
        }
    }
}

/// Read-only inputs shared by every behavior of one agent
#[derive(Debug, Clone, Copy)]
pub struct SteeringContext<'a> {
    pub id: &'a str,
    pub params: AgentParams,
    /// Start-of-frame state of every agent
    pub snapshot: &'a AgentStates,
    /// Objects resolved so far this frame
    pub objects: &'a ObjectScope,
}

impl SteeringContext<'_> {
    /// Agents are found in the snapshot, other objects in the resolved scope
    fn resolve(&self, target: &Target) -> Option<Vec2> {
        match target {
            Target::Point(p) => Some((*p).into()),
            Target::Id(id) => self.position_of(id),
        }
    }

    fn position_of(&self, id: &str) -> Option<Vec2> {
        if let Some(agent) = self.snapshot.get(id) {
            return Some(agent.pos);
        }
        let fields = self.objects.get(id)?;
        Some(Vec2::new(*fields.get("x")?, *fields.get("y")?))
    }

    fn agent(&self, id: &str) -> Option<&AgentState> {
        self.snapshot.get(id)
    }

    /// Neighbors other than this agent, in id order
    fn others(&self) -> impl Iterator<Item = &AgentState> {
        self.snapshot
            .iter()
            .filter(move |(other, _)| other.as_str() != self.id)
            .map(|(_, state)| state)
    }
}

pub fn seek(state: &AgentState, target: Vec2, max_speed: f32) -> Vec2 {
    (target - state.pos).normalize_or_zero() * max_speed - state.vel
}

/// Steer directly away; no force beyond `radius` when one is given
pub fn flee(state: &AgentState, target: Vec2, max_speed: f32, radius: Option<f32>) -> Vec2 {
    if radius.is_some_and(|r| state.pos.distance(target) > r) {
        return Vec2::ZERO;
    }
    (state.pos - target).normalize_or_zero() * max_speed - state.vel
}

/// Seek that slows linearly inside `slow_radius` and stops steering on arrival
pub fn arrive(state: &AgentState, target: Vec2, max_speed: f32, slow_radius: f32) -> Vec2 {
    let d = state.pos.distance(target);
    if d < ARRIVE_EPSILON {
        return Vec2::ZERO;
    }
    let speed = if d < slow_radius {
        max_speed * (d / slow_radius)
    } else {
        max_speed
    };
    (target - state.pos).normalize_or_zero() * speed - state.vel
}

/// Where `target` will be by the time this agent could reach it
fn predict(state: &AgentState, target: &AgentState, max_speed: f32) -> Vec2 {
    let t = state.pos.distance(target.pos) / (max_speed + 0.001);
    target.pos + target.vel * t
}

pub fn pursue(state: &AgentState, target: &AgentState, max_speed: f32) -> Vec2 {
    seek(state, predict(state, target, max_speed), max_speed)
}

pub fn evade(state: &AgentState, target: &AgentState, max_speed: f32, radius: Option<f32>) -> Vec2 {
    if radius.is_some_and(|r| state.pos.distance(target.pos) > r) {
        return Vec2::ZERO;
    }
    flee(state, predict(state, target, max_speed), max_speed, None)
}

/// Seek a point on a circle projected ahead of the agent.
///
/// Advances `state.wander_angle` by a random step in `[-strength/2, strength/2)`.
pub fn wander<R: Rng + ?Sized>(
    state: &mut AgentState,
    strength: f32,
    speed: f32,
    max_speed: f32,
    rng: &mut R,
) -> Vec2 {
    state.wander_angle += (rng.random::<f32>() - 0.5) * strength;
    let ahead = state.pos + state.vel.normalize_or_zero() * WANDER_CIRCLE_DISTANCE;
    let target = ahead + Vec2::from_angle(state.wander_angle) * WANDER_CIRCLE_RADIUS;
    seek(state, target, max_speed * speed)
}

/// Steer away from close neighbors, nearer ones weighted more
pub fn separate<'a>(
    state: &AgentState,
    neighbors: impl IntoIterator<Item = &'a AgentState>,
    radius: f32,
    max_speed: f32,
) -> Vec2 {
    let mut steer = Vec2::ZERO;
    let mut count = 0;
    for other in neighbors {
        let d = state.pos.distance(other.pos);
        if d > 0.0 && d < radius {
            steer += (state.pos - other.pos).normalize_or_zero() / d;
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    (steer / count as f32).normalize_or_zero() * max_speed - state.vel
}

/// Match the average heading of neighbors
pub fn align<'a>(
    state: &AgentState,
    neighbors: impl IntoIterator<Item = &'a AgentState>,
    radius: f32,
    max_speed: f32,
) -> Vec2 {
    let (sum, count) = neighbors
        .into_iter()
        .filter(|other| state.pos.distance(other.pos) < radius)
        .fold((Vec2::ZERO, 0), |(sum, n), other| (sum + other.vel, n + 1));
    if count == 0 {
        return Vec2::ZERO;
    }
    (sum / count as f32).normalize_or_zero() * max_speed - state.vel
}

/// Seek the centroid of neighbors
pub fn cohere<'a>(
    state: &AgentState,
    neighbors: impl IntoIterator<Item = &'a AgentState>,
    radius: f32,
    max_speed: f32,
) -> Vec2 {
    let (sum, count) = neighbors
        .into_iter()
        .filter(|other| state.pos.distance(other.pos) < radius)
        .fold((Vec2::ZERO, 0), |(sum, n), other| (sum + other.pos, n + 1));
    if count == 0 {
        return Vec2::ZERO;
    }
    seek(state, sum / count as f32, max_speed)
}

/// Seek the current waypoint, advancing `state.path_index` when it is reached
pub fn follow_path(state: &mut AgentState, path: &[Point], looped: bool, max_speed: f32) -> Vec2 {
    if path.is_empty() {
        return Vec2::ZERO;
    }
    // The path may have been edited since the index was stored
    let last = path.len() - 1;
    state.path_index = state.path_index.min(last);

    let current: Vec2 = path[state.path_index].into();
    if state.pos.distance(current) < PATH_REACH_RADIUS {
        state.path_index = match state.path_index + 1 {
            next if next <= last => next,
            _ if looped => 0,
            _ => last,
        };
    }
    seek(state, path[state.path_index].into(), max_speed)
}

/// Nearest point inside the zone, or `None` when `pos` is already inside
pub fn zone_nearest(zone: &Zone, pos: Vec2) -> Option<Vec2> {
    match *zone {
        Zone::Circle { x, y, radius } => {
            let center = Vec2::new(x, y);
            (pos.distance(center) > radius).then_some(center)
        }
        Zone::Rect {
            x,
            y,
            width,
            height,
        } => {
            let half = Vec2::new(width, height) / 2.0;
            let center = Vec2::new(x, y);
            let (min, max) = (center - half, center + half);
            let inside = pos.cmpge(min).all() && pos.cmple(max).all();
            (!inside).then(|| pos.clamp(min, max))
        }
    }
}

/// No force inside the zone, otherwise head back to it
pub fn maintain_zone(state: &AgentState, zone: &Zone, max_speed: f32) -> Vec2 {
    match zone_nearest(zone, state.pos) {
        Some(target) => seek(state, target, max_speed),
        None => Vec2::ZERO,
    }
}

fn behavior_force<R: Rng + ?Sized>(
    behavior: &Behavior,
    ctx: &SteeringContext<'_>,
    state: &mut AgentState,
    rng: &mut R,
) -> Option<Vec2> {
    let max_speed = ctx.params.max_speed;
    let force = match behavior {
        Behavior::Seek { target } | Behavior::FastBreak { target } => {
            seek(state, ctx.resolve(target)?, max_speed)
        }
        Behavior::Flee { target, radius } => flee(state, ctx.resolve(target)?, max_speed, *radius),
        Behavior::Arrive {
            target,
            slow_radius,
        } => arrive(
            state,
            ctx.resolve(target)?,
            max_speed,
            slow_radius.unwrap_or(DEFAULT_SLOW_RADIUS),
        ),
        Behavior::Pursue { target } => pursue(state, ctx.agent(target)?, max_speed),
        Behavior::Evade { target, radius } => evade(state, ctx.agent(target)?, max_speed, *radius),
        Behavior::Wander { strength, speed } => wander(
            state,
            strength.unwrap_or(DEFAULT_WANDER_STRENGTH),
            speed.unwrap_or(DEFAULT_WANDER_SPEED),
            max_speed,
            rng,
        ),
        Behavior::Separate { radius } => separate(
            state,
            ctx.others(),
            radius.unwrap_or(DEFAULT_SEPARATE_RADIUS),
            max_speed,
        ),
        Behavior::Align { radius } => align(
            state,
            ctx.others(),
            radius.unwrap_or(DEFAULT_NEIGHBOR_RADIUS),
            max_speed,
        ),
        Behavior::Cohere { radius } => cohere(
            state,
            ctx.others(),
            radius.unwrap_or(DEFAULT_NEIGHBOR_RADIUS),
            max_speed,
        ),
        Behavior::FollowPath { path, looped } => follow_path(state, path, *looped, max_speed),
        Behavior::MaintainZone { zone } | Behavior::DefendZone { zone } => {
            maintain_zone(state, zone, max_speed)
        }
        Behavior::Guard { target } => {
            arrive(state, ctx.agent(target)?.pos, max_speed, GUARD_SLOW_RADIUS)
        }
        Behavior::SetScreen {
            ball_handler,
            offset,
        } => {
            let handler = ctx.agent(ball_handler)?.pos;
            let offset: Vec2 = offset.map(Into::into).unwrap_or(Vec2::ZERO);
            arrive(state, handler + offset, max_speed, SCREEN_SLOW_RADIUS)
        }
        Behavior::Unknown => return None,
    };
    Some(force)
}

/// Weighted sum of every behavior's force, clamped to the agent's max force.
///
/// `state` is the agent's private scratch copy: wander and follow_path write
/// their persistent fields into it. A behavior whose target cannot be
/// resolved contributes nothing.
pub fn compute_steering<R: Rng + ?Sized>(
    behaviors: &[BehaviorConfig],
    ctx: &SteeringContext<'_>,
    state: &mut AgentState,
    rng: &mut R,
) -> Vec2 {
    let mut total = Vec2::ZERO;
    for config in behaviors {
        match behavior_force(&config.behavior, ctx, state, rng) {
            Some(force) if force.is_finite() && config.weight.is_finite() => {
                total += force * config.weight;
            }
            Some(_) => {}
            None => log::debug!(
                "agent '{}': {:?} has no resolvable target",
                ctx.id,
                config.behavior
            ),
        }
    }
    clamp_length(total, ctx.params.max_force)
}
