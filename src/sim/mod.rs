//! Deterministic simulation module
//!
//! All frame logic lives here. This module must be pure and deterministic:
//! - One resolution call per frame, inputs never mutated
//! - Seeded RNG only
//! - Stable iteration order (agent states keyed by id)
//! - No rendering or platform dependencies

pub mod order;
pub mod playback;
pub mod resolve;
pub mod state;
pub mod steering;

pub use order::dependency_order;
pub use playback::{domain_transform, interpolate_keyframes, process_events, process_keyframes};
pub use resolve::{ResolveResult, resolve_scene};
pub use state::{AgentState, AgentStates, FrameContext, agent_rng};
pub use steering::{AgentParams, SteeringContext, compute_steering};
