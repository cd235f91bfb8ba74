//! Renderer handoff
//!
//! The engine never paints pixels. It produces layer-sorted [`DrawCommand`]s
//! that any 2D backend can execute without knowing the scene model.

pub mod commands;
pub mod trail;

pub use commands::{
    ArcCommand, DrawCommand, EllipseCommand, LineCommand, RectCommand, ResolvedObject, TextCommand,
    TrailCommand, sort_by_layer,
};
pub use trail::TrailRecorder;
