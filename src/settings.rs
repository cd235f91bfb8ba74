//! Engine settings
//!
//! Defaults for scenes that leave canvas or timing unspecified, plus limits
//! for stepping and the frame driver. Loaded from JSON; missing fields use
//! the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BACKGROUND, DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::Result;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Canvas ===
    /// Canvas width when the scene has none (pixels)
    pub width: f32,
    /// Canvas height when the scene has none (pixels)
    pub height: f32,
    /// Frame rate when the scene has none
    pub fps: f32,
    /// Background color when the scene has none
    pub background: String,

    // === Simulation ===
    /// Seed for wander randomness and initial wander headings
    pub seed: u64,

    // === Stepping ===
    /// Frames run when a request gives no count (or zero)
    pub default_run_frames: u32,
    /// Upper bound for a single run request
    pub max_run_frames: u32,

    // === Frame driver ===
    /// Most frames fired for one wall-clock advance; older backlog is dropped
    pub max_catch_up_frames: u32,
    /// Longer deltas (tab switch, debugger pause) are clamped to this (seconds)
    pub max_delta_seconds: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Canvas
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            background: DEFAULT_BACKGROUND.to_string(),

            // Simulation
            seed: 0x6761_6d65_6261_6c6c,

            // Stepping
            default_run_frames: 30,
            max_run_frames: 300,

            // Frame driver
            max_catch_up_frames: 8,
            max_delta_seconds: 0.25,
        }
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Frames to run for a request: unspecified or zero uses the default,
    /// anything else is clamped to `1..=max_run_frames`
    pub fn run_frames(&self, requested: Option<u32>) -> u32 {
        let max = self.max_run_frames.max(1);
        match requested {
            None | Some(0) => self.default_run_frames.clamp(1, max),
            Some(n) => n.min(max),
        }
    }
}
