//! Session: one scene, its agent states and a frame counter
//!
//! The session is the single writer for its scene. Callers mutate objects and
//! playback data between frames and step the simulation; every step runs
//! playback injection then resolution, feeding the returned agent states
//! into the next step.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::driver::FrameDriver;
use crate::error::{Result, SessionError};
use crate::expr::Evaluator;
use crate::renderer::{DrawCommand, ResolvedObject, TrailRecorder, sort_by_layer};
use crate::scene::{GameEvent, Keyframe, SceneConfig, SceneObject};
use crate::settings::Settings;
use crate::sim::{AgentStates, FrameContext, ResolveResult, process_events, process_keyframes, resolve_scene};

/// Result of running several frames
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub frames_run: u32,
    /// Frame the next step will resolve
    pub end_frame: u64,
    /// Objects as resolved on the last frame run
    pub objects: BTreeMap<String, ResolvedObject>,
}

/// One rendered frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutput {
    pub frame: u64,
    pub t: f32,
    pub background: String,
    /// Scene and trail commands, sorted by layer
    pub commands: Vec<DrawCommand>,
    pub objects: BTreeMap<String, ResolvedObject>,
}

#[derive(Debug)]
pub struct Session {
    scene: SceneConfig,
    frame: u64,
    agent_states: AgentStates,
    trails: TrailRecorder,
    evaluator: Evaluator,
    settings: Settings,
}

impl Session {
    /// Empty scene using the settings' canvas defaults
    pub fn new(settings: Settings) -> Self {
        let scene = SceneConfig {
            background: Some(settings.background.clone()),
            width: Some(settings.width),
            height: Some(settings.height),
            fps: Some(settings.fps),
            ..Default::default()
        };
        Self::from_scene(scene, settings)
    }

    pub fn from_scene(scene: SceneConfig, settings: Settings) -> Self {
        Self {
            scene,
            frame: 0,
            agent_states: AgentStates::new(),
            trails: TrailRecorder::new(),
            evaluator: Evaluator::new(),
            settings,
        }
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Frame the next step will resolve
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn agent_states(&self) -> &AgentStates {
        &self.agent_states
    }

    pub fn get_object(&self, id: &str) -> Result<&SceneObject> {
        self.scene
            .find(id)
            .ok_or_else(|| SessionError::ObjectNotFound(id.to_string()))
    }

    /// Parse an object spec from loosely-typed JSON
    pub fn parse_object(spec: serde_json::Value) -> Result<SceneObject> {
        serde_json::from_value(spec).map_err(|e| SessionError::InvalidSpec(e.to_string()))
    }

    /// Append an object; returns the new object count
    pub fn add_object(&mut self, obj: SceneObject) -> Result<usize> {
        if obj.id.is_empty() {
            return Err(SessionError::InvalidSpec("object spec must include an id".to_string()));
        }
        if self.scene.contains(&obj.id) {
            return Err(SessionError::DuplicateId(obj.id));
        }
        log::debug!("adding {} '{}'", obj.kind.name(), obj.id);
        self.scene.objects.push(obj);
        Ok(self.scene.objects.len())
    }

    /// Replace the object with this id, keeping its position in the scene.
    /// The replacement's own id is ignored.
    pub fn set_object(&mut self, id: &str, mut obj: SceneObject) -> Result<()> {
        let slot = self
            .scene
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| SessionError::ObjectNotFound(id.to_string()))?;
        obj.id = id.to_string();
        *slot = obj;
        Ok(())
    }

    pub fn delete_object(&mut self, id: &str) -> Result<SceneObject> {
        let index = self
            .scene
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| SessionError::ObjectNotFound(id.to_string()))?;
        let removed = self.scene.objects.remove(index);
        self.agent_states.remove(id);
        self.trails.retain_scene(&self.scene);
        Ok(removed)
    }

    /// Swap in a whole new scene and start over from frame 0
    pub fn replace_scene(&mut self, scene: SceneConfig) {
        log::info!("Scene replaced ({} objects)", scene.objects.len());
        self.scene = scene;
        self.clear_runtime();
    }

    /// Replace the scripted events; returns how many there are
    pub fn set_events(&mut self, events: Vec<GameEvent>) -> usize {
        self.scene.events = events;
        self.scene.events.len()
    }

    /// Replace the keyframes; returns how many agents they cover
    pub fn set_keyframes(&mut self, keyframes: Vec<Keyframe>) -> usize {
        self.scene.keyframes = keyframes;
        crate::sim::playback::group_keyframes(&self.scene.keyframes).len()
    }

    fn frame_context(&self, frame: u64) -> FrameContext {
        let (width, height) = self.scene.canvas_size(&self.settings);
        let fps = self.scene.frame_rate(&self.settings);
        FrameContext::new(frame, frame as f32 / fps, width, height).with_seed(self.settings.seed)
    }

    /// Inject playback into `states` and resolve one frame
    fn resolve_frame(&self, ctx: &FrameContext, states: &mut AgentStates) -> ResolveResult {
        process_events(&self.scene, ctx, states, &self.evaluator);
        process_keyframes(&self.scene, ctx, states, &self.evaluator);
        resolve_scene(&self.scene, ctx, states, &self.evaluator)
    }

    /// Advance one frame, returning everything a renderer needs
    pub fn step(&mut self) -> StepOutput {
        let ctx = self.frame_context(self.frame);
        let mut states = std::mem::take(&mut self.agent_states);
        let result = self.resolve_frame(&ctx, &mut states);
        self.agent_states = result.agent_states;
        self.frame += 1;

        let objects = result.objects;
        let mut commands = self.trails.record(&self.scene, |id| objects.get(id));
        commands.extend(result.commands);
        sort_by_layer(&mut commands);

        StepOutput {
            frame: ctx.frame,
            t: ctx.t,
            background: self.background(),
            commands,
            objects,
        }
    }

    /// Run `requested` frames (clamped by settings) without rendering
    pub fn run_frames(&mut self, requested: Option<u32>) -> RunSummary {
        let n = self.settings.run_frames(requested);
        let mut objects = BTreeMap::new();
        for _ in 0..n {
            let ctx = self.frame_context(self.frame);
            let mut states = std::mem::take(&mut self.agent_states);
            let result = self.resolve_frame(&ctx, &mut states);
            self.agent_states = result.agent_states;
            self.frame += 1;
            objects = result.objects;
        }
        log::info!("Ran {n} frames, now at frame {}", self.frame);
        RunSummary {
            frames_run: n,
            end_frame: self.frame,
            objects,
        }
    }

    /// Resolve the current frame without advancing or keeping any state
    pub fn current_state(&self) -> ResolveResult {
        let ctx = self.frame_context(self.frame);
        let mut states = self.agent_states.clone();
        self.resolve_frame(&ctx, &mut states)
    }

    /// Back to frame 0 with fresh agents
    pub fn reset(&mut self) {
        log::info!("Simulation reset");
        self.clear_runtime();
    }

    fn clear_runtime(&mut self) {
        self.frame = 0;
        self.agent_states.clear();
        self.trails.clear();
        self.evaluator.clear_cache();
    }

    /// Feed wall-clock time through `driver`, stepping once per frame it fires.
    /// Returns the last frame produced, if any.
    pub fn tick(&mut self, driver: &mut FrameDriver, delta_seconds: f32) -> Option<StepOutput> {
        let mut last = None;
        driver.advance(delta_seconds, |_, _| last = Some(self.step()));
        last
    }

    pub fn background(&self) -> String {
        self.scene
            .background
            .clone()
            .unwrap_or_else(|| self.settings.background.clone())
    }

    /// Frame driver matching this scene's frame rate
    pub fn driver(&self) -> FrameDriver {
        FrameDriver::with_settings(self.scene.frame_rate(&self.settings), &self.settings)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
