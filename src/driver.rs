//! Fixed-rate frame driver
//!
//! Turns irregular wall-clock deltas (display refresh, timer ticks) into a
//! steady sequence of frame numbers. It owns no simulation state: the
//! callback does the work, usually by stepping a [`Session`](crate::Session).

use crate::consts::DEFAULT_FPS;
use crate::settings::Settings;

/// Default cap on frames fired per advance
const MAX_CATCH_UP_FRAMES: u32 = 8;
/// Default clamp on a single wall-clock delta (seconds)
const MAX_DELTA_SECONDS: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct FrameDriver {
    frame_interval: f32,
    /// Next frame number to fire
    frame: u64,
    accumulator: f32,
    /// Running time since start/reset (seconds)
    elapsed: f32,
    running: bool,
    max_catch_up: u32,
    max_delta: f32,
}

impl FrameDriver {
    /// Driver for `fps` frames per second; invalid rates use the default
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { DEFAULT_FPS };
        Self {
            frame_interval: 1.0 / fps,
            frame: 0,
            accumulator: 0.0,
            elapsed: 0.0,
            running: false,
            max_catch_up: MAX_CATCH_UP_FRAMES,
            max_delta: MAX_DELTA_SECONDS,
        }
    }

    /// Driver using the catch-up limits from settings
    pub fn with_settings(fps: f32, settings: &Settings) -> Self {
        let mut driver = Self::new(fps);
        driver.max_catch_up = settings.max_catch_up_frames.max(1);
        if settings.max_delta_seconds.is_finite() && settings.max_delta_seconds > 0.0 {
            driver.max_delta = settings.max_delta_seconds;
        }
        driver
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Pause; the frame counter and partial interval are kept
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to frame 0 with no elapsed time. Running state is unchanged
    pub fn reset(&mut self) {
        self.frame = 0;
        self.accumulator = 0.0;
        self.elapsed = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of frames fired since the last reset
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame_interval(&self) -> f32 {
        self.frame_interval
    }

    /// Feed `delta_seconds` of wall-clock time and fire `on_frame(frame, t)`
    /// once per whole frame interval accumulated.
    ///
    /// At most the catch-up limit fires per call; whole intervals beyond it
    /// are dropped and the fractional remainder is kept. Returns the number
    /// of frames fired. Does nothing while stopped.
    pub fn advance(&mut self, delta_seconds: f32, mut on_frame: impl FnMut(u64, f32)) -> u32 {
        if !self.running || !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return 0;
        }
        let dt = delta_seconds.min(self.max_delta);
        self.elapsed += dt;
        self.accumulator += dt;

        let mut fired = 0;
        while self.accumulator >= self.frame_interval && fired < self.max_catch_up {
            on_frame(self.frame, self.elapsed);
            self.frame += 1;
            self.accumulator -= self.frame_interval;
            fired += 1;
        }
        if self.accumulator >= self.frame_interval {
            log::debug!("frame driver dropping {:.3}s of backlog", self.accumulator);
            self.accumulator %= self.frame_interval;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval() {
        let mut driver = FrameDriver::new(10.0);
        driver.start();
        let mut frames = Vec::new();
        assert_eq!(driver.advance(0.05, |f, _| frames.push(f)), 0);
        assert_eq!(driver.advance(0.06, |f, _| frames.push(f)), 1);
        assert_eq!(driver.advance(0.2, |f, _| frames.push(f)), 2);
        assert_eq!(frames, [0, 1, 2]);
        assert_eq!(driver.frame(), 3);
    }

    #[test]
    fn test_stopped_driver_does_nothing() {
        let mut driver = FrameDriver::new(60.0);
        assert_eq!(driver.advance(1.0, |_, _| panic!("should not fire")), 0);
        driver.start();
        driver.stop();
        assert!(!driver.is_running());
        assert_eq!(driver.advance(1.0, |_, _| panic!("should not fire")), 0);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let settings = Settings {
            max_catch_up_frames: 3,
            max_delta_seconds: 10.0,
            ..Default::default()
        };
        let mut driver = FrameDriver::with_settings(4.0, &settings);
        driver.start();
        assert_eq!(driver.advance(5.1, |_, _| {}), 3);
        // Backlog was dropped; only the remainder carries over
        assert_eq!(driver.advance(0.01, |_, _| {}), 0);
    }

    #[test]
    fn test_reset_restarts_clock() {
        let mut driver = FrameDriver::new(0.0);
        assert!((driver.frame_interval() - 1.0 / 60.0).abs() < 1e-6);
        driver.start();
        driver.advance(0.1, |_, _| {});
        assert!(driver.frame() > 0);
        driver.reset();
        assert_eq!(driver.frame(), 0);
        assert_eq!(driver.elapsed(), 0.0);
        assert!(driver.is_running());
        let mut first = None;
        driver.advance(0.02, |f, t| first = Some((f, t)));
        assert_eq!(first.map(|(f, _)| f), Some(0));
    }
}
