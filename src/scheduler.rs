use std::time::{Duration, Instant};

use crate::config::Params;
use crate::noise::{DegenerateConfiguration, FractalSettings};
use crate::Timing;
use crate::render::Frame;

/// Length of the FPS sample window.
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Where frames go. Supplied by the host (window, PNG writer, test double).
pub trait Surface {
    type Error;

    /// Current size in pixels, `(width, height)`.
    fn size(&self) -> (usize, usize);

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

/// Frames-per-second over a sliding one-second window.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(start: Instant) -> Self {
        Self {
            window_start: start,
            frames: 0,
        }
    }

    /// Count one frame at `now`. Returns Some(fps) whenever a full window has passed.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (self.frames as f64 / elapsed_ms * 1000.0).round() as u32;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

/// Drives one render per host refresh and tracks throughput.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    start: Instant,
    fps: FpsCounter,
    frame_number: u64,
    last_fps: Option<u32>,
    last_timings: Vec<Timing>,
    degenerate: Option<DegenerateConfiguration>,
}

impl FrameScheduler {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            fps: FpsCounter::new(start),
            frame_number: 0,
            last_fps: None,
            last_timings: Vec::new(),
            degenerate: None,
        }
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Most recently published FPS.
    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }

    /// Phase timings of the most recent frame.
    pub fn last_timings(&self) -> &[Timing] {
        &self.last_timings
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    /// Render `params` onto `surface` for the host refresh at `now`.
    ///
    /// Returns the FPS when a new value is published.
    pub fn tick<S: Surface>(
        &mut self,
        now: Instant,
        params: &Params,
        surface: &mut S,
    ) -> Result<Option<u32>, S::Error> {
        self.note_configuration(params);

        let (w, h) = surface.size();
        let elapsed = self.elapsed(now).as_secs_f64();
        let (frame, timings) = crate::render_frame(params, w, h, elapsed);
        surface.present(&frame)?;
        self.frame_number += 1;

        for t in &timings {
            log::debug!("frame {} {:10} {:8.2} ms", self.frame_number, t.name, t.ms);
        }
        self.last_timings = timings;

        let fps = self.fps.tick(now);
        if let Some(fps) = fps {
            log::info!("{} FPS at {}x{}", fps, w, h);
            self.last_fps = Some(fps);
        }
        Ok(fps)
    }

    fn note_configuration(&mut self, params: &Params) {
        let state = FractalSettings::from_params(params).validate().err();
        if state == self.degenerate {
            return;
        }
        match state {
            Some(reason) => log::warn!("rendering a flat field: {}", reason),
            None => log::info!("fractal configuration usable again"),
        }
        self.degenerate = state;
    }
}
