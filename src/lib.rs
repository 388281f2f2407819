pub mod codec;
pub mod config;
pub mod error;
pub mod grid;
pub mod noise;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod transport;

use std::time::Instant;

use config::Params;
use render::{CompositeSettings, Frame};

pub use error::{Error, Result};

#[derive(Clone, Debug)]
pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Render one full frame of the field.
///
/// `elapsed_secs` is wall-clock time since the animation started; the noise
/// time axis is `elapsed_secs * speed`, multiplied in f64 so long runs keep
/// their resolution.
pub fn render_frame(params: &Params, w: usize, h: usize, elapsed_secs: f64) -> (Frame, Vec<Timing>) {
    let mut timings = Vec::new();
    let total_start = Instant::now();
    let time = (elapsed_secs * f64::from(params.speed)) as f32;

    // 1. Sample fractal noise per pixel
    let t = Instant::now();
    let field = render::sample_field(params, w, h, time);
    timings.push(Timing {
        name: "sample",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Composite to RGBA
    let t = Instant::now();
    let rgba = render::composite_field(&field, &CompositeSettings::from_params(params));
    timings.push(Timing {
        name: "composite",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    let frame = Frame {
        width: w,
        height: h,
        time,
        rgba,
    };

    (frame, timings)
}
