use rayon::prelude::*;

use crate::config::Params;
use crate::grid::Grid;
use crate::noise::{FractalSettings, fractal_noise};

/// The subset of [`Params`] the compositor reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub color_enabled: bool,
}

impl CompositeSettings {
    pub fn from_params(p: &Params) -> Self {
        Self {
            brightness: p.brightness,
            contrast: p.contrast,
            color_enabled: p.color_enabled,
        }
    }
}

/// Map one noise sample to linear RGBA in [0, 1].
#[inline]
pub fn composite(n: f32, s: &CompositeSettings) -> [f32; 4] {
    let c = n * 0.5 + 0.5;
    let c = ((c - 0.5) * s.contrast + 0.5 + s.brightness / 255.0).clamp(0.0, 1.0);
    // clamp passes NaN through
    let c = if c.is_nan() { 0.0 } else { c };
    if s.color_enabled {
        [c, c * 0.5, 1.0 - c, 1.0]
    } else {
        [c, c, c, 1.0]
    }
}

#[inline]
pub fn to_rgba8(c: [f32; 4]) -> [u8; 4] {
    c.map(|ch| (ch * 255.0).round() as u8)
}

/// One presented image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub time: f32,
    pub rgba: Vec<u8>,
}

/// Field position of a pixel: its centre, y measured from the bottom edge,
/// shifted by the offset and divided by the scale.
#[inline]
pub fn pixel_position(x: usize, y: usize, height: usize, p: &Params) -> (f32, f32) {
    let fx = x as f32 + 0.5;
    let fy = (height - 1 - y) as f32 + 0.5;
    ((fx + p.offset_x) / p.scale, (fy + p.offset_y) / p.scale)
}

/// Evaluate the fractal field for every pixel at noise time `t`.
pub fn sample_field(p: &Params, w: usize, h: usize, t: f32) -> Grid<f32> {
    let settings = FractalSettings::from_params(p);
    Grid::from_fn_par(w, h, |x, y| {
        let (px, py) = pixel_position(x, y, h, p);
        fractal_noise(px, py, t, &settings)
    })
}

/// Composite a sampled field into an RGBA8 buffer.
pub fn composite_field(field: &Grid<f32>, s: &CompositeSettings) -> Vec<u8> {
    let w = field.w;
    let mut rgba = vec![0u8; w * field.h * 4];
    if w == 0 {
        return rgba;
    }

    rgba.par_chunks_mut(w * 4)
        .zip(field.par_rows())
        .for_each(|(out, samples)| {
            for (px, &n) in out.chunks_exact_mut(4).zip(samples) {
                px.copy_from_slice(&to_rgba8(composite(n, s)));
            }
        });

    rgba
}
