use thiserror::Error;

use crate::config::Params;

/// Octave count is capped here regardless of the stored value.
pub const MAX_OCTAVES: i32 = 8;

/// Divisor/multiplier pairs for the two hash stages.
///
/// Stage A reduces the lattice cell index, stage B reduces each permutation
/// round. With [`HashOperands::CLASSIC`] both are plain `mod 289`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashOperands {
    pub mod1: f32,
    pub mod2: f32,
    pub base_mod: f32,
    pub mod_mult: f32,
}

impl HashOperands {
    pub const CLASSIC: Self = Self {
        mod1: 289.0,
        mod2: 289.0,
        base_mod: 289.0,
        mod_mult: 1.0,
    };

    pub fn from_params(p: &Params) -> Self {
        Self {
            mod1: p.mod1_total(),
            mod2: p.mod2,
            base_mod: p.base_mod,
            mod_mult: p.mod_mult,
        }
    }
}

/// `x - floor(x / divisor) * multiplier`. A zero divisor leaves `x` alone.
#[inline]
fn reduce(x: f32, divisor: f32, multiplier: f32) -> f32 {
    if divisor == 0.0 {
        return x;
    }
    x - (x * (1.0 / divisor)).floor() * multiplier
}

/// Stage A: reduce a lattice index by `(mod1 + mod1Fine, mod2)`.
#[inline]
pub fn reduce_modulus_a(v: [f32; 3], ops: &HashOperands) -> [f32; 3] {
    v.map(|x| reduce(x, ops.mod1, ops.mod2))
}

/// Stage B: reduce a permutation round by `(baseMod, baseMod * modMult)`.
#[inline]
pub fn reduce_modulus_b(v: [f32; 4], ops: &HashOperands) -> [f32; 4] {
    v.map(|x| reduce(x, ops.base_mod, ops.base_mod * ops.mod_mult))
}

#[inline]
fn permute(v: [f32; 4], ops: &HashOperands) -> [f32; 4] {
    reduce_modulus_b(v.map(|x| (x * 34.0 + 1.0) * x), ops)
}

#[inline]
fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_72 * r
}

/// GLSL `step(edge, x)`.
#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

#[inline]
fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Column and row on the 7x7 gradient ring for hash value `p`.
///
/// Operands other than the classic ones push `p` far outside `[0, 289)`,
/// where `p - 49 * floor(p / 49)` is no longer exact in f32. The index is
/// therefore taken with `rem_euclid` and both coordinates are clamped to the
/// ring, so every hash maps onto one of the 49 unit gradients.
#[inline]
fn ring_cell(p: f32, n7: f32) -> (f32, f32) {
    let j = p.rem_euclid(49.0);
    // overflowed hash rounds
    let j = if j.is_finite() { j } else { 0.0 };
    let col = (j * n7).floor().clamp(0.0, 6.0);
    let row = (j - 7.0 * col).floor().clamp(0.0, 6.0);
    (col, row)
}

/// 3D simplex noise, approximately in [-1, 1]. The third axis is time.
///
/// Corner gradients come from a 7x7 ring picked by the hash stages, so the
/// modulus operands reshape the pattern without touching the falloff.
pub fn simplex3(x: f32, y: f32, z: f32, ops: &HashOperands) -> f32 {
    const F3: f32 = 1.0 / 3.0;
    const G3: f32 = 1.0 / 6.0;
    // 1/7; as f32 this rounds just above 1/7, which keeps floor(7 * N7) == 1.
    const N7: f32 = 0.142_857_142_857;

    // Skew into the simplex lattice and find the containing cell.
    let s = (x + y + z) * F3;
    let cell = [(x + s).floor(), (y + s).floor(), (z + s).floor()];
    let t = (cell[0] + cell[1] + cell[2]) * G3;
    let x0 = [x - cell[0] + t, y - cell[1] + t, z - cell[2] + t];

    // Rank the offsets to pick the two middle corners.
    let g = [step(x0[1], x0[0]), step(x0[2], x0[1]), step(x0[0], x0[2])];
    let l = g.map(|c| 1.0 - c);
    let i1 = [g[0].min(l[2]), g[1].min(l[0]), g[2].min(l[1])];
    let i2 = [g[0].max(l[2]), g[1].max(l[0]), g[2].max(l[1])];

    let x1 = [0, 1, 2].map(|k| x0[k] - i1[k] + G3);
    let x2 = [0, 1, 2].map(|k| x0[k] - i2[k] + 2.0 * G3);
    let x3 = [0, 1, 2].map(|k| x0[k] - 1.0 + 3.0 * G3);

    // Hash the four corners.
    let cell = reduce_modulus_a(cell, ops);
    let corner = |axis: usize| [0.0, i1[axis], i2[axis], 1.0];
    let (cz, cy, cx) = (corner(2), corner(1), corner(0));
    let p = permute([0, 1, 2, 3].map(|k| cell[2] + cz[k]), ops);
    let p = permute([0, 1, 2, 3].map(|k| p[k] + cell[1] + cy[k]), ops);
    let p = permute([0, 1, 2, 3].map(|k| p[k] + cell[0] + cx[k]), ops);

    let ns_x = N7 * 2.0;
    let ns_y = N7 * 0.5 - 1.0;
    let ns_z = N7;

    let offsets = [x0, x1, x2, x3];
    let mut total = 0.0;
    for k in 0..4 {
        // Gradient on the 7x7 ring, folded onto the octahedron.
        let (gx_, gy_) = ring_cell(p[k], ns_z);
        let gx = gx_ * ns_x + ns_y;
        let gy = gy_ * ns_x + ns_y;
        let h = 1.0 - gx.abs() - gy.abs();
        let sh = -step(h, 0.0);
        let mut grad = [
            gx + (gx.floor() * 2.0 + 1.0) * sh,
            gy + (gy.floor() * 2.0 + 1.0) * sh,
            h,
        ];
        let norm = taylor_inv_sqrt(dot3(grad, grad));
        grad = grad.map(|c| c * norm);

        let off = offsets[k];
        let m = (0.6 - dot3(off, off)).max(0.0);
        let m2 = m * m;
        total += m2 * m2 * dot3(grad, off);
    }
    42.0 * total
}

/// Why a fractal configuration cannot produce a meaningful sum.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DegenerateConfiguration {
    #[error("octaves must be at least 1 (got {0})")]
    NoOctaves(i32),
    #[error("persistence must be positive (got {0})")]
    NonPositivePersistence(f32),
    #[error("lacunarity must be positive (got {0})")]
    NonPositiveLacunarity(f32),
}

/// The subset of [`Params`] the fractal sum reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalSettings {
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub hash: HashOperands,
}

impl FractalSettings {
    pub fn from_params(p: &Params) -> Self {
        Self {
            octaves: p.octaves,
            persistence: p.persistence,
            lacunarity: p.lacunarity,
            hash: HashOperands::from_params(p),
        }
    }

    pub fn validate(&self) -> Result<(), DegenerateConfiguration> {
        if self.octaves <= 0 {
            return Err(DegenerateConfiguration::NoOctaves(self.octaves));
        }
        // Written as negations so NaN counts as non-positive.
        if !(self.persistence > 0.0) {
            return Err(DegenerateConfiguration::NonPositivePersistence(self.persistence));
        }
        if !(self.lacunarity > 0.0) {
            return Err(DegenerateConfiguration::NonPositiveLacunarity(self.lacunarity));
        }
        Ok(())
    }
}

/// Normalized fractal Brownian motion over `simplex3`.
///
/// Degenerate settings and non-finite results evaluate to 0.
pub fn fractal_noise(x: f32, y: f32, t: f32, settings: &FractalSettings) -> f32 {
    if settings.validate().is_err() {
        return 0.0;
    }
    let octaves = settings.octaves.min(MAX_OCTAVES);

    let mut sum = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    let mut norm = 0.0;
    for _ in 0..octaves {
        sum += amp * simplex3(x * freq, y * freq, t, &settings.hash);
        norm += amp;
        amp *= settings.persistence;
        freq *= settings.lacunarity;
    }

    let n = sum / norm;
    if n.is_finite() { n } else { 0.0 }
}
