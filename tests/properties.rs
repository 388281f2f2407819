//! Property-based invariant tests for the noise field and parameter handling.
//!
//! Verifies:
//! 1. Fractal noise stays near [-1, 1] for any hash operands
//! 2. A single octave is exactly the primitive
//! 3. Octave counts of zero or less give a flat field
//! 4. Composited channels always land in [0, 1], NaN and infinities included
//! 5. Snapshots survive encode then decode unchanged
//! 6. A bulk replace missing any one field changes nothing
//! 7. A steady frame rate is reported as itself after one window

use std::time::{Duration, Instant};

use noisescope::codec;
use noisescope::config::{Field, Params, ParseError};
use noisescope::noise::{FractalSettings, HashOperands, fractal_noise, simplex3};
use noisescope::render::{CompositeSettings, composite};
use noisescope::scheduler::FpsCounter;
use noisescope::store::ParamStore;
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_operands() -> impl Strategy<Value = HashOperands> {
    (
        1.0f32..1000.0,
        1.0f32..1000.0,
        1.0f32..1000.0,
        0.1f32..3.0,
        -1.0f32..1.0,
    )
        .prop_map(|(mod1, mod2, base_mod, mod_mult, mod1_fine)| HashOperands {
            mod1: mod1 + mod1_fine,
            mod2,
            base_mod,
            mod_mult,
        })
}

fn arb_coord() -> impl Strategy<Value = f32> {
    -20.0f32..20.0
}

fn arb_params() -> impl Strategy<Value = Params> {
    (
        (0.1f32..1000.0, -5.0f32..5.0, -255.0f32..255.0, 0.0f32..5.0),
        (-1e4f32..1e4, -1e4f32..1e4, -2i32..12, 0.01f32..1.0, 0.5f32..4.0),
        (1.0f32..1000.0, 1.0f32..1000.0, 1.0f32..1000.0, 0.1f32..3.0),
        (any::<bool>(), -1.0f32..1.0),
    )
        .prop_map(
            |(
                (scale, speed, brightness, contrast),
                (offset_x, offset_y, octaves, persistence, lacunarity),
                (mod1, mod2, base_mod, mod_mult),
                (color_enabled, mod1_fine),
            )| Params {
                scale,
                speed,
                brightness,
                contrast,
                offset_x,
                offset_y,
                octaves,
                persistence,
                lacunarity,
                mod1,
                mod2,
                base_mod,
                mod_mult,
                color_enabled,
                mod1_fine,
            },
        )
}

fn raw_pairs(p: &Params) -> Vec<(String, String)> {
    Field::ALL
        .iter()
        .map(|f| (f.key().to_string(), p.get(*f).to_string()))
        .collect()
}

// ── Noise ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn fractal_noise_stays_near_unit_range(
        x in arb_coord(),
        y in arb_coord(),
        t in 0.0f32..100.0,
        octaves in 1i32..=8,
        persistence in 0.05f32..1.0,
        lacunarity in 1.0f32..2.0,
        hash in arb_operands(),
    ) {
        let settings = FractalSettings { octaves, persistence, lacunarity, hash };
        let n = fractal_noise(x, y, t, &settings);
        prop_assert!(n.abs() <= 1.05, "noise {} at ({}, {}, {}) with {:?}", n, x, y, t, hash);
    }

    #[test]
    fn single_octave_is_the_primitive(
        x in arb_coord(),
        y in arb_coord(),
        t in 0.0f32..100.0,
        persistence in 0.05f32..1.0,
        lacunarity in 1.0f32..3.0,
    ) {
        let settings = FractalSettings {
            octaves: 1,
            persistence,
            lacunarity,
            hash: HashOperands::CLASSIC,
        };
        prop_assert_eq!(
            fractal_noise(x, y, t, &settings),
            simplex3(x, y, t, &HashOperands::CLASSIC)
        );
    }

    #[test]
    fn no_octaves_is_flat(
        x in arb_coord(),
        y in arb_coord(),
        t in 0.0f32..100.0,
        octaves in i32::MIN..=0,
    ) {
        let settings = FractalSettings {
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
            hash: HashOperands::CLASSIC,
        };
        prop_assert_eq!(fractal_noise(x, y, t, &settings), 0.0);
    }
}

// ── Compositing ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn composited_channels_are_in_unit_range(
        n in prop::num::f32::ANY,
        brightness in -1000.0f32..1000.0,
        contrast in -50.0f32..50.0,
        color_enabled in any::<bool>(),
    ) {
        let s = CompositeSettings { brightness, contrast, color_enabled };
        let c = composite(n, &s);
        for ch in c {
            prop_assert!((0.0..=1.0).contains(&ch), "channel {} from {:?}", ch, c);
        }
        prop_assert_eq!(c[3], 1.0);
    }
}

// ── Parameters ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn snapshot_round_trip(p in arb_params()) {
        let back = codec::decode(&codec::encode(&p).unwrap()).unwrap();
        prop_assert_eq!(back, p);
    }

    #[test]
    fn replace_with_every_field_lands_whole(p in arb_params()) {
        let mut store = ParamStore::default();
        store.replace_raw(&raw_pairs(&p)).unwrap();
        prop_assert_eq!(store.snapshot(), p);
    }

    #[test]
    fn replace_missing_a_field_changes_nothing(
        p in arb_params(),
        missing in 0usize..Field::COUNT,
    ) {
        let mut store = ParamStore::default();
        let before = store.snapshot();
        let mut pairs = raw_pairs(&p);
        pairs.remove(missing);

        let err = store.replace_raw(&pairs).unwrap_err();
        prop_assert_eq!(err, ParseError::MissingField(Field::ALL[missing]));
        prop_assert_eq!(store.snapshot(), before);
    }
}

// ── Frame rate ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn steady_rate_is_reported_after_one_window(rate in 1u32..=240) {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        for k in 1..rate {
            let now = start + Duration::from_secs_f64(k as f64 / rate as f64);
            prop_assert_eq!(fps.tick(now), None);
        }
        prop_assert_eq!(fps.tick(start + Duration::from_secs(1)), Some(rate));
    }
}
