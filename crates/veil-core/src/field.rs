//! The atmospheric noise field.
//!
//! [`shade`] maps a normalized surface coordinate and an elapsed time to the
//! color of one pixel of the veil. Three octaves of simplex noise drift at
//! different speeds, a soft vignette attenuates the edges, and the result
//! nudges the theme's base color a few percent toward its accent color.

use crate::color::{Rgb, Rgba};
use crate::noise::simplex2;
use crate::theme::ThemeSample;
use serde::{Deserialize, Serialize};

/// Global time multiplier; keeps the drift slow.
pub const TIME_SCALE: f32 = 0.05;
/// uv → noise-space scale.
pub const SPATIAL_SCALE: f32 = 2.0;
/// Strength of the radial edge attenuation.
pub const VIGNETTE_STRENGTH: f32 = 0.3;
/// Accent blend weight in dark mode.
pub const DARK_ACCENT_BLEND: f32 = 0.03;
/// Accent blend weight in light mode.
pub const LIGHT_ACCENT_BLEND: f32 = 0.01;
/// Amplitude of the per-pixel texture dither.
pub const DITHER: f32 = 0.02;
/// Output alpha in dark mode.
pub const DARK_ALPHA: f32 = 0.4;
/// Output alpha in light mode.
pub const LIGHT_ALPHA: f32 = 0.2;

/// One octave: frequency multiplier, amplitude, mix weight, drift speed.
struct Octave {
    frequency: f32,
    amplitude: f32,
    weight: f32,
    drift: f32,
}

const OCTAVES: [Octave; 3] = [
    // Large scale movement
    Octave {
        frequency: 1.0,
        amplitude: 1.0,
        weight: 0.3,
        drift: 0.1,
    },
    // Medium detail
    Octave {
        frequency: 2.0,
        amplitude: 0.5,
        weight: 0.3,
        drift: 0.15,
    },
    // Fine detail, drifting the other way
    Octave {
        frequency: 4.0,
        amplitude: 0.25,
        weight: 0.2,
        drift: -0.08,
    },
];

/// Everything one frame needs. Recomputed every frame, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    /// Seconds since the effect started, excluding paused time.
    pub elapsed: f32,
    pub base: Rgb,
    pub accent: Rgb,
    pub is_dark: bool,
}

impl RenderState {
    pub fn new(elapsed: f32, theme: ThemeSample) -> Self {
        Self {
            elapsed,
            base: theme.base,
            accent: theme.accent,
            is_dark: theme.is_dark,
        }
    }

    /// Shade one normalized coordinate with this frame's parameters.
    pub fn shade(&self, uv: (f32, f32)) -> Rgba {
        shade(uv, self.elapsed, self.base, self.accent, self.is_dark)
    }
}

/// Radial attenuation factor: 1.0 at the centre, falling linearly with
/// distance. Reaches zero at distance 1/0.3 and goes negative beyond.
pub fn vignette(uv: (f32, f32)) -> f32 {
    let dx = uv.0 - 0.5;
    let dy = uv.1 - 0.5;
    1.0 - (dx * dx + dy * dy).sqrt() * VIGNETTE_STRENGTH
}

/// Layered noise at sample position `p` for already-scaled `time`,
/// remapped from about [-1, 1] to about [0, 1].
pub fn octaves(p: (f32, f32), time: f32) -> f32 {
    let mut n = 0.0;
    for o in &OCTAVES {
        let t = time * o.drift;
        n += simplex2(p.0 * o.frequency + t, p.1 * o.frequency + t) * o.amplitude * o.weight;
    }
    n * 0.5 + 0.5
}

/// Color of the veil at `uv` after `t` seconds.
///
/// Alpha depends only on `is_dark`. Color channels are clamped to [0, 1]
/// so far-out coordinates, where the vignette goes negative, never produce
/// negative color.
pub fn shade(uv: (f32, f32), t: f32, base: Rgb, accent: Rgb, is_dark: bool) -> Rgba {
    let time = t * TIME_SCALE;
    let p = (uv.0 * SPATIAL_SCALE, uv.1 * SPATIAL_SCALE);

    let noise = octaves(p, time) * vignette(uv);

    let blend = if is_dark {
        DARK_ACCENT_BLEND
    } else {
        LIGHT_ACCENT_BLEND
    };
    let color = base.mix(accent, noise * blend).offset((noise - 0.5) * DITHER);
    let alpha = if is_dark { DARK_ALPHA } else { LIGHT_ALPHA };

    color.with_alpha(alpha).clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rgb = Rgb::new(0.02, 0.03, 0.08);
    const ACCENT: Rgb = Rgb::new(0.98, 0.57, 0.24);

    #[test]
    fn alpha_depends_only_on_scheme() {
        for &t in &[0.0, 0.5, 13.0, 1e4] {
            for &uv in &[(0.0, 0.0), (0.5, 0.5), (1.0, 0.25), (0.9, 1.0)] {
                assert_eq!(shade(uv, t, BASE, ACCENT, true).a, DARK_ALPHA);
                assert_eq!(shade(uv, t, BASE, ACCENT, false).a, LIGHT_ALPHA);
            }
        }
    }

    #[test]
    fn vignette_is_one_at_centre() {
        assert_eq!(vignette((0.5, 0.5)), 1.0);
    }

    #[test]
    fn vignette_reaches_zero_far_out() {
        let d = 3.34_f32;
        assert!(vignette((0.5 + d, 0.5)) <= 0.0);
        assert!(vignette((0.5, 0.5 - d)) <= 0.0);
        assert!(vignette((0.5 + 10.0, 0.5 + 10.0)) < 0.0);
    }

    #[test]
    fn no_negative_channels_where_vignette_is_negative() {
        let black = Rgb::BLACK;
        for &t in &[0.0, 7.0, 120.0] {
            for i in 0..50 {
                let uv = (4.0 + i as f32 * 0.37, -3.0 - i as f32 * 0.11);
                let c = shade(uv, t, black, black, true);
                assert!(c.r >= 0.0 && c.g >= 0.0 && c.b >= 0.0, "{c:?} at {uv:?}");
            }
        }
    }

    #[test]
    fn stays_close_to_base_color() {
        // Accent influence is at most 3% and dither at most ±1%.
        for i in 0..=10 {
            for j in 0..=10 {
                let uv = (i as f32 / 10.0, j as f32 / 10.0);
                let c = shade(uv, 42.0, BASE, ACCENT, true);
                assert!((c.r - BASE.r).abs() < 0.06, "{c:?}");
                assert!((c.g - BASE.g).abs() < 0.06, "{c:?}");
                assert!((c.b - BASE.b).abs() < 0.06, "{c:?}");
            }
        }
    }

    #[test]
    fn field_drifts_over_time() {
        let uv = (0.3, 0.7);
        let a = octaves((uv.0 * 2.0, uv.1 * 2.0), 0.0);
        let b = octaves((uv.0 * 2.0, uv.1 * 2.0), 60.0 * TIME_SCALE);
        assert_ne!(a, b);
    }

    #[test]
    fn render_state_delegates_to_shade() {
        let state = RenderState {
            elapsed: 3.0,
            base: BASE,
            accent: ACCENT,
            is_dark: false,
        };
        assert_eq!(state.shade((0.2, 0.8)), shade((0.2, 0.8), 3.0, BASE, ACCENT, false));
    }
}
