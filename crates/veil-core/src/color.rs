//! Color types and HSL ↔ RGB conversion.
//!
//! Theme tokens arrive from the style sheet as `"H S% L%"` triples. They are
//! parsed into [`Hsl`] and converted to linear [0, 1] [`Rgb`] triples that the
//! field shader consumes directly.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── RGB ─────────────────────────────────────────────────────────────────

/// RGB triple, each channel in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Linear interpolation toward `other` (GLSL `mix`). `t` is not clamped.
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Add the same offset to every channel.
    pub fn offset(self, d: f32) -> Rgb {
        Rgb::new(self.r + d, self.g + d, self.b + d)
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// RGBA color, each channel in [0.0, 1.0] once clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Clamp every channel into [0, 1], the way a framebuffer write does.
    pub fn clamped(self) -> Rgba {
        Rgba {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// Quantize to straight (non-premultiplied) 8-bit channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        [
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
            (c.a * 255.0).round() as u8,
        ]
    }
}

// ─── HSL ─────────────────────────────────────────────────────────────────

/// Hue in degrees [0, 360), saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Parse a CSS custom-property token of the form `"H S% L%"`.
    ///
    /// Components are whitespace separated. The `%` suffix on S/L and a
    /// `deg` suffix on H are optional; S/L are always read as percentages.
    pub fn parse(token: &str) -> Result<Self, String> {
        let mut parts = token.split_whitespace();
        let mut next = |what: &str, suffix: &str| -> Result<f32, String> {
            let raw = parts
                .next()
                .ok_or_else(|| format!("HSL token {token:?} is missing {what}"))?;
            let raw = raw.strip_suffix(suffix).unwrap_or(raw);
            raw.parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("HSL token {token:?} has invalid {what} {raw:?}"))
        };

        let h = next("hue", "deg")?;
        let s = next("saturation", "%")?;
        let l = next("lightness", "%")?;

        Ok(Self::new(
            h.rem_euclid(360.0),
            (s / 100.0).clamp(0.0, 1.0),
            (l / 100.0).clamp(0.0, 1.0),
        ))
    }

    pub fn to_rgb(self) -> Rgb {
        hsl_to_rgb(self)
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h, self.s * 100.0, self.l * 100.0)
    }
}

/// Standard piecewise HSL → RGB conversion.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let Hsl { s, l, .. } = hsl;
    if s == 0.0 {
        return Rgb::new(l, l, l);
    }

    let h = hsl.h.rem_euclid(360.0) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Rgb::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Inverse of [`hsl_to_rgb`]. Achromatic inputs report hue 0.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let Rgb { r, g, b } = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let delta = max - min;
    if delta == 0.0 {
        return Hsl::new(0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let sector = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl::new((sector * 60.0).rem_euclid(360.0), s, l)
}
