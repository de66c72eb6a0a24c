//! Drawing surface sizing and run gating.
//!
//! A surface is the element's CSS box scaled by the device pixel ratio,
//! capped so high-density displays do not quadruple the fill cost.

use crate::config::EffectConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Facts about the runtime that decide whether an effect runs at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Window inner width in CSS px.
    pub viewport_width: f64,
    pub device_pixel_ratio: f64,
    pub prefers_reduced_motion: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            device_pixel_ratio: 1.0,
            prefers_reduced_motion: false,
        }
    }
}

/// Why an effect stays inert for this mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The runtime could not provide the drawing context.
    UnsupportedContext,
    /// Viewport narrower than the mobile breakpoint.
    MobileViewport,
    /// The user asked for reduced motion.
    ReducedMotion,
}

impl Unavailable {
    /// Gates are intentional no-ops; only context failures are worth a warning.
    pub fn is_failure(self) -> bool {
        matches!(self, Unavailable::UnsupportedContext)
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::UnsupportedContext => write!(f, "drawing context not supported"),
            Unavailable::MobileViewport => write!(f, "viewport below mobile breakpoint"),
            Unavailable::ReducedMotion => write!(f, "reduced motion requested"),
        }
    }
}

/// Decide whether the veil may run in this environment.
pub fn check_environment(env: &Environment, config: &EffectConfig) -> Result<(), Unavailable> {
    if env.prefers_reduced_motion {
        return Err(Unavailable::ReducedMotion);
    }
    if config.is_mobile(env.viewport_width) {
        return Err(Unavailable::MobileViewport);
    }
    Ok(())
}

/// Measured size of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub css_width: f64,
    pub css_height: f64,
    /// Effective (capped) pixel ratio.
    pub pixel_ratio: f64,
    /// Backing-store width in device pixels.
    pub width: u32,
    /// Backing-store height in device pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Size a surface from its CSS box. Non-finite or non-positive ratios
    /// count as 1.0; the ratio is capped at `max_ratio`.
    pub fn measure(css_width: f64, css_height: f64, device_ratio: f64, max_ratio: f64) -> Self {
        let ratio = if device_ratio.is_finite() && device_ratio > 0.0 {
            device_ratio.min(max_ratio.max(1.0))
        } else {
            1.0
        };
        let css_width = css_width.max(0.0);
        let css_height = css_height.max(0.0);
        Self {
            css_width,
            css_height,
            pixel_ratio: ratio,
            width: (css_width * ratio).floor() as u32,
            height: (css_height * ratio).floor() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A drawing surface owned by one mounted effect.
pub trait DrawSurface {
    /// Frame parameters handed to [`DrawSurface::present`].
    type Frame;

    /// Apply a new backing-store size. Called on mount and on every resize.
    fn resize(&mut self, size: SurfaceSize);

    /// Draw one frame.
    fn present(&mut self, frame: &Self::Frame);

    /// Free GPU/context resources. Called exactly once, on unmount.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mobile_viewport_is_gated() {
        let env = Environment {
            viewport_width: 500.0,
            ..Environment::default()
        };
        assert_eq!(
            check_environment(&env, &EffectConfig::default()),
            Err(Unavailable::MobileViewport)
        );
    }

    #[test]
    fn reduced_motion_is_gated() {
        let env = Environment {
            prefers_reduced_motion: true,
            ..Environment::default()
        };
        assert_eq!(
            check_environment(&env, &EffectConfig::default()),
            Err(Unavailable::ReducedMotion)
        );
    }

    #[test]
    fn desktop_runs() {
        assert_eq!(
            check_environment(&Environment::default(), &EffectConfig::default()),
            Ok(())
        );
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let s = SurfaceSize::measure(800.0, 600.0, 3.0, 2.0);
        assert_eq!(s.pixel_ratio, 2.0);
        assert_eq!((s.width, s.height), (1600, 1200));
    }

    #[test]
    fn fractional_ratio_floors() {
        let s = SurfaceSize::measure(333.0, 100.0, 1.5, 2.0);
        assert_eq!((s.width, s.height), (499, 150));
    }

    #[test]
    fn bogus_ratio_counts_as_one() {
        for dpr in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let s = SurfaceSize::measure(100.0, 50.0, dpr, 2.0);
            assert_eq!(s.pixel_ratio, 1.0);
            assert_eq!((s.width, s.height), (100, 50));
        }
    }

    #[test]
    fn zero_box_is_empty() {
        assert!(SurfaceSize::measure(0.0, 400.0, 2.0, 2.0).is_empty());
        assert!(!SurfaceSize::measure(10.0, 10.0, 1.0, 2.0).is_empty());
    }
}
