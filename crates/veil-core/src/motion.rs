//! Motion preferences derived from the runtime environment.

use crate::config::EffectConfig;
use crate::surface::Environment;
use serde::{Deserialize, Serialize};

/// How much animation the page should run.
///
/// The effects read `should_animate` and `enable_parallax`; the two
/// multipliers are output for the page's own entrance animations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub should_animate: bool,
    pub is_mobile: bool,
    /// Scales entrance travel distances. 0.5 on mobile.
    pub distance_multiplier: f32,
    /// Scales stagger delays. 0.7 on mobile.
    pub stagger_multiplier: f32,
    /// Pointer parallax only on desktop with motion allowed.
    pub enable_parallax: bool,
}

impl AnimationConfig {
    pub fn detect(env: &Environment, config: &EffectConfig) -> Self {
        let should_animate = !env.prefers_reduced_motion;
        let is_mobile = config.is_mobile(env.viewport_width);
        Self {
            should_animate,
            is_mobile,
            distance_multiplier: if is_mobile { 0.5 } else { 1.0 },
            stagger_multiplier: if is_mobile { 0.7 } else { 1.0 },
            enable_parallax: !is_mobile && should_animate,
        }
    }
}
