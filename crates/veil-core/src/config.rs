//! Effect configuration.
//!
//! Every field has a default matching the page's shipped look, so hosts can
//! pass a partial JSON object (or nothing) and override only what they need.

use crate::theme::ThemeSampler;
use serde::{Deserialize, Serialize};

/// Configuration shared by the veil and the particle layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Viewports narrower than this (CSS px) count as mobile. Default: **768**.
    pub mobile_breakpoint: f64,

    /// Upper bound on the device pixel ratio used for sizing. Default: **2.0**.
    pub max_pixel_ratio: f64,

    /// Color tokens read from the style sheet.
    pub theme: ThemeSampler,

    /// Particle population on desktop viewports. Default: **35**.
    pub particle_count: usize,

    /// Particle population on mobile viewports. Default: **20**.
    pub mobile_particle_count: usize,

    /// Maximum distance (px) at which two particles are linked. Default: **100**.
    pub link_distance: f32,

    /// Pointer offset from centre → render-time particle shift. Default: **0.01**.
    pub parallax_factor: f32,

    /// Particle fill color as 8-bit RGB. Default: **(251, 146, 60)**.
    pub particle_color: [u8; 3],

    /// Seed for particle placement. `None` lets the host pick one.
    pub seed: Option<u64>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            max_pixel_ratio: 2.0,
            theme: ThemeSampler::default(),
            particle_count: 35,
            mobile_particle_count: 20,
            link_distance: 100.0,
            parallax_factor: 0.01,
            particle_color: [251, 146, 60],
            seed: None,
        }
    }
}

impl EffectConfig {
    /// Parse a (possibly partial) JSON object. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns a message describing the first malformed field.
    pub fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| format!("invalid effect config: {e}"))
    }

    pub fn is_mobile(&self, viewport_width: f64) -> bool {
        viewport_width < self.mobile_breakpoint
    }

    /// Particle population for a viewport of the given width.
    pub fn particle_count_for(&self, viewport_width: f64) -> usize {
        if self.is_mobile(viewport_width) {
            self.mobile_particle_count
        } else {
            self.particle_count
        }
    }
}
