//! Theme sampling: active color scheme + two named color tokens → RGB.
//!
//! The sampler is re-run every frame because the page theme may change
//! between frames (a dark-mode toggle mid-animation).

use crate::color::{Hsl, Rgb};
use serde::{Deserialize, Serialize};

/// The user's theme choice. `System` defers to the OS scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

/// A resolved color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Resolve against the OS-reported scheme.
    pub fn resolve(self, system: ColorScheme) -> ColorScheme {
        match self {
            ThemePreference::Light => ColorScheme::Light,
            ThemePreference::Dark => ColorScheme::Dark,
            ThemePreference::System => system,
        }
    }
}

/// Where theme state is read from (the page's style sheet in a browser).
pub trait ThemeSource {
    fn preference(&self) -> ThemePreference;
    fn system_scheme(&self) -> ColorScheme;
    /// Raw value of a named color token, e.g. `--background` → `"222 84% 5%"`.
    fn color_token(&self, name: &str) -> Option<String>;
}

/// Output of one [`ThemeSampler::sample`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThemeSample {
    pub base: Rgb,
    pub accent: Rgb,
    pub is_dark: bool,
}

/// Fallback palette used when a token is missing or malformed.
fn fallback(scheme: ColorScheme) -> (Rgb, Rgb) {
    match scheme {
        ColorScheme::Dark => (Rgb::new(0.04, 0.04, 0.05), Rgb::new(0.16, 0.16, 0.18)),
        ColorScheme::Light => (Rgb::WHITE, Rgb::new(0.94, 0.94, 0.95)),
    }
}

/// Reads the base and accent tokens and converts them to RGB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSampler {
    pub base_token: String,
    pub accent_token: String,
}

impl Default for ThemeSampler {
    fn default() -> Self {
        Self {
            base_token: "--background".to_string(),
            accent_token: "--accent".to_string(),
        }
    }
}

impl ThemeSampler {
    pub fn new(base_token: impl Into<String>, accent_token: impl Into<String>) -> Self {
        Self {
            base_token: base_token.into(),
            accent_token: accent_token.into(),
        }
    }

    /// Sample the current theme. Never fails; bad tokens fall back to the
    /// scheme's neutral palette.
    pub fn sample(&self, source: &dyn ThemeSource) -> ThemeSample {
        let scheme = source.preference().resolve(source.system_scheme());
        let (fallback_base, fallback_accent) = fallback(scheme);

        ThemeSample {
            base: read_token(source, &self.base_token).unwrap_or(fallback_base),
            accent: read_token(source, &self.accent_token).unwrap_or(fallback_accent),
            is_dark: scheme == ColorScheme::Dark,
        }
    }
}

fn read_token(source: &dyn ThemeSource, name: &str) -> Option<Rgb> {
    let Some(raw) = source.color_token(name) else {
        log::debug!("theme token {name} is not defined, using fallback");
        return None;
    };
    match Hsl::parse(&raw) {
        Ok(hsl) => Some(hsl.to_rgb()),
        Err(e) => {
            log::debug!("theme token {name}: {e}, using fallback");
            None
        }
    }
}

// ─── Static source ────────────────────────────────────────────────────────

/// A fixed in-memory theme. Used by native hosts and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTheme {
    pub preference: ThemePreference,
    pub system: ColorScheme,
    pub tokens: Vec<(String, String)>,
}

impl StaticTheme {
    pub fn new(preference: ThemePreference) -> Self {
        Self {
            preference,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, name: &str, value: &str) -> Self {
        self.set_token(name, value);
        self
    }

    pub fn set_token(&mut self, name: &str, value: &str) {
        match self.tokens.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.tokens.push((name.to_string(), value.to_string())),
        }
    }
}

impl ThemeSource for StaticTheme {
    fn preference(&self) -> ThemePreference {
        self.preference
    }

    fn system_scheme(&self) -> ColorScheme {
        self.system
    }

    fn color_token(&self, name: &str) -> Option<String> {
        self.tokens
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}
