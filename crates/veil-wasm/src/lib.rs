//! WASM bridge for Dark Veil: mounts the background effects on a page.
//!
//! Compiled via `wasm-pack build --target web`. JavaScript creates one
//! [`DarkVeil`] and/or one [`ParticleBackground`] per canvas and calls
//! `unmount()` (or `free()`) when the canvas goes away. A mount that is
//! gated off (mobile viewport, reduced motion, missing WebGL) succeeds but
//! renders nothing; only a malformed config is an error.

mod canvas2d;
mod host;
mod webgl;

use canvas2d::CanvasParticles;
use host::{Driven, Shared, environment_of, mount_with};
use log::LevelFilter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use veil_core::{AnimationConfig, EffectConfig, EffectStatus, Environment, ParticleEffect, VeilEffect};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;
use webgl::WebGlVeil;

// ─── Initialisation ─────────────────────────────────────────────────────────

/// One-time setup: panic hook and console logger. Safe to call repeatedly;
/// every mount calls it. Exported as `initDarkVeil`; `init` belongs to
/// the module loader.
#[wasm_bindgen(js_name = initDarkVeil)]
pub fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Dark Veil WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            console_log::init_with_level(log::Level::Info).ok();
        }
    });
}

/// Change console verbosity. Returns `false` for an unknown level name.
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> bool {
    init();
    match level.trim().parse::<LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}

// ─── Noise veil ─────────────────────────────────────────────────────────────

/// The WebGL noise veil mounted on one canvas.
#[wasm_bindgen]
pub struct DarkVeil {
    mounted: Option<Shared<VeilEffect<WebGlVeil>>>,
}

#[wasm_bindgen]
impl DarkVeil {
    /// Mount on `canvas`. `config_json` is an optional, possibly partial,
    /// JSON object of effect settings.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: Option<String>) -> Result<DarkVeil, JsValue> {
        init();
        let config = parse_config(config_json.as_deref())?;
        let mounted = mount_with(canvas, |host| {
            let now = host.now();
            let canvas = host.canvas().clone();
            VeilEffect::mount(host, config, now, || acquired(WebGlVeil::new(&canvas)))
        })
        .map_err(|e| JsValue::from_str(&e))?;
        Ok(Self {
            mounted: Some(mounted),
        })
    }

    /// `"active"`, `"inert"` or `"unmounted"`.
    pub fn status(&self) -> String {
        status_of(self.mounted.as_ref())
    }

    /// Stop the loop, detach listeners, release the GL resources.
    /// Idempotent.
    pub fn unmount(&mut self) {
        unmount(self.mounted.take());
    }
}

impl Drop for DarkVeil {
    fn drop(&mut self) {
        unmount(self.mounted.take());
    }
}

// ─── Particle layer ─────────────────────────────────────────────────────────

/// The Canvas2D particle layer mounted on one canvas.
#[wasm_bindgen]
pub struct ParticleBackground {
    mounted: Option<Shared<ParticleEffect<CanvasParticles>>>,
}

#[wasm_bindgen]
impl ParticleBackground {
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<ParticleBackground, JsValue> {
        init();
        let config = parse_config(config_json.as_deref())?;
        let seed = config.seed.unwrap_or_else(random_seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let mounted = mount_with(canvas, |host| {
            let now = host.now();
            let canvas = host.canvas().clone();
            ParticleEffect::mount(host, config, now, &mut rng, || {
                acquired(CanvasParticles::new(&canvas))
            })
        })
        .map_err(|e| JsValue::from_str(&e))?;
        Ok(Self {
            mounted: Some(mounted),
        })
    }

    /// `"active"`, `"static"`, `"inert"` or `"unmounted"`.
    pub fn status(&self) -> String {
        status_of(self.mounted.as_ref())
    }

    pub fn unmount(&mut self) {
        unmount(self.mounted.take());
    }
}

impl Drop for ParticleBackground {
    fn drop(&mut self) {
        unmount(self.mounted.take());
    }
}

// ─── Standalone validation (no canvas needed) ───────────────────────────────

/// Validate an effect config. Returns JSON: `{"ok":true,"config":{...}}`
/// with every default filled in, or `{"ok":false,"error":"..."}`.
#[wasm_bindgen(js_name = validateConfig)]
pub fn validate_config(json: &str) -> String {
    let result = EffectConfig::from_json(json).and_then(|config| {
        serde_json::to_value(&config).map_err(|e| format!("config not serializable: {e}"))
    });
    let body = match result {
        Ok(config) => serde_json::json!({ "ok": true, "config": config }),
        Err(error) => serde_json::json!({ "ok": false, "error": error }),
    };
    body.to_string()
}

/// Motion preferences for the current window as JSON, so page-level
/// animations can scale their travel distances and stagger delays the same
/// way the effects do.
#[wasm_bindgen(js_name = animationConfig)]
pub fn animation_config(config_json: Option<String>) -> Result<String, JsValue> {
    let config = parse_config(config_json.as_deref())?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    motion_json(&environment_of(&window), &config).map_err(|e| JsValue::from_str(&e))
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn parse_config(json: Option<&str>) -> Result<EffectConfig, JsValue> {
    EffectConfig::from_json(json.unwrap_or_default()).map_err(|e| JsValue::from_str(&e))
}

/// The effect warns when acquisition fails; the detail goes to debug.
fn acquired<S>(result: Result<S, String>) -> Option<S> {
    result.map_err(|e| log::debug!("context acquisition failed: {e}")).ok()
}

fn motion_json(env: &Environment, config: &EffectConfig) -> Result<String, String> {
    serde_json::to_string(&AnimationConfig::detect(env, config))
        .map_err(|e| format!("animation config not serializable: {e}"))
}

fn random_seed() -> u64 {
    // 53 bits is all `Math.random` carries.
    (js_sys::Math::random() * (1u64 << 53) as f64) as u64
}

fn status_name(status: EffectStatus) -> &'static str {
    match status {
        EffectStatus::Active => "active",
        EffectStatus::Static => "static",
        EffectStatus::Inert(_) => "inert",
        EffectStatus::Unmounted => "unmounted",
    }
}

fn status_of<E: Driven>(mounted: Option<&Shared<E>>) -> String {
    let status = mounted
        .and_then(|shared| {
            let slot = shared.try_borrow().ok()?;
            slot.as_ref().map(|m| m.effect.status())
        })
        .unwrap_or(EffectStatus::Unmounted);
    status_name(status).to_string()
}

/// Tear down inside the borrow, then drop the host and its callbacks.
fn unmount<E: Driven>(mounted: Option<Shared<E>>) {
    let Some(shared) = mounted else {
        return;
    };
    let Ok(mut slot) = shared.try_borrow_mut() else {
        log::warn!("unmount while a callback is running; teardown skipped");
        return;
    };
    if let Some(mut m) = slot.take() {
        m.effect.unmount(&mut m.host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use veil_core::Unavailable;

    #[test]
    fn validate_fills_defaults() {
        let out: serde_json::Value =
            serde_json::from_str(&validate_config(r#"{"particle_count": 12}"#)).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["config"]["particle_count"], 12);
        assert_eq!(out["config"]["mobile_particle_count"], 20);
        assert_eq!(out["config"]["theme"]["base_token"], "--background");
    }

    #[test]
    fn validate_empty_is_default() {
        let out: serde_json::Value = serde_json::from_str(&validate_config("")).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["config"]["mobile_breakpoint"], 768.0);
    }

    #[test]
    fn validate_reports_errors() {
        let out: serde_json::Value =
            serde_json::from_str(&validate_config(r#"{"particle_count": "many"}"#)).unwrap();
        assert_eq!(out["ok"], false);
        assert!(
            out["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid effect config:")
        );
    }

    #[test]
    fn status_names() {
        assert_eq!(status_name(EffectStatus::Active), "active");
        assert_eq!(status_name(EffectStatus::Static), "static");
        assert_eq!(
            status_name(EffectStatus::Inert(Unavailable::MobileViewport)),
            "inert"
        );
        assert_eq!(status_name(EffectStatus::Unmounted), "unmounted");
    }

    #[test]
    fn log_level_names() {
        assert!(!set_log_level("loud"));
        assert!(set_log_level(" DEBUG "));
        assert_eq!(log::max_level(), LevelFilter::Debug);
        assert!(set_log_level("info"));
        assert_eq!(log::max_level(), LevelFilter::Info);
    }

    #[test]
    fn failed_acquisition_is_inert() {
        assert_eq!(acquired::<u8>(Err("webgl unsupported".to_string())), None);
        assert_eq!(acquired(Ok(7u8)), Some(7));
    }

    #[test]
    fn motion_for_mobile_viewport() {
        let env = Environment {
            viewport_width: 390.0,
            ..Environment::default()
        };
        let out: serde_json::Value =
            serde_json::from_str(&motion_json(&env, &EffectConfig::default()).unwrap()).unwrap();
        assert_eq!(out["is_mobile"], true);
        assert_eq!(out["distance_multiplier"], 0.5);
        assert_eq!(out["stagger_multiplier"], 0.7);
        assert_eq!(out["enable_parallax"], false);
    }

    #[test]
    fn motion_for_reduced_motion() {
        let env = Environment {
            prefers_reduced_motion: true,
            ..Environment::default()
        };
        let out: serde_json::Value =
            serde_json::from_str(&motion_json(&env, &EffectConfig::default()).unwrap()).unwrap();
        assert_eq!(out["should_animate"], false);
        assert_eq!(out["distance_multiplier"], 1.0);
    }

    #[test]
    fn no_mount_reads_as_unmounted() {
        assert_eq!(status_of::<VeilEffect<WebGlVeil>>(None), "unmounted");
    }
}
