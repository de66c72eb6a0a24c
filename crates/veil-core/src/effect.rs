//! Mounted-effect lifecycle.
//!
//! An effect is mounted once, driven by frame, resize, visibility and
//! pointer callbacks from its [`Host`], and unmounted once. Unmounting
//! cancels the pending frame, detaches every listener and releases the
//! surface in the same call; any callback arriving afterwards is a no-op.

use crate::config::EffectConfig;
use crate::field::RenderState;
use crate::motion::AnimationConfig;
use crate::particles::{ParticleField, ParticleFrame};
use crate::scheduler::{FrameHandle, FrameRequester, FrameScheduler};
use crate::surface::{DrawSurface, Environment, SurfaceSize, Unavailable, check_environment};
use crate::theme::ThemeSource;
use rand::Rng;

/// Runtime events an effect may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    VisibilityChange,
    PointerMove,
}

/// The runtime an effect lives in: frame scheduling, theme state,
/// environment queries and event subscriptions.
pub trait Host: FrameRequester + ThemeSource {
    fn environment(&self) -> Environment;
    /// CSS size of the element the surface covers.
    fn surface_box(&self) -> (f64, f64);
    fn listen(&mut self, kind: ListenerKind);
    fn unlisten(&mut self, kind: ListenerKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStatus {
    /// Frames are being scheduled (or paused by a hidden tab).
    Active,
    /// Drawn once, no frame loop (particles under reduced motion).
    Static,
    /// Never ran for this mount.
    Inert(Unavailable),
    Unmounted,
}

/// Listener bookkeeping shared by both effects.
#[derive(Debug, Default)]
struct Listeners(Vec<ListenerKind>);

impl Listeners {
    fn attach(&mut self, host: &mut impl Host, kind: ListenerKind) {
        if !self.0.contains(&kind) {
            host.listen(kind);
            self.0.push(kind);
        }
    }

    fn detach_all(&mut self, host: &mut impl Host) {
        for kind in self.0.drain(..) {
            host.unlisten(kind);
        }
    }
}

fn inert(reason: Unavailable, what: &str) -> EffectStatus {
    if reason.is_failure() {
        log::warn!("{what} disabled: {reason}");
    } else {
        log::debug!("{what} skipped: {reason}");
    }
    EffectStatus::Inert(reason)
}

// ─── Noise veil ───────────────────────────────────────────────────────────

/// The atmospheric noise background.
pub struct VeilEffect<S> {
    config: EffectConfig,
    surface: Option<S>,
    size: SurfaceSize,
    scheduler: FrameScheduler,
    listeners: Listeners,
    status: EffectStatus,
}

impl<S: DrawSurface<Frame = RenderState>> VeilEffect<S> {
    /// Mount the veil. `acquire` is only called once the environment gates
    /// pass, so gated mounts never create a drawing context.
    pub fn mount<H: Host>(
        host: &mut H,
        config: EffectConfig,
        now: f64,
        acquire: impl FnOnce() -> Option<S>,
    ) -> Self {
        let mut effect = Self {
            config,
            surface: None,
            size: SurfaceSize::default(),
            scheduler: FrameScheduler::new(),
            listeners: Listeners::default(),
            status: EffectStatus::Unmounted,
        };

        let env = host.environment();
        if let Err(reason) = check_environment(&env, &effect.config) {
            effect.status = inert(reason, "veil");
            return effect;
        }

        let Some(surface) = acquire() else {
            effect.status = inert(Unavailable::UnsupportedContext, "veil");
            return effect;
        };
        effect.surface = Some(surface);
        effect.on_resize(host);

        effect.listeners.attach(host, ListenerKind::Resize);
        effect.listeners.attach(host, ListenerKind::VisibilityChange);
        effect.scheduler.start(now, host);
        effect.status = EffectStatus::Active;

        log::debug!("veil mounted at {}x{}", effect.size.width, effect.size.height);
        effect
    }

    pub fn status(&self) -> EffectStatus {
        self.status
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Frame callback. Returns `true` if a frame was presented.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, handle: FrameHandle, now: f64) -> bool {
        if self.status != EffectStatus::Active {
            return false;
        }
        let Some(elapsed) = self.scheduler.on_frame(handle, now, host) else {
            return false;
        };
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if self.size.is_empty() {
            return false;
        }

        let state = RenderState::new(elapsed, self.config.theme.sample(&*host));
        surface.present(&state);
        true
    }

    /// Re-measure the surface. Idempotent; safe at any time.
    pub fn on_resize<H: Host>(&mut self, host: &mut H) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let env = host.environment();
        let (w, h) = host.surface_box();
        let size = SurfaceSize::measure(w, h, env.device_pixel_ratio, self.config.max_pixel_ratio);
        if size != self.size {
            log::trace!("veil resized to {}x{}", size.width, size.height);
        }
        self.size = size;
        surface.resize(size);
    }

    /// Tab visibility changed.
    pub fn on_visibility<H: Host>(&mut self, host: &mut H, hidden: bool, now: f64) {
        if self.status != EffectStatus::Active {
            return;
        }
        if hidden {
            self.scheduler.pause(now, host);
        } else {
            self.scheduler.resume(now, host);
        }
    }

    /// Tear down: cancel the pending frame, detach listeners, release the
    /// surface. Safe to call more than once.
    pub fn unmount<H: Host>(&mut self, host: &mut H) {
        self.scheduler.stop(host);
        self.listeners.detach_all(host);
        if let Some(mut surface) = self.surface.take() {
            surface.release();
        }
        if self.status != EffectStatus::Unmounted {
            log::debug!("veil unmounted");
        }
        self.status = EffectStatus::Unmounted;
    }
}

// ─── Particle layer ───────────────────────────────────────────────────────

/// The floating particle layer.
pub struct ParticleEffect<S> {
    config: EffectConfig,
    motion: AnimationConfig,
    surface: Option<S>,
    field: ParticleField,
    pointer: Option<(f32, f32)>,
    scheduler: FrameScheduler,
    listeners: Listeners,
    status: EffectStatus,
}

impl<S: DrawSurface<Frame = ParticleFrame>> ParticleEffect<S> {
    /// Mount the particle layer. Under reduced motion one static frame at
    /// half opacity is drawn and no frame loop starts.
    pub fn mount<H: Host, R: Rng>(
        host: &mut H,
        config: EffectConfig,
        now: f64,
        rng: &mut R,
        acquire: impl FnOnce() -> Option<S>,
    ) -> Self {
        let env = host.environment();
        let motion = AnimationConfig::detect(&env, &config);
        let mut effect = Self {
            config,
            motion,
            surface: None,
            field: ParticleField::default(),
            pointer: None,
            scheduler: FrameScheduler::new(),
            listeners: Listeners::default(),
            status: EffectStatus::Unmounted,
        };

        let Some(surface) = acquire() else {
            effect.status = inert(Unavailable::UnsupportedContext, "particles");
            return effect;
        };
        effect.surface = Some(surface);

        let (w, h) = host.surface_box();
        let count = effect.config.particle_count_for(env.viewport_width);
        effect.field = ParticleField::spawn(count, w as f32, h as f32, rng);
        effect.on_resize(host);
        effect.listeners.attach(host, ListenerKind::Resize);

        if !motion.should_animate {
            effect.present(0.5);
            effect.status = EffectStatus::Static;
            log::debug!("particles drawn statically ({count})");
            return effect;
        }

        if motion.enable_parallax {
            effect.listeners.attach(host, ListenerKind::PointerMove);
        }
        effect.listeners.attach(host, ListenerKind::VisibilityChange);
        effect.scheduler.start(now, host);
        effect.status = EffectStatus::Active;
        log::debug!("particles mounted ({count})");
        effect
    }

    pub fn status(&self) -> EffectStatus {
        self.status
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn motion(&self) -> AnimationConfig {
        self.motion
    }

    /// Frame callback. Returns `true` if a frame was presented.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, handle: FrameHandle, now: f64) -> bool {
        if self.status != EffectStatus::Active {
            return false;
        }
        if self.scheduler.on_frame(handle, now, host).is_none() {
            return false;
        }
        self.field.step();
        self.present(1.0)
    }

    /// Pointer moved, in surface coordinates.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.motion.enable_parallax && self.status == EffectStatus::Active {
            self.pointer = Some((x, y));
        }
    }

    pub fn on_resize<H: Host>(&mut self, host: &mut H) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let (w, h) = host.surface_box();
        let size = SurfaceSize::measure(w, h, 1.0, 1.0);
        self.field.resize(size.width as f32, size.height as f32);
        surface.resize(size);
        // Resizing clears the surface; a static layer has no loop to redraw it.
        if self.status == EffectStatus::Static {
            self.present(0.5);
        }
    }

    pub fn on_visibility<H: Host>(&mut self, host: &mut H, hidden: bool, now: f64) {
        if self.status != EffectStatus::Active {
            return;
        }
        if hidden {
            self.scheduler.pause(now, host);
        } else {
            self.scheduler.resume(now, host);
        }
    }

    pub fn unmount<H: Host>(&mut self, host: &mut H) {
        self.scheduler.stop(host);
        self.listeners.detach_all(host);
        if let Some(mut surface) = self.surface.take() {
            surface.release();
        }
        self.pointer = None;
        self.status = EffectStatus::Unmounted;
    }

    /// Build and present the current frame.
    fn present(&mut self, alpha_scale: f32) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        let (offset, link_distance) = if self.motion.enable_parallax {
            let offset = self
                .pointer
                .map(|p| self.field.parallax_offset(p, self.config.parallax_factor))
                .unwrap_or((0.0, 0.0));
            (offset, self.config.link_distance)
        } else {
            ((0.0, 0.0), 0.0)
        };

        let dots = self.field.dots(offset, alpha_scale);
        let links = ParticleField::links(&dots, link_distance);
        surface.present(&ParticleFrame {
            dots,
            links,
            color: self.config.particle_color,
        });
        true
    }
}
