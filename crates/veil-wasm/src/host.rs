//! The browser runtime behind an effect.
//!
//! [`WebHost`] implements [`Host`] on top of `window`: animation frames via
//! `requestAnimationFrame`, theme tokens via `getComputedStyle` on the root
//! element, the theme preference via the `dark`/`light` class on `<html>`
//! and environment queries via `matchMedia`.
//!
//! Callbacks are created once per mount and hold only a weak reference to
//! the mounted effect. The effect owns the host, the host owns the
//! closures, so dropping the mount drops everything; unmount detaches and
//! cancels before that happens.

use js_sys::Function;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use veil_core::{
    ColorScheme, Environment, FrameHandle, FrameRequester, Host, ListenerKind, ParticleEffect,
    ParticleFrame, RenderState, ThemePreference, ThemeSource, VeilEffect,
};
use veil_core::{DrawSurface, EffectStatus};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, EventTarget, HtmlCanvasElement, MouseEvent, Window};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

// ─── Driven effects ─────────────────────────────────────────────────────────

/// The callbacks a mounted effect receives from the page.
pub trait Driven {
    fn frame(&mut self, host: &mut WebHost, handle: FrameHandle, now: f64);
    fn resize(&mut self, host: &mut WebHost);
    fn visibility(&mut self, host: &mut WebHost, hidden: bool, now: f64);
    fn pointer_move(&mut self, _x: f32, _y: f32) {}
    fn unmount(&mut self, host: &mut WebHost);
    fn status(&self) -> EffectStatus;
}

impl<S: DrawSurface<Frame = RenderState>> Driven for VeilEffect<S> {
    fn frame(&mut self, host: &mut WebHost, handle: FrameHandle, now: f64) {
        self.on_frame(host, handle, now);
    }

    fn resize(&mut self, host: &mut WebHost) {
        self.on_resize(host);
    }

    fn visibility(&mut self, host: &mut WebHost, hidden: bool, now: f64) {
        self.on_visibility(host, hidden, now);
    }

    fn unmount(&mut self, host: &mut WebHost) {
        VeilEffect::unmount(self, host);
    }

    fn status(&self) -> EffectStatus {
        VeilEffect::status(self)
    }
}

impl<S: DrawSurface<Frame = ParticleFrame>> Driven for ParticleEffect<S> {
    fn frame(&mut self, host: &mut WebHost, handle: FrameHandle, now: f64) {
        self.on_frame(host, handle, now);
    }

    fn resize(&mut self, host: &mut WebHost) {
        self.on_resize(host);
    }

    fn visibility(&mut self, host: &mut WebHost, hidden: bool, now: f64) {
        self.on_visibility(host, hidden, now);
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        self.on_pointer_move(x, y);
    }

    fn unmount(&mut self, host: &mut WebHost) {
        ParticleEffect::unmount(self, host);
    }

    fn status(&self) -> EffectStatus {
        ParticleEffect::status(self)
    }
}

/// A mounted effect together with the host driving it.
pub struct Mounted<E> {
    pub host: WebHost,
    pub effect: E,
}

pub type Shared<E> = Rc<RefCell<Option<Mounted<E>>>>;

/// Run `f` against the mounted effect, if it is still mounted and not
/// already borrowed.
fn with_mounted<E>(weak: &Weak<RefCell<Option<Mounted<E>>>>, f: impl FnOnce(&mut WebHost, &mut E)) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let Ok(mut slot) = shared.try_borrow_mut() else {
        log::trace!("callback skipped: effect busy");
        return;
    };
    if let Some(Mounted { host, effect }) = slot.as_mut() {
        f(host, effect);
    }
}

/// Build a host for `canvas`, mount an effect on it and wire the page
/// callbacks back into it.
pub fn mount_with<E: Driven + 'static>(
    canvas: HtmlCanvasElement,
    build: impl FnOnce(&mut WebHost) -> E,
) -> Result<Shared<E>, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "no document".to_string())?;

    let shared: Shared<E> = Rc::new(RefCell::new(None));
    let callbacks = Callbacks::new(Rc::downgrade(&shared));
    let mut host = WebHost {
        window,
        document,
        canvas,
        callbacks,
        pending: None,
    };

    let effect = build(&mut host);
    *shared.borrow_mut() = Some(Mounted { host, effect });
    Ok(shared)
}

/// Viewport width, pixel ratio and reduced-motion preference of `window`.
pub fn environment_of(window: &Window) -> Environment {
    Environment {
        viewport_width: window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0),
        device_pixel_ratio: window.device_pixel_ratio(),
        prefers_reduced_motion: media_matches(window, REDUCED_MOTION_QUERY),
    }
}

fn media_matches(window: &Window, query: &str) -> bool {
    match window.match_media(query) {
        Ok(Some(list)) => list.matches(),
        _ => false,
    }
}

// ─── Callbacks ──────────────────────────────────────────────────────────────

struct Callbacks {
    frame: Closure<dyn FnMut(f64)>,
    resize: Closure<dyn FnMut()>,
    visibility: Closure<dyn FnMut()>,
    pointer: Closure<dyn FnMut(MouseEvent)>,
}

impl Callbacks {
    fn new<E: Driven + 'static>(weak: Weak<RefCell<Option<Mounted<E>>>>) -> Self {
        let w = weak.clone();
        let frame = Closure::wrap(Box::new(move |timestamp: f64| {
            with_mounted(&w, |host, effect| {
                // The browser never fires a cancelled frame, so whatever
                // was pending is the frame being delivered.
                if let Some(handle) = host.pending.take() {
                    effect.frame(host, handle, timestamp);
                }
            });
        }) as Box<dyn FnMut(f64)>);

        let w = weak.clone();
        let resize = Closure::wrap(Box::new(move || {
            with_mounted(&w, |host, effect| effect.resize(host));
        }) as Box<dyn FnMut()>);

        let w = weak.clone();
        let visibility = Closure::wrap(Box::new(move || {
            with_mounted(&w, |host, effect| {
                let hidden = host.document.hidden();
                let now = host.now();
                effect.visibility(host, hidden, now);
            });
        }) as Box<dyn FnMut()>);

        let w = weak;
        let pointer = Closure::wrap(Box::new(move |event: MouseEvent| {
            with_mounted(&w, |host, effect| {
                let rect = host.canvas.get_bounding_client_rect();
                let x = event.client_x() as f64 - rect.left();
                let y = event.client_y() as f64 - rect.top();
                effect.pointer_move(x as f32, y as f32);
            });
        }) as Box<dyn FnMut(MouseEvent)>);

        Self {
            frame,
            resize,
            visibility,
            pointer,
        }
    }
}

// ─── Web host ───────────────────────────────────────────────────────────────

pub struct WebHost {
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    callbacks: Callbacks,
    pending: Option<FrameHandle>,
}

impl WebHost {
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Milliseconds on the same clock as animation-frame timestamps.
    pub fn now(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }


    fn event_target(&self, kind: ListenerKind) -> (&EventTarget, &'static str, &Function) {
        let window: &EventTarget = self.window.as_ref();
        let document: &EventTarget = self.document.as_ref();
        let cb = &self.callbacks;
        match kind {
            ListenerKind::Resize => (window, "resize", cb.resize.as_ref().unchecked_ref()),
            ListenerKind::VisibilityChange => (
                document,
                "visibilitychange",
                cb.visibility.as_ref().unchecked_ref(),
            ),
            ListenerKind::PointerMove => (window, "mousemove", cb.pointer.as_ref().unchecked_ref()),
        }
    }
}

impl FrameRequester for WebHost {
    fn request_frame(&mut self) -> FrameHandle {
        let callback: &Function = self.callbacks.frame.as_ref().unchecked_ref();
        match self.window.request_animation_frame(callback) {
            Ok(id) => {
                let handle = FrameHandle(id);
                self.pending = Some(handle);
                handle
            }
            Err(e) => {
                // The effect stalls on its last frame.
                log::warn!("requestAnimationFrame failed: {e:?}");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            log::debug!("cancelAnimationFrame failed: {e:?}");
        }
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

impl ThemeSource for WebHost {
    fn preference(&self) -> ThemePreference {
        let Some(root) = self.document.document_element() else {
            return ThemePreference::System;
        };
        let classes = root.class_list();
        if classes.contains("dark") {
            ThemePreference::Dark
        } else if classes.contains("light") {
            ThemePreference::Light
        } else {
            ThemePreference::System
        }
    }

    fn system_scheme(&self) -> ColorScheme {
        if media_matches(&self.window, DARK_SCHEME_QUERY) {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    fn color_token(&self, name: &str) -> Option<String> {
        let root = self.document.document_element()?;
        let style = self.window.get_computed_style(&root).ok()??;
        let value = style.get_property_value(name).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

impl Host for WebHost {
    fn environment(&self) -> Environment {
        environment_of(&self.window)
    }

    fn surface_box(&self) -> (f64, f64) {
        (
            self.canvas.offset_width() as f64,
            self.canvas.offset_height() as f64,
        )
    }

    fn listen(&mut self, kind: ListenerKind) {
        let (target, event, callback) = self.event_target(kind);
        if let Err(e) = target.add_event_listener_with_callback(event, callback) {
            log::warn!("could not listen for {event}: {e:?}");
        }
    }

    fn unlisten(&mut self, kind: ListenerKind) {
        let (target, event, callback) = self.event_target(kind);
        if let Err(e) = target.remove_event_listener_with_callback(event, callback) {
            log::debug!("could not stop listening for {event}: {e:?}");
        }
    }
}
