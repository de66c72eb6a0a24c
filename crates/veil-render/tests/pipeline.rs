//! Integration tests: effect lifecycle → CPU raster → Vello scene.

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use veil_core::*;
use veil_render::{FieldRaster, paint_frame};
use vello::Scene;

/// A headless host with a fixed window and a dark theme.
struct Headless {
    env: Environment,
    theme: StaticTheme,
    next: i32,
    pending: Option<FrameHandle>,
    listeners: usize,
}

impl Headless {
    fn new(dpr: f64) -> Self {
        Self {
            env: Environment {
                viewport_width: 1024.0,
                device_pixel_ratio: dpr,
                prefers_reduced_motion: false,
            },
            theme: StaticTheme::new(ThemePreference::Dark)
                .with_token("--background", "240 10% 4%")
                .with_token("--accent", "24 95% 53%"),
            next: 0,
            pending: None,
            listeners: 0,
        }
    }
}

impl FrameRequester for Headless {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let h = FrameHandle(self.next);
        self.pending = Some(h);
        h
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

impl ThemeSource for Headless {
    fn preference(&self) -> ThemePreference {
        self.theme.preference()
    }

    fn system_scheme(&self) -> ColorScheme {
        self.theme.system_scheme()
    }

    fn color_token(&self, name: &str) -> Option<String> {
        self.theme.color_token(name)
    }
}

impl Host for Headless {
    fn environment(&self) -> Environment {
        self.env
    }

    fn surface_box(&self) -> (f64, f64) {
        (64.0, 36.0)
    }

    fn listen(&mut self, _kind: ListenerKind) {
        self.listeners += 1;
    }

    fn unlisten(&mut self, _kind: ListenerKind) {
        self.listeners -= 1;
    }
}

#[test]
fn veil_renders_into_raster_surface() {
    let mut host = Headless::new(2.0);
    let mut veil = VeilEffect::mount(&mut host, EffectConfig::default(), 0.0, || {
        Some(FieldRaster::default())
    });
    assert_eq!(veil.status(), EffectStatus::Active);

    let handle = host.pending.take().unwrap();
    assert!(veil.on_frame(&mut host, handle, 500.0));

    let raster = veil.surface().unwrap();
    assert_eq!((raster.width(), raster.height()), (128, 72));
    assert!(raster.pixels().chunks(4).all(|px| px[3] == 102));

    // Dark base: every pixel stays very dark.
    assert!(raster.pixels().chunks(4).all(|px| px[0] < 40 && px[1] < 40 && px[2] < 40));

    veil.unmount(&mut host);
    assert!(veil.surface().is_none());
    assert_eq!(host.listeners, 0);
    assert_eq!(host.pending, None);
}

#[test]
fn consecutive_frames_differ() {
    let mut host = Headless::new(1.0);
    let mut veil = VeilEffect::mount(&mut host, EffectConfig::default(), 0.0, || {
        Some(FieldRaster::default())
    });

    let h = host.pending.take().unwrap();
    veil.on_frame(&mut host, h, 0.0);
    let first = veil.surface().unwrap().pixels().to_vec();

    // Five minutes of drift is enough to move the field.
    let h = host.pending.take().unwrap();
    veil.on_frame(&mut host, h, 300_000.0);
    let later = veil.surface().unwrap().pixels();

    assert_eq!(first.len(), later.len());
    assert_ne!(first.as_slice(), later);
}

#[test]
fn full_frame_paints_into_scene() {
    let state = RenderState {
        elapsed: 1.0,
        base: Rgb::new(0.0, 0.0, 0.0),
        accent: Rgb::WHITE,
        is_dark: true,
    };
    let mut raster = FieldRaster::new(32, 18);
    raster.render(&state);

    let mut field = ParticleField::spawn(35, 32.0, 18.0, &mut StdRng::seed_from_u64(5));
    field.step();
    let dots = field.dots((0.0, 0.0), 1.0);
    let links = ParticleField::links(&dots, 100.0);
    assert!(!links.is_empty());
    let frame = ParticleFrame {
        dots,
        links,
        color: [251, 146, 60],
    };

    let mut scene = Scene::new();
    paint_frame(&mut scene, Some(&raster), Some(&frame), 1.0);
}
