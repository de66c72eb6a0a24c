pub mod color;
pub mod config;
pub mod effect;
pub mod field;
pub mod motion;
pub mod noise;
pub mod particles;
pub mod scheduler;
pub mod surface;
pub mod theme;

pub use color::{Hsl, Rgb, Rgba, hsl_to_rgb, rgb_to_hsl};
pub use config::EffectConfig;
pub use effect::{EffectStatus, Host, ListenerKind, ParticleEffect, VeilEffect};
pub use field::{RenderState, shade, vignette};
pub use motion::AnimationConfig;
pub use noise::simplex2;
pub use particles::{Dot, Link, Particle, ParticleField, ParticleFrame};
pub use scheduler::{FrameHandle, FrameRequester, FrameScheduler, SchedulerState};
pub use surface::{DrawSurface, Environment, SurfaceSize, Unavailable, check_environment};
pub use theme::{ColorScheme, StaticTheme, ThemePreference, ThemeSample, ThemeSampler, ThemeSource};
