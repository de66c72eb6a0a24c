//! Floating particle field.
//!
//! A fixed population of slow dots that drift in straight lines and wrap at
//! the surface edges. Nearby dots are joined by faint lines. Pointer
//! parallax shifts where particles are *drawn*, never where they *are*.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Line alpha at zero distance; fades linearly to 0 at the link distance.
const LINK_ALPHA: f32 = 0.05;
/// Stroke width of link lines, in CSS px.
pub const LINK_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub opacity: f32,
}

/// A particle as it should be drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub alpha: f32,
}

/// A line between two drawn particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub alpha: f32,
}

/// Everything the particle surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleFrame {
    pub dots: Vec<Dot>,
    pub links: Vec<Link>,
    pub color: [u8; 3],
}

/// The particle population and the area it lives in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleField {
    /// Scatter `count` particles uniformly over a `width` × `height` area.
    pub fn spawn<R: Rng>(count: usize, width: f32, height: f32, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                x: rng.r#gen::<f32>() * width,
                y: rng.r#gen::<f32>() * height,
                vx: (rng.r#gen::<f32>() - 0.5) * 0.1,
                vy: (rng.r#gen::<f32>() - 0.5) * 0.1,
                radius: rng.r#gen::<f32>() * 1.5 + 0.5,
                opacity: rng.r#gen::<f32>() * 0.2 + 0.05,
            })
            .collect();
        Self {
            particles,
            width,
            height,
        }
    }

    pub fn from_particles(particles: Vec<Particle>, width: f32, height: f32) -> Self {
        Self {
            particles,
            width,
            height,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// New wrap bounds. Particles keep their positions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Advance every particle by one frame and wrap at the edges.
    pub fn step(&mut self) {
        let (w, h) = (self.width, self.height);
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;

            if p.x < 0.0 {
                p.x = w;
            } else if p.x > w {
                p.x = 0.0;
            }
            if p.y < 0.0 {
                p.y = h;
            } else if p.y > h {
                p.y = 0.0;
            }
        }
    }

    /// Render-time shift for a pointer at `pointer` (surface coordinates).
    pub fn parallax_offset(&self, pointer: (f32, f32), factor: f32) -> (f32, f32) {
        (
            (pointer.0 - self.width / 2.0) * factor,
            (pointer.1 - self.height / 2.0) * factor,
        )
    }

    /// Drawn dots, shifted by `offset`, with opacity scaled by `alpha_scale`.
    pub fn dots(&self, offset: (f32, f32), alpha_scale: f32) -> Vec<Dot> {
        self.particles
            .iter()
            .map(|p| Dot {
                x: p.x + offset.0,
                y: p.y + offset.1,
                radius: p.radius,
                alpha: p.opacity * alpha_scale,
            })
            .collect()
    }

    /// Lines between every pair of dots closer than `max_distance`.
    /// Each pair appears once.
    pub fn links(dots: &[Dot], max_distance: f32) -> Vec<Link> {
        let mut links = Vec::new();
        if max_distance <= 0.0 {
            return links;
        }
        for (i, a) in dots.iter().enumerate() {
            for b in &dots[i + 1..] {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d < max_distance {
                    links.push(Link {
                        from: (a.x, a.y),
                        to: (b.x, b.y),
                        alpha: (1.0 - d / max_distance) * LINK_ALPHA,
                    });
                }
            }
        }
        links
    }
}
