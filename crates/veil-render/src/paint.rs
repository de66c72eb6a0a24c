//! Veil + particles → Vello drawing commands.
//!
//! The rasterized field is drawn as a full-surface image, the particle layer
//! as filled circles joined by thin strokes on top. Call once per frame
//! with a freshly-cleared `Scene`; the caller presents the scene via wgpu.

use crate::raster::FieldRaster;
use kurbo::{Affine, Circle, Line, Point, Stroke};
use peniko::{Blob, Color, Fill, Image, ImageFormat};
use std::sync::Arc;
use veil_core::ParticleFrame;
use veil_core::particles::LINK_WIDTH;
use vello::Scene;

/// Wrap a rendered raster as an image brush.
pub fn field_image(raster: &FieldRaster) -> Image {
    let data = Blob::new(Arc::new(raster.pixels().to_vec()));
    Image::new(data, ImageFormat::Rgba8, raster.width(), raster.height())
}

/// Draw the field so it covers the surface from the origin.
pub fn paint_field(scene: &mut Scene, image: &Image) {
    scene.draw_image(image, Affine::IDENTITY);
}

/// Draw the particle layer. Particle coordinates are CSS px; `scale` maps
/// them to device pixels.
pub fn paint_particles(scene: &mut Scene, frame: &ParticleFrame, scale: f64) {
    let transform = Affine::scale(scale);
    let [r, g, b] = frame.color;

    let stroke = Stroke::new(LINK_WIDTH as f64);
    for link in &frame.links {
        let line = Line::new(
            Point::new(link.from.0 as f64, link.from.1 as f64),
            Point::new(link.to.0 as f64, link.to.1 as f64),
        );
        scene.stroke(&stroke, transform, alpha_color(r, g, b, link.alpha), None, &line);
    }

    for dot in &frame.dots {
        let circle = Circle::new((dot.x as f64, dot.y as f64), dot.radius as f64);
        scene.fill(Fill::NonZero, transform, alpha_color(r, g, b, dot.alpha), None, &circle);
    }

    log::trace!(
        "PAINT particles: {} dots, {} links",
        frame.dots.len(),
        frame.links.len()
    );
}

/// Paint a whole frame: veil underneath, particles on top.
pub fn paint_frame(
    scene: &mut Scene,
    field: Option<&FieldRaster>,
    particles: Option<&ParticleFrame>,
    scale: f64,
) {
    if let Some(raster) = field
        && raster.width() > 0
        && raster.height() > 0
    {
        paint_field(scene, &field_image(raster));
    }
    if let Some(frame) = particles {
        paint_particles(scene, frame, scale);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn alpha_color(r: u8, g: u8, b: u8, alpha: f32) -> Color {
    Color::from_rgba8(r, g, b, alpha_byte(alpha))
}

fn alpha_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}
