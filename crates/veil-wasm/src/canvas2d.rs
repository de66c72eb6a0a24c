//! Canvas2D surface for the particle layer.

use std::f64::consts::TAU;
use veil_core::particles::LINK_WIDTH;
use veil_core::{DrawSurface, ParticleFrame, SurfaceSize};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct CanvasParticles {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: SurfaceSize,
}

impl CanvasParticles {
    /// Acquire a 2D context on `canvas`.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| format!("2d context failed: {e:?}"))?
            .ok_or_else(|| "2d context unsupported".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "2d context has unexpected type".to_string())?;
        Ok(Self {
            canvas: canvas.clone(),
            ctx,
            size: SurfaceSize::default(),
        })
    }

    fn clear(&self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.size.width as f64, self.size.height as f64);
    }
}

impl DrawSurface for CanvasParticles {
    type Frame = ParticleFrame;

    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.size = size;
    }

    fn present(&mut self, frame: &ParticleFrame) {
        self.clear();
        let [r, g, b] = frame.color;

        self.ctx.set_line_width(LINK_WIDTH as f64);
        for link in &frame.links {
            self.ctx.begin_path();
            self.ctx.set_stroke_style_str(&rgba_style(r, g, b, link.alpha));
            self.ctx.move_to(link.from.0 as f64, link.from.1 as f64);
            self.ctx.line_to(link.to.0 as f64, link.to.1 as f64);
            self.ctx.stroke();
        }

        for dot in &frame.dots {
            self.ctx.begin_path();
            if self
                .ctx
                .arc(dot.x as f64, dot.y as f64, dot.radius as f64, 0.0, TAU)
                .is_err()
            {
                continue;
            }
            self.ctx.set_fill_style_str(&rgba_style(r, g, b, dot.alpha));
            self.ctx.fill();
        }
    }

    fn release(&mut self) {
        self.clear();
        self.size = SurfaceSize::default();
    }
}

/// CSS `rgba()` string for a particle colour at `alpha`.
pub(crate) fn rgba_style(r: u8, g: u8, b: u8, alpha: f32) -> String {
    let a = (alpha.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
    format!("rgba({r}, {g}, {b}, {a})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rgba_style_rounds_alpha() {
        assert_eq!(rgba_style(251, 146, 60, 0.125), "rgba(251, 146, 60, 0.125)");
        assert_eq!(rgba_style(251, 146, 60, 0.03333), "rgba(251, 146, 60, 0.033)");
    }

    #[test]
    fn rgba_style_clamps() {
        assert_eq!(rgba_style(0, 0, 0, 2.0), "rgba(0, 0, 0, 1)");
        assert_eq!(rgba_style(0, 0, 0, -1.0), "rgba(0, 0, 0, 0)");
    }
}
