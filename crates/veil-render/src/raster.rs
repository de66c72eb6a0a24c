//! CPU rasterization of the noise veil.
//!
//! Evaluates [`veil_core::shade`] at every pixel centre. Row 0 is the top of
//! the image, so uv.y runs from 1 at the top to 0 at the bottom, matching
//! `gl_FragCoord` on the GPU path.

use veil_core::{DrawSurface, RenderState, SurfaceSize};

/// A reusable RGBA8 buffer holding one rendered frame of the veil.
/// Pixels are straight (non-premultiplied) alpha, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FieldRaster {
    pub fn new(width: u32, height: u32) -> Self {
        let mut raster = Self::default();
        raster.resize(width, height);
        raster
    }

    /// Size to a surface's backing store.
    pub fn for_surface(size: SurfaceSize) -> Self {
        Self::new(size.width, size.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.resize(width as usize * height as usize * 4, 0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA of the pixel at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Normalized coordinate of the centre of pixel (x, y).
    pub fn uv(&self, x: u32, y: u32) -> (f32, f32) {
        let u = (x as f32 + 0.5) / self.width as f32;
        let v = 1.0 - (y as f32 + 0.5) / self.height as f32;
        (u, v)
    }

    /// Render one frame into the buffer.
    pub fn render(&mut self, state: &RenderState) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let width = self.width as usize;
        for (row_idx, row) in self.pixels.chunks_exact_mut(width * 4).enumerate() {
            let v = 1.0 - (row_idx as f32 + 0.5) / self.height as f32;
            for (col, px) in row.chunks_exact_mut(4).enumerate() {
                let u = (col as f32 + 0.5) / self.width as f32;
                px.copy_from_slice(&state.shade((u, v)).to_rgba8());
            }
        }
        log::trace!("rasterized veil {}x{} at t={}", self.width, self.height, state.elapsed);
    }
}

impl DrawSurface for FieldRaster {
    type Frame = RenderState;

    fn resize(&mut self, size: SurfaceSize) {
        FieldRaster::resize(self, size.width, size.height);
    }

    fn present(&mut self, frame: &RenderState) {
        self.render(frame);
    }

    fn release(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
    }
}

/// Render one frame into a fresh buffer.
pub fn rasterize_field(size: SurfaceSize, state: &RenderState) -> FieldRaster {
    let mut raster = FieldRaster::for_surface(size);
    raster.render(state);
    raster
}
