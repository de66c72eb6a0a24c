pub mod paint;
pub mod raster;

pub use paint::{field_image, paint_field, paint_frame, paint_particles};
pub use raster::{FieldRaster, rasterize_field};
