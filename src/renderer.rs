pub mod export;
pub mod rasterizer;
pub mod surface;

pub use export::export_image;
pub use rasterizer::{GlyphKey, Rasterizer};
pub use surface::Surface;
