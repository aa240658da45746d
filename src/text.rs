/// Single-line glyph layout of label text.
pub mod layout;

pub use layout::{LabelLayout, PlacedGlyph};
