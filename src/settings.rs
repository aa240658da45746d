use std::num::NonZeroUsize;

use crate::item::{FALLBACK_TEXT, FontSpec, Rgb};

/// Field separator of the collage file format.
pub const DEFAULT_DELIMITER: &str = " ### ";

/// Configuration of the drawing canvas and the pipeline behind it.
///
/// The defaults reproduce the reference canvas: 800x600, light gray, black
/// text in a bold 24 px serif face.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    /// Color of items whose text color is unset.
    pub default_foreground: Rgb,
    /// Font of items whose font is unset.
    pub default_font: FontSpec,
    /// Text placed when the user submits a blank label.
    pub fallback_text: String,
    pub delimiter: String,
    /// `(block_size, capacity)` pairs of the glyph coverage cache. Glyphs go
    /// to the smallest block size that fits their bitmap.
    pub glyph_cache: Vec<(NonZeroUsize, NonZeroUsize)>,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: Rgb::LIGHT_GRAY,
            default_foreground: Rgb::BLACK,
            default_font: FontSpec::default(),
            fallback_text: FALLBACK_TEXT.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            glyph_cache: default_glyph_cache(),
        }
    }
}

impl CanvasSettings {
    /// Surface size as `[width, height]`.
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

fn default_glyph_cache() -> Vec<(NonZeroUsize, NonZeroUsize)> {
    const BLOCKS: [(usize, usize); 3] = [(1024, 512), (4096, 256), (16384, 64)];

    BLOCKS
        .iter()
        .filter_map(|&(block, capacity)| {
            Some((NonZeroUsize::new(block)?, NonZeroUsize::new(capacity)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let settings = CanvasSettings::default();
        assert_eq!(settings.size(), [800, 600]);
        assert_eq!(settings.background, Rgb::LIGHT_GRAY);
        assert_eq!(settings.default_foreground, Rgb::BLACK);
        assert_eq!(settings.delimiter, " ### ");
        assert_eq!(settings.fallback_text, "Hello World!");
        assert_eq!(settings.glyph_cache.len(), 3);
    }
}
