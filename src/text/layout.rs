use std::sync::Arc;

use crate::renderer::GlyphKey;

/// A glyph bitmap placed relative to the start of the baseline.
///
/// **Y-axis goes down**: `y` is the top of the glyph bitmap, so glyphs that
/// rise above the baseline have negative `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub key: GlyphKey,
    pub x: f32,
    pub y: f32,
    pub width: usize,
    pub height: usize,
}

/// Measured and positioned glyphs of one label.
///
/// `width` is the kerned advance width of the text and `ascent`/`descent`
/// come from the face's horizontal line metrics (`descent` is positive and
/// measured downwards). Their sum is the label's nominal height, which is
/// what the label box and the centering are computed from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelLayout {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub glyphs: Vec<PlacedGlyph>,
}

impl LabelLayout {
    /// Lays out `text` on a single line at `font_size` pixels.
    ///
    /// Line breaks and other control characters have no glyph of their own
    /// and only contribute their advance, matching how the label is drawn as
    /// a single run of text.
    pub fn new(text: &str, font_id: fontdb::ID, font: &Arc<fontdue::Font>, font_size: f32) -> Self {
        let Some(line_metrics) = font.horizontal_line_metrics(font_size) else {
            return Self::default();
        };

        let mut glyphs = Vec::with_capacity(text.len());
        let mut origin_x = 0.0f32;
        let mut previous: Option<(u16, f32)> = None;

        for ch in text.chars() {
            let glyph_index = font.lookup_glyph_index(ch);
            let metrics = font.metrics_indexed(glyph_index, font_size);

            if let Some((prev_index, prev_advance)) = previous {
                let kerning = font
                    .horizontal_kern_indexed(prev_index, glyph_index, font_size)
                    .unwrap_or(0.0);
                origin_x += prev_advance + kerning;
            }

            if !ch.is_control() && metrics.width > 0 && metrics.height > 0 {
                glyphs.push(PlacedGlyph {
                    key: GlyphKey::new(font_id, glyph_index, font_size),
                    x: origin_x + metrics.xmin as f32,
                    y: -(metrics.ymin as f32 + metrics.height as f32),
                    width: metrics.width,
                    height: metrics.height,
                });
            }

            previous = Some((glyph_index, metrics.advance_width));
        }

        let width = match previous {
            Some((_, last_advance)) => origin_x + last_advance,
            None => 0.0,
        };

        Self {
            width: width.max(0.0),
            ascent: line_metrics.ascent,
            descent: -line_metrics.descent,
            glyphs,
        }
    }

    /// Nominal height of the label: ascent plus descent.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Smallest rectangle `[min_x, min_y, max_x, max_y]` around all glyph
    /// bitmaps, relative to the baseline start. `None` without glyphs.
    pub fn ink_bounds(&self) -> Option<[f32; 4]> {
        self.glyphs.iter().fold(None, |bounds, glyph| {
            let rect = [
                glyph.x,
                glyph.y,
                glyph.x + glyph.width as f32,
                glyph.y + glyph.height as f32,
            ];
            Some(match bounds {
                None => rect,
                Some([x0, y0, x1, y1]) => [
                    x0.min(rect[0]),
                    y0.min(rect[1]),
                    x1.max(rect[2]),
                    y1.max(rect[3]),
                ],
            })
        })
    }
}
