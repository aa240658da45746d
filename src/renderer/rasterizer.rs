mod glyph_cache;

use std::path::PathBuf;

use euclid::default::{Point2D, Transform2D};
use euclid::{Angle, point2, vec2};
use parking_lot::Mutex;

use crate::{
    collage::Collage,
    font_storage::FontStorage,
    item::{FontSpec, Rgb, TextItem},
    renderer::Surface,
    settings::CanvasSettings,
    text::LabelLayout,
};

pub use glyph_cache::{GlyphCache, GlyphCacheItem, GlyphKey, SUB_PIXEL_QUANTIZE};

/// Space between the text and the edge of its background box or border,
/// before magnification.
pub const LABEL_PADDING: f32 = 3.0;

/// Largest font size, in pixels, at which glyphs are rasterized. Bigger
/// labels are sampled from a rendering at this size.
pub const MAX_RASTER_FONT_SIZE: f32 = 256.0;

/// Draws collages onto [`Surface`]s.
///
/// There is one drawing routine per item, [`Rasterizer::draw_item`], and both
/// the on-screen view and image export go through it, so an exported image is
/// exactly what the canvas shows.
///
/// The font storage and glyph cache sit behind `Mutex`es so a shared
/// rasterizer can render through `&self`, which is what UI callbacks usually
/// have at hand.
pub struct Rasterizer {
    background: Rgb,
    default_foreground: Rgb,
    default_font: FontSpec,
    pub font_storage: Mutex<FontStorage>,
    pub cache: Mutex<GlyphCache>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(&CanvasSettings::default())
    }
}

impl Rasterizer {
    /// Creates a rasterizer with an empty font storage.
    pub fn new(settings: &CanvasSettings) -> Self {
        Self {
            background: settings.background,
            default_foreground: settings.default_foreground,
            default_font: settings.default_font.clone(),
            font_storage: Mutex::new(FontStorage::new()),
            cache: Mutex::new(GlyphCache::new(&settings.glyph_cache)),
        }
    }

    /// Creates a rasterizer and loads the fonts installed on the system.
    pub fn with_system_fonts(settings: &CanvasSettings) -> Self {
        let rasterizer = Self::new(settings);
        rasterizer.load_system_fonts();
        rasterizer
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    pub fn default_foreground(&self) -> Rgb {
        self.default_foreground
    }

    pub fn default_font(&self) -> &FontSpec {
        &self.default_font
    }
}

/// font loading
impl Rasterizer {
    pub fn load_system_fonts(&self) {
        self.font_storage.lock().load_system_fonts();
        self.cache.lock().clear();
    }

    pub fn load_font_binary(&self, data: impl Into<Vec<u8>>) {
        self.font_storage.lock().load_font_binary(data);
        self.cache.lock().clear();
    }

    pub fn load_font_file(&self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_storage.lock().load_font_file(path)?;
        self.cache.lock().clear();
        Ok(())
    }

    /// Whether any font face is available for drawing text.
    pub fn has_fonts(&self) -> bool {
        !self.font_storage.lock().is_empty()
    }
}

/// rendering
impl Rasterizer {
    /// Renders `collage` onto a new `width` x `height` surface.
    pub fn render(&self, collage: &Collage, width: u32, height: u32) -> Surface {
        let mut surface = Surface::new(width, height);
        self.render_into(collage, &mut surface);
        surface
    }

    /// Clears `surface` to the background and draws every item in order.
    pub fn render_into(&self, collage: &Collage, surface: &mut Surface) {
        surface.fill(self.background);
        for item in collage.items() {
            self.draw_item(surface, item);
        }
    }

    /// Draws one label centered on its anchor, over whatever is already on
    /// the surface.
    ///
    /// The label is laid out at `font size * magnification`, then placed with
    /// a rotation about the anchor. Layers are the background box, the
    /// border, then the text.
    ///
    /// Glyphs are rasterized at no more than [`MAX_RASTER_FONT_SIZE`] pixels.
    /// Larger labels are laid out at that size and scaled up while sampling,
    /// so memory stays bounded however far a label is magnified.
    pub fn draw_item(&self, surface: &mut Surface, item: &TextItem) {
        let spec = item.font().unwrap_or(&self.default_font);
        let font_size = spec.size * item.magnification();
        let raster_size = font_size.min(MAX_RASTER_FONT_SIZE);
        // device pixels per label-local unit
        let upscale = if raster_size > 0.0 {
            font_size / raster_size
        } else {
            1.0
        };
        if !upscale.is_finite() {
            log::warn!("Skipping label {:?}: font size {font_size} is out of range", item.text());
            return;
        }

        let (layout, half_w, half_h, mask) = {
            let mut font_storage = self.font_storage.lock();
            let layout = match font_storage.resolve(spec) {
                Some((id, font)) => LabelLayout::new(item.text(), id, &font, raster_size),
                None => LabelLayout::default(),
            };
            // whole-pixel centering keeps unrotated text on the pixel grid
            let half_w = (layout.width / 2.0).floor();
            let half_h = (layout.height() / 2.0).floor();
            let baseline = point2(-half_w, -half_h + layout.ascent);
            let mask = TextMask::new(
                &layout,
                baseline,
                &mut self.cache.lock(),
                &mut font_storage,
            );
            (layout, half_w, half_h, mask)
        };

        // one device pixel in label-local units
        let pixel = 1.0 / upscale;
        let pad = LABEL_PADDING * item.magnification() * pixel;
        let label_box = LocalRect {
            x0: -half_w - pad,
            y0: -half_h - pad,
            x1: -half_w + layout.width.ceil() + pad,
            y1: -half_h + layout.height().ceil() + pad,
        };

        let to_device = Transform2D::scale(upscale, upscale)
            .then_rotate(Angle::degrees(-item.rotation_angle()))
            .then_translate(vec2(item.x() as f32, item.y() as f32));
        let Some(to_local) = to_device.inverse() else {
            return;
        };

        let mut extent = label_box.outset(pixel);
        if let Some(mask) = &mask {
            extent = extent.union(&mask.rect());
        }
        let Some([x_min, y_min, x_max, y_max]) = device_bounds(&to_device, &extent, surface)
        else {
            return;
        };

        let text_color = item.resolved_color(self.default_foreground).to_f32();
        let text_alpha = 1.0 - item.text_transparency();
        let background = item
            .background()
            .map(|color| (color.to_f32(), 1.0 - item.background_transparency()));

        for py in y_min..y_max {
            for px in x_min..x_max {
                let p = to_local.transform_point(point2(px as f32 + 0.5, py as f32 + 0.5));

                if let Some((color, alpha)) = background {
                    surface.blend(px, py, color, alpha * label_box.coverage(p, pixel));
                }
                if item.border() {
                    let outline = label_box.outline_coverage(p, pixel);
                    surface.blend(px, py, text_color, text_alpha * outline);
                }
                if let Some(mask) = &mask {
                    surface.blend(px, py, text_color, text_alpha * mask.sample(p));
                }
            }
        }
    }
}

/// Axis-aligned rectangle in label-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LocalRect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl LocalRect {
    fn outset(&self, by: f32) -> Self {
        Self {
            x0: self.x0 - by,
            y0: self.y0 - by,
            x1: self.x1 + by,
            y1: self.y1 + by,
        }
    }

    fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn corners(&self) -> [Point2D<f32>; 4] {
        [
            point2(self.x0, self.y0),
            point2(self.x1, self.y0),
            point2(self.x1, self.y1),
            point2(self.x0, self.y1),
        ]
    }

    /// Area coverage of the square footprint of side `pixel` centered on
    /// `p`.
    fn coverage(&self, p: Point2D<f32>, pixel: f32) -> f32 {
        let cx = ((p.x - self.x0) / pixel + 0.5)
            .min((self.x1 - p.x) / pixel + 0.5)
            .clamp(0.0, 1.0);
        let cy = ((p.y - self.y0) / pixel + 0.5)
            .min((self.y1 - p.y) / pixel + 0.5)
            .clamp(0.0, 1.0);
        cx * cy
    }

    /// Coverage of a one-device-pixel outline on the left and top edges and
    /// just outside the right and bottom edges, like an integer `drawRect`.
    fn outline_coverage(&self, p: Point2D<f32>, pixel: f32) -> f32 {
        let outer = LocalRect {
            x1: self.x1 + pixel,
            y1: self.y1 + pixel,
            ..*self
        };
        let inner = LocalRect {
            x0: self.x0 + pixel,
            y0: self.y0 + pixel,
            ..*self
        };
        (outer.coverage(p, pixel) - inner.coverage(p, pixel)).max(0.0)
    }
}

/// Pixel range `[x_min, y_min, x_max, y_max)` touched by `rect` once
/// transformed, clipped to the surface. `None` when nothing is visible.
fn device_bounds(
    to_device: &Transform2D<f32>,
    rect: &LocalRect,
    surface: &Surface,
) -> Option<[u32; 4]> {
    let corners = rect.corners().map(|c| to_device.transform_point(c));
    let (mut x_min, mut y_min) = (f32::INFINITY, f32::INFINITY);
    let (mut x_max, mut y_max) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for c in corners {
        x_min = x_min.min(c.x);
        y_min = y_min.min(c.y);
        x_max = x_max.max(c.x);
        y_max = y_max.max(c.y);
    }

    let clip = |v: f32, max: u32| v.clamp(0.0, max as f32) as u32;
    let bounds = [
        clip(x_min.floor(), surface.width),
        clip(y_min.floor(), surface.height),
        clip(x_max.ceil(), surface.width),
        clip(y_max.ceil(), surface.height),
    ];

    (bounds[0] < bounds[2] && bounds[1] < bounds[3]).then_some(bounds)
}

/// Accumulated glyph coverage of one label in label-local pixels.
struct TextMask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

impl TextMask {
    /// Rasterizes the glyphs of `layout` with the baseline starting at
    /// `baseline`. `None` when the label has no visible glyphs.
    fn new(
        layout: &LabelLayout,
        baseline: Point2D<f32>,
        cache: &mut GlyphCache,
        font_storage: &mut FontStorage,
    ) -> Option<Self> {
        let [min_x, min_y, max_x, max_y] = layout.ink_bounds()?;
        let x0 = (baseline.x + min_x).floor() as i32;
        let y0 = (baseline.y + min_y).floor() as i32;
        let width = ((baseline.x + max_x).ceil() as i32 - x0).max(0) as usize + 1;
        let height = ((baseline.y + max_y).ceil() as i32 - y0).max(0) as usize + 1;

        let mut mask = Self {
            x0,
            y0,
            width,
            height,
            coverage: vec![0; width * height],
        };

        for glyph in &layout.glyphs {
            let Some(cached) = cache.get(&glyph.key, font_storage) else {
                continue;
            };
            let origin_x = (baseline.x + glyph.x).floor() as i32 - x0;
            let origin_y = (baseline.y + glyph.y).floor() as i32 - y0;

            for row in 0..cached.height {
                let iy = origin_y + row as i32;
                if iy < 0 || iy as usize >= mask.height {
                    continue;
                }
                for col in 0..cached.width {
                    let src_alpha = cached.data[row * cached.width + col];
                    if src_alpha == 0 {
                        continue;
                    }
                    let ix = origin_x + col as i32;
                    if ix < 0 || ix as usize >= mask.width {
                        continue;
                    }

                    let idx = iy as usize * mask.width + ix as usize;
                    mask.coverage[idx] = mask.coverage[idx].saturating_add(src_alpha);
                }
            }
        }

        Some(mask)
    }

    fn rect(&self) -> LocalRect {
        LocalRect {
            x0: self.x0 as f32,
            y0: self.y0 as f32,
            x1: (self.x0 + self.width as i32) as f32,
            y1: (self.y0 + self.height as i32) as f32,
        }
    }

    fn texel(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.coverage[y as usize * self.width + x as usize] as f32 / 255.0
    }

    /// Bilinear coverage at local point `p`; texel centers sit at half
    /// pixels, so unrotated labels sample texels exactly.
    fn sample(&self, p: Point2D<f32>) -> f32 {
        let fx = p.x - self.x0 as f32 - 0.5;
        let fy = p.y - self.y0 as f32 - 0.5;
        let (ix, iy) = (fx.floor(), fy.floor());
        let (tx, ty) = (fx - ix, fy - iy);
        let (ix, iy) = (ix as i32, iy as i32);

        let top = self.texel(ix, iy) * (1.0 - tx) + self.texel(ix + 1, iy) * tx;
        let bottom = self.texel(ix, iy + 1) * (1.0 - tx) + self.texel(ix + 1, iy + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: [u8; 4] = [192, 192, 192, 255];

    fn rasterizer() -> Rasterizer {
        Rasterizer::with_system_fonts(&CanvasSettings::default())
    }

    fn sample_collage() -> Collage {
        let mut collage = Collage::new();
        collage.add(TextItem::new("Hello World!", 100, 150));
        collage.add(
            TextItem::builder("rotated", 400, 300)
                .rotation_angle(30.0)
                .magnification(2.5)
                .background(Rgb::new(0, 0, 255))
                .background_transparency(0.4)
                .text_transparency(0.3)
                .border(true)
                .text_color(Rgb::new(200, 30, 30))
                .build(),
        );
        collage.add(TextItem::new("edge", 799, 599));
        collage
    }

    fn count_pixels(surface: &Surface, pred: impl Fn([u8; 4]) -> bool) -> usize {
        surface
            .pixels
            .chunks_exact(4)
            .filter(|p| pred([p[0], p[1], p[2], p[3]]))
            .count()
    }

    #[test]
    fn test_empty_collage_is_background() {
        let surface = Rasterizer::default().render(&Collage::new(), 800, 600);
        assert_eq!((surface.width, surface.height), (800, 600));
        assert_eq!(count_pixels(&surface, |p| p != GRAY), 0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let rasterizer = rasterizer();
        let collage = sample_collage();
        let first = rasterizer.render(&collage, 800, 600);
        let second = rasterizer.render(&collage, 800, 600);
        assert_eq!(first, second);

        // a fresh rasterizer with a cold cache draws the same pixels
        let third = self::rasterizer().render(&collage, 800, 600);
        assert_eq!(first, third);
    }

    #[test]
    fn test_render_into_matches_render() {
        let rasterizer = rasterizer();
        let collage = sample_collage();
        let exported = rasterizer.render(&collage, 640, 480);

        let mut live = Surface::new(640, 480);
        live.fill(Rgb::WHITE);
        rasterizer.render_into(&collage, &mut live);
        assert_eq!(live, exported);
    }

    #[test]
    fn test_background_box_without_fonts() {
        // no fonts: the label shrinks to its padding box
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("x", 50, 50)
                .background(Rgb::new(255, 0, 0))
                .build(),
        );
        let surface = rasterizer.render(&collage, 100, 100);

        assert_eq!(surface.pixel(50, 50), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(47, 47), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(52, 52), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(53, 53), Some(GRAY));
        assert_eq!(surface.pixel(46, 50), Some(GRAY));
        assert_eq!(count_pixels(&surface, |p| p == [255, 0, 0, 255]), 36);
    }

    #[test]
    fn test_border_uses_text_color() {
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        collage.add(TextItem::builder("x", 50, 50).border(true).build());
        let surface = rasterizer.render(&collage, 100, 100);

        // outline of the 6x6 box from 47 to 53 inclusive
        assert_eq!(surface.pixel(47, 47), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(53, 50), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(50, 53), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(50, 50), Some(GRAY));
        assert_eq!(count_pixels(&surface, |p| p == [0, 0, 0, 255]), 24);
    }

    #[test]
    fn test_transparent_background_blends() {
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("x", 50, 50)
                .background(Rgb::WHITE)
                .background_transparency(1.0)
                .build(),
        );
        collage.add(
            TextItem::builder("x", 20, 20)
                .background(Rgb::WHITE)
                .background_transparency(0.5)
                .build(),
        );
        let surface = rasterizer.render(&collage, 100, 100);
        assert_eq!(surface.pixel(50, 50), Some(GRAY));
        let [r, ..] = surface.pixel(20, 20).unwrap();
        assert!((223..=224).contains(&r), "r = {r}");
    }

    #[test]
    fn test_later_items_draw_on_top() {
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        collage.add(TextItem::builder("a", 50, 50).background(Rgb::new(255, 0, 0)).build());
        collage.add(TextItem::builder("b", 50, 50).background(Rgb::new(0, 255, 0)).build());
        let surface = rasterizer.render(&collage, 100, 100);
        assert_eq!(surface.pixel(50, 50), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_rotation_turns_box() {
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("x", 50, 50)
                .magnification(10.0)
                .rotation_angle(45.0)
                .background(Rgb::BLACK)
                .build(),
        );
        let surface = rasterizer.render(&collage, 100, 100);
        // a 60 px square turned by 45 degrees reaches ~42 px from the center
        // along the axes but leaves its own corners empty
        assert_eq!(surface.pixel(50, 12), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(22, 22), Some(GRAY));
    }

    #[test]
    fn test_text_uses_default_foreground() {
        let rasterizer = rasterizer();
        if !rasterizer.has_fonts() {
            return;
        }

        let mut collage = Collage::new();
        collage.add(TextItem::new("Hello World!", 100, 150));
        let surface = rasterizer.render(&collage, 800, 600);

        let dark = count_pixels(&surface, |p| p[0] < 64 && p[1] < 64 && p[2] < 64);
        assert!(dark > 50, "expected black text, found {dark} dark pixels");
        // the label is centered: nothing far from the anchor is touched
        assert_eq!(surface.pixel(100, 300), Some(GRAY));
        assert_eq!(surface.pixel(300, 150), Some(GRAY));
    }

    #[test]
    fn test_unset_color_follows_canvas_foreground() {
        let settings = CanvasSettings {
            default_foreground: Rgb::new(255, 0, 0),
            ..CanvasSettings::default()
        };
        let rasterizer = Rasterizer::with_system_fonts(&settings);
        let mut collage = Collage::new();
        collage.add(TextItem::builder("Hello World!", 100, 100).border(true).build());
        let surface = rasterizer.render(&collage, 200, 200);

        let red = count_pixels(&surface, |p| p == [255, 0, 0, 255]);
        assert!(red > 0);
        assert_eq!(count_pixels(&surface, |p| p[0] < 64 && p[1] < 64 && p[2] < 64), 0);

        // an explicit color still wins
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("Hello World!", 100, 100)
                .border(true)
                .text_color(Rgb::new(0, 0, 255))
                .build(),
        );
        let surface = rasterizer.render(&collage, 200, 200);
        assert_eq!(count_pixels(&surface, |p| p == [255, 0, 0, 255]), 0);
        assert!(count_pixels(&surface, |p| p == [0, 0, 255, 255]) > 0);
    }

    #[test]
    fn test_huge_magnification_on_small_surface() {
        let rasterizer = rasterizer();
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("Hello World!", 32, 32)
                .magnification(1000.0)
                .background(Rgb::WHITE)
                .build(),
        );
        let surface = rasterizer.render(&collage, 64, 64);

        // the box alone is thousands of pixels wide and covers everything
        assert_eq!(count_pixels(&surface, |p| p == GRAY), 0);
    }

    #[test]
    fn test_box_keeps_scaling_past_raster_cap() {
        let rasterizer = Rasterizer::default();
        let mut collage = Collage::new();
        // 24 px * 20 is above the cap
        collage.add(
            TextItem::builder("x", 100, 100)
                .magnification(20.0)
                .background(Rgb::new(255, 0, 0))
                .build(),
        );
        let surface = rasterizer.render(&collage, 200, 200);

        // 3 px padding * 20 on every side of an empty label
        assert_eq!(count_pixels(&surface, |p| p == [255, 0, 0, 255]), 120 * 120);
        assert_eq!(surface.pixel(39, 100), Some(GRAY));
        assert_eq!(surface.pixel(160, 100), Some(GRAY));
    }

    #[test]
    fn test_off_canvas_item_is_clipped() {
        let rasterizer = rasterizer();
        let mut collage = Collage::new();
        collage.add(
            TextItem::builder("far away", -5000, -5000)
                .background(Rgb::BLACK)
                .build(),
        );
        let surface = rasterizer.render(&collage, 50, 50);
        assert_eq!(count_pixels(&surface, |p| p != GRAY), 0);
    }

    #[test]
    fn test_zero_sized_surface() {
        let surface = rasterizer().render(&sample_collage(), 0, 0);
        assert!(surface.pixels.is_empty());
    }
}
