/// Text substituted for labels whose text is empty or only whitespace.
pub const FALLBACK_TEXT: &str = "Hello World!";

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const LIGHT_GRAY: Self = Self::new(192, 192, 192);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as normalized floats, used by the compositor.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Generic or named font family of a [`FontSpec`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
    Named(String),
}

/// Description of the font a label is drawn with.
///
/// A spec is resolved to a concrete face by
/// [`FontStorage::resolve`](crate::FontStorage::resolve) at render time, so
/// the same item can be drawn on machines with different installed fonts.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    /// Font size in pixels.
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            bold: false,
            italic: false,
            size,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

impl Default for FontSpec {
    /// Serif, bold, 24 px: the canvas default font.
    fn default() -> Self {
        Self::new(FontFamily::Serif, 24.0).bold()
    }
}

/// One placed, styled text label.
///
/// Items are values: once built they are never edited in place. The optional
/// fields keep "unset" distinct from any explicit value, so an item without a
/// text color follows the canvas foreground wherever it is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    text: String,
    x: i32,
    y: i32,
    text_color: Option<Rgb>,
    font: Option<FontSpec>,
    magnification: f32,
    rotation_angle: f32,
    text_transparency: f32,
    background_transparency: f32,
    border: bool,
    background: Option<Rgb>,
}

impl TextItem {
    /// Creates an item with default styling, centered on `(x, y)`.
    ///
    /// Line breaks become spaces and blank text is replaced by
    /// [`FALLBACK_TEXT`].
    pub fn new(text: impl Into<String>, x: i32, y: i32) -> Self {
        Self::builder(text, x, y).build()
    }

    pub fn builder(text: impl Into<String>, x: i32, y: i32) -> TextItemBuilder {
        TextItemBuilder::new(text.into(), x, y)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn text_color(&self) -> Option<Rgb> {
        self.text_color
    }

    /// The explicit color, or `default` when the item has none.
    pub fn resolved_color(&self, default: Rgb) -> Rgb {
        self.text_color.unwrap_or(default)
    }

    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref()
    }

    pub fn magnification(&self) -> f32 {
        self.magnification
    }

    /// Rotation in degrees; positive values turn the label counter-clockwise.
    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    pub fn text_transparency(&self) -> f32 {
        self.text_transparency
    }

    pub fn background_transparency(&self) -> f32 {
        self.background_transparency
    }

    pub fn border(&self) -> bool {
        self.border
    }

    pub fn background(&self) -> Option<Rgb> {
        self.background
    }
}

/// Builder for the optional styling of a [`TextItem`].
#[derive(Clone, Debug)]
pub struct TextItemBuilder {
    item: TextItem,
}

impl TextItemBuilder {
    fn new(text: String, x: i32, y: i32) -> Self {
        // labels are a single line
        let text = if text.contains(['\n', '\r']) {
            text.replace("\r\n", " ").replace(['\n', '\r'], " ")
        } else {
            text
        };
        let text = if text.trim().is_empty() {
            FALLBACK_TEXT.to_string()
        } else {
            text
        };

        Self {
            item: TextItem {
                text,
                x,
                y,
                text_color: None,
                font: None,
                magnification: 1.0,
                rotation_angle: 0.0,
                text_transparency: 0.0,
                background_transparency: 0.0,
                border: false,
                background: None,
            },
        }
    }

    pub fn text_color(mut self, color: Rgb) -> Self {
        self.item.text_color = Some(color);
        self
    }

    /// Sets or unsets the text color in one call.
    pub fn maybe_text_color(mut self, color: Option<Rgb>) -> Self {
        self.item.text_color = color;
        self
    }

    pub fn font(mut self, font: FontSpec) -> Self {
        self.item.font = Some(font);
        self
    }

    /// Scale factor for the whole label. Non-positive or non-finite values
    /// are ignored.
    pub fn magnification(mut self, magnification: f32) -> Self {
        if magnification.is_finite() && magnification > 0.0 {
            self.item.magnification = magnification;
        } else {
            log::warn!("Ignoring invalid magnification {magnification}, keeping 1.0.");
        }
        self
    }

    pub fn rotation_angle(mut self, degrees: f32) -> Self {
        if degrees.is_finite() {
            self.item.rotation_angle = degrees;
        } else {
            log::warn!("Ignoring non-finite rotation angle.");
        }
        self
    }

    /// Clamped to `[0, 1]`; `0` is opaque.
    pub fn text_transparency(mut self, transparency: f32) -> Self {
        self.item.text_transparency = clamp_unit(transparency);
        self
    }

    /// Clamped to `[0, 1]`; `0` is opaque.
    pub fn background_transparency(mut self, transparency: f32) -> Self {
        self.item.background_transparency = clamp_unit(transparency);
        self
    }

    pub fn border(mut self, border: bool) -> Self {
        self.item.border = border;
        self
    }

    pub fn background(mut self, color: Rgb) -> Self {
        self.item.background = Some(color);
        self
    }

    pub fn build(self) -> TextItem {
        self.item
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let item = TextItem::new("Hello World!", 100, 150);
        assert_eq!(item.text(), "Hello World!");
        assert_eq!((item.x(), item.y()), (100, 150));
        assert_eq!(item.text_color(), None);
        assert_eq!(item.font(), None);
        assert_eq!(item.magnification(), 1.0);
        assert_eq!(item.rotation_angle(), 0.0);
        assert_eq!(item.text_transparency(), 0.0);
        assert_eq!(item.background_transparency(), 0.0);
        assert!(!item.border());
        assert_eq!(item.background(), None);
    }

    #[test]
    fn test_blank_text_uses_fallback() {
        assert_eq!(TextItem::new("", 0, 0).text(), FALLBACK_TEXT);
        assert_eq!(TextItem::new("  \t ", 0, 0).text(), FALLBACK_TEXT);
        // non-blank text is kept verbatim, surrounding spaces included
        assert_eq!(TextItem::new(" a ", 0, 0).text(), " a ");
    }

    #[test]
    fn test_line_breaks_become_spaces() {
        assert_eq!(TextItem::new("line one\nline two", 0, 0).text(), "line one line two");
        assert_eq!(TextItem::new("a\r\nb\rc", 0, 0).text(), "a b c");
        assert_eq!(TextItem::new("\n\r\n", 0, 0).text(), FALLBACK_TEXT);
        assert_eq!(TextItem::new("tab\tok", 0, 0).text(), "tab\tok");
    }

    #[test]
    fn test_unset_color_differs_from_black() {
        let unset = TextItem::new("a", 0, 0);
        let black = TextItem::builder("a", 0, 0).text_color(Rgb::BLACK).build();
        assert_ne!(unset, black);
        assert_eq!(unset.resolved_color(Rgb::WHITE), Rgb::WHITE);
        assert_eq!(black.resolved_color(Rgb::WHITE), Rgb::BLACK);
    }

    #[test]
    fn test_builder_sanitizes_values() {
        let item = TextItem::builder("a", 0, 0)
            .magnification(-2.0)
            .text_transparency(1.5)
            .background_transparency(f32::NAN)
            .rotation_angle(f32::INFINITY)
            .build();
        assert_eq!(item.magnification(), 1.0);
        assert_eq!(item.text_transparency(), 1.0);
        assert_eq!(item.background_transparency(), 0.0);
        assert_eq!(item.rotation_angle(), 0.0);
    }

    #[test]
    fn test_default_font_spec() {
        let spec = FontSpec::default();
        assert_eq!(spec.family, FontFamily::Serif);
        assert!(spec.bold);
        assert!(!spec.italic);
        assert_eq!(spec.size, 24.0);
    }
}
