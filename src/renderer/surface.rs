use crate::item::Rgb;

/// RGBA8 pixel surface that collages are drawn onto.
///
/// Pixels are arranged in row-major order with the origin at the top-left,
/// four bytes per pixel, straight (not premultiplied) alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Surface {
    /// Creates a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Overwrites every pixel with an opaque color.
    pub fn fill(&mut self, color: Rgb) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// RGBA value at `(x, y)`, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    /// Source-over compositing of `color` at `alpha` onto `(x, y)`.
    ///
    /// `alpha` is in `[0, 1]`; out-of-range coordinates are ignored.
    pub fn blend(&mut self, x: u32, y: u32, color: [f32; 3], alpha: f32) {
        if alpha <= 0.0 || x >= self.width || y >= self.height {
            return;
        }
        let a = alpha.min(1.0);
        let idx = self.index(x, y);
        let dst = &mut self.pixels[idx..idx + 4];

        let bg_a = dst[3] as f32 / 255.0;
        let out_a = a + bg_a * (1.0 - a);
        if out_a <= 0.0 {
            return;
        }

        for channel in 0..3 {
            let bg = dst[channel] as f32 / 255.0;
            let out = (color[channel] * a + bg * bg_a * (1.0 - a)) / out_a;
            dst[channel] = to_byte(out);
        }
        dst[3] = to_byte(out_a);
    }

    /// Drops the alpha channel, e.g. for formats without transparency.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let rgb: Vec<u8> = self
            .pixels
            .chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect();
        image::RgbImage::from_raw(self.width, self.height, rgb)
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
