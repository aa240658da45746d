use crate::item::{Rgb, TextItem};

/// Text of every generated item.
pub const SCATTER_TEXT: &str = "lorem ipsum";

/// Upper bound (inclusive) of each generated color channel.
///
/// Deliberately 250 rather than 255; saved collages made by the reference
/// generator never contain brighter channels.
pub const MAX_CHANNEL: u8 = 250;

/// Produces randomly placed and colored labels for bulk population.
pub struct ScatterGenerator {
    width: u32,
    height: u32,
    rng: fastrand::Rng,
}

impl Default for ScatterGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScatterGenerator {
    /// Generator for the default 800x600 surface.
    pub fn new() -> Self {
        Self::for_surface(800, 600)
    }

    /// Generator whose positions stay within a `width` x `height` surface.
    pub fn for_surface(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rng: fastrand::Rng::new(),
        }
    }

    /// Reseeds the generator so batches are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Tracks a new surface size for subsequent batches.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Samples `n` independent items.
    ///
    /// `x` is uniform in `[0, width]`, `y` in `[0, height]` (both inclusive)
    /// and each color channel in `[0, MAX_CHANNEL]`.
    pub fn generate(&mut self, n: usize) -> Vec<TextItem> {
        (0..n).map(|_| self.sample()).collect()
    }

    fn sample(&mut self) -> TextItem {
        let x = self.rng.i64(0..=i64::from(self.width));
        let y = self.rng.i64(0..=i64::from(self.height));
        let color = Rgb::new(
            self.rng.u8(0..=MAX_CHANNEL),
            self.rng.u8(0..=MAX_CHANNEL),
            self.rng.u8(0..=MAX_CHANNEL),
        );

        TextItem::builder(SCATTER_TEXT, saturate(x), saturate(y))
            .text_color(color)
            .build()
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
