//! # Textcollage
//!
//! A small text collage engine: labels placed on a canvas, saved to and
//! loaded from a line-oriented text format, and rasterized to pixels.
//!
//! ## Overview
//!
//! A [`Collage`] is an ordered list of [`TextItem`]s. The [`CollageCodec`]
//! reads and writes the ` ### ` delimited file format, the [`Rasterizer`]
//! draws a collage onto a [`Surface`] which [`export_image`] writes as a PNG,
//! and the [`ScatterGenerator`] fills a canvas with randomly placed labels.
//! The [`editor::Editor`] wires these together behind a
//! [`editor::UiCollaborator`] supplied by the user interface.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use textcollage::{CanvasSettings, Collage, CollageCodec, Rasterizer, TextItem, export_image};
//!
//! let settings = CanvasSettings::default();
//! let rasterizer = Rasterizer::with_system_fonts(&settings);
//!
//! let mut collage = Collage::new();
//! collage.add(TextItem::new("Hello World!", 400, 300));
//!
//! let codec = CollageCodec::from_settings(&settings);
//! codec.save(&collage, "collage.txt".as_ref())?;
//!
//! let surface = rasterizer.render(&collage, settings.width, settings.height);
//! export_image(&surface, "textimage.png".as_ref())?;
//! # Ok::<(), textcollage::CollageError>(())
//! ```
//!
//! ## Features
//!
//! *   **Single-level undo**: the last label can be taken back while more than one remains.
//! *   **One draw routine**: the live view and image export share [`Rasterizer::draw_item`].
//! *   **Font Management**: system fonts or custom font files through [`FontStorage`].
//! *   **Thread Safety**: the rasterizer keeps its font and glyph caches behind locks.

pub mod codec;
pub mod collage;
pub mod editor;
pub mod error;
pub mod font_storage;
pub mod item;
pub mod renderer;
pub mod scatter;
pub mod settings;
pub mod text;

// common re-exports
pub use codec::CollageCodec;
pub use collage::Collage;
pub use error::{CollageError, CollageResult};
pub use font_storage::FontStorage;
pub use item::{FontFamily, FontSpec, Rgb, TextItem};
pub use renderer::{Rasterizer, Surface, export_image};
pub use scatter::ScatterGenerator;
pub use settings::CanvasSettings;

// re-export dependencies
pub use fontdb;
pub use fontdue;
pub use parking_lot;
