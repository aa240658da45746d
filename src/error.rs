//! Error types shared by the codec, the rasterizer's export path and the
//! editor commands.

use thiserror::Error;

/// Errors surfaced to the user by collage operations.
///
/// Blank label text is not an error: it is replaced by
/// [`FALLBACK_TEXT`](crate::item::FALLBACK_TEXT) when the item is created.
#[derive(Error, Debug)]
pub enum CollageError {
    /// A record line of a collage file could not be parsed.
    #[error("Malformed record on line {line}: {kind}")]
    Decode { line: usize, kind: DecodeErrorKind },

    /// A label text would not read back as a single record, because the
    /// delimiter occurs in it or at its end together with the field separator.
    #[error("Item {index} cannot be saved: {text:?} collides with the field delimiter")]
    Unencodable { index: usize, text: String },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image could not be encoded or written.
    #[error("Image encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}

/// What was wrong with a malformed record line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The line did not split into exactly six fields.
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A coordinate or color field is not an integer.
    #[error("field `{field}` is not an integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A color component is outside `0..=255`.
    #[error("color component `{field}` out of range: {value}")]
    ColorOutOfRange { field: &'static str, value: i64 },
}

/// Result type alias for collage operations.
pub type CollageResult<T> = Result<T, CollageError>;
