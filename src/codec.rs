//! Line-oriented text format for collages.
//!
//! ```text
//! String ### x ### Y ### color: R ### color: G ### color: B
//! Hello ### 100 ### 150 ### 0 ### 0 ### 0
//! ```
//!
//! The first line is a documentary header and is never parsed. Each further
//! line is one item: text, integer position, and the three color components.
//! The delimiter is not escaped. Text that contains it, or that ends in a
//! prefix of it such as `" ###"`, would split its record at the wrong place,
//! so [`CollageCodec::encode`] refuses it with [`CollageError::Unencodable`].
//! Line breaks never reach the file because [`TextItem`] turns them into
//! spaces. Only position, text and an explicit color are stored; items
//! with an unset color are written with the default foreground.

use std::io::{Read, Write};
use std::path::Path;

use crate::{
    collage::Collage,
    error::{CollageError, CollageResult, DecodeErrorKind},
    item::{Rgb, TextItem},
    settings::{CanvasSettings, DEFAULT_DELIMITER},
};

/// Column names written on the header line.
pub const HEADER_COLUMNS: [&str; 6] = ["String", "x", "Y", "color: R", "color: G", "color: B"];

const FIELD_COUNT: usize = HEADER_COLUMNS.len();

/// Encoder/decoder for the collage file format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollageCodec {
    delimiter: String,
    default_foreground: Rgb,
}

impl Default for CollageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, Rgb::BLACK)
    }
}

impl CollageCodec {
    pub fn new(delimiter: impl Into<String>, default_foreground: Rgb) -> Self {
        Self {
            delimiter: delimiter.into(),
            default_foreground,
        }
    }

    /// Codec matching the delimiter and foreground of `settings`.
    pub fn from_settings(settings: &CanvasSettings) -> Self {
        Self::new(settings.delimiter.clone(), settings.default_foreground)
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Serializes the header and one record per item, in collage order.
    ///
    /// Fails with [`CollageError::Unencodable`] for the first item whose text
    /// would not decode back as the text field.
    pub fn encode(&self, collage: &Collage) -> CollageResult<String> {
        let mut out = HEADER_COLUMNS.join(&self.delimiter);
        out.push('\n');

        for (index, item) in collage.items().iter().enumerate() {
            if !self.is_encodable(item.text()) {
                return Err(CollageError::Unencodable {
                    index,
                    text: item.text().to_string(),
                });
            }

            let color = item.resolved_color(self.default_foreground);
            let fields = [
                item.text().to_string(),
                item.x().to_string(),
                item.y().to_string(),
                color.r.to_string(),
                color.g.to_string(),
                color.b.to_string(),
            ];
            out.push_str(&fields.join(&self.delimiter));
            out.push('\n');
        }

        Ok(out)
    }

    /// Whether `text` followed by the delimiter splits exactly after `text`.
    fn is_encodable(&self, text: &str) -> bool {
        if text.contains(['\n', '\r']) {
            return false;
        }
        let field = format!("{text}{}", self.delimiter);
        field.find(self.delimiter.as_str()) == Some(text.len())
    }

    /// Replaces the contents of `collage` with the records in `text`.
    ///
    /// The collage is cleared first and each record is appended as soon as
    /// it is parsed. A malformed record stops decoding with
    /// [`CollageError::Decode`] and leaves the records before it in place.
    /// The redraw hook fires once when decoding ends, successful or not.
    pub fn decode_into(&self, text: &str, collage: &mut Collage) -> CollageResult<()> {
        collage.clear_silent();
        let result = self.decode_records(text, collage);
        collage.notify_redraw();

        if let Err(e) = &result {
            log::warn!(
                "Decoding stopped after {} item(s): {}",
                collage.len(),
                e
            );
        }
        result
    }

    /// Decodes `text` into a new collage.
    pub fn decode(&self, text: &str) -> CollageResult<Collage> {
        let mut collage = Collage::new();
        self.decode_into(text, &mut collage)?;
        Ok(collage)
    }

    fn decode_records(&self, text: &str, collage: &mut Collage) -> CollageResult<()> {
        let mut lines: Vec<&str> = text.lines().collect();
        // blank lines at the very end are not records
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }

        for (index, line) in lines.into_iter().enumerate().skip(1) {
            let line_number = index + 1;
            let item = self
                .parse_record(line)
                .map_err(|kind| CollageError::Decode {
                    line: line_number,
                    kind,
                })?;
            collage.push_silent(item);
        }

        Ok(())
    }

    fn parse_record(&self, line: &str) -> Result<TextItem, DecodeErrorKind> {
        let fields: Vec<&str> = line.split(self.delimiter.as_str()).collect();
        if fields.len() != FIELD_COUNT {
            return Err(DecodeErrorKind::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let x = parse_int("x", fields[1])?;
        let y = parse_int("y", fields[2])?;
        let color = Rgb::new(
            parse_channel("color: R", fields[3])?,
            parse_channel("color: G", fields[4])?,
            parse_channel("color: B", fields[5])?,
        );

        Ok(TextItem::builder(fields[0], x, y).text_color(color).build())
    }

    /// Writes the encoded collage to `path`.
    ///
    /// The data goes to a temporary file next to `path` which replaces the
    /// target only after everything was written, so a failed save never
    /// leaves a truncated file behind. Texts refused by [`Self::encode`]
    /// fail the save before anything is written.
    pub fn save(&self, collage: &Collage, path: &Path) -> CollageResult<()> {
        let encoded = self.encode(collage)?;
        write_atomically(path, |file| -> std::io::Result<()> {
            file.write_all(encoded.as_bytes())
        })?;
        log::debug!("Saved {} item(s) to {}", collage.len(), path.display());
        Ok(())
    }

    /// Reads `path` and decodes it into `collage` with the semantics of
    /// [`Self::decode_into`].
    ///
    /// I/O errors leave the collage untouched.
    pub fn open(&self, path: &Path, collage: &mut Collage) -> CollageResult<()> {
        let text = {
            let mut file = std::fs::File::open(path)?;
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            text
        };

        self.decode_into(&text, collage)?;
        log::debug!("Loaded {} item(s) from {}", collage.len(), path.display());
        Ok(())
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i32, DecodeErrorKind> {
    value
        .parse::<i32>()
        .map_err(|_| DecodeErrorKind::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_channel(field: &'static str, value: &str) -> Result<u8, DecodeErrorKind> {
    let raw = value
        .parse::<i64>()
        .map_err(|_| DecodeErrorKind::InvalidNumber {
            field,
            value: value.to_string(),
        })?;
    u8::try_from(raw).map_err(|_| DecodeErrorKind::ColorOutOfRange { field, value: raw })
}

/// Runs `write` against a temporary file in the directory of `path`, then
/// moves it over `path`. The temporary file is removed on any failure.
///
/// The result keeps the permissions of the file it replaces. New files get
/// the usual `0o666` minus umask on Unix instead of the owner-only mode of
/// temporary files.
pub(crate) fn write_atomically<E: From<std::io::Error>>(
    path: &Path,
    write: impl FnOnce(&mut std::fs::File) -> Result<(), E>,
) -> Result<(), E> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder.tempfile_in(dir)?;
    if let Ok(existing) = std::fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }

    write(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.persist(path).map_err(|e| E::from(e.error))?;
    Ok(())
}
