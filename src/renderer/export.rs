use std::io::Write;
use std::path::Path;

use image::ImageFormat;
use image::codecs::png::PngEncoder;
use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};

use crate::{codec::write_atomically, error::CollageResult, renderer::Surface};

/// Writes `surface` to `path` as an opaque RGB PNG of the same size.
///
/// Paths without an extension, or with a `.png` one, are written as PNG; any
/// other extension fails with [`CollageError::Encoding`]. The image is
/// encoded in memory first and then written to a temporary file that only
/// replaces `path` once all bytes are on disk.
///
/// [`CollageError::Encoding`]: crate::CollageError::Encoding
pub fn export_image(surface: &Surface, path: &Path) -> CollageResult<()> {
    if path.extension().is_some() {
        let format = ImageFormat::from_path(path)?;
        if format != ImageFormat::Png {
            let hint = ImageFormatHint::Exact(format);
            return Err(image::ImageError::Unsupported(
                UnsupportedError::from_format_and_kind(
                    hint.clone(),
                    UnsupportedErrorKind::Format(hint),
                ),
            )
            .into());
        }
    }

    let mut encoded = Vec::new();
    surface
        .to_rgb_image()
        .write_with_encoder(PngEncoder::new(&mut encoded))?;
    write_atomically(path, |file| -> std::io::Result<()> { file.write_all(&encoded) })?;

    log::debug!(
        "Exported {}x{} image to {}",
        surface.width,
        surface.height,
        path.display()
    );
    Ok(())
}
