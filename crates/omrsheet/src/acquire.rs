//! Image acquisition: file or in-memory capture → RGBA raster.

use std::path::Path;

use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero size")]
    Empty,
}

/// Decode an encoded capture (PNG, JPEG) into RGBA.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, AcquireError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(AcquireError::Empty);
    }
    tracing::debug!(width = rgba.width(), height = rgba.height(), "image decoded");
    Ok(rgba)
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> Result<RgbaImage, AcquireError> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.png");
        let img = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, img);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, AcquireError::Io(_)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AcquireError::Decode(_)));
    }
}
