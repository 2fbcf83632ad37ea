use crate::config::is_image_extension;
use crate::error::SourceError;
use image::RgbImage;
use std::path::Path;

/// Decode an image file into RGB, rejecting extensions the file chooser would not offer
pub fn load_still(path: &Path) -> Result<RgbImage, SourceError> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_image_extension);
    if !accepted {
        return Err(SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let decoded = image::open(path).map_err(|source| SourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Decoded {} ({}x{})",
        path.display(),
        decoded.width(),
        decoded.height()
    );

    Ok(decoded.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("waste-lens-{}-{}", std::process::id(), name))
    }

    #[test]
    fn loads_png_as_rgb() {
        let path = scratch_path("red.png");
        RgbImage::from_pixel(4, 3, Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();

        let loaded = load_still(&path).unwrap();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(1, 1), &Rgb([255, 0, 0]));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_unlisted_extension() {
        let err = load_still(Path::new("model.onnx")).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let path = scratch_path("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = load_still(&path).unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));

        std::fs::remove_file(path).ok();
    }
}
