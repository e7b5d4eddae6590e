//! 8-bit export of feature planes.

use std::path::Path;

use common::Buffer2;

use crate::error::{Error, Result};
use crate::Plane;

/// Rescales a [0, 1] plane to bytes: `(v * 255)` truncated.
///
/// Non-finite pixels become 0 and values outside [0, 1] are clamped first.
pub fn to_luma8(plane: &Plane) -> Buffer2<u8> {
    plane.map(|&v| {
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        (v * 255.0) as u8
    })
}

/// Writes the 8-bit rescale of `plane` as a grayscale PNG.
pub fn save_png(plane: &Plane, path: &Path) -> Result<()> {
    let luma = to_luma8(plane);
    let (width, height) = luma.shape();
    let image = image::GrayImage::from_raw(width as u32, height as u32, luma.into_vec())
        .ok_or_else(|| Error::decode(path.display().to_string(), "plane does not fit a PNG"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: match e {
                image::ImageError::IoError(source) => source,
                other => std::io::Error::other(other.to_string()),
            },
        })?;

    tracing::debug!("Wrote {}x{} feature image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_luma8_truncates() {
        let plane = Plane::new(6, 1, vec![0.0, 1.0, 0.5, 0.999, f32::NAN, 7.0]);
        let luma = to_luma8(&plane);
        assert_eq!(luma.pixels(), &[0, 255, 127, 254, 0, 255]);
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("NGC1300_processed.png");
        let plane = Plane::from_fn(5, 3, |x, y| (x + y) as f32 / 6.0);

        save_png(&plane, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.into_raw(), to_luma8(&plane).into_vec());
    }
}
