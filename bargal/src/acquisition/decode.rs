//! Raster payload decoding.

use crate::error::{Error, Result};
use crate::observation::ColorImage;
use crate::Plane;

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
#[inline]
fn luma_601([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn load(bytes: &[u8], what: &str) -> Result<image::DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::decode(what, e))
}

/// Decodes a raster to one grayscale plane with values in 0..=255.
///
/// Colour rasters are reduced with the 601 luma weights.
pub fn decode_grayscale(bytes: &[u8], what: &str) -> Result<Plane> {
    let rgb = load(bytes, what)?.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let pixels = rgb
        .pixels()
        .map(|p| luma_601(p.0) as f32)
        .collect::<Vec<_>>();
    Ok(Plane::new(width, height, pixels))
}

/// Decodes a raster to an RGB image.
pub fn decode_color(bytes: &[u8], what: &str) -> Result<ColorImage> {
    let rgb = load(bytes, what)?.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let pixels = rgb.pixels().map(|p| p.0).collect::<Vec<_>>();
    Ok(ColorImage::new(width, height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma_601([0, 0, 0]), 0);
        assert_eq!(luma_601([255, 255, 255]), 255);
        assert_eq!(luma_601([255, 0, 0]), 76);
        assert_eq!(luma_601([0, 255, 0]), 150);
        assert_eq!(luma_601([0, 0, 255]), 29);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode_grayscale(b"definitely not a jpeg", "NGC1300.g.jpg").unwrap_err();
        match err {
            Error::Decode { what, .. } => assert_eq!(what, "NGC1300.g.jpg"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(decode_color(&[], "empty").is_err());
    }
}
