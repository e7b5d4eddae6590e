//! Geometric transforms.

use crate::Plane;

/// Output shape of [`center_crop`] for an input of `width x height`.
pub fn center_crop_shape(width: usize, height: usize, factor: f32) -> (usize, usize) {
    if !(factor.is_finite() && factor > 1.0) {
        return (width, height);
    }
    let scale = |len: usize| ((len as f32 / factor) as usize).clamp(1usize.min(len), len);
    (scale(width), scale(height))
}

/// Keeps the central `1 / factor` of each dimension.
///
/// The border is where background noise dominates; the galaxy core sits at
/// the cutout centre. Factors at or below 1 (or non-finite) keep the whole
/// image.
pub fn center_crop(image: &Plane, factor: f32) -> Plane {
    let (width, height) = image.shape();
    let (crop_width, crop_height) = center_crop_shape(width, height, factor);
    if (crop_width, crop_height) == (width, height) {
        return image.clone();
    }
    image.crop(
        (width - crop_width) / 2,
        (height - crop_height) / 2,
        crop_width,
        crop_height,
    )
}
