//! Intensity normalisation.
//!
//! Survey rasters usually contain a handful of saturated pixels (foreground
//! stars, cosmic rays) that would dominate a plain min-max scale, which is why
//! the percentile variant is the default everywhere.

use crate::Plane;

/// Lower clip percentile of [`adaptive`].
pub const LOWER_PERCENTILE: f64 = 1.0;

/// Upper clip percentile of [`adaptive`].
pub const UPPER_PERCENTILE: f64 = 99.0;

/// Replaces NaN and infinite pixels with zero.
pub fn sanitize(image: &Plane) -> Plane {
    image.map(|&v| if v.is_finite() { v } else { 0.0 })
}

/// Linear rescale of finite pixels from `[low, high]` to `[0, 1]`, clamped.
///
/// A degenerate range yields the zero plane.
pub fn rescale(image: &Plane, low: f32, high: f32) -> Plane {
    let low = low as f64;
    let range = high as f64 - low;
    if !(range.is_finite() && range > 0.0) {
        return image.map(|_| 0.0);
    }
    image.map(|&v| (((v as f64 - low) / range) as f32).clamp(0.0, 1.0))
}

/// Rescale by observed min and max. Constant input gives all zeros.
pub fn min_max(image: &Plane) -> Plane {
    let (min, max) = image
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return image.map(|_| 0.0);
    }
    rescale(image, min, max)
}

/// Clip to the 1st..99th percentile and rescale to [0, 1].
///
/// When the two percentiles coincide (constant or nearly constant input) the
/// output is all zeros.
pub fn adaptive(image: &Plane) -> Plane {
    if image.is_empty() {
        return image.clone();
    }
    let mut scratch: Vec<f32> = image.iter().copied().filter(|v| v.is_finite()).collect();
    if scratch.is_empty() {
        return image.map(|_| 0.0);
    }
    let low = percentile_mut(&mut scratch, LOWER_PERCENTILE);
    let high = percentile_mut(&mut scratch, UPPER_PERCENTILE);
    rescale(image, low, high)
}

/// Percentile with linear interpolation between closest ranks.
///
/// Reorders `data` (quickselect). `data` must be non-empty and NaN-free.
pub fn percentile_mut(data: &mut [f32], percent: f64) -> f32 {
    debug_assert!(!data.is_empty());

    let rank = percent.clamp(0.0, 100.0) / 100.0 * (data.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let fraction = rank - lower_index as f64;

    let (_, lower, above) = data.select_nth_unstable_by(lower_index, f32::total_cmp);
    let lower = *lower;
    if fraction == 0.0 || above.is_empty() {
        return lower;
    }

    // The next rank is the smallest element of the upper partition.
    let upper = above.iter().copied().fold(f32::INFINITY, f32::min);
    (lower as f64 + (upper as f64 - lower as f64) * fraction) as f32
}
