//! Noise suppression filters: Gaussian, median and bilateral.
//!
//! Rows are processed in parallel; every output row depends only on the
//! input plane, so results do not depend on the thread count.

use rayon::prelude::*;

use crate::Plane;

/// Mirror index into `0..len` without repeating the edge pixel (`dcb|abcd|cba`).
#[inline]
pub(crate) fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let i = index.rem_euclid(period);
    (if i >= len { period - i } else { i }) as usize
}

/// Clamp index into `0..len` (`aaa|abcd|ddd`).
#[inline]
pub(crate) fn replicate(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

/// Rounds even kernel sizes up to the next odd size.
#[inline]
fn odd_kernel(kernel_size: usize) -> usize {
    kernel_size | 1
}

// ============================================================================
// Gaussian blur
// ============================================================================

/// Sigma implied by a kernel size when none is given explicitly.
pub fn sigma_for_kernel(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1D Gaussian of `kernel_size` taps.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let radius = (kernel_size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - radius;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with mirrored borders.
///
/// Kernel sizes of 0 or 1 leave the image unchanged.
pub fn gaussian_blur(image: &Plane, kernel_size: usize) -> Plane {
    if kernel_size <= 1 || image.is_empty() {
        return image.clone();
    }
    let kernel_size = odd_kernel(kernel_size);
    let kernel = gaussian_kernel_1d(kernel_size, sigma_for_kernel(kernel_size));
    let radius = (kernel_size / 2) as isize;
    let (width, height) = image.shape();

    let mut horizontal = Plane::new_default(width, height);
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let in_row = image.row(y);
            for (x, out) in out_row.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * in_row[reflect_101(x as isize + k as isize - radius, width)])
                    .sum();
            }
        });

    let mut output = Plane::new_default(width, height);
    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            for (k, w) in kernel.iter().enumerate() {
                let src = horizontal.row(reflect_101(y as isize + k as isize - radius, height));
                for (out, &v) in out_row.iter_mut().zip(src) {
                    *out += w * v;
                }
            }
        });

    output
}

// ============================================================================
// Median blur
// ============================================================================

/// Square-window median with replicated borders.
///
/// Kernel sizes of 0 or 1 leave the image unchanged; even sizes are rounded up.
pub fn median_blur(image: &Plane, kernel_size: usize) -> Plane {
    if kernel_size <= 1 || image.is_empty() {
        return image.clone();
    }
    let kernel_size = odd_kernel(kernel_size);
    let radius = (kernel_size / 2) as isize;
    let (width, height) = image.shape();

    let mut output = Plane::new_default(width, height);
    output.par_chunks_mut(width).enumerate().for_each_init(
        || Vec::with_capacity(kernel_size * kernel_size),
        |window: &mut Vec<f32>, (y, out_row)| {
            for (x, out) in out_row.iter_mut().enumerate() {
                window.clear();
                for dy in -radius..=radius {
                    let row = image.row(replicate(y as isize + dy, height));
                    for dx in -radius..=radius {
                        window.push(row[replicate(x as isize + dx, width)]);
                    }
                }
                let mid = window.len() / 2;
                let (_, median, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
                *out = *median;
            }
        },
    );

    output
}

// ============================================================================
// Bilateral filter
// ============================================================================

/// Bilateral filter over a circular window.
///
/// Each neighbour is weighted by its spatial distance (`sigma_space`) and by
/// its intensity difference from the centre (`sigma_color`), so strong edges
/// survive the smoothing. A zero `diameter` derives the window radius as
/// `1.5 * sigma_space`.
pub fn bilateral(image: &Plane, diameter: usize, sigma_color: f32, sigma_space: f32) -> Plane {
    if image.is_empty() {
        return image.clone();
    }
    let sigma_color = if sigma_color > 0.0 { sigma_color } else { 1.0 };
    let sigma_space = if sigma_space > 0.0 { sigma_space } else { 1.0 };
    let radius = if diameter > 0 {
        diameter / 2
    } else {
        (sigma_space * 1.5).round() as usize
    }
    .max(1) as isize;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq.sqrt() <= radius as f32 {
                offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
            }
        }
    }

    let (width, height) = image.shape();
    let mut output = Plane::new_default(width, height);
    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            for (x, out) in out_row.iter_mut().enumerate() {
                let center = image[(x, y)];
                let mut weighted = 0.0f32;
                let mut total = 0.0f32;
                for &(dx, dy, space_weight) in &offsets {
                    let v = image[(
                        reflect_101(x as isize + dx, width),
                        reflect_101(y as isize + dy, height),
                    )];
                    let diff = v - center;
                    let w = space_weight * (diff * diff * color_coeff).exp();
                    weighted += w * v;
                    total += w;
                }
                // The centre tap always has weight 1, so total > 0.
                *out = weighted / total;
            }
        });

    output
}
