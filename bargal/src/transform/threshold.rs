//! Binarisation for coarse structure isolation.

use rayon::prelude::*;

use super::filter::replicate;
use crate::Plane;

/// 1.0 where the pixel is strictly above `value`, 0.0 elsewhere.
pub fn binary(image: &Plane, value: f32) -> Plane {
    image.map(|&v| if v > value { 1.0 } else { 0.0 })
}

/// Local mean threshold.
///
/// A pixel becomes 1.0 when it exceeds the mean of its `block_size` square
/// neighbourhood minus `constant`. Borders replicate the edge pixel. Block
/// sizes are forced odd and at least 3.
pub fn adaptive_mean(image: &Plane, block_size: usize, constant: f32) -> Plane {
    if image.is_empty() {
        return image.clone();
    }
    let block_size = (block_size | 1).max(3);
    let means = box_mean(image, block_size);
    image.zip_map(&means, |&v, &mean| if v > mean - constant { 1.0 } else { 0.0 })
}

/// Separable box filter with replicated borders.
fn box_mean(image: &Plane, block_size: usize) -> Plane {
    let radius = (block_size / 2) as isize;
    let (width, height) = image.shape();
    let area = (block_size * block_size) as f64;

    // Row sums in f64 keep the second pass exact enough for large blocks.
    let mut row_sums = vec![0.0f64; width * height];
    row_sums
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = image.row(y);
            for (x, out) in out_row.iter_mut().enumerate() {
                *out = (-radius..=radius)
                    .map(|dx| row[replicate(x as isize + dx, width)] as f64)
                    .sum();
            }
        });

    let mut output = Plane::new_default(width, height);
    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            for dy in -radius..=radius {
                let src_y = replicate(y as isize + dy, height);
                let src = &row_sums[src_y * width..(src_y + 1) * width];
                for (out, &s) in out_row.iter_mut().zip(src) {
                    *out += (s / area) as f32;
                }
            }
        });

    output
}
