//! Monotonic intensity stretches.
//!
//! Input is clipped to [0, 1] before the stretch, so each function maps
//! [0, 1] onto [0, 1] and reveals faint structure by compressing the bright
//! end of the range.

use crate::Plane;

#[inline]
fn clip_unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

#[inline]
fn finish(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn log(image: &Plane, a: f32) -> Plane {
    let norm = (a + 1.0).ln();
    image.map(|&v| finish((a * clip_unit(v) + 1.0).ln() / norm))
}

pub fn sqrt(image: &Plane) -> Plane {
    image.map(|&v| finish(clip_unit(v).sqrt()))
}

pub fn power(image: &Plane, exponent: f32) -> Plane {
    image.map(|&v| finish(clip_unit(v).powf(exponent)))
}

pub fn square(image: &Plane) -> Plane {
    image.map(|&v| {
        let v = clip_unit(v);
        finish(v * v)
    })
}

pub fn asinh(image: &Plane, a: f32) -> Plane {
    let norm = (1.0 / a).asinh();
    image.map(|&v| finish((clip_unit(v) / a).asinh() / norm))
}
