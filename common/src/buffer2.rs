//! Row-major 2D buffer used for every image plane.

use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice;

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Builds a buffer by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn same_shape<U>(&self, other: &Buffer2<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn rows(&self) -> slice::ChunksExact<'_, T> {
        // chunks_exact panics on a zero chunk size
        self.pixels.chunks_exact(self.width.max(1))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel-wise combination of two equally sized buffers.
    pub fn zip_map<U, V>(&self, other: &Buffer2<U>, mut f: impl FnMut(&T, &U) -> V) -> Buffer2<V> {
        assert!(self.same_shape(other), "zip_map requires equal shapes");
        Buffer2 {
            pixels: self
                .pixels
                .iter()
                .zip(other.pixels.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    /// Returns a copy with the row order reversed (top row becomes bottom row).
    pub fn flip_vertical(&self) -> Self {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for row in self.rows().rev() {
            pixels.extend_from_slice(row);
        }
        Self {
            pixels,
            width: self.width,
            height: self.height,
        }
    }

    /// Copies the `width x height` window whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Self {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "crop window {}x{}+{}+{} exceeds {}x{}",
            width,
            height,
            x,
            y,
            self.width,
            self.height
        );
        let mut pixels = Vec::with_capacity(width * height);
        for row in self.rows().skip(y).take(height) {
            pixels.extend_from_slice(&row[x..x + width]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl<T> DerefMut for Buffer2<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

impl<'a, T> IntoIterator for &'a Buffer2<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}
