//! Multi-band observation of one galaxy.

use common::Buffer2;

use crate::error::{Error, Result};
use crate::Plane;

/// Colour raster, one RGB triple per pixel.
pub type ColorImage = Buffer2<[u8; 3]>;

/// The g, r and z planes of a cutout plus an optional colour composite.
///
/// Constructed per acquisition call. All three band planes share one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    composite: Option<ColorImage>,
    band_g: Plane,
    band_r: Plane,
    band_z: Plane,
}

impl Observation {
    /// Fails with [`Error::ShapeMismatch`] when the band planes differ in shape.
    pub fn new(band_g: Plane, band_r: Plane, band_z: Plane) -> Result<Self> {
        for (context, plane) in [("band r", &band_r), ("band z", &band_z)] {
            if !plane.same_shape(&band_g) {
                return Err(Error::ShapeMismatch {
                    context,
                    expected: band_g.shape(),
                    actual: plane.shape(),
                });
            }
        }
        Ok(Self {
            composite: None,
            band_g,
            band_r,
            band_z,
        })
    }

    pub fn with_composite(mut self, composite: ColorImage) -> Self {
        self.composite = Some(composite);
        self
    }

    pub fn composite(&self) -> Option<&ColorImage> {
        self.composite.as_ref()
    }

    pub fn band_g(&self) -> &Plane {
        &self.band_g
    }

    pub fn band_r(&self) -> &Plane {
        &self.band_r
    }

    pub fn band_z(&self) -> &Plane {
        &self.band_z
    }

    /// `(width, height)` shared by the band planes.
    pub fn shape(&self) -> (usize, usize) {
        self.band_g.shape()
    }
}
