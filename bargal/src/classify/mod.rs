//! Classification boundary.
//!
//! The trained model is external; it is reached through [`BarClassifier`],
//! which sees only the 8-bit feature image.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use common::Buffer2;

use crate::acquisition::{AcquisitionClient, CutoutSource, HttpCutoutSource, ObservationOptions};
use crate::catalog::GalaxyRef;
use crate::error::Result;
use crate::export::to_luma8;
use crate::preprocess::ImageProcessor;

/// A trained bar detector.
pub trait BarClassifier: Send + Sync {
    /// `true` when the galaxy in `feature` is predicted to be barred.
    fn predict(&self, feature: &Buffer2<u8>) -> bool;
}

/// Acquisition, preprocessing and prediction for one galaxy at a time.
pub struct GalaxyClassifier<C, S: CutoutSource = HttpCutoutSource> {
    client: Arc<AcquisitionClient<S>>,
    processor: Arc<dyn ImageProcessor>,
    classifier: C,
    persist: bool,
}

impl<C: BarClassifier, S: CutoutSource> GalaxyClassifier<C, S> {
    pub fn new(
        client: Arc<AcquisitionClient<S>>,
        processor: Arc<dyn ImageProcessor>,
        classifier: C,
    ) -> Self {
        Self {
            client,
            processor,
            classifier,
            persist: true,
        }
    }

    /// Whether downloads made while classifying are written to disk.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// The 8-bit feature image the model sees for `galaxy`.
    ///
    /// Bands come from the FITS cube; the composite is not fetched.
    pub fn features(&self, galaxy: &GalaxyRef) -> Result<Buffer2<u8>> {
        let options = ObservationOptions {
            use_cube_format: true,
            include_composite: false,
            persist: self.persist,
        };
        let observation = self.client.get_observation(galaxy, &options)?;
        let feature = self.processor.preprocess(&observation)?;
        Ok(to_luma8(&feature))
    }

    pub fn classify(&self, galaxy: &GalaxyRef) -> Result<bool> {
        let barred = self.classifier.predict(&self.features(galaxy)?);
        tracing::debug!(
            "{} classified as {}",
            galaxy.cache_name(),
            if barred { "barred" } else { "unbarred" }
        );
        Ok(barred)
    }
}
