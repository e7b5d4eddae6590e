//! Band-difference feature extraction.
//!
//! A [`BandDifferenceProcessor`] runs one transform chain over the g band and
//! another over the r band, subtracts the two, and finishes the difference
//! with a third chain:
//!
//! ```text
//! result_chain(g_chain(g) - r_chain(r))
//! ```
//!
//! Bars show up as a colour gradient between bands that a smooth disk does
//! not reproduce, so stretching the two bands differently before subtracting
//! makes them stand out. Named processors live in a [`PresetRegistry`].


use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::observation::Observation;
use crate::transform::{self, Stage, Transform};
use crate::Plane;

/// Square-root stretched difference of adaptively normalised bands.
pub const SQRT_GR_DIFF: &str = "sqrt-gr-diff";

/// Difference of a smoothed g band and a log-stretched r band.
pub const GRLOG_GR_DIFF: &str = "grlog-gr-diff";

/// Crop factor of the built-in presets: keeps the central half of each axis.
pub const PRESET_CROP_FACTOR: f32 = 2.0;

/// Turns an observation into a single feature plane.
pub trait ImageProcessor: Send + Sync {
    fn preprocess(&self, observation: &Observation) -> Result<Plane>;

    /// Human-readable summary for listings.
    fn describe(&self) -> String {
        "custom processor".to_string()
    }
}

// ============================================================================
// Band difference
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct BandDifferenceProcessor {
    g_chain: Transform,
    r_chain: Transform,
    result_chain: Transform,
}

impl BandDifferenceProcessor {
    pub fn new(
        g_chain: impl Into<Transform>,
        r_chain: impl Into<Transform>,
        result_chain: impl Into<Transform>,
    ) -> Self {
        Self {
            g_chain: g_chain.into(),
            r_chain: r_chain.into(),
            result_chain: result_chain.into(),
        }
    }

    /// g: adaptive, bilateral. r: adaptive. Result: sqrt, adaptive, crop.
    pub fn sqrt_gr_diff() -> Self {
        Self::new(
            transform::compose([transform::adaptive_normalize(), transform::bilateral_filter()]),
            transform::adaptive_normalize(),
            transform::compose([
                transform::sqrt_stretch(),
                transform::adaptive_normalize(),
                transform::center_crop(PRESET_CROP_FACTOR),
            ]),
        )
    }

    /// g: adaptive, bilateral. r: log. Result: crop, adaptive.
    pub fn grlog_gr_diff() -> Self {
        Self::new(
            transform::compose([transform::adaptive_normalize(), transform::bilateral_filter()]),
            transform::log_stretch(),
            transform::compose([
                transform::center_crop(PRESET_CROP_FACTOR),
                transform::adaptive_normalize(),
            ]),
        )
    }

    pub fn g_chain(&self) -> &Transform {
        &self.g_chain
    }

    pub fn r_chain(&self) -> &Transform {
        &self.r_chain
    }

    pub fn result_chain(&self) -> &Transform {
        &self.result_chain
    }

    /// `result_chain(g_chain(g) - r_chain(r))`.
    ///
    /// Fails with [`Error::ShapeMismatch`] when the inputs, or the outputs of
    /// the two band chains, differ in shape.
    pub fn difference(&self, g: &Plane, r: &Plane) -> Result<Plane> {
        check_shape("band difference input", g, r)?;

        let (g, r) = rayon::join(|| self.g_chain.apply(g), || self.r_chain.apply(r));
        check_shape("band difference", &g, &r)?;

        let diff = g.zip_map(&r, |&a, &b| a - b);
        Ok(self.result_chain.apply(&diff))
    }
}

fn check_shape(context: &'static str, g: &Plane, r: &Plane) -> Result<()> {
    if g.same_shape(r) {
        return Ok(());
    }
    Err(Error::ShapeMismatch {
        context,
        expected: g.shape(),
        actual: r.shape(),
    })
}

impl ImageProcessor for BandDifferenceProcessor {
    fn preprocess(&self, observation: &Observation) -> Result<Plane> {
        let output = self.difference(observation.band_g(), observation.band_r())?;
        tracing::debug!(
            "Band difference {:?} -> {:?}",
            observation.shape(),
            output.shape()
        );
        Ok(output)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BandDifferenceProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "g: {}; r: {}; result: {}",
            self.g_chain.describe(),
            self.r_chain.describe(),
            self.result_chain.describe()
        )
    }
}

// ============================================================================
// Declarative presets
// ============================================================================

/// A band-difference processor written as three lists of stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetDefinition {
    pub g_chain: Vec<Stage>,
    pub r_chain: Vec<Stage>,
    pub result_chain: Vec<Stage>,
}

impl PresetDefinition {
    pub fn to_processor(&self) -> BandDifferenceProcessor {
        BandDifferenceProcessor::new(
            self.g_chain.iter().cloned().collect::<Transform>(),
            self.r_chain.iter().cloned().collect::<Transform>(),
            self.result_chain.iter().cloned().collect::<Transform>(),
        )
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Named processors. Built once at start-up and read-only afterwards.
#[derive(Clone)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Arc<dyn ImageProcessor>>,
}

impl PresetRegistry {
    pub fn empty() -> Self {
        Self {
            presets: BTreeMap::new(),
        }
    }

    /// The two reference presets.
    pub fn builtin() -> Self {
        Self::empty()
            .with_processor(SQRT_GR_DIFF, BandDifferenceProcessor::sqrt_gr_diff())
            .with_processor(GRLOG_GR_DIFF, BandDifferenceProcessor::grlog_gr_diff())
    }

    /// Built-in presets plus `definitions`. A definition named like a built-in replaces it.
    pub fn with_definitions(definitions: &BTreeMap<String, PresetDefinition>) -> Result<Self> {
        let mut registry = Self::builtin();
        for (name, definition) in definitions {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidConfig("preset name is empty".into()));
            }
            if registry.contains(name) {
                tracing::warn!("Preset '{}' from configuration replaces the built-in", name);
            }
            registry = registry.with_processor(name, definition.to_processor());
        }
        Ok(registry)
    }

    /// Registers `processor` under `name`, replacing any previous entry.
    pub fn with_processor(
        mut self,
        name: impl Into<String>,
        processor: impl ImageProcessor + 'static,
    ) -> Self {
        self.presets.insert(name.into(), Arc::new(processor));
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ImageProcessor>> {
        self.presets
            .get(name.trim())
            .cloned()
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name.trim())
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ImageProcessor)> {
        self.presets
            .iter()
            .map(|(name, processor)| (name.as_str(), processor.as_ref()))
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.names())
            .finish()
    }
}
