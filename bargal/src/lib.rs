//! Bargal - galaxy cutout acquisition and bar feature extraction.
//!
//! This library provides:
//! - A cache-first client for survey cutouts, with per-band rasters or a
//!   single FITS cube as band sources
//! - Composable, total image transforms (normalisation, stretches, filters,
//!   thresholds, crops)
//! - Band-difference processors and a registry of named presets
//! - The classification boundary and a retrying batch runner
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bargal::{AcquisitionClient, Config, GalaxyRef, ObservationOptions, PresetRegistry};
//!
//! let config = Config::default();
//! let client = AcquisitionClient::from_config(&config)?;
//! let galaxy = GalaxyRef::new("NGC1300", 49.92, -19.41);
//!
//! let options = ObservationOptions { use_cube_format: true, include_composite: false, persist: true };
//! let observation = client.get_observation(&galaxy, &options)?;
//! let feature = PresetRegistry::builtin().get("grlog-gr-diff")?.preprocess(&observation)?;
//! bargal::save_png(&feature, "NGC1300_processed.png".as_ref())?;
//! ```

pub mod acquisition;
pub mod batch;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod observation;
pub mod preprocess;
pub mod storage;
pub mod transform;

/// Single-channel floating point image.
pub type Plane = common::Buffer2<f32>;

// ============================================================================
// Errors and configuration
// ============================================================================

pub use config::{AcquisitionConfig, CacheConfig, Config};
pub use error::{Error, Result};

// ============================================================================
// Catalog and observations
// ============================================================================

pub use catalog::{load_catalog, select_range, BarLabel, GalaxyRef};
pub use observation::{ColorImage, Observation};

// ============================================================================
// Acquisition and caching
// ============================================================================

pub use acquisition::{
    AcquisitionClient, Band, CutoutFormat, CutoutRequest, CutoutSource, HttpCutoutSource,
    ObservationOptions,
};
pub use storage::{CacheTier, ImageStore, MemoryTier, TieredCache};

// ============================================================================
// Transforms and preprocessing
// ============================================================================

pub use preprocess::{
    BandDifferenceProcessor, ImageProcessor, PresetDefinition, PresetRegistry, GRLOG_GR_DIFF,
    SQRT_GR_DIFF,
};
pub use transform::{compose, Stage, Transform};

// ============================================================================
// Classification, export and batches
// ============================================================================

pub use batch::{run_batch, BatchFailure, BatchReport};
pub use classify::{BarClassifier, GalaxyClassifier};
pub use export::{save_png, to_luma8};
