//! Cache-first acquisition of galaxy cutouts.
//!
//! [`AcquisitionClient`] resolves every artifact through a [`TieredCache`]
//! before touching the network, and assembles an [`Observation`] using one of
//! two band-sourcing strategies:
//!
//! - raster: one JPEG per band (`<name>.<band>.jpg`), decoded to grayscale;
//! - cube: a single FITS cube (`<name>.fits`) whose planes are g, r and z.
//!
//! Cache keys always use the trimmed galaxy name.

pub mod decode;
pub mod fits;
pub mod source;


use std::collections::BTreeMap;
use std::fmt;

pub use source::{CutoutFormat, CutoutRequest, CutoutSource, HttpCutoutSource};

use crate::catalog::GalaxyRef;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::observation::Observation;
use crate::storage::TieredCache;
use crate::Plane;

/// Bands rendered by the composite.
pub const COMPOSITE_BANDS: &str = "grz";

// ============================================================================
// Band
// ============================================================================

/// Survey filter band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    G,
    R,
    Z,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::G, Band::R, Band::Z];

    pub fn as_char(self) -> char {
        match self {
            Band::G => 'g',
            Band::R => 'r',
            Band::Z => 'z',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'g' => Some(Band::G),
            'r' => Some(Band::R),
            'z' => Some(Band::Z),
            _ => None,
        }
    }

    /// Supported bands named in `bands`, deduplicated and in g, r, z order.
    ///
    /// Unsupported characters are dropped with a warning.
    pub fn parse_set(bands: &str) -> Vec<Band> {
        let mut selected = Vec::with_capacity(Band::ALL.len());
        for c in bands.chars().filter(|c| !c.is_whitespace() && *c != ',') {
            match Band::from_char(c) {
                Some(band) => selected.push(band),
                None => tracing::warn!("Dropping unsupported band '{}' from '{}'", c, bands),
            }
        }
        selected.sort();
        selected.dedup();
        selected
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ============================================================================
// Options
// ============================================================================

/// How [`AcquisitionClient::get_observation`] sources its planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationOptions {
    /// Take the three bands from one FITS cube instead of three rasters.
    pub use_cube_format: bool,
    /// Also fetch and decode the colour composite.
    pub include_composite: bool,
    /// Write downloads to persistent cache tiers.
    pub persist: bool,
}

impl Default for ObservationOptions {
    fn default() -> Self {
        Self {
            use_cube_format: false,
            include_composite: true,
            persist: true,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Fetches composites, band images and observations for galaxies.
#[derive(Debug)]
pub struct AcquisitionClient<S: CutoutSource = HttpCutoutSource> {
    source: S,
    cache: TieredCache,
}

impl AcquisitionClient<HttpCutoutSource> {
    /// HTTP source and cache tiers as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpCutoutSource::new(config.acquisition.clone())?;
        let cache = TieredCache::from_options(config.cache.dir.as_deref(), config.cache.memory)?;
        tracing::debug!("Acquisition cache tiers: {:?}", cache.tier_names());
        Ok(Self::new(source, cache))
    }
}

impl<S: CutoutSource> AcquisitionClient<S> {
    pub fn new(source: S, cache: TieredCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }

    /// Colour composite of the g, r and z bands, as JPEG bytes.
    ///
    /// Served from the galaxy's memoised image, then the cache under
    /// `<name>.jpg`, then the network.
    pub fn get_composite(&self, galaxy: &GalaxyRef, persist: bool) -> Result<Vec<u8>> {
        let key = format!("{}.jpg", galaxy.cache_name());
        if let Some(bytes) = galaxy.image() {
            // An earlier non-persisting call may have left the disk without it.
            if persist && !self.cache.is_persisted(&key) {
                self.cache.put(&key, bytes, true)?;
            }
            return Ok(bytes.to_vec());
        }
        let request = CutoutRequest::new(
            galaxy.right_ascension(),
            galaxy.declination(),
            COMPOSITE_BANDS,
            CutoutFormat::Raster,
        );
        let bytes = self.fetch_cached(&key, &request, persist)?;
        galaxy.remember_image(bytes.clone());
        Ok(bytes)
    }

    /// One payload per requested band.
    ///
    /// Bands outside g, r, z are dropped. Raster payloads are cached under
    /// `<name>.<band>.jpg`, cube payloads under `<name>.<band>.fits`.
    pub fn get_bands(
        &self,
        galaxy: &GalaxyRef,
        bands: &str,
        format: CutoutFormat,
        persist: bool,
    ) -> Result<BTreeMap<Band, Vec<u8>>> {
        let mut result = BTreeMap::new();
        for band in Band::parse_set(bands) {
            let key = format!(
                "{}.{}.{}",
                galaxy.cache_name(),
                band,
                format.extension()
            );
            let request = CutoutRequest::new(
                galaxy.right_ascension(),
                galaxy.declination(),
                band.to_string(),
                format,
            );
            result.insert(band, self.fetch_cached(&key, &request, persist)?);
        }
        Ok(result)
    }

    /// Assembles the g, r and z planes (and optionally the composite) of `galaxy`.
    pub fn get_observation(
        &self,
        galaxy: &GalaxyRef,
        options: &ObservationOptions,
    ) -> Result<Observation> {
        let observation = if options.use_cube_format {
            self.observation_from_cube(galaxy, options.persist)?
        } else {
            self.observation_from_rasters(galaxy, options.persist)?
        };

        if !options.include_composite {
            return Ok(observation);
        }
        let composite = self.get_composite(galaxy, options.persist)?;
        let what = format!("{}.jpg", galaxy.cache_name());
        Ok(observation.with_composite(decode::decode_color(&composite, &what)?))
    }

    fn observation_from_rasters(&self, galaxy: &GalaxyRef, persist: bool) -> Result<Observation> {
        let mut payloads =
            self.get_bands(galaxy, COMPOSITE_BANDS, CutoutFormat::Raster, persist)?;
        let mut plane = |band: Band| -> Result<Plane> {
            let what = format!("{}.{}.jpg", galaxy.cache_name(), band);
            let bytes = payloads
                .remove(&band)
                .ok_or_else(|| Error::decode(what.as_str(), "band missing from response set"))?;
            decode::decode_grayscale(&bytes, &what)
        };
        let (g, r, z) = (plane(Band::G)?, plane(Band::R)?, plane(Band::Z)?);
        Observation::new(g, r, z)
    }

    fn observation_from_cube(&self, galaxy: &GalaxyRef, persist: bool) -> Result<Observation> {
        let key = format!("{}.fits", galaxy.cache_name());
        let request = CutoutRequest::new(
            galaxy.right_ascension(),
            galaxy.declination(),
            COMPOSITE_BANDS,
            CutoutFormat::Cube,
        );
        let bytes = self.fetch_cached(&key, &request, persist)?;

        let planes = fits::read_planes(&bytes, &key)?;
        let found = planes.len();
        let mut planes = planes.into_iter();
        let (Some(g), Some(r), Some(z)) = (planes.next(), planes.next(), planes.next()) else {
            return Err(Error::decode(
                key.as_str(),
                format!("expected 3 band planes, found {}", found),
            ));
        };

        // Cube rows run bottom to top; rasters run top to bottom.
        Observation::new(g.flip_vertical(), r.flip_vertical(), z.flip_vertical())
    }

    fn fetch_cached(&self, key: &str, request: &CutoutRequest, persist: bool) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.get(key)? {
            return Ok(bytes);
        }
        let bytes = self.source.fetch(request)?;
        tracing::info!("Fetched {} ({} bytes)", key, bytes.len());
        self.cache.put(key, &bytes, persist)?;
        Ok(bytes)
    }
}
