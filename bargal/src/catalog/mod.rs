//! Galaxy references and catalog loading.
//!
//! A [`GalaxyRef`] is built once at the boundary from a catalog row and is the
//! only galaxy representation used past that point.

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Visual bar classification and its ordinal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarLabel {
    #[default]
    Unknown,
    None,
    Weak,
    /// Bar blended with the spiral arms.
    Mixed,
    Defined,
    /// Well defined and of significant size.
    Strong,
}

impl BarLabel {
    pub const ALL: [BarLabel; 6] = [
        BarLabel::Unknown,
        BarLabel::None,
        BarLabel::Weak,
        BarLabel::Mixed,
        BarLabel::Defined,
        BarLabel::Strong,
    ];

    pub fn score(self) -> f64 {
        match self {
            BarLabel::Unknown => -0.5,
            BarLabel::None => 0.0,
            BarLabel::Weak => 0.25,
            BarLabel::Mixed => 0.5,
            BarLabel::Defined => 0.75,
            BarLabel::Strong => 1.0,
        }
    }

    /// Inverse of [`BarLabel::score`]; only the six catalog scores are accepted.
    pub fn from_score(score: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| (label.score() - score).abs() < 1e-6)
    }

    pub fn is_barred(self) -> bool {
        self.score() > 0.0
    }
}

impl fmt::Display for BarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarLabel::Unknown => "unknown",
            BarLabel::None => "none",
            BarLabel::Weak => "weak",
            BarLabel::Mixed => "mixed",
            BarLabel::Defined => "defined",
            BarLabel::Strong => "strong",
        };
        f.write_str(name)
    }
}

/// A catalogued galaxy: name, sky position (degrees) and bar label.
#[derive(Debug, Clone)]
pub struct GalaxyRef {
    name: String,
    right_ascension: f64,
    declination: f64,
    bar_label: BarLabel,
    image: OnceLock<Vec<u8>>,
}

impl GalaxyRef {
    pub fn new(name: impl Into<String>, right_ascension: f64, declination: f64) -> Self {
        Self {
            name: name.into(),
            right_ascension,
            declination,
            bar_label: BarLabel::Unknown,
            image: OnceLock::new(),
        }
    }

    pub fn with_bar(mut self, bar_label: BarLabel) -> Self {
        self.bar_label = bar_label;
        self
    }

    /// The name as it appears in the catalog, padding included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whitespace-trimmed name; the identity used for every cache key.
    pub fn cache_name(&self) -> &str {
        self.name.trim()
    }

    pub fn right_ascension(&self) -> f64 {
        self.right_ascension
    }

    pub fn declination(&self) -> f64 {
        self.declination
    }

    pub fn bar_label(&self) -> BarLabel {
        self.bar_label
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.get().map(Vec::as_slice)
    }

    /// Fills the image slot. Returns `false` and keeps the existing bytes if
    /// the slot was already set.
    pub fn remember_image(&self, bytes: Vec<u8>) -> bool {
        self.image.set(bytes).is_ok()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    objra: f64,
    objdec: f64,
    #[serde(rename = "Bars")]
    bars: Option<f64>,
}

impl CatalogRow {
    fn into_galaxy(self, path: &Path, line: usize) -> Result<GalaxyRef> {
        let label = match self.bars {
            Some(score) => BarLabel::from_score(score).ok_or_else(|| Error::Catalog {
                path: path.to_path_buf(),
                reason: format!("row {}: unknown bar score {}", line, score),
            })?,
            None => BarLabel::Unknown,
        };
        Ok(GalaxyRef::new(self.name, self.objra, self.objdec).with_bar(label))
    }
}

/// Loads a galaxy catalog, dispatching on the file extension.
///
/// Only CSV with a `name, objra, objdec[, Bars]` header is supported.
pub fn load_catalog(path: &Path) -> Result<Vec<GalaxyRef>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv(path),
        other => Err(Error::Catalog {
            path: path.to_path_buf(),
            reason: format!("unsupported catalog format '{}'", other),
        }),
    }
}

fn load_csv(path: &Path) -> Result<Vec<GalaxyRef>> {
    let catalog_error = |reason: String| Error::Catalog {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| catalog_error(e.to_string()))?;

    let mut galaxies = Vec::new();
    for (index, record) in reader.deserialize::<CatalogRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = record.map_err(|e| catalog_error(format!("row {}: {}", line, e)))?;
        galaxies.push(row.into_galaxy(path, line)?);
    }

    tracing::info!("Loaded {} galaxies from {}", galaxies.len(), path.display());
    Ok(galaxies)
}

/// Slices `skip..skip + top`, clamped to the catalog length.
pub fn select_range(galaxies: &[GalaxyRef], skip: Option<usize>, top: Option<usize>) -> &[GalaxyRef] {
    let start = skip.unwrap_or(0).min(galaxies.len());
    let end = match top {
        Some(top) => start.saturating_add(top).min(galaxies.len()),
        None => galaxies.len(),
    };
    &galaxies[start..end]
}
