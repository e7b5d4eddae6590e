//! Runtime configuration.
//!
//! Loaded from YAML; every field has a default so a partial document (or no
//! document at all) is valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::preprocess::PresetDefinition;

// ============================================================================
// Acquisition
// ============================================================================

/// Parameters of the remote cutout service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Service root; `{base_url}/jpeg-cutout` and `{base_url}/fits-cutout` are queried.
    pub base_url: String,
    /// Cutout edge length in pixels.
    pub size: u32,
    /// Survey layer identifier.
    pub layer: String,
    /// Arcseconds per pixel.
    pub pixel_scale: f64,
    /// Per-request deadline.
    pub timeout_secs: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.legacysurvey.org/viewer".to_string(),
            size: 800,
            layer: "ls-dr10".to_string(),
            pixel_scale: 0.262,
            timeout_secs: 60,
        }
    }
}

impl AcquisitionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("acquisition.base_url is empty".into()));
        }
        if self.size == 0 {
            return Err(Error::InvalidConfig("acquisition.size must be positive".into()));
        }
        if !(self.pixel_scale.is_finite() && self.pixel_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "acquisition.pixel_scale must be positive, got {}",
                self.pixel_scale
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "acquisition.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Cache
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disk tier root. No disk tier when absent.
    pub dir: Option<PathBuf>,
    /// Keep downloaded bytes in memory for the lifetime of the client.
    pub memory: bool,
    /// Write downloads to the disk tier.
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            memory: false,
            persist: true,
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub acquisition: AcquisitionConfig,
    pub cache: CacheConfig,
    /// Preset used by the preprocess command.
    pub preset: String,
    /// Extra presets, registered next to the built-in ones.
    pub presets: BTreeMap<String, PresetDefinition>,
    /// Passes over the failure set in batch commands.
    pub retry_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            cache: CacheConfig::default(),
            preset: crate::preprocess::GRLOG_GR_DIFF.to_string(),
            presets: BTreeMap::new(),
            retry_passes: 3,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config =
            serde_yml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.acquisition.validate()?;
        if self.retry_passes == 0 {
            return Err(Error::InvalidConfig("retry_passes must be at least 1".into()));
        }
        if self.preset.trim().is_empty() {
            return Err(Error::InvalidConfig("preset is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Stage;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.acquisition.size, 800);
        assert_eq!(config.acquisition.layer, "ls-dr10");
        assert!((config.acquisition.pixel_scale - 0.262).abs() < 1e-12);
        assert_eq!(config.retry_passes, 3);
        assert!(config.cache.persist);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "cache:\n  dir: /tmp/galaxies\n  memory: true\nretry_passes: 5\n",
        )
        .unwrap();
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/galaxies")));
        assert!(config.cache.memory);
        assert!(config.cache.persist);
        assert_eq!(config.retry_passes, 5);
        assert_eq!(config.acquisition, AcquisitionConfig::default());
    }

    #[test]
    fn test_yaml_presets() {
        let yaml = r#"
preset: blur-diff
presets:
  blur-diff:
    g_chain:
      - kind: adaptive_normalize
      - kind: gaussian_blur
        kernel_size: 5
    r_chain:
      - kind: adaptive_normalize
    result_chain:
      - kind: center_crop
        factor: 2.0
      - kind: adaptive_normalize
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let preset = &config.presets["blur-diff"];
        assert_eq!(preset.g_chain.len(), 2);
        assert_eq!(preset.g_chain[1], Stage::GaussianBlur { kernel_size: 5 });
        assert_eq!(preset.result_chain[0], Stage::CenterCrop { factor: 2.0 });
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_yaml("acquisition:\n  size: 0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_yaml("acquisition:\n  pixel_scale: -1.0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_yaml("retry_passes: 0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_yaml("acquisition: [1, 2"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
