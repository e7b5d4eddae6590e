//! Remote cutout service.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::AcquisitionConfig;
use crate::error::{Error, Result};

/// Payload format of a cutout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutoutFormat {
    /// JPEG raster, one image per request.
    Raster,
    /// FITS data cube, one plane per requested band.
    Cube,
}

impl CutoutFormat {
    /// Endpoint selector used in the service URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            CutoutFormat::Raster => "jpeg",
            CutoutFormat::Cube => "fits",
        }
    }

    /// Cache file extension.
    pub fn extension(self) -> &'static str {
        match self {
            CutoutFormat::Raster => "jpg",
            CutoutFormat::Cube => "fits",
        }
    }
}

impl FromStr for CutoutFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raster" | "jpeg" | "jpg" => Ok(CutoutFormat::Raster),
            "cube" | "fits" => Ok(CutoutFormat::Cube),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for CutoutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoutFormat::Raster => write!(f, "raster"),
            CutoutFormat::Cube => write!(f, "cube"),
        }
    }
}

/// One cutout to download.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoutRequest {
    pub right_ascension: f64,
    pub declination: f64,
    /// Any subset of `"grz"`, rendered jointly.
    pub bands: String,
    pub format: CutoutFormat,
}

impl CutoutRequest {
    pub fn new(
        right_ascension: f64,
        declination: f64,
        bands: impl Into<String>,
        format: CutoutFormat,
    ) -> Self {
        Self {
            right_ascension,
            declination,
            bands: bands.into(),
            format,
        }
    }

    /// Full query URL against the configured service.
    pub fn url(&self, config: &AcquisitionConfig) -> String {
        format!(
            "{}/{}-cutout?ra={}&dec={}&size={}&layer={}&pixscale={}&bands={}",
            config.base_url.trim_end_matches('/'),
            self.format.endpoint(),
            self.right_ascension,
            self.declination,
            config.size,
            config.layer,
            config.pixel_scale,
            self.bands
        )
    }
}

/// Anything that can turn a [`CutoutRequest`] into payload bytes.
pub trait CutoutSource: Send + Sync {
    /// Fails with [`Error::Network`] on transport failures and non-success responses.
    fn fetch(&self, request: &CutoutRequest) -> Result<Vec<u8>>;
}

/// Blocking HTTP client for the survey cutout service.
#[derive(Debug, Clone)]
pub struct HttpCutoutSource {
    config: AcquisitionConfig,
    client: reqwest::blocking::Client,
}

impl HttpCutoutSource {
    pub fn new(config: AcquisitionConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }
}

impl CutoutSource for HttpCutoutSource {
    fn fetch(&self, request: &CutoutRequest) -> Result<Vec<u8>> {
        let url = request.url(&self.config);
        let network_error = |status: Option<u16>, reason: String| Error::Network {
            url: url.clone(),
            status,
            reason,
        };

        tracing::info!(
            "Downloading {} cutout at ra={} dec={} bands={}",
            request.format,
            request.right_ascension,
            request.declination,
            request.bands
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network_error(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network_error(
                Some(status.as_u16()),
                format!("HTTP {}", status),
            ));
        }

        let bytes = response
            .bytes()
            .map_err(|e| network_error(Some(status.as_u16()), e.to_string()))?;
        tracing::debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
