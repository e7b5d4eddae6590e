//! Error types for acquisition, decoding and preprocessing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Acquisition and decode failures always propagate to the caller, which owns
/// retry and skip policy. Numeric edge cases inside transforms never produce
/// an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Cache directory '{path}' is unusable: {reason}")]
    Configuration { path: PathBuf, reason: String },

    #[error("Request to '{url}' failed: {reason}")]
    Network {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Unsupported cutout format: '{0}' (expected 'raster' or 'cube')")]
    UnsupportedFormat(String),

    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Failed to access cache entry '{path}': {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid cache key '{0}'")]
    InvalidCacheKey(String),

    #[error("Catalog '{path}': {reason}")]
    Catalog { path: PathBuf, reason: String },

    #[error("Unknown preprocessing preset '{0}'")]
    UnknownPreset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Error::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_message() {
        let err = Error::Network {
            url: "https://example.invalid/cutout".to_string(),
            status: Some(500),
            reason: "HTTP 500".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.invalid"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::ShapeMismatch {
            context: "band difference",
            expected: (400, 400),
            actual: (200, 400),
        };
        let msg = err.to_string();
        assert!(msg.contains("band difference"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = Error::UnsupportedFormat("png".to_string());
        assert!(err.to_string().contains("'png'"));
    }

    #[test]
    fn test_cache_io_source_chain() {
        use std::error::Error as StdError;

        let err = Error::CacheIo {
            path: PathBuf::from("/tmp/cache/NGC1300.jpg"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("NGC1300.jpg"));
    }
}
