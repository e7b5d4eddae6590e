use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::acquisition::{fits, CutoutFormat, CutoutRequest};
use crate::error::Error;
use crate::preprocess::BandDifferenceProcessor;
use crate::storage::TieredCache;
use crate::Plane;

const SIZE: usize = 64;

/// Serves a g, r, z cube where g carries a bright horizontal bar.
#[derive(Debug, Default)]
struct CubeSource {
    calls: AtomicUsize,
}

impl CutoutSource for CubeSource {
    fn fetch(&self, request: &CutoutRequest) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.format != CutoutFormat::Cube {
            return Err(Error::Network {
                url: "raster".to_string(),
                status: Some(404),
                reason: "only cubes are served".to_string(),
            });
        }
        let c = SIZE as f32 / 2.0;
        let disk = |x: usize, y: usize| {
            let (dx, dy) = (x as f32 - c, y as f32 - c);
            (-(dx * dx + dy * dy) / 300.0).exp()
        };
        let g = Plane::from_fn(SIZE, SIZE, |x, y| {
            let bar = if (y as f32 - c).abs() < 2.0 && (x as f32 - c).abs() < 16.0 {
                0.5
            } else {
                0.0
            };
            disk(x, y) + bar
        });
        let r = Plane::from_fn(SIZE, SIZE, disk);
        let z = r.clone();
        Ok(fits::encode_f32_cube(&[g, r, z]))
    }
}

/// Calls a galaxy barred when the centre row outshines the centre column.
struct RowVersusColumn;

impl BarClassifier for RowVersusColumn {
    fn predict(&self, feature: &Buffer2<u8>) -> bool {
        let (width, height) = feature.shape();
        let row: u32 = feature.row(height / 2).iter().map(|&v| v as u32).sum();
        let column: u32 = (0..height).map(|y| feature[(width / 2, y)] as u32).sum();
        row > column
    }
}

fn classifier() -> GalaxyClassifier<RowVersusColumn, CubeSource> {
    let client = Arc::new(AcquisitionClient::new(CubeSource::default(), TieredCache::new()));
    GalaxyClassifier::new(
        client,
        Arc::new(BandDifferenceProcessor::grlog_gr_diff()),
        RowVersusColumn,
    )
}

#[test]
fn test_features_use_cube_without_composite() {
    let classifier = classifier();
    let feature = classifier
        .features(&GalaxyRef::new("NGC1300", 49.92, -19.41))
        .unwrap();

    assert_eq!(feature.shape(), (SIZE / 2, SIZE / 2));
    assert_eq!(feature.iter().copied().max(), Some(255));
    assert_eq!(classifier.client.source().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_classify_detects_bar() {
    let classifier = classifier();
    assert!(classifier
        .classify(&GalaxyRef::new("NGC1300", 49.92, -19.41))
        .unwrap());
}

#[test]
fn test_acquisition_errors_propagate() {
    struct Offline;

    impl CutoutSource for Offline {
        fn fetch(&self, _request: &CutoutRequest) -> Result<Vec<u8>> {
            Err(Error::Network {
                url: "offline".to_string(),
                status: None,
                reason: "unreachable".to_string(),
            })
        }
    }

    let classifier = GalaxyClassifier::new(
        Arc::new(AcquisitionClient::new(Offline, TieredCache::new())),
        Arc::new(BandDifferenceProcessor::sqrt_gr_diff()),
        RowVersusColumn,
    );
    let err = classifier
        .classify(&GalaxyRef::new("M95", 160.99, 11.70))
        .unwrap_err();
    assert!(matches!(err, Error::Network { status: None, .. }));
}
