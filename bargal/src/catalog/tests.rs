//! Tests for galaxy references and catalog loading.

use std::fs;

use super::*;

fn write_catalog(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_bar_scores_round_trip() {
    for label in BarLabel::ALL {
        assert_eq!(BarLabel::from_score(label.score()), Some(label));
    }
    assert_eq!(BarLabel::from_score(0.3), None);
}

#[test]
fn test_bar_score_ordering() {
    let scores: Vec<f64> = BarLabel::ALL.iter().map(|l| l.score()).collect();
    assert!(scores.windows(2).all(|w| w[0] < w[1]));
    assert!(!BarLabel::Unknown.is_barred());
    assert!(!BarLabel::None.is_barred());
    assert!(BarLabel::Weak.is_barred());
}

#[test]
fn test_cache_name_is_trimmed() {
    let padded = GalaxyRef::new("  NGC1300 ", 49.92, -19.41);
    let plain = GalaxyRef::new("NGC1300", 49.92, -19.41);
    assert_eq!(padded.cache_name(), "NGC1300");
    assert_eq!(padded.cache_name(), plain.cache_name());
    assert_eq!(padded.name(), "  NGC1300 ");
}

#[test]
fn test_image_slot_is_write_once() {
    let galaxy = GalaxyRef::new("NGC1300", 49.92, -19.41);
    assert!(galaxy.image().is_none());
    assert!(galaxy.remember_image(vec![1, 2, 3]));
    assert!(!galaxy.remember_image(vec![9, 9]));
    assert_eq!(galaxy.image(), Some(&[1u8, 2, 3][..]));
}

#[test]
fn test_load_csv_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(
        &dir,
        "galaxies.csv",
        "name,objra,objdec,Bars,extra\n\
         NGC1300 ,49.92,-19.41,1.0,x\n\
         NGC0628,24.17,15.78,0.0,y\n\
         UGC00001,0.5,1.5,,z\n",
    );

    let galaxies = load_catalog(&path).unwrap();
    assert_eq!(galaxies.len(), 3);
    assert_eq!(galaxies[0].cache_name(), "NGC1300");
    assert_eq!(galaxies[0].bar_label(), BarLabel::Strong);
    assert!((galaxies[1].right_ascension() - 24.17).abs() < 1e-12);
    assert_eq!(galaxies[1].bar_label(), BarLabel::None);
    assert_eq!(galaxies[2].bar_label(), BarLabel::Unknown);
}

#[test]
fn test_load_csv_rejects_unknown_score() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, "bad.csv", "name,objra,objdec,Bars\nNGC1,1.0,2.0,0.4\n");

    let err = load_catalog(&path).unwrap_err();
    assert!(matches!(err, Error::Catalog { .. }));
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn test_load_catalog_rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, "galaxies.fits", "SIMPLE");

    let err = load_catalog(&path).unwrap_err();
    assert!(err.to_string().contains("'fits'"));
}

#[test]
fn test_select_range_clamps() {
    let galaxies: Vec<GalaxyRef> = (0..5)
        .map(|i| GalaxyRef::new(format!("G{}", i), i as f64, 0.0))
        .collect();

    assert_eq!(select_range(&galaxies, None, None).len(), 5);
    assert_eq!(select_range(&galaxies, Some(2), None).len(), 3);
    assert_eq!(select_range(&galaxies, Some(1), Some(2))[0].name(), "G1");
    assert_eq!(select_range(&galaxies, Some(4), Some(10)).len(), 1);
    assert!(select_range(&galaxies, Some(10), Some(1)).is_empty());
}
