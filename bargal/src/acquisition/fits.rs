//! Reading the primary image of a FITS data cube.
//!
//! Cutout cubes are `NAXIS1` wide, `NAXIS2` high and `NAXIS3` planes deep,
//! one plane per band. cfitsio applies `BSCALE`/`BZERO` while reading. Rows
//! keep the file's bottom-to-top order.

use std::io::Write;
use std::path::Path;

use fitsio::hdu::HduInfo;
use fitsio::images::ImageType;
use fitsio::FitsFile;

use crate::error::{Error, Result};
use crate::Plane;

/// Reads every plane of the primary data cube in `bytes`, in file order.
///
/// A 2D image yields a single plane. Corrupt or truncated input is a
/// [`Error::Decode`] naming `what`.
pub fn read_planes(bytes: &[u8], what: &str) -> Result<Vec<Plane>> {
    // cfitsio reads from a path, so payloads go through a scratch file.
    let mut scratch = tempfile::Builder::new()
        .prefix("bargal-")
        .suffix(".fits")
        .tempfile()
        .map_err(|source| Error::Io {
            path: std::env::temp_dir(),
            source,
        })?;
    scratch
        .write_all(bytes)
        .and_then(|_| scratch.flush())
        .map_err(|source| Error::Io {
            path: scratch.path().to_path_buf(),
            source,
        })?;

    read_planes_from_path(scratch.path(), bytes.len(), what)
}

fn read_planes_from_path(path: &Path, file_len: usize, what: &str) -> Result<Vec<Plane>> {
    let mut fptr = FitsFile::open(path).map_err(|e| Error::decode(what, e))?;
    let hdu = fptr.primary_hdu().map_err(|e| Error::decode(what, e))?;

    let (shape, image_type) = match &hdu.info {
        HduInfo::ImageInfo { shape, image_type } => (shape.as_slice(), image_type),
        HduInfo::TableInfo { .. } => {
            return Err(Error::decode(what, "primary HDU is a table, not an image"))
        }
        HduInfo::AnyInfo => return Err(Error::decode(what, "unknown primary HDU type")),
    };

    // cfitsio reports the axes slowest first: [planes, height, width].
    let (plane_count, height, width) = match shape {
        [height, width] => (1, *height, *width),
        [planes, height, width] => (*planes, *height, *width),
        other => {
            return Err(Error::decode(
                what,
                format!("expected a 2D image or 3D cube, found {} axes", other.len()),
            ))
        }
    };

    let plane_len = width
        .checked_mul(height)
        .filter(|&len| len > 0)
        .ok_or_else(|| Error::decode(what, format!("invalid plane size {}x{}", width, height)))?;
    let total = plane_len
        .checked_mul(plane_count)
        .ok_or_else(|| Error::decode(what, "data unit size overflows"))?;

    // The data unit must fit in the file before anything is allocated for it.
    let data_len = total.checked_mul(element_size(image_type));
    if !matches!(data_len, Some(len) if len <= file_len) {
        return Err(Error::decode(
            what,
            format!(
                "data unit of {} x {}x{} {:?} values does not fit in {} bytes",
                plane_count, width, height, image_type, file_len
            ),
        ));
    }

    let pixels: Vec<f32> = hdu
        .read_image(&mut fptr)
        .map_err(|e| Error::decode(what, e))?;
    if pixels.len() != total {
        return Err(Error::decode(
            what,
            format!("expected {} values, read {}", total, pixels.len()),
        ));
    }

    tracing::debug!(
        "Read {} FITS planes of {}x{} ({:?}) from {}",
        plane_count,
        width,
        height,
        image_type,
        what
    );

    Ok(pixels
        .chunks_exact(plane_len)
        .map(|plane| Plane::new(width, height, plane.to_vec()))
        .collect())
}

/// Bytes per stored element.
fn element_size(image_type: &ImageType) -> usize {
    match image_type {
        ImageType::UnsignedByte | ImageType::Byte => 1,
        ImageType::Short | ImageType::UnsignedShort => 2,
        ImageType::Long | ImageType::UnsignedLong | ImageType::Float => 4,
        ImageType::LongLong | ImageType::Double => 8,
    }
}

/// Serialises `planes` as a float cube. Used by tests that stand in for the service.
#[cfg(test)]
pub(crate) fn encode_f32_cube(planes: &[Plane]) -> Vec<u8> {
    use fitsio::images::ImageDescription;

    let (width, height) = planes.first().map(|p| p.shape()).unwrap_or((0, 0));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.fits");

    {
        let description = ImageDescription {
            data_type: ImageType::Float,
            dimensions: &[planes.len(), height, width],
        };
        let mut fptr = FitsFile::create(&path)
            .with_custom_primary(&description)
            .open()
            .unwrap();
        let hdu = fptr.primary_hdu().unwrap();
        let data: Vec<f32> = planes.iter().flat_map(|p| p.iter().copied()).collect();
        hdu.write_image(&mut fptr, &data).unwrap();
    }

    std::fs::read(&path).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_SIZE: usize = 2880;

    fn card(text: &str) -> String {
        format!("{:<80}", text)
    }

    /// Hand-written primary header followed by `data`, both padded to whole blocks.
    fn raw_fits(cards: &[String], data: &[u8]) -> Vec<u8> {
        let mut text: String = cards.iter().map(|c| card(c)).collect();
        text += &card("END");
        let mut bytes = text.into_bytes();
        bytes.resize(bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
        bytes.extend_from_slice(data);
        bytes.resize(bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, 0);
        bytes
    }

    fn header(bitpix: i64, axes: &[u64], extra: &[&str]) -> Vec<String> {
        let mut cards = vec![
            "SIMPLE  =                    T".to_string(),
            format!("BITPIX  = {:>20}", bitpix),
            format!("NAXIS   = {:>20}", axes.len()),
        ];
        for (index, len) in axes.iter().enumerate() {
            cards.push(format!("NAXIS{:<3}= {:>20}", index + 1, len));
        }
        cards.extend(extra.iter().map(|line| line.to_string()));
        cards
    }

    fn i16_data(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_read_f32_cube() {
        let planes: Vec<Plane> = (0..3)
            .map(|band| Plane::from_fn(4, 2, |x, y| (band * 100 + y * 10 + x) as f32))
            .collect();
        let bytes = encode_f32_cube(&planes);
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);

        let decoded = read_planes(&bytes, "cube").unwrap();
        assert_eq!(decoded, planes);
    }

    #[test]
    fn test_read_scaled_i16_image() {
        let bytes = raw_fits(
            &header(
                16,
                &[2, 2],
                &["BSCALE  =                  2.0", "BZERO   =              32768.0"],
            ),
            &i16_data(&[-32768, 0, 1, 32767]),
        );
        let planes = read_planes(&bytes, "image").unwrap();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].pixels(), &[-32768.0, 32768.0, 32770.0, 98302.0]);
    }

    #[test]
    fn test_missing_data_unit() {
        let mut bytes = raw_fits(&header(16, &[2, 2], &[]), &i16_data(&[1, 2, 3, 4]));
        bytes.truncate(BLOCK_SIZE);
        assert!(matches!(read_planes(&bytes, "x"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_rejects_non_fits() {
        assert!(matches!(
            read_planes(b"\xff\xd8\xff\xe0 jpeg bytes", "x"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(read_planes(&[], "x"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_unsupported_bitpix() {
        let bytes = raw_fits(&header(24, &[1, 1], &[]), &[0, 0, 0]);
        assert!(matches!(read_planes(&bytes, "x"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_huge_naxis_is_decode_error() {
        let cards = vec![
            "SIMPLE  =                    T".to_string(),
            "BITPIX  =                  -32".to_string(),
            "NAXIS   =     1000000000000000".to_string(),
        ];
        let bytes = raw_fits(&cards, &[]);
        assert!(matches!(read_planes(&bytes, "x"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_overflowing_axes_are_decode_error() {
        let side = 1u64 << 32;
        let bytes = raw_fits(&header(-32, &[side, side], &[]), &[0; 16]);
        let err = read_planes(&bytes, "NGC1300.fits").unwrap_err();
        assert!(matches!(err, Error::Decode { ref what, .. } if what == "NGC1300.fits"));

        let bytes = raw_fits(&header(-32, &[side, side, 3], &[]), &[0; 16]);
        assert!(matches!(read_planes(&bytes, "x"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_axes_larger_than_file() {
        let bytes = raw_fits(&header(-32, &[4000, 4000, 3], &[]), &[0; 64]);
        assert!(matches!(read_planes(&bytes, "x"), Err(Error::Decode { .. })));
    }
}
