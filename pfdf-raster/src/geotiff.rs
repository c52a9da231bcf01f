//! GeoTIFF read/write, backed by the `tiff` crate for the pixel codec.
//!
//! A dedicated module translating between `Raster` and on-disk bytes, with
//! the TIFF/BigTIFF tag table and LZW/Deflate codecs delegated to `tiff`.
//! Only the GeoKeys this library actually needs are read (pixel scale,
//! tiepoint, and a raw EPSG code) rather than the full GeoTIFF key registry;
//! see DESIGN.md.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::decoder::ifd::Value;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

use pfdf_common::errors::{Error, Result};

use crate::dtype::DType;
use crate::projection::{Crs, Transform};
use crate::raster::{Raster, RasterMetadata};
use crate::dtype::Casting;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

fn value_to_f64_vec(value: Value) -> Result<Vec<f64>> {
    match value {
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(value_to_f64_vec(item)?);
            }
            Ok(out)
        }
        Value::Double(v) => Ok(vec![v]),
        Value::Float(v) => Ok(vec![v as f64]),
        Value::Unsigned(v) => Ok(vec![v as f64]),
        Value::Short(v) => Ok(vec![v as f64]),
        Value::Byte(v) => Ok(vec![v as f64]),
        Value::Signed(v) => Ok(vec![v as f64]),
        Value::SignedShort(v) => Ok(vec![v as f64]),
        other => Err(Error::FeatureFile {
            path: "(geotiff tag)".to_string(),
            detail: format!("unsupported tag value type: {other:?}"),
        }),
    }
}

fn value_to_u16_vec(value: Value) -> Result<Vec<u16>> {
    Ok(value_to_f64_vec(value)?.into_iter().map(|v| v as u16).collect())
}

/// Reads the pixel values, inferred dtype, and (best-effort) spatial
/// metadata from a GeoTIFF file.
pub fn read_geotiff(path: impl AsRef<Path>) -> Result<Raster> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let (width, height) = decoder.dimensions().map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let (nrows, ncols) = (height as usize, width as usize);

    let image = decoder.read_image().map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let (values, dtype) = decoding_result_to_f64(image);

    let pixel_scale = decoder
        .get_tag(Tag::Unknown(MODEL_PIXEL_SCALE))
        .ok()
        .and_then(|v| value_to_f64_vec(v).ok());
    let tiepoint = decoder
        .get_tag(Tag::Unknown(MODEL_TIEPOINT))
        .ok()
        .and_then(|v| value_to_f64_vec(v).ok());
    let geo_keys = decoder
        .get_tag(Tag::Unknown(GEO_KEY_DIRECTORY))
        .ok()
        .and_then(|v| value_to_u16_vec(v).ok());

    let crs = geo_keys.as_ref().and_then(|keys| epsg_from_geo_keys(keys));

    let transform = match (pixel_scale, tiepoint) {
        (Some(scale), Some(tp)) if scale.len() >= 2 && tp.len() >= 6 => {
            let dx = scale[0];
            let dy = -scale[1];
            let left = tp[3];
            let top = tp[4];
            Transform::new(dx, dy, left, top, crs.clone()).ok()
        }
        _ => None,
    };

    let metadata = RasterMetadata::new(nrows, ncols, Some(dtype), None, crs, transform, Casting::Safe)?;
    Raster::from_array(
        values,
        nrows,
        ncols,
        metadata.dtype,
        metadata.nodata,
        metadata.crs,
        metadata.transform,
        None,
        Casting::Unsafe,
    )
}

fn decoding_result_to_f64(result: DecodingResult) -> (Vec<f64>, DType) {
    match result {
        DecodingResult::U8(v) => (v.into_iter().map(|x| x as f64).collect(), DType::UInt8),
        DecodingResult::U16(v) => (v.into_iter().map(|x| x as f64).collect(), DType::UInt16),
        DecodingResult::U32(v) => (v.into_iter().map(|x| x as f64).collect(), DType::UInt32),
        DecodingResult::U64(v) => (v.into_iter().map(|x| x as f64).collect(), DType::UInt64),
        DecodingResult::I8(v) => (v.into_iter().map(|x| x as f64).collect(), DType::Int8),
        DecodingResult::I16(v) => (v.into_iter().map(|x| x as f64).collect(), DType::Int16),
        DecodingResult::I32(v) => (v.into_iter().map(|x| x as f64).collect(), DType::Int32),
        DecodingResult::I64(v) => (v.into_iter().map(|x| x as f64).collect(), DType::Int64),
        DecodingResult::F32(v) => (v.into_iter().map(|x| x as f64).collect(), DType::Float32),
        DecodingResult::F64(v) => (v, DType::Float64),
    }
}

/// Resolves a GeoKeyDirectory to an EPSG `Crs`, handling only the common
/// case of a raw EPSG code stored directly as a `GeographicTypeGeoKey` or
/// `ProjectedCSTypeGeoKey` short value (key id, tiff tag location = 0,
/// count = 1, value-or-offset = the code). This covers the overwhelming
/// majority of GeoTIFFs produced by GDAL/rasterio; a directory using the
/// citation-string form is not resolved.
fn epsg_from_geo_keys(keys: &[u16]) -> Option<Crs> {
    if keys.len() < 4 {
        return None;
    }
    let num_keys = keys[3] as usize;
    for i in 0..num_keys {
        let base = 4 + i * 4;
        if base + 3 >= keys.len() {
            break;
        }
        let key_id = keys[base];
        let tiff_tag_location = keys[base + 1];
        let value = keys[base + 3];
        if tiff_tag_location == 0 && (key_id == GEOGRAPHIC_TYPE_KEY || key_id == PROJECTED_CS_TYPE_KEY) {
            return Some(Crs::from_epsg(value as u32));
        }
    }
    None
}

/// Writes `raster` as a GeoTIFF. Boolean rasters are serialized as `int8`.
pub fn write_geotiff(raster: &Raster, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let (nrows, ncols) = raster.shape();
    let dtype = raster.dtype().unwrap_or(DType::Float64);
    let write_dtype = if dtype == DType::Bool { DType::Int8 } else { dtype };

    let mut values = Vec::with_capacity(nrows * ncols);
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            values.push(raster.get(r, c));
        }
    }

    let write_result = match write_dtype {
        DType::Float64 => encoder
            .new_image::<colortype::Gray64Float>(ncols as u32, nrows as u32)
            .and_then(|img| img.write_data(&values)),
        DType::Float32 => {
            let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            encoder
                .new_image::<colortype::Gray32Float>(ncols as u32, nrows as u32)
                .and_then(|img| img.write_data(&data))
        }
        DType::UInt8 | DType::Int8 => {
            let data: Vec<u8> = values.iter().map(|&v| v as u8).collect();
            encoder
                .new_image::<colortype::Gray8>(ncols as u32, nrows as u32)
                .and_then(|img| img.write_data(&data))
        }
        DType::UInt16 | DType::Int16 => {
            let data: Vec<u16> = values.iter().map(|&v| v as u16).collect();
            encoder
                .new_image::<colortype::Gray16>(ncols as u32, nrows as u32)
                .and_then(|img| img.write_data(&data))
        }
        _ => {
            let data: Vec<u32> = values.iter().map(|&v| v as u32).collect();
            encoder
                .new_image::<colortype::Gray32>(ncols as u32, nrows as u32)
                .and_then(|img| img.write_data(&data))
        }
    };
    write_result.map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    Ok(())
}
