//! Rasterizes point/polygon features into a `Raster`.
//!
//! Polygon fill uses the standard point-in-polygon ray-casting test applied
//! scanline by scanline.

use pfdf_common::errors::{Error, Result};
use pfdf_common::structures::Point2D;
use pfdf_raster::dtype::{Casting, DType};
use pfdf_raster::{Crs, Raster, Transform};

use crate::features::FeatureGeometry;

/// Computes the minimal axis-aligned grid at `resolution` that contains all
/// `geometries`, then (for points) pads the shape by one pixel on the right
/// and bottom so a point sitting exactly on the far edge still lands on a
/// pixel.
fn output_grid(
    geometries: &[FeatureGeometry],
    resolution: f64,
    crs: Option<Crs>,
    pad_for_points: bool,
) -> Result<(usize, usize, Transform)> {
    if resolution <= 0.0 {
        return Err(Error::Dimension("resolution must be positive".to_string()));
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for g in geometries {
        let (x0, y0, x1, y1) = g.bounds();
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    }

    let mut ncols = ((max_x - min_x) / resolution).ceil().max(1.0) as usize;
    let mut nrows = ((max_y - min_y) / resolution).ceil().max(1.0) as usize;
    if pad_for_points {
        ncols += 1;
        nrows += 1;
    }

    let transform = Transform::new(resolution, -resolution, min_x, max_y, crs)?;
    Ok((nrows, ncols, transform))
}

/// Result dtype/nodata defaults for a field-driven rasterization: `int32`
/// (smallest-int nodata) if every field value is integral, else `float64`
/// (`NaN` nodata).
fn infer_field_dtype(values: &[f64]) -> (DType, f64) {
    let all_integral = values.iter().all(|v| v.fract() == 0.0);
    if all_integral {
        (DType::Int32, i32::MIN as f64)
    } else {
        (DType::Float64, f64::NAN)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn rasterize_points(
    features: &[(FeatureGeometry, f64)],
    resolution: f64,
    crs: Option<Crs>,
    has_field: bool,
    dtype: Option<DType>,
    nodata: Option<f64>,
    field_casting: Casting,
) -> Result<Raster> {
    let geometries: Vec<FeatureGeometry> = features.iter().map(|(g, _)| g.clone()).collect();
    let (nrows, ncols, transform) = output_grid(&geometries, resolution, crs, true)?;

    let (dtype, nodata) = resolve_output_type(features, has_field, dtype, nodata);
    if has_field {
        field_casting.allows(DType::Float64, dtype)?;
    }
    let mut values = vec![nodata; nrows * ncols];

    // Construction order: later points overwrite earlier ones landing in
    // the same pixel ("last point wins").
    for (geom, value) in features {
        if let FeatureGeometry::Point(p) = geom {
            let col = ((p.x - transform.left) / transform.dx).floor();
            let row = ((p.y - transform.top) / transform.dy).floor();
            if row >= 0.0 && col >= 0.0 && (row as usize) < nrows && (col as usize) < ncols {
                let cast_value = if has_field { *value } else { 1.0 };
                values[(row as usize) * ncols + col as usize] = cast_value;
            }
        }
    }

    build_raster(values, nrows, ncols, dtype, nodata, transform)
}

#[allow(clippy::too_many_arguments)]
pub fn rasterize_polygons(
    features: &[(FeatureGeometry, f64)],
    resolution: f64,
    crs: Option<Crs>,
    has_field: bool,
    dtype: Option<DType>,
    nodata: Option<f64>,
    field_casting: Casting,
) -> Result<Raster> {
    let geometries: Vec<FeatureGeometry> = features.iter().map(|(g, _)| g.clone()).collect();
    let (nrows, ncols, transform) = output_grid(&geometries, resolution, crs, false)?;

    let (dtype, nodata) = resolve_output_type(features, has_field, dtype, nodata);
    if !supported_polygon_dtype(dtype) {
        return Err(Error::Dimension(format!(
            "dtype {dtype:?} is not supported for polygon rasterization"
        )));
    }
    if has_field {
        field_casting.allows(DType::Float64, dtype)?;
    }
    let mut values = vec![nodata; nrows * ncols];

    for (geom, value) in features {
        if let FeatureGeometry::Polygon(rings) = geom {
            let cast_value = if has_field { *value } else { 1.0 };
            scanline_fill(rings, &transform, nrows, ncols, cast_value, &mut values);
        }
    }

    build_raster(values, nrows, ncols, dtype, nodata, transform)
}

fn supported_polygon_dtype(dtype: DType) -> bool {
    matches!(
        dtype,
        DType::Bool
            | DType::Int16
            | DType::Int32
            | DType::UInt8
            | DType::UInt16
            | DType::UInt32
            | DType::Float32
            | DType::Float64
    )
}

fn resolve_output_type(
    features: &[(FeatureGeometry, f64)],
    has_field: bool,
    dtype: Option<DType>,
    nodata: Option<f64>,
) -> (DType, f64) {
    if !has_field {
        return (DType::Bool, nodata.unwrap_or(0.0));
    }
    match dtype {
        Some(d) => (d, nodata.unwrap_or(d.default_nodata())),
        None => {
            let values: Vec<f64> = features.iter().map(|(_, v)| *v).collect();
            let (d, default_nodata) = infer_field_dtype(&values);
            (d, nodata.unwrap_or(default_nodata))
        }
    }
}

fn build_raster(
    values: Vec<f64>,
    nrows: usize,
    ncols: usize,
    dtype: DType,
    nodata: f64,
    transform: Transform,
) -> Result<Raster> {
    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(dtype),
        Some(nodata),
        transform.crs.clone(),
        Some(transform),
        None,
        Casting::Unsafe,
    )
}

/// Fills every pixel whose centre lies inside the polygon (exterior minus
/// holes), row by row: for each row, intersect the polygon's edges with the
/// row's horizontal centreline, sort the crossings, and fill between pairs
/// (even-odd rule, so holes are handled by winding the same test over all
/// rings).
fn scanline_fill(
    rings: &[Vec<Point2D>],
    transform: &Transform,
    nrows: usize,
    ncols: usize,
    value: f64,
    values: &mut [f64],
) {
    for row in 0..nrows {
        let (_, y) = transform.pixel_to_world(row as f64 + 0.5, 0.0);
        let mut crossings: Vec<f64> = Vec::new();
        for ring in rings {
            for i in 0..ring.len() {
                let a = ring[i];
                let b = ring[(i + 1) % ring.len()];
                if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                    let t = (y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for pair in crossings.chunks(2) {
            if pair.len() < 2 {
                continue;
            }
            let (x0, x1) = (pair[0], pair[1]);
            let col0 = ((x0 - transform.left) / transform.dx).floor().max(0.0) as usize;
            let col1 = (((x1 - transform.left) / transform.dx).ceil() as isize).max(0) as usize;
            for col in col0..col1.min(ncols) {
                let (px, _) = transform.pixel_to_world(row as f64, col as f64 + 0.5);
                if px >= x0 && px <= x1 {
                    values[row * ncols + col] = value;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_rasterization_marks_interior_pixels() {
        let square = FeatureGeometry::Polygon(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 4.0),
            Point2D::new(0.0, 4.0),
        ]]);
        let raster =
            rasterize_polygons(&[(square, 1.0)], 1.0, None, false, None, None, Casting::Unsafe).unwrap();
        assert_eq!(raster.shape(), (4, 4));
        assert_eq!(raster.get(1, 1), 1.0);
        assert_eq!(raster.get(0, 0), 1.0);
    }

    #[test]
    fn point_rasterization_pads_the_far_edge() {
        let point = FeatureGeometry::Point(Point2D::new(4.0, 0.0));
        let raster =
            rasterize_points(&[(point, 1.0)], 1.0, None, false, None, None, Casting::Unsafe).unwrap();
        // a 4x4 extent with a single point padded by one pixel -> 5x5 (or
        // larger than 4x4 at minimum)
        assert!(raster.shape().0 >= 1 && raster.shape().1 >= 5);
    }
}
