//! Reads point/polygon vector features out of a GeoJSON file and extracts
//! an optional attribute field value per feature.
//!
//! Parses the on-disk format into plain geometry + attribute pairs,
//! leaving rasterization to a separate module. The `geojson` crate handles
//! the actual parsing.

use pfdf_common::errors::{Error, Result};
use pfdf_common::structures::Point2D;
use pfdf_raster::BoundingBox;

use std::fs;
use std::path::Path;

/// A single feature's geometry, restricted to the two kinds this crate
/// rasterizes.
#[derive(Clone, Debug)]
pub enum FeatureGeometry {
    Point(Point2D),
    /// Rings in order, first is the exterior ring, the rest are holes.
    Polygon(Vec<Vec<Point2D>>),
}

impl FeatureGeometry {
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut update = |p: &Point2D| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        };
        match self {
            FeatureGeometry::Point(p) => update(p),
            FeatureGeometry::Polygon(rings) => {
                for ring in rings {
                    for p in ring {
                        update(p);
                    }
                }
            }
        }
        (min_x, min_y, max_x, max_y)
    }

    fn intersects_bounds(&self, bounds: &BoundingBox) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        let feature_box = BoundingBox::new(min_x, min_y, max_x, max_y, None);
        feature_box.intersects(bounds)
    }
}

/// `"point"` accepts `Point`/`MultiPoint` geometries (multipoints expand to
/// one feature per point); `"polygon"` accepts `Polygon`/`MultiPolygon`
/// (multipolygons expand to one feature per part).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
}

/// Reads `path` and returns `(geometry, field value)` pairs, one per
/// feature (multi-part geometries are expanded), restricted to features
/// intersecting `bounds` if given. `field` selects a numeric property to
/// carry through; features missing it are skipped with a `1.0` default
/// only when `field` is `None` (the "presence" raster case).
pub fn read_features(
    path: impl AsRef<Path>,
    kind: GeometryKind,
    field: Option<&str>,
    bounds: Option<&BoundingBox>,
) -> Result<Vec<(FeatureGeometry, f64)>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let geojson = contents.parse::<geojson::GeoJson>().map_err(|e| Error::FeatureFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut out = Vec::new();
    collect_features(&geojson, kind, field, &mut out, path)?;

    if let Some(bounds) = bounds {
        out.retain(|(geom, _)| geom.intersects_bounds(bounds));
    }

    if out.is_empty() {
        return Err(Error::NoFeatures { path: path.display().to_string() });
    }
    Ok(out)
}

fn collect_features(
    value: &geojson::GeoJson,
    kind: GeometryKind,
    field: Option<&str>,
    out: &mut Vec<(FeatureGeometry, f64)>,
    path: &Path,
) -> Result<()> {
    match value {
        geojson::GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                collect_one(feature, kind, field, out, path)?;
            }
        }
        geojson::GeoJson::Feature(feature) => collect_one(feature, kind, field, out, path)?,
        geojson::GeoJson::Geometry(_) => {
            return Err(Error::Geometry(
                "bare geometry documents are not supported; expected Feature(Collection)".to_string(),
            ));
        }
    }
    Ok(())
}

fn collect_one(
    feature: &geojson::Feature,
    kind: GeometryKind,
    field: Option<&str>,
    out: &mut Vec<(FeatureGeometry, f64)>,
    path: &Path,
) -> Result<()> {
    let geometry = match &feature.geometry {
        Some(g) => g,
        None => return Ok(()),
    };

    let value = match field {
        None => 1.0,
        Some(name) => match feature.properties.as_ref().and_then(|p| p.get(name)) {
            Some(v) => v.as_f64().ok_or_else(|| Error::FeatureFile {
                path: path.display().to_string(),
                detail: format!("field '{name}' is not numeric"),
            })?,
            None => return Ok(()),
        },
    };

    match (kind, &geometry.value) {
        (GeometryKind::Point, geojson::Value::Point(coords)) => {
            out.push((FeatureGeometry::Point(point_from_coords(coords)?), value));
        }
        (GeometryKind::Point, geojson::Value::MultiPoint(points)) => {
            for coords in points {
                out.push((FeatureGeometry::Point(point_from_coords(coords)?), value));
            }
        }
        (GeometryKind::Polygon, geojson::Value::Polygon(rings)) => {
            out.push((FeatureGeometry::Polygon(rings_from_coords(rings)?), value));
        }
        (GeometryKind::Polygon, geojson::Value::MultiPolygon(polygons)) => {
            for rings in polygons {
                out.push((FeatureGeometry::Polygon(rings_from_coords(rings)?), value));
            }
        }
        _ => {}
    }
    Ok(())
}

fn point_from_coords(coords: &[f64]) -> Result<Point2D> {
    if coords.len() < 2 {
        return Err(Error::Point("point geometry needs at least 2 coordinates".to_string()));
    }
    Ok(Point2D::new(coords[0], coords[1]))
}

fn rings_from_coords(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Point2D>>> {
    if rings.is_empty() {
        return Err(Error::Polygon("polygon geometry needs at least one ring".to_string()));
    }
    rings
        .iter()
        .map(|ring| ring.iter().map(|c| point_from_coords(c)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_bounds_covers_all_vertices() {
        let poly = FeatureGeometry::Polygon(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 3.0),
            Point2D::new(0.0, 3.0),
        ]]);
        assert_eq!(poly.bounds(), (0.0, 0.0, 2.0, 3.0));
    }
}
