//! Immutable spatial metadata: coordinate reference systems, affine pixel
//! transforms, and bounding boxes, as standalone value types rather than
//! fields bolted onto the raster struct itself.

use std::fmt;

use pfdf_common::errors::{Error, Result};
use pfdf_common::utils::deg_to_utm;

/// A coordinate reference system, identified by EPSG code or a WKT string.
///
/// Two CRS are *compatible* (see [`Crs::compatible`]) if either is absent or
/// they resolve to the same authority record; an absent CRS is treated as
/// "no opinion" rather than implicitly WGS84.
#[derive(Clone, Debug, PartialEq)]
pub enum Crs {
    Epsg(u32),
    Wkt(String),
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Wkt(wkt) => write!(f, "{}", wkt),
        }
    }
}

impl Crs {
    pub fn from_epsg(code: u32) -> Crs {
        Crs::Epsg(code)
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Crs {
        Crs::Wkt(wkt.into())
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    /// True for geographic (lon/lat) CRS; false for projected CRS. Only the
    /// well-known geographic codes are recognized; anything else is treated
    /// as projected, the safer assumption when a CRS can't be classified.
    pub fn is_angular(&self) -> bool {
        matches!(self, Crs::Epsg(4326) | Crs::Epsg(4269) | Crs::Epsg(4267))
    }

    /// Linear units per metre for a projected CRS, or (for an angular CRS) an
    /// approximate metres-per-degree conversion via the haversine formula,
    /// evaluated at `lat` (or the equator if `lat` is omitted).
    pub fn units_per_m(&self, lat: Option<f64>) -> f64 {
        if self.is_angular() {
            let lat = lat.unwrap_or(0.0).to_radians();
            let earth_radius_m = 6_371_008.8;
            let meridian_circumference = 2.0 * std::f64::consts::PI * earth_radius_m;
            let parallel_circumference = 2.0 * std::f64::consts::PI * earth_radius_m * lat.cos();
            // degrees per metre, averaged between the meridian and the local
            // parallel so this still gives a sane answer at the poles.
            let deg_per_m_ns = 360.0 / meridian_circumference;
            let deg_per_m_ew = if parallel_circumference.abs() > 1e-9 {
                360.0 / parallel_circumference
            } else {
                deg_per_m_ns
            };
            (deg_per_m_ns + deg_per_m_ew) / 2.0
        } else {
            1.0
        }
    }

    /// `(zone, hemisphere letter)` of the UTM zone containing `(lon, lat)`.
    pub fn utm_zone(lon: f64, lat: f64) -> (isize, char) {
        let (_easting, _northing, zone, letter) = deg_to_utm(lat, lon);
        (zone, letter)
    }

    /// True if `self` and `other` name the same projection, or either is
    /// `None`.
    pub fn compatible(this: Option<&Crs>, other: Option<&Crs>) -> bool {
        match (this, other) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => a == b,
        }
    }

    /// Reprojects `(xs, ys)` from `src` to `dst` using `proj4rs` for
    /// WGS84/UTM-family EPSG codes; returns `Error::Crs` for anything the
    /// simplified resolver does not recognize.
    pub fn reproject(src: &Crs, dst: &Crs, xs: &[f64], ys: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if src == dst {
            return Ok((xs.to_vec(), ys.to_vec()));
        }
        if xs.len() != ys.len() {
            return Err(Error::Shape(format!(
                "xs (len {}) and ys (len {}) must be the same length",
                xs.len(),
                ys.len()
            )));
        }

        let src_proj = proj_definition(src)?;
        let dst_proj = proj_definition(dst)?;

        let mut out_x = Vec::with_capacity(xs.len());
        let mut out_y = Vec::with_capacity(ys.len());
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            let mut point = (x, y, 0.0);
            if src_proj.is_latlong() {
                point.0 = point.0.to_radians();
                point.1 = point.1.to_radians();
            }
            proj4rs::transform::transform(&src_proj, &dst_proj, &mut point)
                .map_err(|e| Error::Crs(format!("reprojection failed: {e}")))?;
            if dst_proj.is_latlong() {
                point.0 = point.0.to_degrees();
                point.1 = point.1.to_degrees();
            }
            out_x.push(point.0);
            out_y.push(point.1);
        }
        Ok((out_x, out_y))
    }
}

fn proj_definition(crs: &Crs) -> Result<proj4rs::Proj> {
    let definition = match crs {
        Crs::Epsg(4326) => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        Crs::Epsg(3857) => {
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs".to_string()
        }
        Crs::Epsg(code) => {
            return Err(Error::Crs(format!(
                "EPSG:{code} is not one of the CRS this build can resolve without a full EPSG database"
            )))
        }
        Crs::Wkt(_) => {
            return Err(Error::Crs(
                "WKT-defined CRS cannot be resolved to a proj4 definition in this build".to_string(),
            ))
        }
    };
    proj4rs::Proj::from_proj_string(&definition).map_err(|e| Error::Crs(e.to_string()))
}

/// Cartesian quadrant classification of a transform/bounding box, derived
/// from the signs of `dx`/`dy` (or `right-left`/`top-bottom`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    /// +x, +y (dx > 0, dy > 0)
    One,
    /// -x, +y
    Two,
    /// -x, -y
    Three,
    /// +x, -y (the usual raster convention: dy is negative, north-up)
    Four,
}

/// An affine map from pixel indices `(row, col)` to world coordinates of the
/// pixel's upper-left corner: `x = left + col*dx`, `y = top + row*dy`.
/// Resolution is signed so non north-up rasters are representable, and the
/// transform carries its own optional CRS.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub dx: f64,
    pub dy: f64,
    pub left: f64,
    pub top: f64,
    pub crs: Option<Crs>,
}

impl Transform {
    pub fn new(dx: f64, dy: f64, left: f64, top: f64, crs: Option<Crs>) -> Result<Transform> {
        if dx == 0.0 || dy == 0.0 {
            return Err(Error::Transform("dx and dy must be non-zero".to_string()));
        }
        for (name, v) in [("dx", dx), ("dy", dy), ("left", left), ("top", top)] {
            if !v.is_finite() {
                return Err(Error::Transform(format!("{name} must be finite")));
            }
        }
        Ok(Transform { dx, dy, left, top, crs })
    }

    pub fn quadrant(&self) -> Quadrant {
        match (self.dx >= 0.0, self.dy >= 0.0) {
            (true, true) => Quadrant::One,
            (false, true) => Quadrant::Two,
            (false, false) => Quadrant::Three,
            (true, false) => Quadrant::Four,
        }
    }

    /// World coordinates of a pixel's upper-left corner.
    pub fn pixel_to_world(&self, row: f64, col: f64) -> (f64, f64) {
        (self.left + col * self.dx, self.top + row * self.dy)
    }

    /// Bounds enclosing `nrows` x `ncols` pixels under this transform.
    pub fn bounds(&self, nrows: usize, ncols: usize) -> BoundingBox {
        let (x1, y1) = self.pixel_to_world(0.0, 0.0);
        let (x2, y2) = self.pixel_to_world(nrows as f64, ncols as f64);
        BoundingBox::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2), self.crs.clone())
    }

    /// Pixel size `(xres, yres)` in the given units (applies
    /// [`Crs::units_per_m`] for angular CRS, evaluated at `lat` if given).
    pub fn resolution(&self, lat: Option<f64>) -> (f64, f64) {
        let scale = self
            .crs
            .as_ref()
            .map(|c| c.units_per_m(lat))
            .unwrap_or(1.0);
        (self.dx.abs() / scale.max(1e-300), self.dy.abs() / scale.max(1e-300))
    }

    pub fn pixel_area(&self, lat: Option<f64>) -> f64 {
        let (xres, yres) = self.resolution(lat);
        xres * yres
    }

    pub fn pixel_diagonal(&self, lat: Option<f64>) -> f64 {
        let (xres, yres) = self.resolution(lat);
        xres.hypot(yres)
    }

    /// Reprojects the bounds implied by `(nrows, ncols)` into `dst_crs`, then
    /// re-derives a transform with the same shape that fully covers the
    /// reprojected extent.
    pub fn reproject(&self, nrows: usize, ncols: usize, dst_crs: &Crs) -> Result<Transform> {
        let bounds = self.bounds(nrows, ncols);
        let reprojected = bounds.reproject(dst_crs)?;
        let dx = (reprojected.right - reprojected.left) / ncols as f64;
        let dy = (reprojected.bottom - reprojected.top) / nrows as f64;
        Transform::new(dx, dy, reprojected.left, reprojected.top, Some(dst_crs.clone()))
    }
}

/// `(left, bottom, right, top, crs?)`. No ordering invariant is enforced at
/// rest; [`BoundingBox::orient`] normalizes edge order for a given quadrant.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    pub crs: Option<Crs>,
}

impl BoundingBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64, crs: Option<Crs>) -> BoundingBox {
        BoundingBox { left, bottom, right, top, crs }
    }

    pub fn from_list(values: [f64; 4], crs: Option<Crs>) -> BoundingBox {
        BoundingBox::new(values[0], values[1], values[2], values[3], crs)
    }

    pub fn from_dict(
        left: f64,
        bottom: f64,
        right: f64,
        top: f64,
        crs: Option<Crs>,
    ) -> BoundingBox {
        BoundingBox::new(left, bottom, right, top, crs)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.bottom + self.top) / 2.0)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let (l1, r1) = (self.left.min(self.right), self.left.max(self.right));
        let (b1, t1) = (self.bottom.min(self.top), self.bottom.max(self.top));
        let (l2, r2) = (other.left.min(other.right), other.left.max(other.right));
        let (b2, t2) = (other.bottom.min(other.top), other.bottom.max(other.top));
        l1 <= r2 && l2 <= r1 && b1 <= t2 && b2 <= t1
    }

    pub fn reproject(&self, dst_crs: &Crs) -> Result<BoundingBox> {
        let src_crs = self
            .crs
            .as_ref()
            .ok_or_else(|| Error::MissingCrs("bounding box has no CRS to reproject from".to_string()))?;
        let (xs, ys) = Crs::reproject(
            src_crs,
            dst_crs,
            &[self.left, self.right],
            &[self.bottom, self.top],
        )?;
        Ok(BoundingBox::new(xs[0], ys[0], xs[1], ys[1], Some(dst_crs.clone())))
    }

    /// Returns a copy of this box with edges reordered so that it lies in
    /// the given quadrant (e.g. [`Quadrant::Four`]: left < right, top >
    /// bottom, the usual north-up raster convention).
    pub fn orient(&self, quadrant: Quadrant) -> BoundingBox {
        let (lo_x, hi_x) = (self.left.min(self.right), self.left.max(self.right));
        let (lo_y, hi_y) = (self.bottom.min(self.top), self.bottom.max(self.top));
        let (left, right, bottom, top) = match quadrant {
            Quadrant::One => (lo_x, hi_x, lo_y, hi_y),
            Quadrant::Two => (hi_x, lo_x, lo_y, hi_y),
            Quadrant::Three => (hi_x, lo_x, hi_y, lo_y),
            Quadrant::Four => (lo_x, hi_x, hi_y, lo_y),
        };
        BoundingBox::new(left, bottom, right, top, self.crs.clone())
    }

    /// Derives the `Transform` that maps `(nrows, ncols)` pixels onto this
    /// box (north-up orientation: `dy` negative).
    pub fn transform(&self, nrows: usize, ncols: usize) -> Transform {
        let oriented = self.orient(Quadrant::Four);
        let dx = (oriented.right - oriented.left) / ncols as f64;
        let dy = (oriented.bottom - oriented.top) / nrows as f64;
        Transform::new(dx, dy, oriented.left, oriented.top, self.crs.clone())
            .expect("orient() never produces a zero-size box from a non-degenerate input")
    }

    /// Reprojects this box into its local UTM zone (using its own center as
    /// the reference point), falling back to the box's current CRS if that
    /// CRS is not one `Crs::reproject` can resolve (e.g. a bare WKT string).
    pub fn to_utm(&self) -> Result<BoundingBox> {
        let crs = self
            .crs
            .clone()
            .ok_or_else(|| Error::MissingCrs("bounding box has no CRS to convert to UTM".to_string()))?;
        let (center_x, center_y) = self.center();
        let (lon, lat) = if crs.is_angular() {
            (center_x, center_y)
        } else {
            let (xs, ys) = Crs::reproject(&crs, &Crs::from_epsg(4326), &[center_x], &[center_y])?;
            (xs[0], ys[0])
        };
        let (zone, letter) = Crs::utm_zone(lon, lat);
        let epsg = utm_epsg(zone, letter);
        self.reproject(&Crs::from_epsg(epsg))
    }

    /// Reprojects this box to match `other`'s CRS, if set; a no-op if
    /// `other` has no CRS.
    pub fn match_crs(&self, other: &BoundingBox) -> Result<BoundingBox> {
        match &other.crs {
            Some(crs) => self.reproject(crs),
            None => Ok(self.clone()),
        }
    }
}

/// EPSG code of the WGS84 UTM zone `zone`/`letter` (32600 + zone for
/// northern hemisphere, 32700 + zone for southern, per the standard EPSG
/// numbering).
fn utm_epsg(zone: isize, letter: char) -> u32 {
    let base = if letter >= 'N' { 32600 } else { 32700 };
    base + zone as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_bounds_round_trip() {
        let t = Transform::new(10.0, -10.0, 0.0, 100.0, None).unwrap();
        let bounds = t.bounds(10, 10);
        let back = bounds.transform(10, 10);
        assert!((back.dx - t.dx).abs() < 1e-9);
        assert!((back.dy - t.dy).abs() < 1e-9);
        assert!((back.left - t.left).abs() < 1e-9);
        assert!((back.top - t.top).abs() < 1e-9);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(Transform::new(0.0, -10.0, 0.0, 0.0, None).is_err());
    }

    #[test]
    fn compatible_treats_none_as_wildcard() {
        let a = Crs::from_epsg(4326);
        assert!(Crs::compatible(None, Some(&a)));
        assert!(Crs::compatible(Some(&a), None));
        assert!(Crs::compatible(Some(&a), Some(&a)));
        assert!(!Crs::compatible(Some(&a), Some(&Crs::from_epsg(3857))));
    }

    #[test]
    fn orient_quadrant_four_is_north_up() {
        let b = BoundingBox::new(10.0, 0.0, 0.0, 5.0, None);
        let oriented = b.orient(Quadrant::Four);
        assert_eq!(oriented.left, 0.0);
        assert_eq!(oriented.right, 10.0);
        assert_eq!(oriented.top, 5.0);
        assert_eq!(oriented.bottom, 0.0);
    }
}
