//! The `Raster` value+metadata type: a 2-D array of a declared [`DType`]
//! plus its spatial metadata, with dtype-checked preprocessing operations.
//!
//! A single in-memory value buffer ([`pfdf_common::structures::Array2D<f64>`])
//! plus a metadata struct carrying nodata/projection/extent. Preprocessing
//! methods allocate a fresh buffer and swap it in rather than mutating in
//! place, so a fatal error midway through a kernel leaves the input raster
//! unchanged.

use pfdf_common::errors::{Error, Result};
use pfdf_common::structures::Array2D;

use crate::dtype::{Casting, DType};
use crate::projection::{BoundingBox, Crs, Quadrant, Transform};

/// The metadata half of a [`Raster`]: shape, dtype, nodata, CRS and
/// transform, validated together by [`RasterMetadata::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct RasterMetadata {
    pub nrows: usize,
    pub ncols: usize,
    pub dtype: Option<DType>,
    pub nodata: Option<f64>,
    pub crs: Option<Crs>,
    pub transform: Option<Transform>,
}

impl RasterMetadata {
    pub fn new(
        nrows: usize,
        ncols: usize,
        dtype: Option<DType>,
        nodata: Option<f64>,
        crs: Option<Crs>,
        transform: Option<Transform>,
        casting: Casting,
    ) -> Result<RasterMetadata> {
        if (nrows == 0 || ncols == 0) && transform.is_some() {
            return Err(Error::Shape(
                "a raster with a zero dimension cannot have a transform".to_string(),
            ));
        }
        if let Some(nd) = nodata {
            let dtype = dtype.ok_or_else(|| {
                Error::MissingNoData("nodata was given but dtype was not".to_string())
            })?;
            if !nd.is_nan() {
                casting.allows(DType::Float64, dtype)?;
            }
            if !dtype.represents(nd) {
                return Err(Error::MissingNoData(format!(
                    "nodata value {nd} is not representable in dtype {dtype:?} under casting rule {casting:?}"
                )));
            }
        }
        let crs = reconcile_crs(crs, &transform);
        Ok(RasterMetadata { nrows, ncols, dtype, nodata, crs, transform })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.transform.as_ref().map(|t| t.bounds(self.nrows, self.ncols))
    }

    /// True when `self`'s CRS/transform/shape are the reference a sibling
    /// raster is required to match for a catchment/per-segment statistic:
    /// shape, CRS and the full transform must all agree.
    pub fn require_matches(&self, other: &RasterMetadata, name: &str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::raster_shape(
                name,
                format!("expected shape {:?}, found {:?}", self.shape(), other.shape()),
            ));
        }
        if !Crs::compatible(self.crs.as_ref(), other.crs.as_ref()) {
            return Err(Error::raster_crs(
                name,
                format!("expected CRS {:?}, found {:?}", self.crs, other.crs),
            ));
        }
        if self.transform != other.transform {
            return Err(Error::raster_transform(
                name,
                format!("expected transform {:?}, found {:?}", self.transform, other.transform),
            ));
        }
        Ok(())
    }
}

fn reconcile_crs(crs: Option<Crs>, transform: &Option<Transform>) -> Option<Crs> {
    match (&crs, transform.as_ref().and_then(|t| t.crs.clone())) {
        (Some(c), Some(tc)) if *c != tc => Some(c.clone()),
        (Some(c), _) => Some(c.clone()),
        (None, Some(tc)) => Some(tc),
        (None, None) => None,
    }
}

/// A `RasterMetadata` plus an owned, read-only (from the caller's
/// perspective) 2-D value array of the declared dtype.
#[derive(Clone, Debug)]
pub struct Raster {
    pub metadata: RasterMetadata,
    values: Array2D<f64>,
}

impl PartialEq for Raster {
    fn eq(&self, other: &Self) -> bool {
        if self.metadata != other.metadata {
            return false;
        }
        if self.metadata.shape() != other.metadata.shape() {
            return false;
        }
        for r in 0..self.metadata.nrows as isize {
            for c in 0..self.metadata.ncols as isize {
                let (a, b) = (self.values.get_value(r, c), other.values.get_value(r, c));
                if !(a == b || (a.is_nan() && b.is_nan())) {
                    return false;
                }
            }
        }
        true
    }
}

impl Raster {
    /// Builds a raster directly from a dense row-major `values` buffer.
    /// Either `transform` or `bounds` must be given, not both.
    #[allow(clippy::too_many_arguments)]
    pub fn from_array(
        values: Vec<f64>,
        nrows: usize,
        ncols: usize,
        dtype: Option<DType>,
        nodata: Option<f64>,
        crs: Option<Crs>,
        transform: Option<Transform>,
        bounds: Option<BoundingBox>,
        casting: Casting,
    ) -> Result<Raster> {
        if values.len() != nrows * ncols {
            return Err(Error::Shape(format!(
                "values has {} elements, expected {}",
                values.len(),
                nrows * ncols
            )));
        }
        if transform.is_some() && bounds.is_some() {
            return Err(Error::Transform(
                "transform and bounds are mutually exclusive".to_string(),
            ));
        }
        let transform = match (transform, bounds) {
            (Some(t), None) => Some(t),
            (None, Some(b)) => Some(b.transform(nrows, ncols)),
            (None, None) => None,
            _ => unreachable!(),
        };

        let dtype = dtype.or(Some(DType::Float64));
        let metadata =
            RasterMetadata::new(nrows, ncols, dtype, nodata, crs, transform, casting)?;

        let fill = nodata.unwrap_or(0.0);
        let mut array = Array2D::new(nrows as isize, ncols as isize, fill, fill)
            .map_err(|e| Error::Memory { operation: e.to_string() })?;
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                array.set_value(r, c, values[(r as usize) * ncols + c as usize]);
            }
        }
        Ok(Raster { metadata, values: array })
    }

    pub fn get(&self, row: isize, col: isize) -> f64 {
        self.values.get_value(row, col)
    }

    pub fn set(&mut self, row: isize, col: isize, value: f64) {
        self.values.set_value(row, col, value);
    }

    pub fn shape(&self) -> (usize, usize) {
        self.metadata.shape()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.metadata.nodata
    }

    pub fn dtype(&self) -> Option<DType> {
        self.metadata.dtype
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.metadata.crs.as_ref()
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.metadata.transform.as_ref()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.metadata.bounds()
    }

    pub fn values(&self) -> &Array2D<f64> {
        &self.values
    }

    /// True at every pixel whose value is the raster's nodata value
    /// (NaN-aware); all-false if there is no nodata value.
    pub fn nodata_mask(&self) -> Vec<bool> {
        let (nrows, ncols) = self.shape();
        let mut mask = vec![false; nrows * ncols];
        if let Some(nd) = self.metadata.nodata {
            for r in 0..nrows as isize {
                for c in 0..ncols as isize {
                    let v = self.values.get_value(r, c);
                    mask[(r as usize) * ncols + c as usize] = v == nd || (nd.is_nan() && v.is_nan());
                }
            }
        }
        mask
    }

    /// The complement of [`Raster::nodata_mask`]; all-true if there is no
    /// nodata value.
    pub fn data_mask(&self) -> Vec<bool> {
        self.nodata_mask().into_iter().map(|b| !b).collect()
    }

    /// Replaces every nodata pixel with `value` and clears the nodata
    /// setting. `value` must be representable in the raster's dtype.
    pub fn fill(&self, value: f64) -> Result<Raster> {
        if let Some(dtype) = self.metadata.dtype {
            if !dtype.represents(value) {
                return Err(Error::Dimension(format!(
                    "fill value {value} is not representable in dtype {dtype:?}"
                )));
            }
        }
        let mask = self.nodata_mask();
        let (nrows, ncols) = self.shape();
        let mut out = self.values.duplicate();
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                if mask[(r as usize) * ncols + c as usize] {
                    out.set_value(r, c, value);
                }
            }
        }
        let mut metadata = self.metadata.clone();
        metadata.nodata = None;
        Ok(Raster { metadata, values: out })
    }

    /// Boolean raster (nodata = false) marking pixels whose value equals
    /// any of `values` (NaN matches NaN).
    pub fn find(&self, values: &[f64]) -> Raster {
        let (nrows, ncols) = self.shape();
        let mut out = Array2D::new(nrows as isize, ncols as isize, 0.0, 0.0).unwrap();
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                let v = self.values.get_value(r, c);
                let hit = values.iter().any(|&target| v == target || (v.is_nan() && target.is_nan()));
                out.set_value(r, c, if hit { 1.0 } else { 0.0 });
            }
        }
        let metadata = RasterMetadata {
            nrows: self.metadata.nrows,
            ncols: self.metadata.ncols,
            dtype: Some(DType::Bool),
            nodata: Some(0.0),
            crs: self.metadata.crs.clone(),
            transform: self.metadata.transform.clone(),
        };
        Raster { metadata, values: out }
    }

    /// Restricts pixel values to `[min, max]` (either bound may be omitted,
    /// but not both). Out-of-range pixels either become NoData (`fill =
    /// true`, requires an existing NoData value) or are clamped to the
    /// nearer bound.
    pub fn set_range(
        &self,
        min: Option<f64>,
        max: Option<f64>,
        fill: bool,
        exclude_bounds: bool,
    ) -> Result<Raster> {
        if min.is_none() && max.is_none() {
            return Err(Error::Dimension("set_range requires at least one of min/max".to_string()));
        }
        if exclude_bounds && !fill {
            return Err(Error::Dimension("exclude_bounds requires fill=true".to_string()));
        }
        let nodata = if fill {
            Some(self.metadata.nodata.ok_or_else(|| {
                Error::MissingNoData("set_range(fill=true) requires an existing NoData value".to_string())
            })?)
        } else {
            self.metadata.nodata
        };

        let (nrows, ncols) = self.shape();
        let mut out = self.values.duplicate();
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                let v = self.values.get_value(r, c);
                let in_range = match (min, max) {
                    (Some(lo), Some(hi)) if exclude_bounds => v > lo && v < hi,
                    (Some(lo), Some(hi)) => v >= lo && v <= hi,
                    (Some(lo), None) if exclude_bounds => v > lo,
                    (Some(lo), None) => v >= lo,
                    (None, Some(hi)) if exclude_bounds => v < hi,
                    (None, Some(hi)) => v <= hi,
                    (None, None) => unreachable!(),
                };
                if !in_range {
                    if fill {
                        out.set_value(r, c, nodata.unwrap());
                    } else {
                        let clamped = match (min, max) {
                            (Some(lo), Some(hi)) => v.clamp(lo, hi),
                            (Some(lo), None) => v.max(lo),
                            (None, Some(hi)) => v.min(hi),
                            (None, None) => unreachable!(),
                        };
                        out.set_value(r, c, clamped);
                    }
                }
            }
        }
        let mut metadata = self.metadata.clone();
        metadata.nodata = nodata;
        Ok(Raster { metadata, values: out })
    }

    /// Extends the grid by a whole number of pixels on each side (rounding
    /// `distance` up to the next whole pixel), filling new pixels with
    /// NoData.
    #[allow(clippy::too_many_arguments)]
    pub fn buffer(
        &self,
        left: usize,
        right: usize,
        bottom: usize,
        top: usize,
    ) -> Result<Raster> {
        if left == 0 && right == 0 && bottom == 0 && top == 0 {
            return Err(Error::Dimension("buffer distance must be positive on at least one side".to_string()));
        }
        let nodata = self
            .metadata
            .nodata
            .ok_or_else(|| Error::MissingNoData("buffer requires an existing NoData value".to_string()))?;

        let (nrows, ncols) = self.shape();
        let new_rows = nrows + top + bottom;
        let new_cols = ncols + left + right;
        let mut out = Array2D::new(new_rows as isize, new_cols as isize, nodata, nodata)
            .map_err(|e| Error::Memory { operation: e.to_string() })?;
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                out.set_value(r + top as isize, c + left as isize, self.values.get_value(r, c));
            }
        }

        let transform = self.metadata.transform.as_ref().map(|t| {
            Transform::new(
                t.dx,
                t.dy,
                t.left - left as f64 * t.dx,
                t.top - top as f64 * t.dy,
                t.crs.clone(),
            )
            .expect("buffering an already-valid transform cannot make it invalid")
        });
        let mut metadata = self.metadata.clone();
        metadata.nrows = new_rows;
        metadata.ncols = new_cols;
        metadata.transform = transform;
        Ok(Raster { metadata, values: out })
    }

    /// Windows or extends the grid to `bounds`, filling any area outside the
    /// original extent with NoData.
    pub fn clip(&self, bounds: &BoundingBox) -> Result<Raster> {
        let transform = self
            .metadata
            .transform
            .clone()
            .ok_or_else(|| Error::MissingTransform("clip requires a transform".to_string()))?;
        let self_bounds = self
            .metadata
            .bounds()
            .expect("transform implies bounds are derivable");
        let oriented_self = self_bounds.orient(Quadrant::Four);
        let oriented_target = bounds.orient(Quadrant::Four);

        let extends = oriented_target.left < oriented_self.left
            || oriented_target.top > oriented_self.top
            || oriented_target.right > oriented_self.right
            || oriented_target.bottom < oriented_self.bottom;
        let nodata = if extends {
            Some(self.metadata.nodata.ok_or_else(|| {
                Error::MissingNoData("clip requires NoData when extending beyond the current extent".to_string())
            })?)
        } else {
            self.metadata.nodata
        };

        let new_ncols = ((oriented_target.right - oriented_target.left) / transform.dx.abs()).round() as usize;
        let new_nrows = ((oriented_target.top - oriented_target.bottom) / transform.dy.abs()).round() as usize;
        let mut out = Array2D::new(
            new_nrows as isize,
            new_ncols as isize,
            nodata.unwrap_or(0.0),
            nodata.unwrap_or(0.0),
        )
        .map_err(|e| Error::Memory { operation: e.to_string() })?;

        let row_offset = ((oriented_self.top - oriented_target.top) / transform.dy.abs()).round() as isize;
        let col_offset = ((oriented_target.left - oriented_self.left) / transform.dx.abs()).round() as isize;
        for r in 0..new_nrows as isize {
            for c in 0..new_ncols as isize {
                let src_r = r + row_offset;
                let src_c = c + col_offset;
                out.set_value(r, c, self.values.get_value(src_r, src_c));
            }
        }

        let new_transform = Transform::new(
            transform.dx,
            transform.dy,
            oriented_target.left,
            oriented_target.top,
            transform.crs.clone(),
        )?;
        let mut metadata = self.metadata.clone();
        metadata.nrows = new_nrows;
        metadata.ncols = new_ncols;
        metadata.transform = Some(new_transform);
        metadata.nodata = nodata;
        Ok(Raster { metadata, values: out })
    }

    /// Nearest-neighbour reprojection onto a new pixel grid aligned with
    /// `dst_crs`. Other resamplers (bilinear, cubic, ...) are not
    /// implemented; see DESIGN.md.
    pub fn reproject(&self, dst_crs: &Crs) -> Result<Raster> {
        let transform = self
            .metadata
            .transform
            .clone()
            .ok_or_else(|| Error::MissingTransform("reproject requires a transform".to_string()))?;
        let nodata = self
            .metadata
            .nodata
            .ok_or_else(|| Error::MissingNoData("reproject requires a NoData value".to_string()))?;
        let src_crs = self
            .metadata
            .crs
            .clone()
            .ok_or_else(|| Error::MissingCrs("reproject requires a source CRS".to_string()))?;

        if src_crs == *dst_crs {
            return Ok(self.clone());
        }

        let (nrows, ncols) = self.shape();
        let new_transform = transform.reproject(nrows, ncols, dst_crs)?;

        let mut out = Array2D::new(nrows as isize, ncols as isize, nodata, nodata)
            .map_err(|e| Error::Memory { operation: e.to_string() })?;
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                let (wx, wy) = new_transform.pixel_to_world(r as f64 + 0.5, c as f64 + 0.5);
                let (src_x, src_y) = {
                    let (xs, ys) = Crs::reproject(dst_crs, &src_crs, &[wx], &[wy])?;
                    (xs[0], ys[0])
                };
                let src_col = ((src_x - transform.left) / transform.dx).floor() as isize;
                let src_row = ((src_y - transform.top) / transform.dy).floor() as isize;
                out.set_value(r, c, self.values.get_value(src_row, src_col));
            }
        }

        let mut metadata = self.metadata.clone();
        metadata.crs = Some(dst_crs.clone());
        metadata.transform = Some(new_transform);
        Ok(Raster { metadata, values: out })
    }

    /// Returns a new raster over the sub-grid `rows`/`cols`, with an updated
    /// transform. Neither range may produce a zero-size shape.
    pub fn slice(&self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Result<Raster> {
        if rows.is_empty() || cols.is_empty() {
            return Err(Error::Shape("slice ranges must be non-empty".to_string()));
        }
        let (nrows, ncols) = self.shape();
        if rows.end > nrows || cols.end > ncols {
            return Err(Error::Shape(format!(
                "slice {:?}x{:?} exceeds raster shape {:?}",
                rows, cols, (nrows, ncols)
            )));
        }
        let new_nrows = rows.end - rows.start;
        let new_ncols = cols.end - cols.start;
        let fill = self.metadata.nodata.unwrap_or(0.0);
        let mut out = Array2D::new(new_nrows as isize, new_ncols as isize, fill, fill)
            .map_err(|e| Error::Memory { operation: e.to_string() })?;
        for r in 0..new_nrows as isize {
            for c in 0..new_ncols as isize {
                out.set_value(
                    r,
                    c,
                    self.values.get_value(r + rows.start as isize, c + cols.start as isize),
                );
            }
        }
        let transform = self.metadata.transform.as_ref().map(|t| {
            let (left, top) = t.pixel_to_world(rows.start as f64, cols.start as f64);
            Transform::new(t.dx, t.dy, left, top, t.crs.clone())
                .expect("slicing an already-valid transform cannot make it invalid")
        });
        let mut metadata = self.metadata.clone();
        metadata.nrows = new_nrows;
        metadata.ncols = new_ncols;
        metadata.transform = transform;
        Ok(Raster { metadata, values: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_raster() -> Raster {
        Raster::from_array(
            vec![1.0, 2.0, -999.0, 4.0],
            2,
            2,
            Some(DType::Float64),
            Some(-999.0),
            None,
            Some(Transform::new(1.0, -1.0, 0.0, 2.0, None).unwrap()),
            None,
            Casting::Safe,
        )
        .unwrap()
    }

    #[test]
    fn nodata_mask_is_nan_aware() {
        let r = small_raster();
        assert_eq!(r.nodata_mask(), vec![false, false, true, false]);
    }

    #[test]
    fn fill_clears_nodata() {
        let r = small_raster().fill(0.0).unwrap();
        assert_eq!(r.nodata(), None);
        assert_eq!(r.get(1, 0), 0.0);
    }

    #[test]
    fn set_range_requires_a_bound() {
        let r = small_raster();
        assert!(r.set_range(None, None, false, false).is_err());
    }

    #[test]
    fn buffer_zero_is_an_error() {
        let r = small_raster();
        assert!(r.buffer(0, 0, 0, 0).is_err());
    }

    #[test]
    fn clip_idempotent_on_a_subset() {
        let r = small_raster();
        let bounds = BoundingBox::new(0.0, 1.0, 1.0, 2.0, None);
        let once = r.clip(&bounds).unwrap();
        let twice = once.clip(&bounds).unwrap();
        assert_eq!(once, twice);
    }
}
