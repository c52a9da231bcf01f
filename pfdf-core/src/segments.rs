//! The `Segments` stream-network graph: a directed graph of stream
//! reaches over a `flow`/`mask` pair, plus the per-segment and per-catchment
//! statistics, topology edits, and export operations built on top of it.
//!
//! Construction reuses the exact reach-walking algorithm in
//! [`crate::watershed::network`] (headwater seeding, confluence detection,
//! vertex-per-direction-change simplification), extended here to also record
//! each reach's full pixel chain and the single pixel immediately downstream
//! of its own last pixel. A segment's `child` is found by looking up which
//! other segment's *headwater* pixel that downstream pixel is — segments
//! never share a pixel at a confluence, the child's chain simply starts one
//! D8 step past the parent's end.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use serde_json::{Map as JsonMap, Value as JsonValue};

use pfdf_common::config::Config;
use pfdf_common::errors::{Error, Result};
use pfdf_common::structures::{Point2D, Polyline};
use pfdf_raster::{Casting, DType, Raster, Transform};

use crate::watershed;

/// A stream-segment network built over a `flow` raster restricted to a
/// `mask`. Every per-segment array is kept in internal-index order; `ids`
/// maps indices to the stable, never-reused identifiers callers see.
#[derive(Clone, Debug)]
pub struct Segments {
    ids: Vec<usize>,
    pixels: Vec<Vec<(isize, isize)>>,
    lines: Vec<Polyline>,
    child: Vec<i64>,
    parents: Vec<[i64; 2]>,
    npixels: Vec<usize>,
    flow: Raster,
    mask: Raster,
}

/// One reach discovered by [`walk_reaches`]: its own pixel chain, the
/// simplified vertex list for its [`Polyline`], and (if the reach doesn't
/// run off the mask/grid) the single pixel one D8 step past its own end.
struct Reach {
    pixels: Vec<(isize, isize)>,
    vertices: Vec<Point2D>,
    next_pixel: Option<(isize, isize)>,
}

/// Walks every reach of `flow` restricted to `mask`, exactly the algorithm
/// in [`watershed::network`], but additionally recording each reach's full
/// pixel chain (not just its simplified vertices) and the pixel immediately
/// downstream of its last pixel.
fn walk_reaches(flow: &Raster, mask: &Raster, transform: &Transform) -> Vec<Reach> {
    let (nrows, ncols) = flow.shape();
    let in_mask = |r: isize, c: isize| -> bool {
        r >= 0 && c >= 0 && r < nrows as isize && c < ncols as isize && watershed::raster_truthy(mask, r, c)
    };

    let mut inflowing = vec![0i32; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if !in_mask(r, c) {
                continue;
            }
            let mut count = 0;
            for i in 0..8 {
                let (rn, cn) = (r + watershed::DY[i], c + watershed::DX[i]);
                if !in_mask(rn, cn) {
                    continue;
                }
                let dir = flow.get(rn, cn) as i8;
                if dir != 0 && watershed::dir_index(dir) == watershed::opposite_index(i) {
                    count += 1;
                }
            }
            inflowing[r as usize * ncols + c as usize] = count;
        }
    }

    let mut stack = Vec::new();
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if in_mask(r, c) && inflowing[r as usize * ncols + c as usize] == 0 {
                stack.push((r, c));
            }
        }
    }

    let mut processed = vec![false; nrows * ncols];
    let mut reaches = Vec::new();

    while let Some((start_r, start_c)) = stack.pop() {
        let start_idx = start_r as usize * ncols + start_c as usize;
        if processed[start_idx] {
            continue;
        }

        let mut pixels = Vec::new();
        let mut vertices: Vec<Point2D> = Vec::new();
        let mut prev_dir: i32 = i32::MIN;
        let mut next_pixel = None;
        let (mut r, mut c) = (start_r, start_c);
        loop {
            let dir = flow.get(r, c) as i8;
            pixels.push((r, c));
            if vertices.is_empty() || dir as i32 != prev_dir {
                let (x, y) = transform.pixel_to_world(r as f64 + 0.5, c as f64 + 0.5);
                vertices.push(Point2D::new(x, y));
                prev_dir = dir as i32;
            }
            processed[r as usize * ncols + c as usize] = true;

            if dir == 0 {
                break;
            }
            let i = watershed::dir_index(dir);
            let (rn, cn) = (r + watershed::DY[i], c + watershed::DX[i]);
            next_pixel = Some((rn, cn));

            if !in_mask(rn, cn) {
                let (x, y) = transform.pixel_to_world(rn as f64 + 0.5, cn as f64 + 0.5);
                vertices.push(Point2D::new(x, y));
                break;
            }
            let idx_n = rn as usize * ncols + cn as usize;
            if inflowing[idx_n] != 1 {
                let (x, y) = transform.pixel_to_world(rn as f64 + 0.5, cn as f64 + 0.5);
                vertices.push(Point2D::new(x, y));
                if !processed[idx_n] {
                    stack.push((rn, cn));
                }
                break;
            }
            r = rn;
            c = cn;
        }

        reaches.push(Reach { pixels, vertices, next_pixel });
    }

    reaches
}

fn compute_npixels(flow: &Raster, mask: &Raster, chains: &[Vec<(isize, isize)>]) -> Result<Vec<usize>> {
    let acc = watershed::accumulation(flow, None, Some(mask))?;
    Ok(chains
        .iter()
        .map(|chain| {
            let &(r, c) = chain.last().expect("a reach always has at least one pixel");
            acc.get(r, c).round().max(0.0) as usize
        })
        .collect())
}

/// Re-simplifies a raw pixel chain into a vertex-per-direction-change
/// polyline, the same reduction [`walk_reaches`] applies during
/// construction; used by [`Segments::split`] to rebuild lines for the two
/// new pieces of a split reach.
fn simplify_chain(chain: &[(isize, isize)], transform: &Transform, id: usize) -> Polyline {
    let mut vertices = Vec::new();
    let mut prev_delta: Option<(isize, isize)> = None;
    for (k, &(r, c)) in chain.iter().enumerate() {
        let delta = if k + 1 < chain.len() {
            Some((chain[k + 1].0 - r, chain[k + 1].1 - c))
        } else {
            None
        };
        if k == 0 || k == chain.len() - 1 || delta != prev_delta {
            let (x, y) = transform.pixel_to_world(r as f64 + 0.5, c as f64 + 0.5);
            vertices.push(Point2D::new(x, y));
        }
        if delta.is_some() {
            prev_delta = delta;
        }
    }
    Polyline::new(&vertices, id)
}

/// Converts a value already expressed in metres to the requested linear
/// unit. Errors on any unit this crate doesn't recognize.
fn from_metres(value_m: f64, units: &str) -> Result<f64> {
    let factor = match units {
        "m" | "meters" | "metres" => 1.0,
        "km" | "kilometers" | "kilometres" => 0.001,
        "ft" | "feet" => 1.0 / 0.3048,
        "mi" | "miles" => 1.0 / 1609.344,
        "us_ft" | "us_survey_feet" | "usft" => 3937.0 / 1200.0,
        other => {
            return Err(Error::Dimension(format!(
                "unrecognized length unit {other:?}"
            )))
        }
    };
    Ok(value_m * factor)
}

/// Weighted mean of `raster` over a pixel chain, propagating (or skipping,
/// under `omitnan`) NaN pixels. Shared by every reach-local per-segment
/// statistic (`burn_ratio`, `slope`, `relief`, `sine_theta`, `kf_factor`).
fn reach_mean(chain: &[(isize, isize)], raster: &Raster, weights: Option<&Raster>, omitnan: bool) -> f64 {
    let mut total = 0.0;
    let mut weight_total = 0.0;
    for &(r, c) in chain {
        let v = raster.get(r, c);
        if v.is_nan() {
            if omitnan {
                continue;
            }
            return f64::NAN;
        }
        let w = weights.map(|w| w.get(r, c)).unwrap_or(1.0);
        total += v * w;
        weight_total += w;
    }
    if weight_total == 0.0 {
        f64::NAN
    } else {
        total / weight_total
    }
}

fn ones_like(a: &Raster) -> Result<Raster> {
    let (nrows, ncols) = a.shape();
    Raster::from_array(
        vec![1.0; nrows * ncols],
        nrows,
        ncols,
        Some(DType::Float64),
        Some(f64::NAN),
        a.crs().cloned(),
        a.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

fn multiply(a: &Raster, b: Option<&Raster>) -> Result<Raster> {
    match b {
        None => Ok(a.clone()),
        Some(b) => {
            a.metadata.require_matches(&b.metadata, "weights")?;
            let (nrows, ncols) = a.shape();
            let mut values = vec![0.0; nrows * ncols];
            for r in 0..nrows as isize {
                for c in 0..ncols as isize {
                    values[r as usize * ncols + c as usize] = a.get(r, c) * b.get(r, c);
                }
            }
            Raster::from_array(
                values,
                nrows,
                ncols,
                Some(DType::Float64),
                Some(f64::NAN),
                a.crs().cloned(),
                a.transform().cloned(),
                None,
                Casting::Unsafe,
            )
        }
    }
}

impl Segments {
    /// Builds the network: extracts reaches from `flow` restricted to
    /// `mask` (optionally split at `max_length`), assigns 1-based ids in
    /// construction order, derives `child`/`parents` from the one-D8-step
    /// downstream lookup, and computes `npixels` via masked flow
    /// accumulation sampled at each outlet.
    pub fn new(flow: &Raster, mask: &Raster, max_length: Option<f64>) -> Result<Segments> {
        flow.metadata.require_matches(&mask.metadata, "mask")?;
        let transform = flow
            .transform()
            .cloned()
            .ok_or_else(|| Error::MissingTransform("Segments requires a transform".to_string()))?;

        let mut pixels = Vec::new();
        let mut lines = Vec::new();
        let mut next_pixel = Vec::new();

        for reach in walk_reaches(flow, mask, &transform) {
            match max_length {
                Some(max_len) if max_len > 0.0 && reach.pixels.len() > 1 => {
                    for piece in split_reach(&reach, max_len, &transform) {
                        next_pixel.push(piece.next_pixel);
                        lines.push(simplify_chain(&piece.pixels, &transform, 0));
                        pixels.push(piece.pixels);
                    }
                }
                _ => {
                    next_pixel.push(reach.next_pixel);
                    lines.push(Polyline::new(&reach.vertices, 0));
                    pixels.push(reach.pixels);
                }
            }
        }

        let n = pixels.len();
        let mut headwater_index: HashMap<(isize, isize), usize> = HashMap::new();
        for (i, chain) in pixels.iter().enumerate() {
            headwater_index.insert(chain[0], i);
        }
        for (i, line) in lines.iter_mut().enumerate() {
            line.id = i + 1;
        }

        let mut child = vec![-1i64; n];
        let mut parents = vec![[-1i64; 2]; n];
        for i in 0..n {
            if let Some(next) = next_pixel[i] {
                if let Some(&downstream) = headwater_index.get(&next) {
                    child[i] = downstream as i64;
                    match parents[downstream].iter_mut().find(|p| **p == -1) {
                        Some(slot) => *slot = i as i64,
                        None => {
                            return Err(Error::Dimension(format!(
                                "segment at index {downstream} has more than two tributaries joining at its headwater"
                            )))
                        }
                    }
                }
            }
        }

        let ids: Vec<usize> = (1..=n).collect();
        let npixels = compute_npixels(flow, mask, &pixels)?;

        Ok(Segments {
            ids,
            pixels,
            lines,
            child,
            parents,
            npixels,
            flow: flow.clone(),
            mask: mask.clone(),
        })
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn child(&self) -> &[i64] {
        &self.child
    }

    pub fn parents(&self) -> &[[i64; 2]] {
        &self.parents
    }

    pub fn npixels(&self) -> &[usize] {
        &self.npixels
    }

    pub fn flow(&self) -> &Raster {
        &self.flow
    }

    pub fn lines(&self) -> &[Polyline] {
        &self.lines
    }

    fn index_of(&self, id: usize) -> Result<usize> {
        self.ids
            .iter()
            .position(|&x| x == id)
            .ok_or_else(|| Error::Dimension(format!("no segment with id {id}")))
    }

    fn select(&self, ids: Option<&[usize]>) -> Vec<usize> {
        match ids {
            Some(list) => list.iter().filter_map(|&id| self.index_of(id).ok()).collect(),
            None => (0..self.ids.len()).collect(),
        }
    }

    fn outlet(&self, index: usize) -> (isize, isize) {
        *self.pixels[index].last().expect("a reach always has at least one pixel")
    }

    fn check_matches(&self, raster: &Raster, name: &str) -> Result<()> {
        self.flow.metadata.require_matches(&raster.metadata, name)
    }

    /// A representative latitude for area-unit conversion, used only when
    /// the flow raster's CRS is angular (degrees); otherwise `None`, and
    /// [`Transform::pixel_area`] treats the transform's units as already
    /// linear.
    fn representative_lat(&self) -> Option<f64> {
        let crs = self.flow.crs()?;
        if !crs.is_angular() {
            return None;
        }
        self.flow.bounds().map(|b| b.center().1)
    }

    // ---- topological queries ----

    pub fn isterminal(&self, ids: Option<&[usize]>) -> Vec<bool> {
        self.select(ids).into_iter().map(|i| self.child[i] == -1).collect()
    }

    /// Walks downstream from each terminal's own outlet, beyond the mask
    /// along the raw flow raster, to see whether it eventually reaches
    /// another terminal's outlet pixel — the two terminals then drain a
    /// shared downstream network, so the upstream one is "nested" in the
    /// downstream one's basin.
    pub fn isnested(&self, ids: Option<&[usize]>) -> Result<Vec<bool>> {
        let terminals: Vec<usize> = (0..self.ids.len()).filter(|&i| self.child[i] == -1).collect();
        let outlet_set: HashSet<(isize, isize)> = terminals.iter().map(|&i| self.outlet(i)).collect();
        let flow_nodata = self.flow.nodata().unwrap_or(0.0);
        let (nrows, ncols) = self.flow.shape();
        let in_bounds = |r: isize, c: isize| r >= 0 && c >= 0 && r < nrows as isize && c < ncols as isize;

        let mut nested = vec![false; self.ids.len()];
        for &i in &terminals {
            let (mut r, mut c) = self.outlet(i);
            let own_outlet = (r, c);
            let limit = nrows * ncols;
            for _ in 0..limit {
                let dir = self.flow.get(r, c) as i8;
                if dir == 0 {
                    break;
                }
                let idx = watershed::dir_index(dir);
                let (rn, cn) = (r + watershed::DY[idx], c + watershed::DX[idx]);
                if !in_bounds(rn, cn) || self.flow.get(rn, cn) == flow_nodata {
                    break;
                }
                if (rn, cn) != own_outlet && outlet_set.contains(&(rn, cn)) {
                    nested[i] = true;
                    break;
                }
                r = rn;
                c = cn;
            }
        }

        Ok(self.select(ids).into_iter().map(|i| nested[i]).collect())
    }

    pub fn orphans(&self) -> Vec<usize> {
        (0..self.ids.len())
            .filter(|&i| self.child[i] == -1 && self.parents[i] == [-1, -1])
            .map(|i| self.ids[i])
            .collect()
    }

    /// Expands `ids` by cascading upstream through every segment whose
    /// `child` leads directly into an already-removed segment, so that
    /// removing the expanded set never leaves a dangling tributary feeding
    /// into nothing.
    pub fn continuous(&self, ids: &[usize]) -> Result<Vec<usize>> {
        let mut remove: HashSet<usize> = ids.iter().map(|&id| self.index_of(id)).collect::<Result<_>>()?;
        loop {
            let additions: Vec<usize> = (0..self.ids.len())
                .filter(|i| !remove.contains(i))
                .filter(|&i| self.child[i] != -1 && remove.contains(&(self.child[i] as usize)))
                .collect();
            if additions.is_empty() {
                break;
            }
            remove.extend(additions);
        }
        Ok(remove.into_iter().map(|i| self.ids[i]).collect())
    }

    // ---- pixel/length/area/reach statistics ----

    /// Reach-own pixel count (`terminal=false`) or total upstream catchment
    /// pixel count (`terminal=true`), one value per segment in index order.
    pub fn pixels(&self, terminal: bool) -> Vec<usize> {
        if terminal {
            self.npixels.clone()
        } else {
            self.pixels.iter().map(|chain| chain.len()).collect()
        }
    }

    pub fn length(&self, units: &str) -> Result<Vec<f64>> {
        self.lines.iter().map(|line| from_metres(line.length(), units)).collect()
    }

    /// Catchment area at each segment's outlet, converted to `units²`.
    pub fn area(&self, units: &str) -> Result<Vec<f64>> {
        let transform = self
            .flow
            .transform()
            .ok_or_else(|| Error::MissingTransform("area requires a transform".to_string()))?;
        let pixel_area = transform.pixel_area(self.representative_lat());
        let factor = from_metres(1.0, units)?;
        Ok(self.npixels.iter().map(|&n| n as f64 * pixel_area * factor * factor).collect())
    }

    pub fn burn_ratio(&self, isburned: &Raster) -> Result<Vec<f64>> {
        self.check_matches(isburned, "isburned")?;
        Ok(self.pixels.iter().map(|chain| reach_mean(chain, isburned, None, true)).collect())
    }

    pub fn slope(&self, slopes: &Raster) -> Result<Vec<f64>> {
        self.check_matches(slopes, "slopes")?;
        Ok(self.pixels.iter().map(|chain| reach_mean(chain, slopes, None, true)).collect())
    }

    pub fn relief(&self, relief_raster: &Raster) -> Result<Vec<f64>> {
        self.check_matches(relief_raster, "relief")?;
        Ok(self.pixels.iter().map(|chain| reach_mean(chain, relief_raster, None, true)).collect())
    }

    pub fn sine_theta(&self, slopes: &Raster) -> Result<Vec<f64>> {
        self.check_matches(slopes, "slopes")?;
        Ok(self
            .pixels
            .iter()
            .map(|chain| {
                let mean_slope = reach_mean(chain, slopes, None, true);
                mean_slope / (1.0 + mean_slope * mean_slope).sqrt()
            })
            .collect())
    }

    pub fn kf_factor(&self, kf: &Raster, omitnan: bool, weighted: bool) -> Result<Vec<f64>> {
        self.check_matches(kf, "kf")?;
        let weights = if weighted {
            Some(watershed::accumulation(&self.flow, None, Some(&self.mask))?)
        } else {
            None
        };
        Ok(self.pixels.iter().map(|chain| reach_mean(chain, kf, weights.as_ref(), omitnan)).collect())
    }

    /// Catchment-total developed area at each segment's outlet, in the
    /// flow raster's native square units (a judgment call: unlike the
    /// reach-local ratio statistics above, developed area is reported as an
    /// absolute upstream quantity, the same shape as [`Segments::area`]).
    pub fn developed_area(&self, isdeveloped: &Raster) -> Result<Vec<f64>> {
        self.check_matches(isdeveloped, "isdeveloped")?;
        let acc = watershed::accumulation(&self.flow, Some(isdeveloped), Some(&self.mask))?;
        let transform = self
            .flow
            .transform()
            .ok_or_else(|| Error::MissingTransform("developed_area requires a transform".to_string()))?;
        let pixel_area = transform.pixel_area(self.representative_lat());
        Ok((0..self.ids.len())
            .map(|i| {
                let (r, c) = self.outlet(i);
                acc.get(r, c) * pixel_area
            })
            .collect())
    }

    /// An approximate opening-angle confinement statistic: at each interior
    /// chain pixel, samples the DEM `neighborhood` pixels to either side of
    /// the local flow direction (perpendicular to it) and averages the
    /// resulting opening angle. This is a deliberately approximate
    /// treatment rather than an exact geometric confinement measure; see
    /// DESIGN.md.
    pub fn confinement(&self, dem: &Raster, neighborhood: usize) -> Result<Vec<f64>> {
        self.check_matches(dem, "dem")?;
        let transform = self
            .flow
            .transform()
            .cloned()
            .ok_or_else(|| Error::MissingTransform("confinement requires a transform".to_string()))?;
        let dem_nodata = dem.nodata().unwrap_or(f64::NAN);
        let (nrows, ncols) = dem.shape();
        let in_bounds = |r: isize, c: isize| r >= 0 && c >= 0 && r < nrows as isize && c < ncols as isize;
        let step = neighborhood.max(1) as f64;
        let run = transform.pixel_diagonal(None) * step;

        Ok(self
            .pixels
            .iter()
            .map(|chain| {
                if chain.len() < 2 {
                    return f64::NAN;
                }
                let mut angles = Vec::new();
                for k in 0..chain.len() {
                    let (r, c) = chain[k];
                    let prev = chain[k.saturating_sub(1)];
                    let next = chain[(k + 1).min(chain.len() - 1)];
                    let along = ((next.0 - prev.0) as f64, (next.1 - prev.1) as f64);
                    let mag = (along.0 * along.0 + along.1 * along.1).sqrt();
                    if mag == 0.0 {
                        continue;
                    }
                    let perp = (-along.1 / mag, along.0 / mag);
                    let left = (
                        r + (perp.0 * step).round() as isize,
                        c + (perp.1 * step).round() as isize,
                    );
                    let right = (
                        r - (perp.0 * step).round() as isize,
                        c - (perp.1 * step).round() as isize,
                    );
                    if !in_bounds(left.0, left.1) || !in_bounds(right.0, right.1) {
                        continue;
                    }
                    let z = dem.get(r, c);
                    let zl = dem.get(left.0, left.1);
                    let zr = dem.get(right.0, right.1);
                    if z == dem_nodata || zl == dem_nodata || zr == dem_nodata {
                        continue;
                    }
                    let angle_left = (zl - z).atan2(run);
                    let angle_right = (zr - z).atan2(run);
                    angles.push(std::f64::consts::PI - angle_left - angle_right);
                }
                if angles.is_empty() {
                    f64::NAN
                } else {
                    angles.iter().sum::<f64>() / angles.len() as f64
                }
            })
            .collect())
    }

    // ---- catchment statistics ----

    fn effective_mask(&self, mask: Option<&Raster>, raster: &Raster, omitnan: bool) -> Result<Raster> {
        let base = mask.unwrap_or(&self.mask);
        if !omitnan {
            return Ok(base.clone());
        }
        let (nrows, ncols) = base.shape();
        let mut values = vec![0.0; nrows * ncols];
        for r in 0..nrows as isize {
            for c in 0..ncols as isize {
                let keep = watershed::raster_truthy(base, r, c) && !raster.get(r, c).is_nan();
                values[r as usize * ncols + c as usize] = if keep { 1.0 } else { 0.0 };
            }
        }
        Raster::from_array(
            values,
            nrows,
            ncols,
            Some(DType::Bool),
            Some(0.0),
            base.crs().cloned(),
            base.transform().cloned(),
            None,
            Casting::Unsafe,
        )
    }

    fn catchment_stat(
        &self,
        raster: &Raster,
        weights: Option<&Raster>,
        omitnan: bool,
        mask: Option<&Raster>,
        terminal: bool,
        mean: bool,
    ) -> Result<Vec<f64>> {
        self.check_matches(raster, "raster")?;
        if let Some(w) = weights {
            self.check_matches(w, "weights")?;
        }
        if let Some(m) = mask {
            self.check_matches(m, "mask")?;
        }

        let effective_mask = self.effective_mask(mask, raster, omitnan)?;
        let numerator = multiply(raster, weights)?;
        let sum_acc = watershed::accumulation(&self.flow, Some(&numerator), Some(&effective_mask))?;

        let sums: Vec<f64> = (0..self.ids.len())
            .map(|i| {
                if terminal && self.child[i] != -1 {
                    return f64::NAN;
                }
                let (r, c) = self.outlet(i);
                sum_acc.get(r, c)
            })
            .collect();

        if !mean {
            return Ok(sums);
        }

        let denom_raster = match weights {
            Some(w) => w.clone(),
            None => ones_like(raster)?,
        };
        let count_acc = watershed::accumulation(&self.flow, Some(&denom_raster), Some(&effective_mask))?;
        Ok((0..self.ids.len())
            .map(|i| {
                if terminal && self.child[i] != -1 {
                    return f64::NAN;
                }
                let (r, c) = self.outlet(i);
                let denom = count_acc.get(r, c);
                if denom == 0.0 {
                    f64::NAN
                } else {
                    sums[i] / denom
                }
            })
            .collect())
    }

    pub fn catchment_sum(
        &self,
        raster: &Raster,
        weights: Option<&Raster>,
        omitnan: bool,
        mask: Option<&Raster>,
        terminal: bool,
    ) -> Result<Vec<f64>> {
        self.catchment_stat(raster, weights, omitnan, mask, terminal, false)
    }

    pub fn catchment_mean(
        &self,
        raster: &Raster,
        weights: Option<&Raster>,
        omitnan: bool,
        mask: Option<&Raster>,
        terminal: bool,
    ) -> Result<Vec<f64>> {
        self.catchment_stat(raster, weights, omitnan, mask, terminal, true)
    }

    // ---- topology edits ----

    fn remove_indices(&mut self, removed: &HashSet<usize>) -> Result<()> {
        let n = self.ids.len();
        let kept: Vec<usize> = (0..n).filter(|i| !removed.contains(i)).collect();
        let mut old_to_new = vec![-1i64; n];
        for (new_i, &old_i) in kept.iter().enumerate() {
            old_to_new[old_i] = new_i as i64;
        }

        let mut new_child = vec![-1i64; kept.len()];
        for (new_i, &old_i) in kept.iter().enumerate() {
            let resolved = resolve_kept_child(&self.child, self.child[old_i], removed);
            new_child[new_i] = if resolved == -1 { -1 } else { old_to_new[resolved as usize] };
        }

        let mut new_parents = vec![[-1i64; 2]; kept.len()];
        for (new_i, &c) in new_child.iter().enumerate() {
            if c == -1 {
                continue;
            }
            if let Some(slot) = new_parents[c as usize].iter_mut().find(|p| **p == -1) {
                *slot = new_i as i64;
            }
        }

        self.ids = kept.iter().map(|&i| self.ids[i]).collect();
        self.pixels = kept.iter().map(|&i| self.pixels[i].clone()).collect();
        self.lines = kept.iter().map(|&i| self.lines[i].clone()).collect();
        self.npixels = kept.iter().map(|&i| self.npixels[i]).collect();
        self.child = new_child;
        self.parents = new_parents;
        Ok(())
    }

    pub fn remove(&mut self, ids: &[usize], continuous: bool) -> Result<()> {
        let ids = if continuous { self.continuous(ids)? } else { ids.to_vec() };
        let removed: HashSet<usize> = ids.iter().filter_map(|&id| self.index_of(id).ok()).collect();
        self.remove_indices(&removed)
    }

    pub fn keep(&mut self, ids: &[usize], continuous: bool) -> Result<()> {
        let keep_set: HashSet<usize> = ids.iter().filter_map(|&id| self.index_of(id).ok()).collect();
        let mut to_remove: Vec<usize> = (0..self.ids.len())
            .filter(|i| !keep_set.contains(i))
            .map(|i| self.ids[i])
            .collect();
        if continuous {
            to_remove = self.continuous(&to_remove)?;
        }
        let removed: HashSet<usize> = to_remove.iter().filter_map(|&id| self.index_of(id).ok()).collect();
        self.remove_indices(&removed)
    }

    /// Splits segment `id`'s own pixel chain at `pixel_index` (an interior
    /// index) into an upstream and downstream piece that share the split
    /// pixel — unlike ordinarily distinct segments, which never share a
    /// pixel at a confluence, the two halves of a split deliberately do, so
    /// neither loses the boundary pixel's statistics. The two new pieces
    /// get fresh sequential ids beyond the current maximum; the upstream
    /// piece inherits the old segment's parents, the downstream piece its
    /// child, and the original segment is then removed.
    pub fn split(&mut self, id: usize, pixel_index: usize) -> Result<(usize, usize)> {
        let i = self.index_of(id)?;
        let chain = self.pixels[i].clone();
        if chain.len() < 2 || pixel_index == 0 || pixel_index + 1 >= chain.len() {
            return Err(Error::Dimension(format!(
                "pixel_index must select an interior pixel of segment {id}'s {}-pixel chain",
                chain.len()
            )));
        }
        let transform = self
            .flow
            .transform()
            .cloned()
            .ok_or_else(|| Error::MissingTransform("split requires a transform".to_string()))?;

        let upstream_pixels = chain[..=pixel_index].to_vec();
        let downstream_pixels = chain[pixel_index..].to_vec();

        let new_id_a = *self.ids.iter().max().unwrap_or(&0) + 1;
        let new_id_b = new_id_a + 1;
        let upstream_idx = self.ids.len();
        let downstream_idx = upstream_idx + 1;

        let upstream_line = simplify_chain(&upstream_pixels, &transform, new_id_a);
        let downstream_line = simplify_chain(&downstream_pixels, &transform, new_id_b);

        let old_parents = self.parents[i];
        let old_child = self.child[i];

        self.ids.push(new_id_a);
        self.ids.push(new_id_b);
        self.lines.push(upstream_line);
        self.lines.push(downstream_line);
        self.pixels.push(upstream_pixels);
        self.pixels.push(downstream_pixels);
        self.npixels.push(0);
        self.npixels.push(0);
        self.child.push(downstream_idx as i64);
        self.child.push(old_child);
        self.parents.push(old_parents);
        self.parents.push([upstream_idx as i64, -1]);

        for &p in old_parents.iter() {
            if p != -1 {
                self.child[p as usize] = upstream_idx as i64;
            }
        }
        if old_child != -1 {
            for slot in self.parents[old_child as usize].iter_mut() {
                if *slot == i as i64 {
                    *slot = downstream_idx as i64;
                }
            }
        }

        let mut removed = HashSet::new();
        removed.insert(i);
        self.remove_indices(&removed)?;
        self.npixels = compute_npixels(&self.flow, &self.mask, &self.pixels)?;

        Ok((new_id_a, new_id_b))
    }

    // ---- basins and rasterization ----

    /// Computes the nested drainage-basin raster: each terminal's catchment
    /// painted with the terminal's id, downstream terminals overwriting
    /// upstream ones where catchments overlap. Work is partitioned across
    /// `mpsc::channel` + `thread::scope` workers by terminal outlet
    /// (round-robin, `max_procs`-clamped thread count), and the reduction
    /// step — sorting every returned `(terminal_index, Raster)` pair by
    /// ascending `npixels` before painting — guarantees the same final
    /// raster regardless of how many workers ran or in what order they
    /// finished.
    pub fn locate_basins(&self, parallel: bool, nprocess: Option<usize>) -> Result<Raster> {
        let (nrows, ncols) = self.flow.shape();
        let terminals: Vec<usize> = (0..self.ids.len()).filter(|&i| self.child[i] == -1).collect();

        let mut values = vec![0.0; nrows * ncols];
        if terminals.is_empty() {
            return Raster::from_array(
                values,
                nrows,
                ncols,
                Some(DType::Int32),
                Some(0.0),
                self.flow.crs().cloned(),
                self.flow.transform().cloned(),
                None,
                Casting::Unsafe,
            );
        }

        let workers = if parallel {
            nprocess.unwrap_or_else(|| Config::default().worker_count()).max(1)
        } else {
            1
        };

        let mut catchments: Vec<(usize, Raster)> = if workers <= 1 {
            let mut out = Vec::with_capacity(terminals.len());
            for &t in &terminals {
                let (r, c) = self.outlet(t);
                out.push((t, watershed::catchment(&self.flow, r, c)?));
            }
            out
        } else {
            let (tx, rx) = mpsc::channel();
            thread::scope(|scope| {
                for w in 0..workers {
                    let tx = tx.clone();
                    let terminals = &terminals;
                    let flow = &self.flow;
                    let segs = &self.pixels;
                    scope.spawn(move || {
                        for (k, &t) in terminals.iter().enumerate() {
                            if k % workers != w {
                                continue;
                            }
                            let (r, c) = *segs[t].last().expect("a reach always has at least one pixel");
                            let result = watershed::catchment(flow, r, c).map(|catchment| (t, catchment));
                            let _ = tx.send(result);
                        }
                    });
                }
                drop(tx);
                let mut out = Vec::with_capacity(terminals.len());
                while let Ok(result) = rx.recv() {
                    out.push(result?);
                }
                Ok(out)
            })?
        };

        catchments.sort_by_key(|(t, _)| self.npixels[*t]);
        for (t, catchment) in &catchments {
            let id = self.ids[*t] as f64;
            for r in 0..nrows as isize {
                for c in 0..ncols as isize {
                    if watershed::raster_truthy(catchment, r, c) {
                        values[r as usize * ncols + c as usize] = id;
                    }
                }
            }
        }

        Raster::from_array(
            values,
            nrows,
            ncols,
            Some(DType::Int32),
            Some(0.0),
            self.flow.crs().cloned(),
            self.flow.transform().cloned(),
            None,
            Casting::Unsafe,
        )
    }

    /// Rasterizes `kind` (`"segments"`, `"outlets"` or `"basins"`) as an
    /// integer-id raster. For `"outlets"`, `outlet_only` restricts painting
    /// to terminal segments.
    pub fn raster(&self, kind: &str, outlet_only: bool) -> Result<Raster> {
        match kind {
            "basins" => self.locate_basins(false, None),
            "segments" => self.paint(|i| self.pixels[i].clone(), false),
            "outlets" => self.paint(|i| vec![self.outlet(i)], outlet_only),
            other => Err(Error::Dimension(format!("unknown segments raster type {other:?}"))),
        }
    }

    fn paint(&self, chain_of: impl Fn(usize) -> Vec<(isize, isize)>, terminal_only: bool) -> Result<Raster> {
        let (nrows, ncols) = self.flow.shape();
        let mut values = vec![0.0; nrows * ncols];
        for i in 0..self.ids.len() {
            if terminal_only && self.child[i] != -1 {
                continue;
            }
            for (r, c) in chain_of(i) {
                values[r as usize * ncols + c as usize] = self.ids[i] as f64;
            }
        }
        Raster::from_array(
            values,
            nrows,
            ncols,
            Some(DType::Int32),
            Some(0.0),
            self.flow.crs().cloned(),
            self.flow.transform().cloned(),
            None,
            Casting::Unsafe,
        )
    }

    // ---- GeoJSON export ----

    fn feature_properties(&self, index: usize, extra: Option<&HashMap<String, Vec<f64>>>) -> JsonMap<String, JsonValue> {
        let mut props = JsonMap::new();
        props.insert("id".to_string(), JsonValue::from(self.ids[index]));
        if let Some(extra) = extra {
            for (name, values) in extra {
                if let Some(&v) = values.get(index) {
                    props.insert(name.clone(), JsonValue::from(v));
                }
            }
        }
        props
    }

    fn geojson_segments(&self, properties: Option<&HashMap<String, Vec<f64>>>) -> FeatureCollection {
        let features = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let coords: Vec<Vec<f64>> = (0..line.len()).map(|k| vec![line.get(k).x, line.get(k).y]).collect();
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(GeoValue::LineString(coords))),
                    id: None,
                    properties: Some(self.feature_properties(i, properties)),
                    foreign_members: None,
                }
            })
            .collect();
        FeatureCollection { bbox: None, features, foreign_members: None }
    }

    fn geojson_outlets(
        &self,
        properties: Option<&HashMap<String, Vec<f64>>>,
        terminal_only: bool,
    ) -> Result<FeatureCollection> {
        let transform = self
            .flow
            .transform()
            .ok_or_else(|| Error::MissingTransform("geojson outlets requires a transform".to_string()))?;
        let mut features = Vec::new();
        for i in 0..self.ids.len() {
            if terminal_only && self.child[i] != -1 {
                continue;
            }
            let (r, c) = self.outlet(i);
            let (x, y) = transform.pixel_to_world(r as f64 + 0.5, c as f64 + 0.5);
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(vec![x, y]))),
                id: None,
                properties: Some(self.feature_properties(i, properties)),
                foreign_members: None,
            });
        }
        Ok(FeatureCollection { bbox: None, features, foreign_members: None })
    }

    /// Polygonizes the basins raster by contiguous same-id row runs: each
    /// basin becomes one or more axis-aligned rectangles rather than a
    /// single merged outline. See DESIGN.md.
    fn geojson_basins(&self, properties: Option<&HashMap<String, Vec<f64>>>) -> Result<FeatureCollection> {
        let basins = self.locate_basins(false, None)?;
        let transform = basins
            .transform()
            .ok_or_else(|| Error::MissingTransform("geojson basins requires a transform".to_string()))?;
        let (nrows, ncols) = basins.shape();
        let mut features = Vec::new();

        for row in 0..nrows as isize {
            let mut col = 0isize;
            while col < ncols as isize {
                let id = basins.get(row, col);
                if id == 0.0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < ncols as isize && basins.get(row, col) == id {
                    col += 1;
                }
                let (x0, y0) = transform.pixel_to_world(row as f64, start as f64);
                let (x1, y1) = transform.pixel_to_world(row as f64 + 1.0, col as f64);
                let ring = vec![vec![x0, y0], vec![x1, y0], vec![x1, y1], vec![x0, y1], vec![x0, y0]];
                let mut props = JsonMap::new();
                props.insert("id".to_string(), JsonValue::from(id as i64));
                if let Some(extra) = properties {
                    if let Some(i) = self.ids.iter().position(|&seg_id| seg_id as f64 == id) {
                        for (name, values) in extra {
                            if let Some(&v) = values.get(i) {
                                props.insert(name.clone(), JsonValue::from(v));
                            }
                        }
                    }
                }
                features.push(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(GeoValue::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(props),
                    foreign_members: None,
                });
            }
        }

        Ok(FeatureCollection { bbox: None, features, foreign_members: None })
    }

    /// Builds a `FeatureCollection` for `kind` (`"segments"`, `"outlets"`
    /// or `"basins"`), attaching `properties` values (one vector per named
    /// field, in segment-index order) as feature properties.
    pub fn geojson(
        &self,
        kind: &str,
        properties: Option<&HashMap<String, Vec<f64>>>,
        terminal_only: bool,
    ) -> Result<FeatureCollection> {
        match kind {
            "segments" => Ok(self.geojson_segments(properties)),
            "outlets" => self.geojson_outlets(properties, terminal_only),
            "basins" => self.geojson_basins(properties),
            other => Err(Error::Dimension(format!("unknown segments geojson type {other:?}"))),
        }
    }

    /// Writes `kind`'s GeoJSON to `path`. Refuses to overwrite an existing
    /// file unless `overwrite`.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        kind: &str,
        properties: Option<&HashMap<String, Vec<f64>>>,
        overwrite: bool,
        terminal_only: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(Error::FeatureFile {
                path: path.display().to_string(),
                detail: "refusing to overwrite an existing file".to_string(),
            });
        }
        let collection = self.geojson(kind, properties, terminal_only)?;
        let json = geojson::GeoJson::from(collection).to_string();
        fs::write(path, json).map_err(Error::Io)
    }
}

fn resolve_kept_child(child: &[i64], mut idx: i64, removed: &HashSet<usize>) -> i64 {
    loop {
        if idx == -1 {
            return -1;
        }
        if !removed.contains(&(idx as usize)) {
            return idx;
        }
        idx = child[idx as usize];
    }
}

/// A piece of a reach after splitting at `max_length`, carrying its own
/// pixel sub-chain and (for every piece but the last) `next_pixel` set to
/// the first pixel of the following piece, so [`Segments::new`] wires
/// max-length splits into the same `child`/`parents` graph as ordinary
/// confluences.
struct ReachPiece {
    pixels: Vec<(isize, isize)>,
    next_pixel: Option<(isize, isize)>,
}

/// Splits a reach's pixel chain wherever its cumulative length since the
/// last split first reaches `max_length`, mirroring
/// [`watershed::network`]'s vertex-based splitting but operating on the
/// full pixel chain so every piece keeps its own `npixels`/statistics.
fn split_reach(reach: &Reach, max_length: f64, transform: &Transform) -> Vec<ReachPiece> {
    if reach.pixels.len() < 2 {
        return vec![ReachPiece { pixels: reach.pixels.clone(), next_pixel: reach.next_pixel }];
    }

    let mut breaks = Vec::new();
    let mut cumulative = 0.0;
    let mut last_split = 0.0;
    for k in 0..reach.pixels.len() - 1 {
        let (x0, y0) = transform.pixel_to_world(reach.pixels[k].0 as f64 + 0.5, reach.pixels[k].1 as f64 + 0.5);
        let (x1, y1) = transform.pixel_to_world(reach.pixels[k + 1].0 as f64 + 0.5, reach.pixels[k + 1].1 as f64 + 0.5);
        cumulative += ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        if cumulative - last_split >= max_length {
            breaks.push(k + 1);
            last_split = cumulative;
        }
    }

    if breaks.is_empty() {
        return vec![ReachPiece { pixels: reach.pixels.clone(), next_pixel: reach.next_pixel }];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for &b in &breaks {
        pieces.push(ReachPiece {
            pixels: reach.pixels[start..=b.min(reach.pixels.len() - 1)].to_vec(),
            next_pixel: Some(reach.pixels[b.min(reach.pixels.len() - 1)]),
        });
        start = b;
    }
    pieces.push(ReachPiece { pixels: reach.pixels[start..].to_vec(), next_pixel: reach.next_pixel });
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 4x3 mask with two headwater tributaries (column 0 and column 2)
    /// joining at a single-pixel confluence/terminal segment at (3,1).
    /// Hand-traced: tributary A (0,0)->(1,0)->(2,0), dir S,S,SE, outlet
    /// points to (3,1); tributary B (0,2)->(1,2)->(2,2), dir S,S,SW, outlet
    /// also points to (3,1); (3,1) itself is unmasked-neighbour-free and
    /// terminal (dir 0).
    fn fixture() -> (Raster, Raster) {
        #[rustfmt::skip]
        let flow_values = vec![
            7.0, 0.0, 7.0,
            7.0, 0.0, 7.0,
            8.0, 0.0, 6.0,
            0.0, 0.0, 0.0,
        ];
        let transform = Transform::new(1.0, -1.0, 0.0, 4.0, None).unwrap();
        let flow = Raster::from_array(
            flow_values, 4, 3, Some(DType::Int8), Some(0.0), None, Some(transform.clone()), None, Casting::Unsafe,
        )
        .unwrap();
        #[rustfmt::skip]
        let mask_values = vec![
            1.0, 0.0, 1.0,
            1.0, 0.0, 1.0,
            1.0, 0.0, 1.0,
            0.0, 1.0, 0.0,
        ];
        let mask = Raster::from_array(
            mask_values, 4, 3, Some(DType::Bool), Some(0.0), None, Some(transform), None, Casting::Unsafe,
        )
        .unwrap();
        (flow, mask)
    }

    #[test]
    fn new_builds_child_and_parents_from_a_confluence() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments.ids(), &[1, 2, 3]);
        assert_eq!(segments.child(), &[1, -1, 1]);
        assert_eq!(segments.parents(), &[[-1, -1], [0, 2], [-1, -1]]);
        assert_eq!(segments.npixels(), &[3, 7, 3]);
    }

    #[test]
    fn isterminal_identifies_the_downstream_confluence_segment() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();
        assert_eq!(segments.isterminal(None), vec![false, true, false]);
    }

    #[test]
    fn pixels_reports_reach_and_catchment_counts() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();
        assert_eq!(segments.pixels(false), vec![3, 1, 3]);
        assert_eq!(segments.pixels(true), vec![3, 7, 3]);
    }

    #[test]
    fn remove_rewires_ancestors_to_terminal_when_their_child_is_removed() {
        let (flow, mask) = fixture();
        let mut segments = Segments::new(&flow, &mask, None).unwrap();
        segments.remove(&[2], false).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments.ids(), &[1, 3]);
        assert_eq!(segments.child(), &[-1, -1]);
    }

    #[test]
    fn keep_drops_every_segment_not_named() {
        let (flow, mask) = fixture();
        let mut segments = Segments::new(&flow, &mask, None).unwrap();
        segments.keep(&[1], false).unwrap();
        assert_eq!(segments.ids(), &[1]);
        assert_eq!(segments.child(), &[-1]);
    }

    #[test]
    fn locate_basins_paints_the_shared_terminal_catchment() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();
        let basins = segments.locate_basins(false, None).unwrap();
        for &(r, c) in &[(0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2), (3, 1)] {
            assert_eq!(basins.get(r, c), 2.0);
        }
        assert_eq!(basins.get(0, 1), 0.0);
    }

    #[test]
    fn split_produces_two_segments_sharing_the_split_pixel() {
        let (flow, mask) = fixture();
        let mut segments = Segments::new(&flow, &mask, None).unwrap();
        let a_index = segments.index_of(1).unwrap();
        assert_eq!(segments.pixels[a_index].len(), 3);

        let (upstream_id, downstream_id) = segments.split(1, 1).unwrap();
        assert_eq!(upstream_id, 4);
        assert_eq!(downstream_id, 5);
        assert_eq!(segments.ids(), &[2, 3, 4, 5]);

        let up = segments.index_of(upstream_id).unwrap();
        let down = segments.index_of(downstream_id).unwrap();
        assert_eq!(segments.pixels[up], vec![(0, 2), (1, 2)]);
        assert_eq!(segments.pixels[down], vec![(1, 2), (2, 2)]);
        assert_eq!(segments.child()[up], down as i64);
    }

    #[test]
    fn geojson_segments_carries_one_feature_per_reach() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();
        let collection = segments.geojson("segments", None, false).unwrap();
        assert_eq!(collection.features.len(), 3);
    }

    #[test]
    fn area_scales_with_unit_conversion() {
        let (flow, mask) = fixture();
        let segments = Segments::new(&flow, &mask, None).unwrap();
        let metres = segments.area("m").unwrap();
        let km = segments.area("km").unwrap();
        for i in 0..metres.len() {
            assert!((km[i] - metres[i] * 1e-6).abs() < 1e-9);
        }
    }

    #[test]
    fn from_metres_rejects_an_unknown_unit() {
        assert!(from_metres(1.0, "furlongs").is_err());
    }

    #[test]
    fn new_reproduces_the_nested_confluence_network() {
        // A 7x7 DEM draining into a single outlet at the bottom, with a
        // three-way confluence network: two short tributaries (one a
        // single headwater pixel) and one five-pixel headwater reach all
        // feed a shared two-pixel outlet reach. `flow` is the full D8
        // field over the whole raster; `mask` restricts the network to
        // the channel pixels.
        #[rustfmt::skip]
        let flow_values = vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 7.0, 5.0, 1.0, 7.0, 3.0, 0.0,
            0.0, 7.0, 5.0, 1.0, 7.0, 3.0, 0.0,
            0.0, 1.0, 7.0, 7.0, 6.0, 5.0, 0.0,
            0.0, 5.0, 1.0, 7.0, 5.0, 1.0, 0.0,
            0.0, 5.0, 5.0, 7.0, 5.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let transform = Transform::new(1.0, -1.0, 0.0, 7.0, None).unwrap();
        let flow = Raster::from_array(
            flow_values, 7, 7, Some(DType::Int8), Some(0.0), None, Some(transform.clone()), None, Casting::Unsafe,
        )
        .unwrap();
        #[rustfmt::skip]
        let mask_values = vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0,
            0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let mask = Raster::from_array(
            mask_values, 7, 7, Some(DType::Bool), Some(0.0), None, Some(transform), None, Casting::Unsafe,
        )
        .unwrap();

        let segments = Segments::new(&flow, &mask, None).unwrap();
        assert_eq!(segments.len(), 6);
        assert_eq!(segments.npixels(), &[1, 4, 11, 2, 2, 5]);
        assert_eq!(segments.child(), &[1, 2, -1, -1, 1, 2]);
        assert_eq!(
            segments.parents(),
            &[[-1, -1], [0, 4], [1, 5], [-1, -1], [-1, -1], [-1, -1]]
        );
    }
}
