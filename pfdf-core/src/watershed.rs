//! D8 watershed kernels operating on `Raster`s: flow direction, slope,
//! relief, weighted flow accumulation, catchment delineation, and
//! stream-network extraction.
//!
//! Flow direction uses a linear `1..=8` encoding rather than a power-of-two
//! bitmask, with `0` reserved for "no flow". Accumulation uses a
//! push-zero-inflow/decrement-downstream topological sort; stream-to-vector
//! extraction walks each flowpath and splits it at confluences.

use pfdf_common::errors::{Error, Result};
use pfdf_common::structures::{Point2D, Polyline};
use pfdf_raster::{Casting, DType, Raster};

/// Neighbour offsets in tie-break priority order: cardinals clockwise from
/// north, then diagonals clockwise from north-east. Index `i` below is the
/// neighbour whose direction value is [`dir_value`]`(i)`. This ordering
/// (rather than a purely geometric one) is what a tie between two equally
/// steep neighbours, or between two equally "flat" ones, resolves by.
pub(crate) const DX: [isize; 8] = [0, 1, 0, -1, 1, 1, -1, -1];
pub(crate) const DY: [isize; 8] = [-1, 0, 1, 0, -1, 1, 1, -1];

/// `1=E, 2=NE, 3=N, 4=NW, 5=W, 6=SW, 7=S, 8=SE`, TauDEM's linear D8 coding
/// (the convention pysheds' `flowdir` also emits), keyed by the
/// neighbour-offset index above.
const DIR_VALUES: [i8; 8] = [3, 1, 7, 5, 2, 8, 6, 4];

pub(crate) fn dir_value(index: usize) -> i8 {
    DIR_VALUES[index]
}

pub(crate) fn dir_index(value: i8) -> usize {
    DIR_VALUES.iter().position(|&v| v == value).expect("valid D8 direction value")
}

/// The neighbour-offset index pointing back the other way; used to test
/// whether a neighbour's flow direction points into the current cell.
pub(crate) fn opposite_index(index: usize) -> usize {
    (index + 4) % 8
}

/// Per-direction along-flow cell length, keyed by the same neighbour-offset
/// index as [`DX`]/[`DY`]: `dy` for N/S, `dx` for E/W, the diagonal for the
/// rest.
fn cell_lengths(dx: f64, dy: f64) -> [f64; 8] {
    let diag = (dx * dx + dy * dy).sqrt();
    [dy, dx, dy, dx, diag, diag, diag, diag]
}

/// D8 flow direction by steepest descent, with flat areas resolved by
/// routing towards the nearest real or off-grid outlet.
///
/// Border pixels (the outermost ring of the raster) always get `0`: a
/// pixel on the edge can't know what lies beyond it, so it's treated as an
/// uncertain boundary rather than assigned a direction, mirroring how
/// `D8Pointer`'s own doc comment describes edge pits as an artifact of an
/// unbounded DEM rather than real terrain.
///
/// Every other pixel first tries steepest descent against its 8 neighbours
/// (NoData neighbours are skipped). A pixel with no strictly-lower neighbour
/// but at least one neighbour at the same elevation is "flat"; flats are
/// resolved in a second pass that floods outward from every flat pixel
/// already known to drain (because it touches the border, or because it had
/// a real downhill neighbour) and routes each remaining flat pixel toward
/// whichever same-elevation neighbour is closest to one of those drains.
/// Ties at either stage (equal slope, or equal distance to a drain) are
/// broken using the fixed neighbour order in [`DX`]/[`DY`]. A pixel with no
/// lower *or* equal neighbour (or a flat with no reachable drain) is an
/// interior pit: direction stays `0` and the second return value is set,
/// mirroring `D8Pointer`/`D8FlowAccumulation`'s `interior_pit_found`
/// diagnostic; depression-filling is a documented precondition, same as for
/// the teacher's own D8 tools.
pub fn flow(dem: &Raster) -> Result<(Raster, bool)> {
    let transform = dem
        .transform()
        .cloned()
        .ok_or_else(|| Error::MissingTransform("flow requires a transform".to_string()))?;
    let nodata = dem
        .nodata()
        .ok_or_else(|| Error::MissingNoData("flow requires a NoData value".to_string()))?;
    let (nrows, ncols) = dem.shape();
    let lengths = cell_lengths(transform.dx.abs(), transform.dy.abs());

    let on_border = |r: isize, c: isize| r == 0 || c == 0 || r == nrows as isize - 1 || c == ncols as isize - 1;

    let mut values = vec![0f64; nrows * ncols];
    let mut drains = vec![false; nrows * ncols];
    let mut flat = vec![false; nrows * ncols];
    let mut interior_pit = false;

    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let z = dem.get(r, c);
            if z == nodata {
                continue;
            }
            let idx = r as usize * ncols + c as usize;
            if on_border(r, c) {
                drains[idx] = true;
                continue;
            }

            let mut best: Option<usize> = None;
            let mut max_slope = f64::NEG_INFINITY;
            let mut has_equal = false;
            for i in 0..8 {
                let zn = dem.get(r + DY[i], c + DX[i]);
                if zn == nodata || zn >= z {
                    if zn != nodata && zn == z {
                        has_equal = true;
                    }
                    continue;
                }
                let slope = (z - zn) / lengths[i];
                if slope > max_slope {
                    max_slope = slope;
                    best = Some(i);
                }
            }
            match best {
                Some(i) => {
                    values[idx] = dir_value(i) as f64;
                    drains[idx] = true;
                }
                None if has_equal => flat[idx] = true,
                None => interior_pit = true,
            }
        }
    }

    // Flood "distance to a drain" outward across same-elevation neighbours,
    // seeded from every pixel that already drains (border or real descent).
    let mut towards = vec![u32::MAX; nrows * ncols];
    let mut queue: std::collections::VecDeque<(isize, isize)> = std::collections::VecDeque::new();
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let idx = r as usize * ncols + c as usize;
            if drains[idx] {
                towards[idx] = 0;
                queue.push_back((r, c));
            }
        }
    }
    while let Some((r, c)) = queue.pop_front() {
        let z = dem.get(r, c);
        let d = towards[r as usize * ncols + c as usize];
        for i in 0..8 {
            let (rn, cn) = (r + DY[i], c + DX[i]);
            if rn < 0 || cn < 0 || rn >= nrows as isize || cn >= ncols as isize {
                continue;
            }
            let idx_n = rn as usize * ncols + cn as usize;
            if !flat[idx_n] || towards[idx_n] != u32::MAX {
                continue;
            }
            if dem.get(rn, cn) != z {
                continue;
            }
            towards[idx_n] = d + 1;
            queue.push_back((rn, cn));
        }
    }

    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let idx = r as usize * ncols + c as usize;
            if !flat[idx] {
                continue;
            }
            let z = dem.get(r, c);
            let mut best: Option<usize> = None;
            let mut best_towards = u32::MAX;
            for i in 0..8 {
                let zn = dem.get(r + DY[i], c + DX[i]);
                if zn != z {
                    continue;
                }
                let idx_n = (r + DY[i]) as usize * ncols + (c + DX[i]) as usize;
                if towards[idx_n] < best_towards {
                    best_towards = towards[idx_n];
                    best = Some(i);
                }
            }
            match best {
                Some(i) => values[idx] = dir_value(i) as f64,
                None => interior_pit = true,
            }
        }
    }

    let raster = Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Int8),
        Some(0.0),
        dem.crs().cloned(),
        Some(transform),
        None,
        Casting::Unsafe,
    )?;
    Ok((raster, interior_pit))
}

/// Rise-over-run slope along each pixel's D8 flow direction. Edge pixels,
/// NoData pixels, and pixels with no flow direction (`0`) are NaN.
pub fn slopes(dem: &Raster, flow: &Raster) -> Result<Raster> {
    dem.metadata.require_matches(&flow.metadata, "flow")?;
    let transform = dem
        .transform()
        .cloned()
        .ok_or_else(|| Error::MissingTransform("slopes requires a transform".to_string()))?;
    let dem_nodata = dem
        .nodata()
        .ok_or_else(|| Error::MissingNoData("slopes requires a NoData value on the DEM".to_string()))?;
    let lengths = cell_lengths(transform.dx.abs(), transform.dy.abs());
    let (nrows, ncols) = dem.shape();

    let mut values = vec![f64::NAN; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let dir = flow.get(r, c) as i8;
            if dir == 0 {
                continue;
            }
            let z = dem.get(r, c);
            if z == dem_nodata {
                continue;
            }
            let i = dir_index(dir);
            let zn = dem.get(r + DY[i], c + DX[i]);
            if zn == dem_nodata {
                continue;
            }
            values[r as usize * ncols + c as usize] = (z - zn) / lengths[i];
        }
    }

    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Float64),
        Some(f64::NAN),
        dem.crs().cloned(),
        Some(transform),
        None,
        Casting::Unsafe,
    )
}

/// Visits every pixel `valid` accepts in upstream-to-downstream topological
/// order: seed the stack with zero-inflow (headwater) cells, pop, and push
/// a cell's downstream neighbour once every one of *its* upstream
/// neighbours has been popped. Shared by [`accumulation`] and [`relief`];
/// grounded in `D8FlowAccumulation::run`'s identical stack-based sort.
fn topological_order(flow: &Raster, valid: &dyn Fn(isize, isize) -> bool) -> Vec<(isize, isize)> {
    let (nrows, ncols) = flow.shape();
    let mut inflowing = vec![0i32; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if !valid(r, c) {
                continue;
            }
            for i in 0..8 {
                let (rn, cn) = (r + DY[i], c + DX[i]);
                if !valid(rn, cn) {
                    continue;
                }
                let dir = flow.get(rn, cn) as i8;
                if dir != 0 && dir_index(dir) == opposite_index(i) {
                    inflowing[r as usize * ncols + c as usize] += 1;
                }
            }
        }
    }

    let mut stack = Vec::new();
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if valid(r, c) && inflowing[r as usize * ncols + c as usize] == 0 {
                stack.push((r, c));
            }
        }
    }

    let mut order = Vec::with_capacity(nrows * ncols);
    while let Some((r, c)) = stack.pop() {
        order.push((r, c));
        let dir = flow.get(r, c) as i8;
        if dir == 0 {
            continue;
        }
        let i = dir_index(dir);
        let (rn, cn) = (r + DY[i], c + DX[i]);
        if valid(rn, cn) {
            let idx = rn as usize * ncols + cn as usize;
            inflowing[idx] -= 1;
            if inflowing[idx] == 0 {
                stack.push((rn, cn));
            }
        }
    }
    order
}

pub(crate) fn raster_truthy(raster: &Raster, row: isize, col: isize) -> bool {
    let v = raster.get(row, col);
    let nodata = raster.nodata().unwrap_or(f64::NAN);
    let is_nodata = v == nodata || (nodata.is_nan() && v.is_nan());
    !is_nodata && v != 0.0
}

/// Total (optionally weighted) upslope contribution at each pixel: every
/// pixel starts with its own weight (`1` with no `weights` raster) and adds
/// it to its downstream neighbour, following flow direction until it runs
/// off the grid or hits NoData. `mask` restricts which pixels participate
/// at all (both as sources and as accumulators); pixels outside the mask
/// are NaN.
pub fn accumulation(flow: &Raster, weights: Option<&Raster>, mask: Option<&Raster>) -> Result<Raster> {
    if let Some(w) = weights {
        flow.metadata.require_matches(&w.metadata, "weights")?;
    }
    if let Some(m) = mask {
        flow.metadata.require_matches(&m.metadata, "mask")?;
    }
    let (nrows, ncols) = flow.shape();
    let flow_nodata = flow.nodata().unwrap_or(0.0);

    let valid = |r: isize, c: isize| -> bool {
        if r < 0 || c < 0 || r >= nrows as isize || c >= ncols as isize {
            return false;
        }
        if flow.get(r, c) == flow_nodata {
            return false;
        }
        match mask {
            Some(m) => raster_truthy(m, r, c),
            None => true,
        }
    };

    let order = topological_order(flow, &valid);

    let mut values = vec![f64::NAN; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if valid(r, c) {
                values[r as usize * ncols + c as usize] = 0.0;
            }
        }
    }

    for &(r, c) in &order {
        let idx = r as usize * ncols + c as usize;
        let own_weight = match weights {
            Some(w) => {
                let wv = w.get(r, c);
                let wnodata = w.nodata().unwrap_or(f64::NAN);
                if wv == wnodata || (wnodata.is_nan() && wv.is_nan()) {
                    0.0
                } else {
                    wv
                }
            }
            None => 1.0,
        };
        values[idx] += own_weight;

        let dir = flow.get(r, c) as i8;
        if dir == 0 {
            continue;
        }
        let i = dir_index(dir);
        let (rn, cn) = (r + DY[i], c + DX[i]);
        if valid(rn, cn) {
            values[rn as usize * ncols + cn as usize] += values[idx];
        }
    }

    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Float64),
        Some(f64::NAN),
        flow.crs().cloned(),
        flow.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

/// Vertical distance from each pixel up to the ridge reached by walking
/// against flow. At a confluence with several inflowing neighbours, the
/// path follows whichever neighbour sits at the greatest elevation (see
/// DESIGN.md). A headwater with no inflowing neighbour is its own ridge, so
/// its relief is `0`.
pub fn relief(dem: &Raster, flow: &Raster) -> Result<Raster> {
    dem.metadata.require_matches(&flow.metadata, "flow")?;
    let dem_nodata = dem
        .nodata()
        .ok_or_else(|| Error::MissingNoData("relief requires a NoData value on the DEM".to_string()))?;
    let (nrows, ncols) = dem.shape();
    let flow_nodata = flow.nodata().unwrap_or(0.0);

    let valid = |r: isize, c: isize| -> bool {
        if r < 0 || c < 0 || r >= nrows as isize || c >= ncols as isize {
            return false;
        }
        dem.get(r, c) != dem_nodata && flow.get(r, c) != flow_nodata
    };

    let order = topological_order(flow, &valid);

    let mut ridge = vec![f64::NAN; nrows * ncols];
    for &(r, c) in &order {
        let idx = r as usize * ncols + c as usize;
        if ridge[idx].is_nan() {
            ridge[idx] = dem.get(r, c);
        }
        let dir = flow.get(r, c) as i8;
        if dir == 0 {
            continue;
        }
        let i = dir_index(dir);
        let (rn, cn) = (r + DY[i], c + DX[i]);
        if valid(rn, cn) {
            let idx_n = rn as usize * ncols + cn as usize;
            if ridge[idx_n].is_nan() || ridge[idx] > ridge[idx_n] {
                ridge[idx_n] = ridge[idx];
            }
        }
    }

    let mut values = vec![f64::NAN; nrows * ncols];
    for &(r, c) in &order {
        let idx = r as usize * ncols + c as usize;
        values[idx] = ridge[idx] - dem.get(r, c);
    }

    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Float64),
        Some(f64::NAN),
        dem.crs().cloned(),
        dem.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

/// Boolean mask of every pixel that drains through `(row, col)`, including
/// the pixel itself: the full set of ancestors in the flow graph, found by
/// walking the inflow edges backward from the outlet.
pub fn catchment(flow: &Raster, row: isize, col: isize) -> Result<Raster> {
    let (nrows, ncols) = flow.shape();
    if row < 0 || col < 0 || row >= nrows as isize || col >= ncols as isize {
        return Err(Error::Dimension(format!(
            "(row={row}, col={col}) is outside the flow raster's {nrows}x{ncols} shape"
        )));
    }
    let flow_nodata = flow.nodata().unwrap_or(0.0);
    let in_bounds = |r: isize, c: isize| r >= 0 && c >= 0 && r < nrows as isize && c < ncols as isize;

    let mut mask = vec![false; nrows * ncols];
    let mut stack = vec![(row, col)];
    while let Some((r, c)) = stack.pop() {
        let idx = r as usize * ncols + c as usize;
        if mask[idx] {
            continue;
        }
        mask[idx] = true;
        for i in 0..8 {
            let (rn, cn) = (r + DY[i], c + DX[i]);
            if !in_bounds(rn, cn) || flow.get(rn, cn) == flow_nodata {
                continue;
            }
            let dir = flow.get(rn, cn) as i8;
            if dir_index(dir) == opposite_index(i) {
                stack.push((rn, cn));
            }
        }
    }

    let values: Vec<f64> = mask.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Bool),
        Some(0.0),
        flow.crs().cloned(),
        flow.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

/// Splits `line` wherever its cumulative length since the last split first
/// reaches `max_length`, inserting the split at a vertex boundary rather
/// than mid-edge (every kept vertex already sits on a pixel centre, so this
/// keeps split pieces pixel-aligned). Returns `[line]` unchanged if
/// `max_length` is non-positive or the line is too short to split.
fn split_at_max_length(mut line: Polyline, max_length: f64) -> Vec<Polyline> {
    if max_length <= 0.0 || line.len() < 2 {
        return vec![line];
    }
    let mut cumulative = 0.0;
    let mut last_split = 0.0;
    for i in 0..line.len() - 1 {
        cumulative += line.get(i).distance(&line.get(i + 1));
        if cumulative - last_split >= max_length {
            line.insert_split_point((i + 1) as f64, line.get(i + 1));
            last_split = cumulative;
        }
    }
    line.split()
}

/// Extracts the stream network implied by `flow` restricted to `mask`, as a
/// set of reaches (a vertex per direction change, not every pixel). Each
/// reach runs from a headwater (a masked pixel with no masked inflowing
/// neighbour) down to either a true outlet (flow leaves the mask or the
/// grid) or a confluence, where it stops and the confluence pixel is queued
/// as the start of the next, downstream reach. If `max_length` is given,
/// reaches longer than it are further split via [`split_at_max_length`].
pub fn network(flow: &Raster, mask: &Raster, max_length: Option<f64>) -> Result<Vec<Polyline>> {
    flow.metadata.require_matches(&mask.metadata, "mask")?;
    let transform = flow
        .transform()
        .cloned()
        .ok_or_else(|| Error::MissingTransform("network requires a transform".to_string()))?;
    let (nrows, ncols) = flow.shape();

    let in_mask = |r: isize, c: isize| -> bool {
        r >= 0 && c >= 0 && r < nrows as isize && c < ncols as isize && raster_truthy(mask, r, c)
    };

    let mut inflowing = vec![0i32; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            if !in_mask(r, c) {
                continue;
            }
            let mut count = 0;
            for i in 0..8 {
                let (rn, cn) = (r + DY[i], c + DX[i]);
                if !in_mask(rn, cn) {
                    continue;
                }
                let dir = flow.get(rn, cn) as i8;
                if dir != 0 && dir_index(dir) == opposite_index(i) {
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
    let mut reaches: Vec<Polyline> = Vec::new();

    while let Some((start_r, start_c)) = stack.pop() {
        let start_idx = start_r as usize * ncols + start_c as usize;
        if processed[start_idx] {
            continue;
        }

        let mut points: Vec<Point2D> = Vec::new();
        let mut prev_dir: i32 = i32::MIN;
        let (mut r, mut c) = (start_r, start_c);
        loop {
            let dir = flow.get(r, c) as i8;
            if points.is_empty() || dir as i32 != prev_dir {
                let (x, y) = transform.pixel_to_world(r as f64 + 0.5, c as f64 + 0.5);
                points.push(Point2D::new(x, y));
                prev_dir = dir as i32;
            }
            processed[r as usize * ncols + c as usize] = true;

            if dir == 0 {
                break;
            }
            let i = dir_index(dir);
            let (rn, cn) = (r + DY[i], c + DX[i]);
            if !in_mask(rn, cn) {
                // The reach still points somewhere; extend the displayed
                // line one last vertex toward it even though that pixel
                // isn't part of any reach (off the mask or off the grid).
                let (x, y) = transform.pixel_to_world(rn as f64 + 0.5, cn as f64 + 0.5);
                points.push(Point2D::new(x, y));
                break;
            }
            let idx_n = rn as usize * ncols + cn as usize;
            if inflowing[idx_n] != 1 {
                let (x, y) = transform.pixel_to_world(rn as f64 + 0.5, cn as f64 + 0.5);
                points.push(Point2D::new(x, y));
                stack.push((rn, cn));
                break;
            }
            r = rn;
            c = cn;
        }

        if points.len() > 1 {
            reaches.push(Polyline::new(&points, reaches.len() + 1));
        }
    }

    let mut final_reaches = Vec::new();
    for reach in reaches {
        match max_length {
            Some(max_len) => final_reaches.extend(split_at_max_length(reach, max_len)),
            None => final_reaches.push(reach),
        }
    }
    for (i, reach) in final_reaches.iter_mut().enumerate() {
        reach.id = i + 1;
    }
    Ok(final_reaches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfdf_raster::Transform;

    fn dem_raster(values: Vec<f64>, nrows: usize, ncols: usize, nodata: f64) -> Raster {
        Raster::from_array(
            values,
            nrows,
            ncols,
            Some(DType::Float64),
            Some(nodata),
            None,
            Some(Transform::new(1.0, -1.0, 0.0, nrows as f64, None).unwrap()),
            None,
            Casting::Safe,
        )
        .unwrap()
    }

    #[test]
    fn flow_points_downhill_in_every_compass_direction_around_a_pit() {
        // A pit surrounded by a ring one step lower than the outer border.
        // Every ring pixel's one strictly-downhill neighbour is the centre
        // pit, so each of the 8 directions is exercised unambiguously, and
        // the border ring is forced to 0 regardless of elevation. The
        // centre has no lower *or* equal neighbour, so it's an interior
        // pit.
        #[rustfmt::skip]
        let dem = dem_raster(
            vec![
                9.0, 9.0, 9.0, 9.0, 9.0,
                9.0, 5.0, 5.0, 5.0, 9.0,
                9.0, 5.0, 1.0, 5.0, 9.0,
                9.0, 5.0, 5.0, 5.0, 9.0,
                9.0, 9.0, 9.0, 9.0, 9.0,
            ],
            5, 5, -999.0,
        );
        let (result, pit) = flow(&dem).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 8.0, 7.0, 6.0, 0.0,
            0.0, 1.0, 0.0, 5.0, 0.0,
            0.0, 2.0, 3.0, 4.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        for r in 0..5isize {
            for c in 0..5isize {
                assert_eq!(
                    result.get(r, c),
                    expected[r as usize * 5 + c as usize],
                    "mismatch at ({r},{c})"
                );
            }
        }
        assert!(pit);
    }

    #[test]
    fn accumulation_matches_the_weighted_example() {
        // Three independent east-flowing chains draining off the right
        // edge; each accumulator sums its own weight plus everything
        // upstream of it in its row.
        #[rustfmt::skip]
        let flow_values = vec![
            1.0, 1.0, 1.0, 0.0,
            1.0, 1.0, 1.0, 0.0,
            1.0, 1.0, 1.0, 0.0,
        ];
        let flow_raster = Raster::from_array(
            flow_values, 3, 4, Some(DType::Int8), Some(0.0), None,
            Some(Transform::new(1.0, -1.0, 0.0, 3.0, None).unwrap()), None, Casting::Unsafe,
        )
        .unwrap();
        #[rustfmt::skip]
        let weight_values = vec![
            1.0, 6.0, 7.0, 2.0,
            2.0, 5.0, 8.0, -999.0,
            3.0, 4.0, 9.0, -999.0,
        ];
        let weights = Raster::from_array(
            weight_values, 3, 4, Some(DType::Float64), Some(-999.0), None,
            Some(Transform::new(1.0, -1.0, 0.0, 3.0, None).unwrap()), None, Casting::Safe,
        )
        .unwrap();

        let result = accumulation(&flow_raster, Some(&weights), None).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            1.0, 7.0, 14.0, f64::NAN,
            2.0, 7.0, 15.0, f64::NAN,
            3.0, 7.0, 16.0, f64::NAN,
        ];
        for r in 0..3isize {
            for c in 0..4isize {
                let (a, e) = (result.get(r, c), expected[r as usize * 4 + c as usize]);
                assert!(a == e || (a.is_nan() && e.is_nan()), "mismatch at ({r},{c}): {a} vs {e}");
            }
        }
    }

    #[test]
    fn catchment_includes_the_outlet_itself() {
        let dem = dem_raster(vec![3.0, 2.0, 1.0, 1.0, 1.0, 0.0, 2.0, 2.0, 2.0], 3, 3, -999.0);
        let (flow_raster, _pit) = flow(&dem).unwrap();
        let area = catchment(&flow_raster, 2, 1).unwrap();
        assert_eq!(area.get(2, 1), 1.0);
    }

    #[test]
    fn network_splits_at_a_confluence() {
        #[rustfmt::skip]
        let flow_values = vec![
            7.0, 0.0, 0.0,
            7.0, 7.0, 0.0,
            0.0, 7.0, 0.0,
        ];
        let flow_raster = Raster::from_array(
            flow_values, 3, 3, Some(DType::Int8), Some(0.0), None,
            Some(Transform::new(1.0, -1.0, 0.0, 3.0, None).unwrap()), None, Casting::Unsafe,
        )
        .unwrap();
        let mask = Raster::from_array(
            vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            3, 3, Some(DType::Bool), Some(0.0), None,
            Some(Transform::new(1.0, -1.0, 0.0, 3.0, None).unwrap()), None, Casting::Unsafe,
        )
        .unwrap();

        let reaches = network(&flow_raster, &mask, None).unwrap();
        assert_eq!(reaches.len(), 2);
    }
}
