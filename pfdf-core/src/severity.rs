//! BARC4 burn-severity classification and severity-level masking.
//!
//! A half-open-interval reclassification: walk the thresholds once per
//! pixel and assign the first bucket the value falls into.

use std::collections::HashMap;

use pfdf_common::errors::Result;
use pfdf_raster::{Casting, DType, Raster};

/// Default dNBR break points separating unburned/low/moderate/high.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [125.0, 250.0, 500.0];

/// Classifies a dNBR raster into `{1: unburned, 2: low, 3: moderate,
/// 4: high}` by half-open intervals `(-inf, t1], (t1, t2], (t2, t3],
/// (t3, inf)`. NoData pixels stay NoData (`0`) in the output.
pub fn estimate(dnbr: &Raster, thresholds: Option<[f64; 3]>) -> Result<Raster> {
    let [t1, t2, t3] = thresholds.unwrap_or(DEFAULT_THRESHOLDS);
    let (nrows, ncols) = dnbr.shape();
    let nodata = dnbr.nodata().unwrap_or(f64::NAN);

    let mut values = vec![0f64; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let v = dnbr.get(r, c);
            if v == nodata || (nodata.is_nan() && v.is_nan()) {
                continue;
            }
            let class = if v <= t1 {
                1
            } else if v <= t2 {
                2
            } else if v <= t3 {
                3
            } else {
                4
            };
            values[r as usize * ncols + c as usize] = class as f64;
        }
    }

    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Int32),
        Some(0.0),
        dnbr.crs().cloned(),
        dnbr.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

/// The canonical name -> class-code map produced by [`estimate`].
pub fn classification() -> HashMap<&'static str, i32> {
    HashMap::from([("unburned", 1), ("low", 2), ("moderate", 3), ("high", 4)])
}

/// Boolean raster, true where `severity` is one of the named `levels`
/// (e.g. `["moderate", "high"]`). Unrecognized severity values (including
/// any NoData sentinel) never match.
pub fn mask(severity: &Raster, levels: &[&str]) -> Result<Raster> {
    let classes = classification();
    let mut codes = Vec::with_capacity(levels.len());
    for level in levels {
        if let Some(code) = classes.get(level) {
            codes.push(*code as f64);
        }
    }

    let (nrows, ncols) = severity.shape();
    let mut values = vec![0f64; nrows * ncols];
    for r in 0..nrows as isize {
        for c in 0..ncols as isize {
            let v = severity.get(r, c);
            if codes.contains(&v) {
                values[r as usize * ncols + c as usize] = 1.0;
            }
        }
    }

    Raster::from_array(
        values,
        nrows,
        ncols,
        Some(DType::Bool),
        Some(0.0),
        severity.crs().cloned(),
        severity.transform().cloned(),
        None,
        Casting::Unsafe,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(values: Vec<f64>, nrows: usize, ncols: usize) -> Raster {
        Raster::from_array(values, nrows, ncols, Some(DType::Float64), None, None, None, None, Casting::Safe)
            .unwrap()
    }

    #[test]
    fn estimate_matches_the_worked_example() {
        #[rustfmt::skip]
        let dnbr = raster(
            vec![
                -1.0, 100.0, 300.0, 250.0,
                -22.0, 1000.0, -1.0, 200.0,
                600.0, 700.0, -1.0, 800.0,
            ],
            3, 4,
        );
        let result = estimate(&dnbr, None).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            1.0, 1.0, 3.0, 2.0,
            1.0, 4.0, 1.0, 2.0,
            4.0, 4.0, 1.0, 4.0,
        ];
        for r in 0..3isize {
            for c in 0..4isize {
                assert_eq!(result.get(r, c), expected[r as usize * 4 + c as usize]);
            }
        }
    }

    #[test]
    fn mask_matches_the_worked_example() {
        #[rustfmt::skip]
        let severity = raster(
            vec![
                -1.0, -1.0, 2.0, 4.0,
                3.0, 2.0, 4.0, 2.0,
                3.0, -1.0, -1.0, 1.0,
            ],
            3, 4,
        );
        let result = mask(&severity, &["moderate", "high"]).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            0.0, 0.0, 0.0, 1.0,
            1.0, 0.0, 1.0, 0.0,
            1.0, 0.0, 0.0, 0.0,
        ];
        for r in 0..3isize {
            for c in 0..4isize {
                assert_eq!(result.get(r, c), expected[r as usize * 4 + c as usize]);
            }
        }
    }

    #[test]
    fn classification_names_the_four_classes() {
        let classes = classification();
        assert_eq!(classes["unburned"], 1);
        assert_eq!(classes["high"], 4);
    }
}
