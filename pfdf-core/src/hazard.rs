//! The Staley-family hazard-model harness: per-duration parameter lookup
//! plus the `accumulation`/`likelihood` pair of broadcast numerical
//! functions.
//!
//! The broadcasting and squeeze-trailing-dims pattern follows
//! `pfdf_raster::raster::Raster`'s "allocate fresh, only swap in on
//! success" discipline, applied here to a flat `Vec<f64>` instead of a 2-D
//! grid.

use pfdf_common::errors::{Error, Result};

/// Rainfall durations (minutes) every Staley model publishes parameters
/// for.
pub const DURATIONS: [u32; 3] = [15, 30, 60];

/// Which Staley (2017) debris-flow likelihood model a [`Model`] implements.
/// The four variants share the same `(B, Ct, Cf, Cs)` shape and differ only
/// in which terrain/fire variables `T`, `F`, `S` represent; that mapping is
/// the caller's responsibility, not this harness's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    M1,
    M2,
    M3,
    M4,
}

/// A parametric model: one `(b, ct, cf, cs)` tuple per supported duration.
/// The specific regression coefficients are out of scope for this harness;
/// callers supply them.
#[derive(Debug, Clone)]
pub struct Model {
    pub kind: ModelKind,
    durations: Vec<u32>,
    b: Vec<f64>,
    ct: Vec<f64>,
    cf: Vec<f64>,
    cs: Vec<f64>,
}

impl Model {
    pub fn new(kind: ModelKind, durations: Vec<u32>, b: Vec<f64>, ct: Vec<f64>, cf: Vec<f64>, cs: Vec<f64>) -> Result<Model> {
        let n = durations.len();
        if b.len() != n || ct.len() != n || cf.len() != n || cs.len() != n {
            return Err(Error::Durations(format!(
                "parameter vectors must all have one entry per duration ({n}); got b={}, ct={}, cf={}, cs={}",
                b.len(), ct.len(), cf.len(), cs.len()
            )));
        }
        Ok(Model { kind, durations, b, ct, cf, cs })
    }

    /// Returns the `(B, Ct, Cf, Cs)` slices for the requested `durations`,
    /// in the order requested. Errors naming any duration this model
    /// doesn't support.
    pub fn parameters(&self, durations: &[u32]) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>)> {
        let mut b = Vec::with_capacity(durations.len());
        let mut ct = Vec::with_capacity(durations.len());
        let mut cf = Vec::with_capacity(durations.len());
        let mut cs = Vec::with_capacity(durations.len());
        for &d in durations {
            let i = self
                .durations
                .iter()
                .position(|&supported| supported == d)
                .ok_or_else(|| Error::Durations(format!("duration {d} is not supported by this model")))?;
            b.push(self.b[i]);
            ct.push(self.ct[i]);
            cf.push(self.cf[i]);
            cs.push(self.cs[i]);
        }
        Ok((b, ct, cf, cs))
    }
}

/// A dense `(nSegments, nDurations, nProbabilities)` result, with the
/// trailing dimension droppable when a caller only wants the shape they
/// asked for (`keepdims=false`). Squeezing is metadata-only: the flat
/// `values` layout never moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast3 {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl Broadcast3 {
    fn new(n_segments: usize, n_durations: usize, n_probabilities: usize, values: Vec<f64>) -> Broadcast3 {
        Broadcast3 { shape: vec![n_segments, n_durations, n_probabilities], values }
    }

    /// Drops trailing singleton dimensions (but never below 1 total dim).
    pub fn squeeze(mut self) -> Broadcast3 {
        while self.shape.len() > 1 && *self.shape.last().unwrap() == 1 {
            self.shape.pop();
        }
        self
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Rainfall accumulation `R` that yields probability `p`, for every
/// `(segment, duration, probability)` combination:
///
/// `R = (logit(p) - B - Ct*T - Cf*F - Cs*S) / (Ct*T + Cf*F + Cs*S)`
///
/// `T`, `F`, `S` are per-segment variables (length `nSegments`); `B`, `Ct`,
/// `Cf`, `Cs` are per-duration parameters (length `nDurations`); `p` is a
/// set of probability queries (length `nProbabilities`). When `screen`,
/// entries whose denominator is non-positive (the segment can never reach
/// `p`) become NaN rather than a meaningless negative accumulation.
#[allow(clippy::too_many_arguments)]
pub fn accumulation(
    p: &[f64],
    b: &[f64],
    ct: &[f64],
    t: &[f64],
    cf: &[f64],
    f: &[f64],
    cs: &[f64],
    s: &[f64],
    keepdims: bool,
    screen: bool,
) -> Result<Broadcast3> {
    let n_durations = b.len();
    if ct.len() != n_durations || cf.len() != n_durations || cs.len() != n_durations {
        return Err(Error::Durations("B, Ct, Cf, Cs must have the same length".to_string()));
    }
    let n_segments = t.len();
    if f.len() != n_segments || s.len() != n_segments {
        return Err(Error::Dimension("T, F, S must have the same length".to_string()));
    }
    let n_probabilities = p.len();

    let mut values = vec![0f64; n_segments * n_durations * n_probabilities];
    for seg in 0..n_segments {
        for dur in 0..n_durations {
            let d = ct[dur] * t[seg] + cf[dur] * f[seg] + cs[dur] * s[seg];
            for (k, &pk) in p.iter().enumerate() {
                let r = (logit(pk) - b[dur] - d) / d;
                let idx = (seg * n_durations + dur) * n_probabilities + k;
                values[idx] = if screen && d <= 0.0 { f64::NAN } else { r };
            }
        }
    }

    let result = Broadcast3::new(n_segments, n_durations, n_probabilities, values);
    Ok(if keepdims { result } else { result.squeeze() })
}

/// The inverse of [`accumulation`]: given a rainfall accumulation `R`,
/// returns the probability the logistic link predicts, for every
/// `(segment, duration)` combination. `R`'s trailing (probability-query)
/// dimension is whatever shape it was produced with.
#[allow(clippy::too_many_arguments)]
pub fn likelihood(
    r: &Broadcast3,
    b: &[f64],
    ct: &[f64],
    t: &[f64],
    cf: &[f64],
    f: &[f64],
    cs: &[f64],
    s: &[f64],
    keepdims: bool,
) -> Result<Broadcast3> {
    let n_durations = b.len();
    if ct.len() != n_durations || cf.len() != n_durations || cs.len() != n_durations {
        return Err(Error::Durations("B, Ct, Cf, Cs must have the same length".to_string()));
    }
    let n_segments = t.len();
    if f.len() != n_segments || s.len() != n_segments {
        return Err(Error::Dimension("T, F, S must have the same length".to_string()));
    }
    let n_probabilities = *r.shape.get(2).unwrap_or(&1);
    if r.values.len() != n_segments * n_durations * n_probabilities {
        return Err(Error::Shape(format!(
            "R has {} values, expected {n_segments}x{n_durations}x{n_probabilities}",
            r.values.len()
        )));
    }

    let mut values = vec![0f64; n_segments * n_durations * n_probabilities];
    for seg in 0..n_segments {
        for dur in 0..n_durations {
            let d = ct[dur] * t[seg] + cf[dur] * f[seg] + cs[dur] * s[seg];
            for k in 0..n_probabilities {
                let idx = (seg * n_durations + dur) * n_probabilities + k;
                let logit_p = b[dur] + d * (1.0 + r.values[idx]);
                values[idx] = sigmoid(logit_p);
            }
        }
    }

    let result = Broadcast3::new(n_segments, n_durations, n_probabilities, values);
    Ok(if keepdims { result } else { result.squeeze() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_looks_up_requested_durations() {
        let model = Model::new(
            ModelKind::M1,
            vec![15, 30, 60],
            vec![-3.63, -3.61, -3.21],
            vec![0.41, 0.26, 0.17],
            vec![0.67, 0.39, 0.2],
            vec![0.7, 0.5, 0.22],
        )
        .unwrap();
        let (b, ct, cf, cs) = model.parameters(&[30]).unwrap();
        assert_eq!(b, vec![-3.61]);
        assert_eq!(ct, vec![0.26]);
        assert_eq!(cf, vec![0.39]);
        assert_eq!(cs, vec![0.5]);
    }

    #[test]
    fn parameters_rejects_an_unsupported_duration() {
        let model = Model::new(ModelKind::M1, vec![15], vec![-3.63], vec![0.41], vec![0.67], vec![0.7]).unwrap();
        assert!(model.parameters(&[45]).is_err());
    }

    #[test]
    fn likelihood_inverts_accumulation() {
        let p = [0.5];
        let b = [-3.63];
        let ct = [0.41];
        let t = [0.2];
        let cf = [0.67];
        let f = [0.3];
        let cs = [0.7];
        let s = [0.4];

        let r = accumulation(&p, &b, &ct, &t, &cf, &f, &cs, &s, true, true).unwrap();
        let back = likelihood(&r, &b, &ct, &t, &cf, &f, &cs, &s, true).unwrap();
        assert!((back.values[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn accumulation_screens_non_positive_denominators() {
        let p = [0.5];
        let b = [-3.63];
        let ct = [0.0];
        let t = [0.0];
        let cf = [0.0];
        let f = [0.0];
        let cs = [0.0];
        let s = [0.0];

        let screened = accumulation(&p, &b, &ct, &t, &cf, &f, &cs, &s, true, true).unwrap();
        assert!(screened.values[0].is_nan());

        let unscreened = accumulation(&p, &b, &ct, &t, &cf, &f, &cs, &s, true, false).unwrap();
        assert!(!unscreened.values[0].is_nan());
    }

    #[test]
    fn squeeze_drops_trailing_singleton_dims() {
        let result = accumulation(&[0.5], &[-3.63], &[0.41], &[0.2], &[0.67], &[0.3], &[0.7], &[0.4], false, true).unwrap();
        assert_eq!(result.shape, vec![1]);
    }
}
