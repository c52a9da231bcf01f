//! The error taxonomy shared across the pfdf-rs workspace.
//!
//! Raster and vector I/O ultimately round-trip `std::io::Error` at the
//! process boundary (`From<Error> for std::io::Error` below), but failure
//! *kinds* are distinguished internally so callers can match on them
//! instead of parsing message strings.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// One variant per failure kind surfaced by the workspace's public APIs.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("dimension mismatch: {0}")]
    Dimension(String),

    #[error("empty array: {0}")]
    EmptyArray(String),

    #[error("raster shape mismatch: {raster} does not match the reference raster ({detail})")]
    RasterShape { raster: String, detail: String },

    #[error("raster CRS mismatch: {raster} does not match the reference raster ({detail})")]
    RasterCrs { raster: String, detail: String },

    #[error("raster transform mismatch: {raster} does not match the reference raster ({detail})")]
    RasterTransform { raster: String, detail: String },

    #[error("missing CRS: {0}")]
    MissingCrs(String),

    #[error("missing transform: {0}")]
    MissingTransform(String),

    #[error("missing NoData value: {0}")]
    MissingNoData(String),

    #[error("invalid CRS: {0}")]
    Crs(String),

    #[error("invalid transform: {0}")]
    Transform(String),

    #[error("feature file error ({path}): {detail}")]
    FeatureFile { path: String, detail: String },

    #[error("no features remaining in {path} after applying bounds")]
    NoFeatures { path: String },

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("invalid point geometry: {0}")]
    Point(String),

    #[error("invalid polygon geometry: {0}")]
    Polygon(String),

    #[error("unsupported rainfall duration: {0}")]
    Durations(String),

    #[error("data acquisition error: {0}")]
    DataApi(String),

    #[error("missing API field: {0}")]
    MissingApiField(String),

    #[error("no TNM products matched the query")]
    NoTnmProducts,

    #[error("too many TNM products matched the query ({count} found, expected exactly one)")]
    TooManyTnmProducts { count: usize },

    #[error("invalid LFPS job: {0}")]
    InvalidLfpsJob(String),

    #[error("LFPS job {job_id} timed out after {elapsed:?}")]
    LfpsJobTimeout {
        job_id: String,
        elapsed: std::time::Duration,
    },

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("out of memory while {operation}: try narrowing `bounds` or coarsening the resolution")]
    Memory { operation: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Constructs a `RasterShape` error naming the offending raster and the failing constraint.
    pub fn raster_shape(raster: impl Into<String>, detail: impl fmt::Display) -> Self {
        Error::RasterShape {
            raster: raster.into(),
            detail: detail.to_string(),
        }
    }

    pub fn raster_crs(raster: impl Into<String>, detail: impl fmt::Display) -> Self {
        Error::RasterCrs {
            raster: raster.into(),
            detail: detail.to_string(),
        }
    }

    pub fn raster_transform(raster: impl Into<String>, detail: impl fmt::Display) -> Self {
        Error::RasterTransform {
            raster: raster.into(),
            detail: detail.to_string(),
        }
    }
}

/// Lets acquisition/raster code keep returning `std::io::Error` at its
/// boundary, while internal pfdf code works with `Error`.
impl From<Error> for std::io::Error {
    fn from(err: Error) -> std::io::Error {
        match err {
            Error::Io(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other.to_string()),
        }
    }
}
