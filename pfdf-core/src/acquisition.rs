//! Data-acquisition contracts: the interfaces the core consumes from
//! external raster/bundle providers (DEM tiles, STATSGO, LANDFIRE EVT,
//! retainments, NHD, …), without depending on any specific provider.
//!
//! Each contract is a narrow trait the core calls through, implemented
//! elsewhere, keeping network and catalog access out of the core crate
//! entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pfdf_common::errors::Result;
use pfdf_raster::{BoundingBox, Raster};

/// A provider of raster data windowed to a `BoundingBox` (DEM tiles,
/// STATSGO soil rasters, LANDFIRE EVT). Tile-based providers are expected to
/// internally fetch every overlapping tile, verify they share a CRS, and
/// mosaic them into the aligned destination window; implementations should
/// fail if no tile overlaps `bounds`, or if the tiles disagree on CRS.
pub trait RasterSource {
    /// Reads the raster data intersecting `bounds`. `timeout` bounds the
    /// whole operation; `None` disables the limit.
    fn read(&self, bounds: &BoundingBox, timeout: Option<Duration>) -> Result<Raster>;
}

/// A provider of file bundles the core only consumes by path afterwards
/// (retainment shapefiles, NHD HUC packages, LANDFIRE job outputs).
pub trait BundleSource {
    /// Downloads the bundle to `destination`, returning the path actually
    /// written (which may differ from `destination` once an archive is
    /// unpacked). Refuses to overwrite an existing file unless `overwrite`.
    fn download(&self, destination: &Path, overwrite: bool, timeout: Option<Duration>) -> Result<PathBuf>;
}
