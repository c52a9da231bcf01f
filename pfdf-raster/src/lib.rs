//! Raster value+metadata abstraction, CRS/transform/bounding-box primitives,
//! and GeoTIFF I/O.

pub mod dtype;
pub mod geotiff;
pub mod projection;
pub mod raster;

pub use dtype::{Casting, DType};
pub use projection::{BoundingBox, Crs, Quadrant, Transform};
pub use raster::{Raster, RasterMetadata};
