//! Vector feature I/O and the feature-file rasterizer.

pub mod features;
pub mod rasterize;

pub use features::{read_features, FeatureGeometry, GeometryKind};
pub use rasterize::{rasterize_points, rasterize_polygons};
