//! Core raster and stream-network engine for post-fire debris-flow hazard
//! assessment: D8 watershed delineation, burn-severity classification, the
//! `Segments` stream-network graph, the Staley hazard-model harness, and the
//! data-acquisition contracts external providers implement.

pub mod acquisition;
pub mod hazard;
pub mod segments;
pub mod severity;
pub mod watershed;

pub use segments::Segments;
