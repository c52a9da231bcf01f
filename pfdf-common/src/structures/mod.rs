// private sub-modules defined in other files
mod array2d;
mod point2d;
mod polyline;

// exports identifiers from private sub-modules in the current module namespace
pub use self::array2d::Array2D;
pub use self::point2d::{Direction, Point2D};
pub use self::polyline::Polyline;
