//! Overlays drawn on the map with positions in lat/lon.

pub mod base;
pub mod marker;
pub mod vector;

pub use base::{Layer, LayerGroup};
pub use marker::{IconMarker, Placemark, Symbol};
pub use vector::{BoxLayer, BoxStyle, Circle, Shape, Track};
