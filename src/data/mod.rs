//! Input data: command line values and GeoJSON overlays.

pub mod geojson;
pub mod parse;
