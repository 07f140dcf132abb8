//! # mapmaker
//!
//! Create map images from slippy map tile servers.
//!
//! The library downloads the tiles that cover a geographic area, stitches
//! them into a single image, draws overlays such as GeoJSON features or
//! hillshading and decorates the result with margins, a frame, titles and a
//! compass rose.

pub mod core;
pub mod data;
pub mod decorations;
pub mod icons;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod tiles;

#[cfg(test)]
pub(crate) mod testing;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::{Config, ServiceConfig},
    geo::{BBox, LatLng},
    map::{Map, MapInfo},
    tilemap::{TileCoord, TileMap},
};

pub use tiles::{
    cache::MemoryCache, disk::DiskCache, fallback::Fallback, loader::TileLoader,
    source::{TileProvider, TileResponse, TileService},
};

pub use rendering::context::RenderContext;

pub use decorations::{Composer, Placement};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Tile {0} is not cached")]
    NotCached(TileCoord),

    #[error("Render error: {0}")]
    Render(String),

    #[error("No icon found with name {0:?}")]
    IconNotFound(String),
}

/// Error type alias for convenience
pub type Error = MapError;
