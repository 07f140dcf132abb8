//! Prelude module for common mapmaker types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapmaker::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{CacheConfig, Config, ServiceConfig},
    geo::{BBox, LatLng},
    map::{Map, MapInfo},
    tilemap::{TileCoord, TileMap},
};

pub use crate::layers::{
    BoxLayer, BoxStyle, Circle, IconMarker, Layer, LayerGroup, Placemark, Shape, Symbol, Track,
};

pub use crate::decorations::{
    Area, Cartouche, CompassRose, Composer, Decoration, Frame, FrameStyle, Placement,
};

pub use crate::tiles::{
    cache::MemoryCache,
    disk::DiskCache,
    fallback::Fallback,
    source::{TileProvider, TileResponse, TileService},
};

pub use crate::icons::IconProvider;

pub use crate::rendering::{
    canvas::{Color, BLACK, TRANSPARENT, WHITE},
    context::RenderContext,
};

pub use crate::{Error as MapError, Result};

pub use std::sync::Arc;
