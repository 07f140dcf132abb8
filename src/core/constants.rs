//! Core constants for slippy maps and the spherical earth model.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels. Most (all?) services use it.
pub const TILE_SIZE: u32 = 256;

/// Mean earth radius in meters used for distances and destination points.
pub const EARTH_RADIUS: f64 = 6371.0 * 1000.0;

/// Latitude limits supported by the slippy map (spherical mercator) projection.
pub const MAX_LAT: f64 = 85.0511;
pub const MIN_LAT: f64 = -85.0511;

pub const MAX_LON: f64 = 180.0;
pub const MIN_LON: f64 = -180.0;

/// Highest zoom level accepted on the command line.
pub const MAX_ZOOM: u8 = 19;

/// Bearings in degrees.
pub const BRG_NORTH: f64 = 0.0;
pub const BRG_EAST: f64 = 90.0;
pub const BRG_SOUTH: f64 = 180.0;
pub const BRG_WEST: f64 = 270.0;

/// Name of the service used for the hillshading overlay.
pub const HILLSHADE: &str = "hillshading";

/// Application name, used for config, cache and data directories.
pub const APP_NAME: &str = "mapmaker";
