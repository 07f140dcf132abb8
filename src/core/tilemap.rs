use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::constants::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::core::geo::{BBox, LatLng};
use crate::{MapError, Result};

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Creates a new tile coordinate
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// The tile that contains the given point at the given zoom level.
    ///
    /// See <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>
    pub fn containing(lat: f64, lon: f64, zoom: u8) -> Result<Self> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(MapError::InvalidCoordinates(format!(
                "latitude must be {}..{}, got {}",
                MIN_LAT, MAX_LAT, lat
            )));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(MapError::InvalidCoordinates(format!(
                "longitude must be {}..{}, got {}",
                MIN_LON, MAX_LON, lon
            )));
        }

        let n = 2.0_f64.powi(zoom as i32);
        let x = (lon + 180.0) / 360.0 * n;
        let y = (1.0 - lat.to_radians().tan().asinh() / PI) / 2.0 * n;

        // lon == 180.0 lands exactly on the east edge of the world
        let max_index = (n as u32).saturating_sub(1);
        Ok(Self {
            x: (x as u32).min(max_index),
            y: (y as u32).min(max_index),
            z: zoom,
        })
    }

    /// Location of the north-west corner of this tile.
    pub fn location(&self) -> LatLng {
        corner(self.x, self.y, self.z)
    }

    /// The bounding box covered by this tile.
    pub fn bounds(&self) -> BBox {
        let nw = corner(self.x, self.y, self.z);
        let se = corner(self.x + 1, self.y + 1, self.z);
        BBox {
            minlat: se.lat,
            minlon: nw.lng,
            maxlat: nw.lat,
            maxlon: se.lng,
        }
    }

    /// Gets the parent tile (one zoom level up) and the quadrant offset of
    /// this tile within the parent, `(x % 2, y % 2)`.
    pub fn parent(&self) -> Option<(TileCoord, (u32, u32))> {
        if self.z == 0 {
            return None;
        }

        Some((
            TileCoord {
                x: self.x / 2,
                y: self.y / 2,
                z: self.z - 1,
            },
            (self.x % 2, self.y % 2),
        ))
    }

    /// Tells if the given point lies within this tile.
    pub fn contains(&self, point: &LatLng) -> bool {
        self.bounds().contains(point)
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn max_tiles_at_zoom(zoom: u8) -> u32 {
        1_u32 << zoom
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

fn corner(x: u32, y: u32, z: u8) -> LatLng {
    let n = 2.0_f64.powi(z as i32);
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan().to_degrees();
    LatLng::new(lat, lon)
}

/// A rectangular block of slippy map tiles at a fixed zoom level.
///
/// The bounding box is fully contained within the map, the map itself may be
/// larger than the box.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    pub ax: u32,
    pub ay: u32,
    pub bx: u32,
    pub by: u32,
    pub zoom: u8,
    pub bbox: BBox,
}

impl TileMap {
    pub fn new(ax: u32, ay: u32, bx: u32, by: u32, zoom: u8, bbox: BBox) -> Self {
        Self {
            ax: ax.min(bx),
            ay: ay.min(by),
            bx: ax.max(bx),
            by: ay.max(by),
            zoom,
            bbox,
        }
    }

    /// Set up a map with the tiles that contain the given bounding box.
    pub fn from_bbox(bbox: &BBox, zoom: u8) -> Result<Self> {
        let nw = TileCoord::containing(bbox.maxlat, bbox.minlon, zoom)?;
        let se = TileCoord::containing(bbox.minlat, bbox.maxlon, zoom)?;
        Ok(Self::new(nw.x, nw.y, se.x, se.y, zoom, *bbox))
    }

    pub fn columns(&self) -> u32 {
        self.bx - self.ax + 1
    }

    pub fn rows(&self) -> u32 {
        self.by - self.ay + 1
    }

    pub fn num_tiles(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// All tiles of this map, row by row from the north-west corner.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.ay..=self.by)
            .flat_map(move |y| (self.ax..=self.bx).map(move |x| TileCoord::new(x, y, self.zoom)))
    }

    /// Position of the given coordinate relative to the north-west corner of
    /// this map, in units of tiles.
    ///
    /// Multiply with the tile size to get pixel coordinates.
    pub fn to_pixel_fractions(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (abs_x, abs_y) = project(lat, lon, self.zoom);
        (abs_x - self.ax as f64, abs_y - self.ay as f64)
    }
}

/// Spherical mercator projection to world coordinates in units of tiles.
///
/// See <http://msdn.microsoft.com/en-us/library/bb259689.aspx>
fn project(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let globe = 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * globe;

    let sinlat = lat.to_radians().sin();
    let y = (0.5 - ((1.0 + sinlat) / (1.0 - sinlat)).ln() / (4.0 * PI)) * globe;

    (x, y)
}
