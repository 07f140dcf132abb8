//! Decorations painted over and around the map content, placed in pixel
//! coordinates.
//!
//! Within each [`Area`], decorations go into predefined slots:
//!
//! ```text
//! +------------------------------+
//! |  NW      NNW  N  NNE    NE   |
//! |       +--------------+       |
//! |  WNW  |  NW   N  NE  |  ENE  |
//! |  W    |  W    C  E   |  E    |
//! |  WSW  |  SW   S  SE  |  ESE  |
//! |       +--------------+       |
//! |  SW      SSW  S  SSE    SE   |
//! +------------------------------+
//! ```

pub mod cartouche;
pub mod compass;
pub mod composer;
pub mod frame;

use image::RgbaImage;
use std::fmt;
use std::str::FromStr;

use crate::MapError;

pub use cartouche::Cartouche;
pub use compass::CompassRose;
pub use composer::Composer;
pub use frame::{Frame, FrameStyle};

/// A slot for a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    NW,
    NNW,
    N,
    NNE,
    NE,
    WNW,
    W,
    WSW,
    ENE,
    E,
    ESE,
    SW,
    SSW,
    S,
    SSE,
    SE,
    C,
}

impl Placement {
    pub const ALL: [Placement; 17] = [
        Placement::NW,
        Placement::NNW,
        Placement::N,
        Placement::NNE,
        Placement::NE,
        Placement::WNW,
        Placement::W,
        Placement::WSW,
        Placement::ENE,
        Placement::E,
        Placement::ESE,
        Placement::SW,
        Placement::SSW,
        Placement::S,
        Placement::SSE,
        Placement::SE,
        Placement::C,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::NW => "NW",
            Placement::NNW => "NNW",
            Placement::N => "N",
            Placement::NNE => "NNE",
            Placement::NE => "NE",
            Placement::WNW => "WNW",
            Placement::W => "W",
            Placement::WSW => "WSW",
            Placement::ENE => "ENE",
            Placement::E => "E",
            Placement::ESE => "ESE",
            Placement::SW => "SW",
            Placement::SSW => "SSW",
            Placement::S => "S",
            Placement::SSE => "SSE",
            Placement::SE => "SE",
            Placement::C => "C",
        }
    }

    /// Along the top edge of the margin.
    pub fn is_northern(&self) -> bool {
        matches!(
            self,
            Placement::NW | Placement::NNW | Placement::N | Placement::NNE | Placement::NE
        )
    }

    /// Along the bottom edge of the margin.
    pub fn is_southern(&self) -> bool {
        matches!(
            self,
            Placement::SW | Placement::SSW | Placement::S | Placement::SSE | Placement::SE
        )
    }

    /// Along the left edge of the margin.
    pub fn is_western(&self) -> bool {
        matches!(
            self,
            Placement::NW | Placement::WNW | Placement::W | Placement::WSW | Placement::SW
        )
    }

    /// Along the right edge of the margin.
    pub fn is_eastern(&self) -> bool {
        matches!(
            self,
            Placement::NE | Placement::ENE | Placement::E | Placement::ESE | Placement::SE
        )
    }
}

impl FromStr for Placement {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Placement::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| MapError::Parse(format!("invalid placement {:?}", s)))
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a decoration is placed: on the map content or on the margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Map,
    Margin,
}

impl Area {
    /// Whether the area has a slot for the given placement.
    pub fn accepts(&self, placement: Placement) -> bool {
        match self {
            Area::Map => matches!(
                placement,
                Placement::NW
                    | Placement::N
                    | Placement::NE
                    | Placement::W
                    | Placement::C
                    | Placement::E
                    | Placement::SW
                    | Placement::S
                    | Placement::SE
            ),
            Area::Margin => placement != Placement::C,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Map => f.write_str("MAP"),
            Area::Margin => f.write_str("MARGIN"),
        }
    }
}

/// A graphic element placed in pixel coordinates.
pub trait Decoration: Send + Sync {
    fn placement(&self) -> Placement;

    /// Size in pixels, given the size of the map content.
    fn calc_size(&self, map_size: (u32, u32)) -> (u32, u32);

    /// Draw onto a transparent image of the size from
    /// [`Decoration::calc_size`].
    fn draw(&self, img: &mut RgbaImage);
}
