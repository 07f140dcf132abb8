use image::RgbaImage;
use std::fmt;
use std::str::FromStr;

use crate::core::bounds::Bounds;
use crate::core::geo::{decimal, BBox};
use crate::rendering::canvas::{self, Color, BLACK, WHITE};
use crate::rendering::context::RenderContext;
use crate::MapError;

/// Number of regular ticks along each edge of a coordinate frame.
const TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStyle {
    /// A single colored border.
    #[default]
    Solid,
    /// Alternating colors at regular lat/lon intervals.
    Coordinates,
}

impl FromStr for FrameStyle {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solid" => Ok(FrameStyle::Solid),
            "coordinates" => Ok(FrameStyle::Coordinates),
            _ => Err(MapError::Parse(format!("invalid frame style {:?}", s))),
        }
    }
}

impl fmt::Display for FrameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStyle::Solid => f.write_str("solid"),
            FrameStyle::Coordinates => f.write_str("coordinates"),
        }
    }
}

/// A border between the map content and the margin.
///
/// The frame adds `2 * width` to the size of the final image.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub color: Color,
    pub alt_color: Color,
    pub style: FrameStyle,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            width: 5,
            color: BLACK,
            alt_color: WHITE,
            style: FrameStyle::Solid,
        }
    }
}

impl Frame {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_alt_color(mut self, color: Color) -> Self {
        self.alt_color = color;
        self
    }

    pub fn with_style(mut self, style: FrameStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw onto an image the size of the map plus the frame.
    pub fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        match self.style {
            FrameStyle::Solid => self.draw_solid(img),
            FrameStyle::Coordinates => self.draw_coordinates(rc, img),
        }
    }

    fn draw_solid(&self, img: &mut RgbaImage) {
        let area = Bounds::from_size(0, 0, img.width(), img.height());
        canvas::rectangle(img, area, None, Some(self.color), self.width);
    }

    fn draw_coordinates(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let crop = rc.crop_box();
        let fw = self.width as i32;
        let h = img.height() as i32;
        let ticks = Ticks::new(rc.bbox());

        // pixel position on the frame image
        let pos = |lat: f64, lon: f64| {
            let (x, y) = rc.to_pixels(lat, lon);
            (x - crop.left, y - crop.top)
        };

        for (lat, offset) in [(rc.bbox().maxlat, 0), (rc.bbox().minlat, fw)] {
            let mut prev_x = fw;
            for (i, lon) in ticks.lon.iter().enumerate() {
                let (x, y) = pos(lat, *lon);
                let (x, y) = (x + fw, y + offset);
                self.segment(img, Bounds::new(prev_x, y, x, y + fw), i);
                prev_x = x;
            }
        }

        for (lon, offset) in [(rc.bbox().minlon, 0), (rc.bbox().maxlon, fw)] {
            let mut prev_y = h - fw;
            for (i, lat) in ticks.lat.iter().enumerate() {
                let (x, y) = pos(*lat, lon);
                let (x, y) = (x + offset, y + fw);
                self.segment(img, Bounds::new(x, y - 1, x + fw, prev_y), i);
                prev_y = y;
            }
        }

        self.draw_corners(img);
    }

    fn segment(&self, img: &mut RgbaImage, area: Bounds, i: usize) {
        let fill = if i % 2 == 1 { self.color } else { self.alt_color };
        canvas::rectangle(img, area, Some(fill), Some(self.color), 1);
    }

    fn draw_corners(&self, img: &mut RgbaImage) {
        let (w, h) = (img.width() as i32, img.height() as i32);
        let fw = self.width as i32;
        for (x, y) in [(0, 0), (w - fw, 0), (0, h - fw), (w - fw, h - fw)] {
            canvas::rectangle(img, Bounds::new(x, y, x + fw, y + fw), Some(self.color), None, 0);
        }
    }
}

/// Tick positions for a coordinate frame, including the end of each edge.
#[derive(Debug, Clone, PartialEq)]
struct Ticks {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl Ticks {
    fn new(bbox: &BBox) -> Self {
        let mut lon = ticks(bbox.minlon, bbox.maxlon, TICKS);
        // partial tick for the last segment
        lon.push(bbox.maxlon);
        let mut lat = ticks(bbox.minlat, bbox.maxlat, TICKS);
        lat.push(bbox.maxlat);
        Self { lat, lon }
    }
}

/// About `n` ticks from `start` to `end`, on full degrees, minutes or
/// seconds where possible.
fn ticks(start: f64, end: f64, n: u32) -> Vec<f64> {
    let span = end - start;
    if span <= 0.0 || n == 0 {
        return Vec::new();
    }

    let n = n as f64;
    let degrees = span.floor();
    let minutes = (span * 60.0).floor();
    let half_minutes = (span * 120.0).floor();
    let seconds = (span * 3600.0).floor();

    let per_tick = if degrees >= n {
        decimal((degrees / n).floor(), 0.0, 0.0)
    } else if minutes >= n {
        decimal(0.0, (minutes / n).floor(), 0.0)
    } else if half_minutes >= n {
        decimal(0.0, (half_minutes / n).floor() / 2.0, 0.0)
    } else {
        decimal(0.0, 0.0, (seconds / n).floor())
    };
    if per_tick <= 0.0 {
        return Vec::new();
    }

    let count = (span / per_tick).floor() as u32;
    (1..=count).map(|i| start + i as f64 * per_tick).collect()
}
