use image::RgbaImage;

use crate::core::bounds::Bounds;
use crate::core::geo::{BBox, LatLng};
use crate::layers::base::Layer;
use crate::rendering::canvas::{self, Color, BLACK};
use crate::rendering::context::RenderContext;
use crate::{MapError, Result};

/// A path along a list of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub waypoints: Vec<LatLng>,
    pub color: Color,
    pub width: f32,
}

impl Track {
    pub fn new(waypoints: Vec<LatLng>) -> Self {
        Self {
            waypoints,
            color: BLACK,
            width: 1.0,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

impl Layer for Track {
    fn kind(&self) -> &'static str {
        "track"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let xy: Vec<(f32, f32)> = self
            .waypoints
            .iter()
            .map(|p| rc.to_pixels_f(p.lat, p.lng))
            .collect();
        canvas::line(img, &xy, self.color, self.width);
    }
}

/// A closed polygon with optional outline and fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub points: Vec<LatLng>,
    pub color: Option<Color>,
    pub fill: Option<Color>,
    pub width: f32,
}

impl Shape {
    /// Creates a shape, `points` must contain at least three coordinates.
    pub fn new(points: Vec<LatLng>) -> Result<Self> {
        if points.len() < 3 {
            return Err(MapError::InvalidCoordinates(format!(
                "a shape needs at least three points, got {}",
                points.len()
            )));
        }

        Ok(Self {
            points,
            color: Some(BLACK),
            fill: None,
            width: 1.0,
        })
    }

    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

impl Layer for Shape {
    fn kind(&self) -> &'static str {
        "shape"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let xy: Vec<(f32, f32)> = self
            .points
            .iter()
            .map(|p| rc.to_pixels_f(p.lat, p.lng))
            .collect();
        canvas::polygon(img, &xy, self.fill, self.color, self.width);
    }
}

/// How a [`BoxLayer`] outlines its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxStyle {
    /// A plain rectangle.
    #[default]
    Regular,
    /// Only the corners of the rectangle.
    Bracket,
}

/// A rectangle around a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxLayer {
    pub bbox: BBox,
    pub color: Option<Color>,
    pub fill: Option<Color>,
    pub width: u32,
    pub style: BoxStyle,
}

impl BoxLayer {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            color: Some(BLACK),
            fill: None,
            width: 1,
            style: BoxStyle::Regular,
        }
    }

    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_style(mut self, style: BoxStyle) -> Self {
        self.style = style;
        self
    }

    fn pixel_bounds(&self, rc: &RenderContext) -> Bounds {
        let (left, top) = rc.to_pixels(self.bbox.maxlat, self.bbox.minlon);
        let (right, bottom) = rc.to_pixels(self.bbox.minlat, self.bbox.maxlon);
        Bounds::new(left, top, right, bottom)
    }

    fn draw_bracket(&self, bounds: Bounds, img: &mut RgbaImage) {
        let Some(color) = self.color else {
            return;
        };
        if self.width == 0 {
            return;
        }

        // the shortest side is half bracket, half free
        let length = bounds.width().min(bounds.height()) as i32 / 4;
        let Bounds {
            left,
            top,
            right,
            bottom,
        } = bounds;
        let (xa, xb) = (left + length, right - length);
        let (ya, yb) = (top + length, bottom - length);

        let brackets = [
            [(left, ya), (left, top), (xa, top)],
            [(xb, top), (right, top), (right, ya)],
            [(right, yb), (right, bottom), (xb, bottom)],
            [(xa, bottom), (left, bottom), (left, yb)],
        ];
        for bracket in brackets {
            let xy: Vec<(f32, f32)> = bracket.iter().map(|&(x, y)| (x as f32, y as f32)).collect();
            canvas::line(img, &xy, color, self.width as f32);
        }
    }
}

impl Layer for BoxLayer {
    fn kind(&self) -> &'static str {
        "box"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let bounds = self.pixel_bounds(rc);
        match self.style {
            BoxStyle::Regular => canvas::rectangle(img, bounds, self.fill, self.color, self.width),
            BoxStyle::Bracket => {
                canvas::rectangle(img, bounds, self.fill, None, 0);
                self.draw_bracket(bounds, img);
            }
        }
    }
}

/// A circle around a center with a radius in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: LatLng,
    pub radius: f64,
    pub color: Option<Color>,
    pub fill: Option<Color>,
    pub width: u32,
    /// Draw a small dot at the center.
    pub marker: bool,
}

impl Circle {
    pub fn new(center: LatLng, radius: f64) -> Self {
        Self {
            center,
            radius,
            color: Some(BLACK),
            fill: None,
            width: 1,
            marker: false,
        }
    }

    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }
}

impl Layer for Circle {
    fn kind(&self) -> &'static str {
        "circle"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let bbox = match BBox::from_radius(self.center.lat, self.center.lng, self.radius) {
            Ok(bbox) => bbox,
            Err(e) => {
                log::warn!("Skip circle at {:?}: {}", self.center, e);
                return;
            }
        };

        let (left, top) = rc.to_pixels(bbox.maxlat, bbox.minlon);
        let (right, bottom) = rc.to_pixels(bbox.minlat, bbox.maxlon);
        canvas::ellipse(
            img,
            Bounds::new(left, top, right, bottom),
            self.fill,
            self.color,
            self.width,
        );

        if self.marker {
            let (x, y) = rc.to_pixels(self.center.lat, self.center.lng);
            let color = self.color.unwrap_or(BLACK);
            canvas::ellipse(img, Bounds::new(x - 2, y - 2, x + 3, y + 3), Some(color), None, 0);
        }
    }
}
