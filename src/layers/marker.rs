use image::RgbaImage;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::bounds::Bounds;
use crate::core::geo::LatLng;
use crate::layers::base::Layer;
use crate::rendering::canvas::{self, Color, BLACK, WHITE};
use crate::rendering::context::RenderContext;
use crate::MapError;

/// Symbol drawn for a [`Placemark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symbol {
    #[default]
    Dot,
    Square,
    Triangle,
}

impl FromStr for Symbol {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dot" => Ok(Symbol::Dot),
            "square" => Ok(Symbol::Square),
            "triangle" => Ok(Symbol::Triangle),
            other => Err(MapError::Parse(format!("unknown symbol {:?}", other))),
        }
    }
}

/// A point marker with an optional label below the symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub position: LatLng,
    pub symbol: Symbol,
    pub size: u32,
    /// Outline color.
    pub color: Option<Color>,
    pub fill: Option<Color>,
    pub border: u32,
    pub label: Option<String>,
    pub font_size: f32,
    pub label_color: Color,
    pub label_background: Option<Color>,
}

impl Placemark {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            symbol: Symbol::Dot,
            size: 4,
            color: Some(BLACK),
            fill: Some(WHITE),
            border: 0,
            label: None,
            font_size: 12.0,
            label_color: BLACK,
            label_background: None,
        }
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_label_color(mut self, color: Color) -> Self {
        self.label_color = color;
        self
    }

    pub fn with_label_background(mut self, color: Option<Color>) -> Self {
        self.label_background = color;
        self
    }

    fn outline(&self) -> Option<Color> {
        if self.border > 0 {
            self.color
        } else {
            None
        }
    }

    fn draw_symbol(&self, img: &mut RgbaImage, x: i32, y: i32) {
        let d = self.size as i32 / 2;
        let area = Bounds::new(x - d, y - d, x + d + 1, y + d + 1);

        match self.symbol {
            Symbol::Dot => canvas::ellipse(img, area, self.fill, self.outline(), self.border),
            Symbol::Square => canvas::rectangle(img, area, self.fill, self.outline(), self.border),
            Symbol::Triangle => {
                // equilateral, centered on x/y
                let h = self.size as f32;
                let side = h / 60.0_f32.to_radians().sin();
                let (x, y) = (x as f32, y as f32);
                let points = [
                    (x, y - h / 2.0),
                    (x + side / 2.0, y + h / 2.0),
                    (x - side / 2.0, y + h / 2.0),
                ];
                canvas::polygon(img, &points, self.fill, self.outline(), self.border as f32);
            }
        }
    }

    fn draw_label(&self, img: &mut RgbaImage, x: i32, y: i32) {
        let Some(label) = self.label.as_deref().filter(|l| !l.is_empty()) else {
            return;
        };

        let (w, h) = canvas::text_size(label, self.font_size);
        let top = y + self.size as i32 / 2 + 2;
        let left = x - w as i32 / 2;

        match self.label_background {
            Some(bg) => {
                let pad = 2;
                canvas::rectangle(
                    img,
                    Bounds::new(left - pad, top - pad, left + w as i32 + pad, top + h as i32 + pad),
                    Some(bg),
                    None,
                    0,
                );
                canvas::text(img, left, top, label, self.font_size, self.label_color);
            }
            None => canvas::text_outlined(
                img,
                left,
                top,
                label,
                self.font_size,
                self.label_color,
                WHITE,
            ),
        }
    }
}

impl Layer for Placemark {
    fn kind(&self) -> &'static str {
        "placemark"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let (x, y) = rc.to_pixels(self.position.lat, self.position.lng);
        self.draw_symbol(img, x, y);
        self.draw_label(img, x, y);
    }
}

/// An icon image centered on a position.
#[derive(Debug, Clone, PartialEq)]
pub struct IconMarker {
    pub position: LatLng,
    pub icon: Arc<RgbaImage>,
}

impl IconMarker {
    pub fn new(position: LatLng, icon: Arc<RgbaImage>) -> Self {
        Self { position, icon }
    }
}

impl Layer for IconMarker {
    fn kind(&self) -> &'static str {
        "icon"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let (x, y) = rc.to_pixels(self.position.lat, self.position.lng);
        let (w, h) = self.icon.dimensions();
        let left = x as i64 - w as i64 / 2;
        let top = y as i64 - h as i64 / 2;
        canvas::composite(img, &self.icon, left, top);
    }
}
