use image::RgbaImage;

use crate::decorations::{Decoration, Placement};
use crate::rendering::canvas::{self, Anchor, Color, HAlign, VAlign, BLACK};

/// An arrow pointing north with an optional "N" marker at its tip.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassRose {
    pub placement: Placement,
    pub color: Color,
    pub outline: Option<Color>,
    pub marker: bool,
    /// Space around the arrow: top, right, bottom, left.
    pub margin: (u32, u32, u32, u32),
}

impl Default for CompassRose {
    fn default() -> Self {
        Self {
            placement: Placement::SE,
            color: BLACK,
            outline: None,
            marker: false,
            margin: (12, 12, 12, 12),
        }
    }
}

impl CompassRose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_outline(mut self, outline: Option<Color>) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    /// Corners of the arrow within a `w` x `h` box.
    ///
    /// ```text
    ///        a
    ///       /\
    ///     /    \      <- head
    ///   b --  -- c
    ///      d||e
    ///       ||        <- tail
    ///     f  i  g
    /// ```
    fn arrow(w: i32, h: i32) -> [(i32, i32); 8] {
        let head_h = (h as f64 / 2.2).floor() as i32;
        let tail_h = h - head_h;
        let tail_w = w / 4;

        let a = (w / 2, 0);
        // outer points pulled down
        let b = (0, head_h + head_h / 4);
        let c = (w, b.1);
        let d = (w / 2 - tail_w / 2, head_h);
        let e = (w / 2 + tail_w / 2, head_h);
        // base of the tail a bit wider
        let f = (tail_w - tail_w / 6, h);
        let g = (w - tail_w + tail_w / 6, h);
        // base line pulled inwards
        let i = (w / 2, h - tail_h / 3);

        [a, c, e, g, i, f, d, b]
    }
}

impl Decoration for CompassRose {
    fn placement(&self) -> Placement {
        self.placement
    }

    fn calc_size(&self, map_size: (u32, u32)) -> (u32, u32) {
        let (map_w, map_h) = map_size;
        let (m_top, m_right, m_bottom, m_left) = self.margin;
        let w = (map_w as f64 * 0.05) as u32;
        let h = (map_h as f64 * 0.1) as u32;
        (w + m_left + m_right, h + m_top + m_bottom)
    }

    fn draw(&self, img: &mut RgbaImage) {
        let (size_w, size_h) = (img.width() as i32, img.height() as i32);
        let (m_top, m_right, m_bottom, m_left) = self.margin;
        let w = size_w - (m_left + m_right) as i32;
        let mut h = size_h - (m_top + m_bottom) as i32;

        let font_size = (size_h / 5) as f32;
        let (mut marker_h, mut marker_pad) = (0, 0);
        if self.marker {
            marker_h = canvas::text_size("N", font_size).1 as i32;
            marker_pad = marker_h / 16;
            h -= marker_h + marker_pad;
        }
        if w <= 0 || h <= 0 {
            return;
        }

        let x_offset = m_left as i32;
        let y_offset = m_top as i32 + marker_h + marker_pad;
        let points: Vec<(f32, f32)> = Self::arrow(w, h)
            .iter()
            .map(|&(x, y)| ((x + x_offset) as f32, (y + y_offset) as f32))
            .collect();
        canvas::polygon(img, &points, Some(self.color), self.outline, 1.0);

        if self.marker {
            let (tw, th) = canvas::text_size("N", font_size);
            let (left, top) =
                Anchor::new(HAlign::Middle, VAlign::Top).top_left(size_w / 2, m_top as i32, tw, th);
            match self.outline {
                Some(stroke) => {
                    canvas::text_outlined(img, left, top, "N", font_size, self.color, stroke)
                }
                None => canvas::text(img, left, top, "N", font_size, self.color),
            }
        }
    }
}
