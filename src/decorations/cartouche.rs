use image::RgbaImage;

use crate::core::bounds::Bounds;
use crate::decorations::{Decoration, Placement};
use crate::rendering::canvas::{self, Anchor, Color, HAlign, VAlign, BLACK};

/// A text box, e.g. the title or a comment.
///
/// The box can have a border and a background color. On the margin, the
/// outer margin towards the frame is removed so that the box lines up with
/// the frame edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Cartouche {
    pub text: String,
    pub placement: Placement,
    pub color: Color,
    pub background: Option<Color>,
    pub border_width: u32,
    /// Defaults to the text color.
    pub border_color: Option<Color>,
    pub font_size: f32,
    /// Space around the box: top, right, bottom, left.
    pub margin: (u32, u32, u32, u32),
    /// Space between text and border: top, right, bottom, left.
    pub padding: (u32, u32, u32, u32),
}

impl Cartouche {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            placement: Placement::N,
            color: BLACK,
            background: None,
            border_width: 0,
            border_color: None,
            font_size: 12.0,
            margin: (4, 4, 4, 4),
            padding: (4, 8, 4, 8),
        }
    }

    /// A map title, centered above the map.
    pub fn title(text: impl Into<String>) -> Self {
        Self::new(text).with_font_size(16.0)
    }

    /// A comment below the map, right aligned.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(text).with_placement(Placement::SSE)
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    pub fn with_border(mut self, width: u32, color: Option<Color>) -> Self {
        self.border_width = width;
        self.border_color = color;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Margins with the side facing the frame removed.
    fn masked_margin(&self) -> (u32, u32, u32, u32) {
        let (top, right, bottom, left) = self.margin;
        match self.placement {
            Placement::NNW | Placement::SSW => (top, right, bottom, 0),
            Placement::NNE | Placement::SSE => (top, 0, bottom, left),
            Placement::ENE | Placement::WNW => (0, right, bottom, left),
            Placement::ESE | Placement::WSW => (top, right, 0, left),
            _ => self.margin,
        }
    }

    /// Where the text is attached, pointing towards the map.
    fn anchor(&self) -> Anchor {
        use HAlign::{Left, Right};
        use VAlign::{Bottom, Top};

        let (h, v) = match self.placement {
            Placement::NW => (Right, Bottom),
            Placement::NNW => (Left, Bottom),
            Placement::N => (HAlign::Middle, Bottom),
            Placement::NNE => (Right, Bottom),
            Placement::NE => (Left, Bottom),
            Placement::ENE => (Left, Top),
            Placement::E => (Left, VAlign::Middle),
            Placement::ESE => (Left, Bottom),
            Placement::SE => (Left, Top),
            Placement::SSE => (Right, Top),
            Placement::S => (HAlign::Middle, Top),
            Placement::SSW => (Left, Top),
            Placement::SW => (Right, Top),
            Placement::WSW => (Right, Bottom),
            Placement::W => (Right, VAlign::Middle),
            Placement::WNW => (Right, Top),
            Placement::C => (HAlign::Middle, VAlign::Middle),
        };
        Anchor::new(h, v)
    }
}

impl Decoration for Cartouche {
    fn placement(&self) -> Placement {
        self.placement
    }

    fn calc_size(&self, _map_size: (u32, u32)) -> (u32, u32) {
        if self.is_blank() {
            return (0, 0);
        }

        let (w, h) = canvas::text_size(&self.text, self.font_size);
        let (m_top, m_right, m_bottom, m_left) = self.margin;
        let (p_top, p_right, p_bottom, p_left) = self.padding;
        let border = self.border_width * 2;

        (
            w + m_left + m_right + p_left + p_right + border,
            h + m_top + m_bottom + p_top + p_bottom + border,
        )
    }

    fn draw(&self, img: &mut RgbaImage) {
        if self.is_blank() {
            return;
        }

        let (w, h) = (img.width() as i32, img.height() as i32);
        let (m_top, m_right, m_bottom, m_left) = self.masked_margin();
        let (p_top, p_right, p_bottom, p_left) = self.padding;

        let outline = if self.border_width > 0 {
            Some(self.border_color.unwrap_or(self.color))
        } else {
            None
        };
        canvas::rectangle(
            img,
            Bounds::new(m_left as i32, m_top as i32, w - m_right as i32, h - m_bottom as i32),
            self.background,
            outline,
            self.border_width,
        );

        let anchor = self.anchor();
        let x = match anchor.h {
            HAlign::Left => (p_left + m_left) as i32,
            HAlign::Middle => w / 2,
            HAlign::Right => w - (p_right + m_right) as i32,
        };
        let y = match anchor.v {
            VAlign::Top => (p_top + m_top) as i32,
            VAlign::Middle => h / 2,
            VAlign::Bottom => h - (p_bottom + m_bottom) as i32,
        };
        canvas::text_anchored(img, x, y, anchor, &self.text, self.font_size, self.color);
    }
}
