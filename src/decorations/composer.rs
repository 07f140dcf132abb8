use image::RgbaImage;

use crate::core::bounds::Bounds;
use crate::decorations::{Area, Decoration, Frame, Placement};
use crate::rendering::canvas::{self, Color, TRANSPARENT, WHITE};
use crate::rendering::context::RenderContext;
use crate::{MapError, Result};

/// Composes the map image with margin, frame and decorations.
///
/// Margin decorations enlarge the margin on their side as needed and are
/// aligned with the frame edges. Map decorations are placed on a 3x3 grid
/// over the map content.
pub struct Composer {
    background: Color,
    /// top, right, bottom, left
    margins: (u32, u32, u32, u32),
    frame: Option<Frame>,
    map_decorations: Vec<Box<dyn Decoration>>,
    margin_decorations: Vec<Box<dyn Decoration>>,
}

impl Default for Composer {
    fn default() -> Self {
        Self {
            background: WHITE,
            margins: (0, 0, 0, 0),
            frame: None,
            map_decorations: Vec::new(),
            margin_decorations: Vec::new(),
        }
    }
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Background color of the margin.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// White space around the map, extended for margin decorations.
    pub fn set_margin(&mut self, top: u32, right: u32, bottom: u32, left: u32) {
        self.margins = (top, right, bottom, left);
    }

    pub fn margins(&self) -> (u32, u32, u32, u32) {
        self.margins
    }

    /// A frame with zero width removes the frame.
    pub fn set_frame(&mut self, frame: Option<Frame>) {
        self.frame = frame.filter(|f| f.width > 0);
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Add a decoration to an area. The placement must be a slot of that
    /// area.
    pub fn add_decoration(&mut self, area: Area, decoration: Box<dyn Decoration>) -> Result<()> {
        let placement = decoration.placement();
        if !area.accepts(placement) {
            return Err(MapError::Render(format!(
                "invalid placement {} for area {}",
                placement, area
            )));
        }

        match area {
            Area::Map => self.map_decorations.push(decoration),
            Area::Margin => self.margin_decorations.push(decoration),
        }
        Ok(())
    }

    pub fn decorations(&self, area: Area) -> &[Box<dyn Decoration>] {
        match area {
            Area::Map => &self.map_decorations,
            Area::Margin => &self.margin_decorations,
        }
    }

    fn frame_width(&self) -> u32 {
        self.frame.as_ref().map_or(0, |f| f.width)
    }

    /// Margins including the space for margin decorations.
    pub fn calc_margins(&self, map_size: (u32, u32)) -> (u32, u32, u32, u32) {
        let (mut top, mut right, mut bottom, mut left) = (0, 0, 0, 0);

        for deco in &self.margin_decorations {
            let (w, h) = deco.calc_size(map_size);
            let placement = deco.placement();
            if placement.is_northern() {
                top = top.max(h);
            } else if placement.is_southern() {
                bottom = bottom.max(h);
            }

            if placement.is_western() {
                left = left.max(w);
            } else if placement.is_eastern() {
                right = right.max(w);
            }
        }

        let (m_top, m_right, m_bottom, m_left) = self.margins;
        (top + m_top, right + m_right, bottom + m_bottom, left + m_left)
    }

    /// Top left position of a margin decoration in the final image.
    pub fn calc_margin_pos(
        placement: Placement,
        img_size: (u32, u32),
        frame_box: Bounds,
        deco_size: (u32, u32),
    ) -> (i32, i32) {
        let (total_w, total_h) = (img_size.0 as i32, img_size.1 as i32);
        let (deco_w, deco_h) = (deco_size.0 as i32, deco_size.1 as i32);

        let y = match placement {
            p if p.is_northern() => frame_box.top - deco_h,
            p if p.is_southern() => frame_box.bottom,
            Placement::WNW | Placement::ENE => frame_box.top,
            Placement::WSW | Placement::ESE => frame_box.bottom - deco_h,
            _ => total_h / 2 - deco_h / 2,
        };

        let x = match placement {
            p if p.is_western() => frame_box.left - deco_w,
            p if p.is_eastern() => frame_box.right,
            Placement::NNW | Placement::SSW => frame_box.left,
            Placement::NNE | Placement::SSE => frame_box.right - deco_w,
            _ => total_w / 2 - deco_w / 2,
        };

        (x, y)
    }

    /// Top left position of a decoration on the map content.
    pub fn calc_map_pos(placement: Placement, map_box: Bounds, deco_size: (u32, u32)) -> (i32, i32) {
        let (deco_w, deco_h) = (deco_size.0 as i32, deco_size.1 as i32);
        let (map_w, map_h) = (map_box.width() as i32, map_box.height() as i32);

        let y = if placement.is_northern() {
            map_box.top
        } else if placement.is_southern() {
            map_box.bottom - deco_h
        } else {
            map_box.top + map_h / 2 - deco_h / 2
        };

        let x = if placement.is_western() {
            map_box.left
        } else if placement.is_eastern() {
            map_box.right - deco_w
        } else {
            map_box.left + map_w / 2 - deco_w / 2
        };

        (x, y)
    }

    /// Create the final image from the rendered map.
    pub fn build(&self, rc: &RenderContext, map_img: &RgbaImage) -> RgbaImage {
        let (map_w, map_h) = map_img.dimensions();
        let (top, right, bottom, left) = self.calc_margins((map_w, map_h));
        let fw = self.frame_width();

        let w = left + map_w + right + 2 * fw;
        let h = top + map_h + bottom + 2 * fw;

        let mut base = RgbaImage::from_pixel(w, h, self.background);

        let map_box = Bounds::from_size((left + fw) as i32, (top + fw) as i32, map_w, map_h);
        log::debug!(
            "Compose map {}x{}, margins {:?}, frame {}, image {}x{}",
            map_w,
            map_h,
            (top, right, bottom, left),
            fw,
            w,
            h
        );
        canvas::paste(&mut base, map_img, map_box.left as i64, map_box.top as i64);

        let frame_box = match &self.frame {
            Some(frame) => {
                let (frame_w, frame_h) = (map_w + 2 * fw, map_h + 2 * fw);
                let mut frame_img = RgbaImage::from_pixel(frame_w, frame_h, TRANSPARENT);
                frame.draw(rc, &mut frame_img);
                canvas::composite(&mut base, &frame_img, left as i64, top as i64);
                Bounds::from_size(left as i32, top as i32, frame_w, frame_h)
            }
            None => map_box,
        };

        for area in [Area::Map, Area::Margin] {
            for deco in self.decorations(area) {
                let size = deco.calc_size((map_w, map_h));
                if size.0 == 0 || size.1 == 0 {
                    continue;
                }

                let (x, y) = match area {
                    Area::Map => Self::calc_map_pos(deco.placement(), map_box, size),
                    Area::Margin => Self::calc_margin_pos(deco.placement(), (w, h), frame_box, size),
                };

                let mut deco_img = RgbaImage::from_pixel(size.0, size.1, TRANSPARENT);
                deco.draw(&mut deco_img);
                canvas::composite(&mut base, &deco_img, x as i64, y as i64);
            }
        }

        base
    }
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("background", &self.background)
            .field("margins", &self.margins)
            .field("frame", &self.frame)
            .field("map_decorations", &self.map_decorations.len())
            .field("margin_decorations", &self.margin_decorations.len())
            .finish()
    }
}
