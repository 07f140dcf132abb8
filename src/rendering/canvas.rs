//! Drawing primitives on RGBA images.
//!
//! All primitives overwrite pixels. To blend semi-transparent colors, draw on
//! a transparent layer and [`composite`] it onto the target.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut,
    draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use once_cell::sync::OnceCell;
use rusttype::{point, Font, Scale};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::bounds::Bounds;

/// An RGBA color.
pub type Color = Rgba<u8>;

pub const BLACK: Color = Rgba([0, 0, 0, 255]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Well-known locations of the DejaVu Sans font.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\DejaVuSans.ttf",
];

static FONT: OnceCell<Option<Arc<Font<'static>>>> = OnceCell::new();

/// Select the font used for all text.
///
/// Must be called before the first text is measured or drawn; later calls
/// have no effect. Returns whether a font is available.
pub fn init_font(configured: Option<&Path>) -> bool {
    FONT.get_or_init(|| load_font(configured)).is_some()
}

/// The font used for text, `None` if no font could be loaded.
pub fn font() -> Option<Arc<Font<'static>>> {
    FONT.get_or_init(|| load_font(None)).clone()
}

fn load_font(configured: Option<&Path>) -> Option<Arc<Font<'static>>> {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_PATHS.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(data) = std::fs::read(&path) else {
            continue;
        };
        match Font::try_from_vec(data) {
            Some(font) => {
                log::debug!("Use font {}", path.display());
                return Some(Arc::new(font));
            }
            None => log::warn!("Not a usable font: {}", path.display()),
        }
    }

    log::warn!("No font found, text will not be drawn");
    None
}

/// Width and height of the given text in pixels.
///
/// The height is the line height of the font. Without a font, the size is
/// zero.
pub fn text_size(text: &str, font_size: f32) -> (u32, u32) {
    match font() {
        Some(font) => measure(&font, text, font_size),
        None => (0, 0),
    }
}

fn measure(font: &Font<'_>, text: &str, font_size: f32) -> (u32, u32) {
    let scale = Scale::uniform(font_size);
    let metrics = font.v_metrics(scale);
    let height = (metrics.ascent - metrics.descent).ceil().max(0.0) as u32;

    let width = font
        .layout(text, scale, point(0.0, metrics.ascent))
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .fold(0.0_f32, f32::max)
        .ceil() as u32;

    (width, height)
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Middle,
    Right,
}

/// Vertical text anchor: top of the line, middle or bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Where a text is attached to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub h: HAlign,
    pub v: VAlign,
}

impl Anchor {
    pub const fn new(h: HAlign, v: VAlign) -> Self {
        Self { h, v }
    }

    /// Top left position of a `(width, height)` box attached at `(x, y)`.
    pub fn top_left(&self, x: i32, y: i32, width: u32, height: u32) -> (i32, i32) {
        let left = match self.h {
            HAlign::Left => x,
            HAlign::Middle => x - width as i32 / 2,
            HAlign::Right => x - width as i32,
        };
        let top = match self.v {
            VAlign::Top => y,
            VAlign::Middle => y - height as i32 / 2,
            VAlign::Bottom => y - height as i32,
        };
        (left, top)
    }
}

/// Draw text with its top left corner at `(x, y)`.
pub fn text(img: &mut RgbaImage, x: i32, y: i32, content: &str, font_size: f32, color: Color) {
    if content.is_empty() {
        return;
    }
    if let Some(font) = font() {
        draw_text_mut(img, color, x, y, Scale::uniform(font_size), &font, content);
    }
}

/// Draw text attached to `(x, y)` with the given anchor.
pub fn text_anchored(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    anchor: Anchor,
    content: &str,
    font_size: f32,
    color: Color,
) {
    let (w, h) = text_size(content, font_size);
    let (left, top) = anchor.top_left(x, y, w, h);
    text(img, left, top, content, font_size, color);
}

/// Draw text with a one pixel outline in `stroke` color.
pub fn text_outlined(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    content: &str,
    font_size: f32,
    color: Color,
    stroke: Color,
) {
    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1), (-1, 1), (1, -1)] {
        text(img, x + dx, y + dy, content, font_size, stroke);
    }
    text(img, x, y, content, font_size, color);
}

/// Fill a polygon.
///
/// Degenerate polygons (fewer than three distinct points) are skipped.
pub fn fill_polygon(img: &mut RgbaImage, points: &[(f32, f32)], color: Color) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    draw_polygon_mut(img, &poly, color);
}

/// Draw a polyline of the given width with round joints.
pub fn line(img: &mut RgbaImage, points: &[(f32, f32)], color: Color, width: f32) {
    if points.is_empty() || width <= 0.0 {
        return;
    }

    if width <= 1.0 {
        for pair in points.windows(2) {
            draw_line_segment_mut(img, pair[0], pair[1], color);
        }
        return;
    }

    let half = width / 2.0;
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        // perpendicular offset
        let (ox, oy) = (-dy / len * half, dx / len * half);
        fill_polygon(
            img,
            &[
                (x0 + ox, y0 + oy),
                (x1 + ox, y1 + oy),
                (x1 - ox, y1 - oy),
                (x0 - ox, y0 - oy),
            ],
            color,
        );
    }

    // round joints and caps
    let radius = (half - 0.5).max(0.0).round() as i32;
    if radius > 0 {
        for &(x, y) in points {
            draw_filled_circle_mut(img, (x.round() as i32, y.round() as i32), radius, color);
        }
    }
}

/// Draw a closed polygon with optional fill and outline.
pub fn polygon(
    img: &mut RgbaImage,
    points: &[(f32, f32)],
    fill: Option<Color>,
    outline: Option<Color>,
    width: f32,
) {
    if let Some(fill) = fill {
        fill_polygon(img, points, fill);
    }
    if let (Some(outline), Some(first)) = (outline, points.first()) {
        let mut closed = points.to_vec();
        closed.push(*first);
        line(img, &closed, outline, width.max(1.0));
    }
}

/// Draw a rectangle with optional fill and an outline of `width` pixels
/// inside the bounds.
pub fn rectangle(
    img: &mut RgbaImage,
    bounds: Bounds,
    fill: Option<Color>,
    outline: Option<Color>,
    width: u32,
) {
    if bounds.is_empty() {
        return;
    }

    if let Some(fill) = fill {
        draw_filled_rect_mut(img, to_rect(bounds), fill);
    }

    if let Some(outline) = outline {
        for i in 0..width as i32 {
            let inner = Bounds::new(
                bounds.left + i,
                bounds.top + i,
                bounds.right - i,
                bounds.bottom - i,
            );
            if bounds.right - i <= bounds.left + i || bounds.bottom - i <= bounds.top + i {
                break;
            }
            draw_hollow_rect_mut(img, to_rect(inner), outline);
        }
    }
}

/// Draw an ellipse inside the given bounds.
pub fn ellipse(
    img: &mut RgbaImage,
    bounds: Bounds,
    fill: Option<Color>,
    outline: Option<Color>,
    width: u32,
) {
    let cx = (bounds.left + bounds.right) / 2;
    let cy = (bounds.top + bounds.bottom) / 2;
    let rx = bounds.width() as i32 / 2;
    let ry = bounds.height() as i32 / 2;
    if rx <= 0 || ry <= 0 {
        return;
    }

    if let Some(fill) = fill {
        draw_filled_ellipse_mut(img, (cx, cy), rx, ry, fill);
    }
    if let Some(outline) = outline {
        for i in 0..width as i32 {
            if rx - i <= 0 || ry - i <= 0 {
                break;
            }
            draw_hollow_ellipse_mut(img, (cx, cy), rx - i, ry - i, outline);
        }
    }
}

/// Alpha-composite `layer` onto `img` at the given position.
///
/// Source-over blending; opaque pixels stay opaque.
pub fn composite(img: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for (lx, ly, src) in layer.enumerate_pixels() {
        let (dx, dy) = (x + lx as i64, y + ly as i64);
        if src[3] == 0 || dx < 0 || dy < 0 || dx >= w || dy >= h {
            continue;
        }
        let dst = img.get_pixel_mut(dx as u32, dy as u32);
        *dst = blend(*dst, *src);
    }
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa;
        (v + 0.5).clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (oa * 255.0 + 0.5).clamp(0.0, 255.0) as u8,
    ])
}

/// Copy `src` onto `img` at the given position, replacing pixels.
pub fn paste(img: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    image::imageops::replace(img, src, x, y);
}

fn to_rect(bounds: Bounds) -> Rect {
    Rect::at(bounds.left, bounds.top).of_size(bounds.width(), bounds.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, TRANSPARENT)
    }

    #[test]
    fn test_thick_line() {
        let mut img = blank(20, 20);
        line(&mut img, &[(2.0, 10.0), (18.0, 10.0)], BLACK, 4.0);
        assert_eq!(*img.get_pixel(10, 10), BLACK);
        assert_eq!(*img.get_pixel(10, 9), BLACK);
        assert_eq!(*img.get_pixel(10, 2), TRANSPARENT);
    }

    #[test]
    fn test_thin_line() {
        let mut img = blank(10, 10);
        line(&mut img, &[(0.0, 0.0), (9.0, 9.0)], BLACK, 1.0);
        assert_eq!(*img.get_pixel(5, 5), BLACK);
        assert_eq!(*img.get_pixel(0, 9), TRANSPARENT);
    }

    #[test]
    fn test_degenerate_polygon_skipped() {
        let mut img = blank(10, 10);
        fill_polygon(&mut img, &[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)], BLACK);
        fill_polygon(&mut img, &[(1.0, 1.0), (5.0, 5.0), (1.0, 1.0)], BLACK);
        fill_polygon(&mut img, &[], BLACK);
        assert!(img.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_closed_polygon() {
        let mut img = blank(10, 10);
        fill_polygon(
            &mut img,
            &[(1.0, 1.0), (8.0, 1.0), (8.0, 8.0), (1.0, 8.0), (1.0, 1.0)],
            BLACK,
        );
        assert_eq!(*img.get_pixel(4, 4), BLACK);
    }

    #[test]
    fn test_rectangle_outline() {
        let mut img = blank(10, 10);
        rectangle(&mut img, Bounds::new(0, 0, 10, 10), Some(WHITE), Some(BLACK), 2);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
        assert_eq!(*img.get_pixel(1, 5), BLACK);
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(9, 9), BLACK);
    }

    #[test]
    fn test_ellipse() {
        let mut img = blank(20, 20);
        ellipse(&mut img, Bounds::new(0, 0, 20, 20), Some(BLACK), None, 0);
        assert_eq!(*img.get_pixel(10, 10), BLACK);
        assert_eq!(*img.get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_composite_blends() {
        let mut img = RgbaImage::from_pixel(2, 2, WHITE);
        let layer = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128]));
        composite(&mut img, &layer, 0, 0);
        let p = img.get_pixel(0, 0);
        assert!(p[0] > 100 && p[0] < 150);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_composite_keeps_opaque_and_clips() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([200, 200, 200, 255]));
        let mut layer = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 1]));
        layer.put_pixel(3, 3, Rgba([255, 0, 0, 254]));
        composite(&mut img, &layer, -1, -1);

        assert!(img.pixels().all(|p| p[3] == 255));
        assert_eq!(*img.get_pixel(3, 3), Rgba([200, 200, 200, 255]));
        let p = img.get_pixel(2, 2);
        assert_eq!((p[0], p[3]), (255, 255));
        assert!(p[1] < 2);

        let mut clear = blank(2, 2);
        composite(&mut clear, &RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128])), 0, 0);
        assert_eq!(*clear.get_pixel(1, 1), Rgba([0, 0, 0, 128]));
    }

    #[test]
    fn test_anchor() {
        let anchor = Anchor::new(HAlign::Middle, VAlign::Bottom);
        assert_eq!(anchor.top_left(50, 50, 20, 10), (40, 40));
        let anchor = Anchor::new(HAlign::Right, VAlign::Top);
        assert_eq!(anchor.top_left(50, 50, 20, 10), (30, 50));
    }

    #[test]
    fn test_text_size_empty() {
        assert_eq!(text_size("", 12.0).0, 0);
    }
}
