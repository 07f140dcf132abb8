//! Helpers shared by unit tests.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

use crate::core::geo::BBox;
use crate::core::tilemap::{TileCoord, TileMap};
use crate::rendering::canvas::TRANSPARENT;
use crate::rendering::context::RenderContext;
use crate::tiles::source::{TileProvider, TileResponse};
use crate::Result;

/// Serves single-colored PNG tiles without network access.
pub(crate) struct SolidTiles {
    pub size: u32,
    pub color: Rgba<u8>,
}

impl SolidTiles {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            color: Rgba([200, 200, 200, 255]),
        }
    }
}

#[async_trait]
impl TileProvider for SolidTiles {
    fn name(&self) -> &str {
        "solid"
    }

    fn url_pattern(&self) -> &str {
        "https://tile.openstreetmap.org/{z}/{x}/{y}.png"
    }

    fn tile_size(&self) -> u32 {
        self.size
    }

    async fn fetch(
        &self,
        _coord: TileCoord,
        _etag: Option<&str>,
        _cached_only: bool,
    ) -> Result<TileResponse> {
        let img = RgbaImage::from_pixel(self.size, self.size, self.color);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Png)?;
        Ok(TileResponse::new(Some("solid".to_string()), buf.into_inner()))
    }
}

/// A render context over a small area near Garmisch at zoom 12.
pub(crate) fn render_context() -> RenderContext {
    let bbox = BBox::new(47.374, 10.953, 47.437, 11.133).unwrap();
    let map = TileMap::from_bbox(&bbox, 12).unwrap();
    RenderContext::new(Arc::new(SolidTiles::new(256)), map)
}

/// A transparent image the size of the stitched map of `rc`.
pub(crate) fn map_image(rc: &RenderContext) -> RgbaImage {
    let (w, h) = rc.tile_size();
    let map = rc.tile_map();
    RgbaImage::from_pixel(w * map.columns(), h * map.rows(), TRANSPARENT)
}
