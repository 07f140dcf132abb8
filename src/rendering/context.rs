use image::RgbaImage;
use std::sync::Arc;

use crate::core::bounds::Bounds;
use crate::core::geo::BBox;
use crate::core::tilemap::{TileCoord, TileMap};
use crate::layers::base::Layer;
use crate::rendering::canvas::{self, TRANSPARENT};
use crate::tiles::loader::TileLoader;
use crate::tiles::source::TileProvider;
use crate::{MapError, Result};

/// Renders a map, downloading the required tiles on the fly.
///
/// The tile size starts with the size configured for the service and is
/// replaced by the actual size once the first tile is decoded.
pub struct RenderContext {
    provider: Arc<dyn TileProvider>,
    map: TileMap,
    overlays: Vec<Box<dyn Layer>>,
    loader: TileLoader,
    tile_size: (u32, u32),
}

impl RenderContext {
    pub fn new(provider: Arc<dyn TileProvider>, map: TileMap) -> Self {
        let size = provider.tile_size();
        Self {
            provider,
            map,
            overlays: Vec::new(),
            loader: TileLoader::new(1),
            tile_size: (size, size),
        }
    }

    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.loader = TileLoader::new(parallel);
        self
    }

    pub fn with_overlay(mut self, layer: Box<dyn Layer>) -> Self {
        self.overlays.push(layer);
        self
    }

    pub fn add_overlay(&mut self, layer: Box<dyn Layer>) {
        self.overlays.push(layer);
    }

    pub fn provider(&self) -> &Arc<dyn TileProvider> {
        &self.provider
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.map
    }

    /// The map's bounding box.
    pub fn bbox(&self) -> &BBox {
        &self.map.bbox
    }

    pub fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    pub fn parallel_downloads(&self) -> usize {
        self.loader.parallel()
    }

    /// Convert lat/lon to pixels on the stitched map image.
    pub fn to_pixels(&self, lat: f64, lon: f64) -> (i32, i32) {
        let (fx, fy) = self.map.to_pixel_fractions(lat, lon);
        let (w, h) = self.tile_size;
        ((fx * w as f64).ceil() as i32, (fy * h as f64).ceil() as i32)
    }

    /// Like [`RenderContext::to_pixels`] but as floats for drawing.
    pub fn to_pixels_f(&self, lat: f64, lon: f64) -> (f32, f32) {
        let (x, y) = self.to_pixels(lat, lon);
        (x as f32, y as f32)
    }

    /// Crop box of the bounding box within the stitched map image.
    pub fn crop_box(&self) -> Bounds {
        let bbox = &self.map.bbox;
        let (left, bottom) = self.to_pixels(bbox.minlat, bbox.minlon);
        let (right, top) = self.to_pixels(bbox.maxlat, bbox.maxlon);
        Bounds::new(left, top, right, bottom)
    }

    /// Download all tiles and render them into an image, cropped to the
    /// bounding box.
    pub async fn build(&mut self) -> Result<RgbaImage> {
        let tiles: Vec<TileCoord> = self.map.tiles().collect();
        let downloaded = self.loader.fetch_all(self.provider.as_ref(), tiles).await?;
        log::info!("Download complete, create map image");

        let mut img = self.stitch(downloaded)?;

        if !self.overlays.is_empty() {
            log::info!("Draw {} overlays", self.overlays.len());
            self.draw_overlays(&mut img);
        }

        self.crop(&img)
    }

    /// Decode tiles and paste them onto one image.
    pub fn stitch(&mut self, tiles: Vec<(TileCoord, Arc<Vec<u8>>)>) -> Result<RgbaImage> {
        let mut decoded = Vec::with_capacity(tiles.len());
        for (coord, data) in tiles {
            let tile = image::load_from_memory(&data)?.to_rgba8();
            decoded.push((coord, tile));
        }

        // assume that all tiles have the same size
        if let Some((_, first)) = decoded.first() {
            self.tile_size = first.dimensions();
        }

        let (w, h) = self.tile_size;
        let (width, height) = w
            .checked_mul(self.map.columns())
            .zip(h.checked_mul(self.map.rows()))
            .ok_or_else(|| {
                MapError::Render(format!(
                    "map of {}x{} tiles is too large",
                    self.map.columns(),
                    self.map.rows()
                ))
            })?;
        let mut img = RgbaImage::from_pixel(width, height, TRANSPARENT);
        for (coord, tile) in &decoded {
            let left = (coord.x - self.map.ax) as i64 * w as i64;
            let top = (coord.y - self.map.ay) as i64 * h as i64;
            canvas::paste(&mut img, tile, left, top);
        }

        Ok(img)
    }

    /// Draw each overlay on its own transparent layer and blend it onto
    /// the map.
    pub fn draw_overlays(&self, img: &mut RgbaImage) {
        for layer in &self.overlays {
            let mut overlay = RgbaImage::from_pixel(img.width(), img.height(), TRANSPARENT);
            layer.draw(self, &mut overlay);
            canvas::composite(img, &overlay, 0, 0);
        }
    }

    fn crop(&self, img: &RgbaImage) -> Result<RgbaImage> {
        let full = Bounds::from_size(0, 0, img.width(), img.height());
        let crop = self
            .crop_box()
            .intersection(&full)
            .ok_or_else(|| MapError::Render("bounding box is empty".to_string()))?;

        Ok(image::imageops::crop_imm(
            img,
            crop.left as u32,
            crop.top as u32,
            crop.width(),
            crop.height(),
        )
        .to_image())
    }
}
