//! Test tile providers that work without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use mapmaker::{MapError, Result, TileCoord, TileProvider, TileResponse};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn png(size: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(size, size, color);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Serves solid tiles with a fixed ETag and counts requests.
///
/// Answers "not modified" when the ETag matches and fails for zoom levels
/// above `max_zoom`.
pub struct CountingTiles {
    pub color: Rgba<u8>,
    pub etag: String,
    pub max_zoom: u8,
    requests: AtomicUsize,
}

impl CountingTiles {
    pub fn new() -> Self {
        Self {
            color: Rgba([200, 200, 200, 255]),
            etag: "\"v1\"".to_string(),
            max_zoom: 19,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = zoom;
        self
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TileProvider for CountingTiles {
    fn name(&self) -> &str {
        "counting"
    }

    fn url_pattern(&self) -> &str {
        "https://tile.openstreetmap.org/{z}/{x}/{y}.png"
    }

    fn tile_size(&self) -> u32 {
        256
    }

    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        _cached_only: bool,
    ) -> Result<TileResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if coord.z > self.max_zoom {
            return Err(MapError::Http {
                status: 404,
                url: format!("https://example.com/{}", coord),
            });
        }
        if etag == Some(self.etag.as_str()) {
            return Ok(TileResponse::not_modified(Some(self.etag.clone())));
        }
        Ok(TileResponse::new(
            Some(self.etag.clone()),
            png(256, self.color),
        ))
    }
}
