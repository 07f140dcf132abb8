use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use image::imageops::FilterType;
use std::io::Cursor;
use std::sync::Arc;

use crate::core::tilemap::TileCoord;
use crate::tiles::source::{TileProvider, TileResponse};
use crate::Result;

/// Falls back on a lower zoom level if a tile is not available.
///
/// The matching quarter of the parent tile is scaled up to the full tile
/// size. This is done recursively, so a missing tile at zoom 10 may be taken
/// from zoom 8 and scaled by four.
pub struct Fallback {
    inner: Arc<dyn TileProvider>,
}

impl Fallback {
    pub fn new(inner: Arc<dyn TileProvider>) -> Self {
        Self { inner }
    }

    fn fetch_or_parent<'a>(
        &'a self,
        coord: TileCoord,
        etag: Option<&'a str>,
        cached_only: bool,
    ) -> BoxFuture<'a, Result<TileResponse>> {
        async move {
            let err = match self.inner.fetch(coord, etag, cached_only).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let Some((parent, offset)) = coord.parent() else {
                return Err(err);
            };
            log::info!("Use fallback {} => {} after {}", coord, parent, err);

            let response = self.fetch_or_parent(parent, None, cached_only).await?;
            let Some(data) = response.data else {
                return Err(err);
            };

            Ok(TileResponse::new(None, subimage(&data, offset)?))
        }
        .boxed()
    }
}

/// Take one quarter of a tile image and scale it up to the original size.
fn subimage(data: &[u8], offset: (u32, u32)) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)?;
    let (w, h) = (img.width(), img.height());
    let (dx, dy) = offset;

    let quarter = img.crop_imm(w / 2 * dx, h / 2 * dy, (w / 2).max(1), (h / 2).max(1));
    let scaled = quarter.resize_exact(w, h, FilterType::Triangle);

    let mut buf = Cursor::new(Vec::new());
    scaled.write_to(&mut buf, image::ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

#[async_trait]
impl TileProvider for Fallback {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn url_pattern(&self) -> &str {
        self.inner.url_pattern()
    }

    fn host(&self) -> String {
        self.inner.host()
    }

    fn tile_size(&self) -> u32 {
        self.inner.tile_size()
    }

    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        cached_only: bool,
    ) -> Result<TileResponse> {
        self.fetch_or_parent(coord, etag, cached_only).await
    }
}
