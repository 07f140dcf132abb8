use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::core::tilemap::TileCoord;
use crate::tiles::source::TileProvider;
use crate::{MapError, Result};

/// Downloads a set of tiles with a bounded number of requests in flight.
#[derive(Debug, Clone)]
pub struct TileLoader {
    parallel: usize,
}

impl TileLoader {
    /// Create a loader that runs at most `parallel` requests at a time.
    pub fn new(parallel: usize) -> Self {
        Self {
            parallel: parallel.max(1),
        }
    }

    pub fn parallel(&self) -> usize {
        self.parallel
    }

    /// Fetch all given tiles.
    ///
    /// Tiles are returned in completion order. The first failing tile aborts
    /// the download and its error is returned.
    pub async fn fetch_all(
        &self,
        provider: &dyn TileProvider,
        tiles: Vec<TileCoord>,
    ) -> Result<Vec<(TileCoord, Arc<Vec<u8>>)>> {
        let total = tiles.len();
        log::info!("Download {} tiles (parallel downloads: {})", total, self.parallel);

        let mut downloads = stream::iter(tiles)
            .map(|coord| async move {
                let response = provider.fetch(coord, None, false).await?;
                let data = response
                    .data
                    .ok_or_else(|| MapError::Render(format!("no data for tile {}", coord)))?;
                Ok::<_, MapError>((coord, data))
            })
            .buffer_unordered(self.parallel);

        let mut results = Vec::with_capacity(total);
        while let Some(tile) = downloads.try_next().await? {
            results.push(tile);
            report_progress(results.len(), total);
        }

        Ok(results)
    }
}

impl Default for TileLoader {
    fn default() -> Self {
        Self::new(1)
    }
}

fn report_progress(done: usize, total: usize) {
    let percentage = if total == 0 { 100 } else { done * 100 / total };
    log::info!("{:3}%  {:4} / {:4}", percentage, done, total);
}
