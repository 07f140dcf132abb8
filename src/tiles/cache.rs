use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::core::tilemap::TileCoord;
use crate::tiles::source::{TileProvider, TileResponse};
use crate::Result;

/// Default number of tiles kept in memory.
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 100;

/// Wraps a tile provider in an in-memory LRU cache.
///
/// Cached tiles are returned without checking for a more recent version.
pub struct MemoryCache {
    inner: Arc<dyn TileProvider>,
    cache: Mutex<LruCache<TileCoord, TileResponse>>,
}

impl MemoryCache {
    /// Create a new memory cache holding up to `size` tiles
    pub fn new(inner: Arc<dyn TileProvider>, size: usize) -> Self {
        let capacity = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Create a new memory cache with default capacity (100 tiles)
    pub fn with_default_capacity(inner: Arc<dyn TileProvider>) -> Self {
        Self::new(inner, DEFAULT_MEMORY_CACHE_SIZE)
    }

    /// Check if a tile is in the cache
    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(coord))
            .unwrap_or(false)
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

#[async_trait]
impl TileProvider for MemoryCache {
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
        let hit = self
            .cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&coord).cloned());
        if let Some(response) = hit {
            return Ok(response);
        }

        let response = self.inner.fetch(coord, etag, cached_only).await?;

        if response.data.is_some() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(coord, response.clone());
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        count: AtomicUsize,
    }

    #[async_trait]
    impl TileProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn url_pattern(&self) -> &str {
            "https://example.com/{z}/{x}/{y}.png"
        }

        fn tile_size(&self) -> u32 {
            256
        }

        async fn fetch(
            &self,
            coord: TileCoord,
            _etag: Option<&str>,
            _cached_only: bool,
        ) -> Result<TileResponse> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(TileResponse::new(Some("e".to_string()), vec![coord.x as u8]))
        }
    }

    fn setup(size: usize) -> (Arc<Counting>, MemoryCache) {
        let inner = Arc::new(Counting {
            count: AtomicUsize::new(0),
        });
        let cache = MemoryCache::new(inner.clone(), size);
        (inner, cache)
    }

    #[tokio::test]
    async fn test_memory_cache_hit() {
        let (inner, cache) = setup(2);
        let coord = TileCoord::new(1, 2, 3);

        assert!(cache.is_empty());
        let first = cache.fetch(coord, None, false).await.unwrap();
        let second = cache.fetch(coord, None, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.count.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&coord));
        assert_eq!(cache.name(), "counting");
    }

    #[tokio::test]
    async fn test_memory_cache_lru_eviction() {
        let (inner, cache) = setup(2);
        let coord1 = TileCoord::new(1, 1, 1);
        let coord2 = TileCoord::new(2, 2, 2);
        let coord3 = TileCoord::new(3, 3, 3);

        cache.fetch(coord1, None, false).await.unwrap();
        cache.fetch(coord2, None, false).await.unwrap();
        // refresh coord1 so coord2 becomes the oldest entry
        cache.fetch(coord1, None, false).await.unwrap();
        cache.fetch(coord3, None, false).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&coord1));
        assert!(!cache.contains(&coord2));
        assert!(cache.contains(&coord3));
        assert_eq!(inner.count.load(Ordering::SeqCst), 3);

        cache.clear();
        assert!(cache.is_empty());
    }
}
