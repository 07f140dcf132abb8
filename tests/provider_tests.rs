mod common;

use common::CountingTiles;
use image::Rgba;
use mapmaker::{DiskCache, Fallback, MemoryCache, TileCoord, TileLoader, TileProvider};
use std::sync::Arc;

#[tokio::test]
async fn test_disk_cache_serves_fresh_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(CountingTiles::new());
    let cache = DiskCache::new(service.clone(), dir.path());
    let coord = TileCoord::new(8, 5, 4);

    let first = cache.fetch(coord, None, false).await.unwrap();
    let second = cache.fetch(coord, None, false).await.unwrap();

    assert_eq!(service.requests(), 1);
    assert_eq!(first.data, second.data);
    assert!(dir.path().join("counting").exists());
}

#[tokio::test]
async fn test_disk_cache_revalidates_old_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(CountingTiles::new());
    let cache = DiskCache::new(service.clone(), dir.path()).with_min_hours(0);
    let coord = TileCoord::new(8, 5, 4);

    let first = cache.fetch(coord, None, false).await.unwrap();
    // the service answers "not modified", data comes from disk
    let second = cache.fetch(coord, None, false).await.unwrap();

    assert_eq!(service.requests(), 2);
    assert!(second.data.is_some());
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn test_disk_cache_write_failure_keeps_tile() {
    let dir = tempfile::tempdir().unwrap();
    // a plain file where the cache directory should be
    let base = dir.path().join("not-a-dir");
    std::fs::write(&base, b"").unwrap();

    let service = Arc::new(CountingTiles::new());
    let cache = DiskCache::new(service.clone(), &base).with_limit(Some(10));

    let response = cache.fetch(TileCoord::new(8, 5, 4), None, false).await.unwrap();
    assert!(response.data.is_some());
    assert_eq!(service.requests(), 1);
}

#[tokio::test]
async fn test_memory_cache_in_front_of_disk() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(CountingTiles::new());
    let disk = Arc::new(DiskCache::new(service.clone(), dir.path()).with_min_hours(0));
    let memory = MemoryCache::with_default_capacity(disk);

    for _ in 0..3 {
        memory.fetch(TileCoord::new(1, 1, 1), None, false).await.unwrap();
    }
    assert_eq!(service.requests(), 1);
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn test_fallback_to_lower_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(
        CountingTiles::new()
            .with_max_zoom(2)
            .with_color(Rgba([10, 20, 30, 255])),
    );
    let disk = Arc::new(DiskCache::new(service.clone(), dir.path()));
    let chain = Fallback::new(Arc::new(MemoryCache::with_default_capacity(disk)));

    // zoom 4 and 3 fail, zoom 2 is scaled up twice
    let response = chain.fetch(TileCoord::new(5, 6, 4), None, false).await.unwrap();
    let data = response.data.unwrap();
    let img = image::load_from_memory(&data).unwrap().to_rgba8();

    assert_eq!(img.dimensions(), (256, 256));
    assert_eq!(*img.get_pixel(128, 128), Rgba([10, 20, 30, 255]));
    assert_eq!(service.requests(), 3);
}

#[tokio::test]
async fn test_fallback_gives_up_at_zoom_zero() {
    let service = Arc::new(CountingTiles::new().with_max_zoom(0));
    let chain = Fallback::new(service.clone());

    // zoom 0 always works
    assert!(chain.fetch(TileCoord::new(3, 3, 2), None, false).await.is_ok());

    let broken = Fallback::new(Arc::new(NeverTiles(Arc::new(CountingTiles::new()))));
    assert!(broken.fetch(TileCoord::new(3, 3, 2), None, false).await.is_err());
}

#[tokio::test]
async fn test_loader_fetches_all_tiles() {
    let service = Arc::new(CountingTiles::new());
    let tiles: Vec<TileCoord> = (0..4)
        .flat_map(|x| (0..4).map(move |y| TileCoord::new(x, y, 2)))
        .collect();

    let loaded = TileLoader::new(4)
        .fetch_all(service.as_ref(), tiles.clone())
        .await
        .unwrap();

    assert_eq!(loaded.len(), tiles.len());
    assert_eq!(service.requests(), tiles.len());
    for coord in &tiles {
        assert!(loaded.iter().any(|(c, _)| c == coord));
    }
}

/// Wraps a provider but fails every request.
struct NeverTiles(Arc<CountingTiles>);

#[async_trait::async_trait]
impl TileProvider for NeverTiles {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn url_pattern(&self) -> &str {
        self.0.url_pattern()
    }

    fn tile_size(&self) -> u32 {
        256
    }

    async fn fetch(
        &self,
        coord: TileCoord,
        _etag: Option<&str>,
        _cached_only: bool,
    ) -> mapmaker::Result<mapmaker::TileResponse> {
        Err(mapmaker::MapError::NotCached(coord))
    }
}
