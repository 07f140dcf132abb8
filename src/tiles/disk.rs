//! File system cache for map tiles.
//!
//! Layout below the base directory:
//!
//! ```text
//! <service>/<zz>/<xxxxxx>/<yyyyyy>.<base64url(etag)>.png
//! ```
//!
//! The ETag of the server response is kept in the file name and used for
//! `If-None-Match` requests. The file's mtime decides whether a tile is
//! used without asking the server at all.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use walkdir::WalkDir;

use crate::core::config::{CacheConfig, Config};
use crate::core::tilemap::TileCoord;
use crate::tiles::source::{TileProvider, TileResponse};
use crate::{MapError, Result};

/// Wraps a tile provider in a file system cache.
///
/// Downloaded tiles are stored when the response carries an ETag. If a size
/// `limit` is set, the oldest files are deleted once the cache grows beyond
/// it.
pub struct DiskCache {
    inner: Arc<dyn TileProvider>,
    base: PathBuf,
    limit: Option<u64>,
    min_age: Duration,
    vacuum_lock: Mutex<()>,
}

impl DiskCache {
    pub fn new(inner: Arc<dyn TileProvider>, base: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            base: base.into(),
            limit: None,
            min_age: Duration::from_secs(24 * 3600),
            vacuum_lock: Mutex::new(()),
        }
    }

    /// Cache in the platform's user cache directory.
    pub fn user_dir(inner: Arc<dyn TileProvider>) -> Result<Self> {
        let base = Config::default_cache_dir()
            .ok_or_else(|| MapError::Config("no cache directory available".to_string()))?;
        Ok(Self::new(inner, base))
    }

    /// Limit the total size of all cached files, in bytes.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Use cached tiles younger than `hours` without revalidation.
    pub fn with_min_hours(mut self, hours: u64) -> Self {
        self.min_age = Duration::from_secs(hours * 3600);
        self
    }

    /// Apply the `[cache]` settings of the configuration.
    pub fn with_config(self, config: &CacheConfig) -> Self {
        self.with_limit(config.limit.and_then(|l| u64::try_from(l).ok()))
            .with_min_hours(config.min_hours)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn tile_dir(&self, coord: TileCoord) -> PathBuf {
        self.base
            .join(self.inner.name())
            .join(format!("{:02}", coord.z))
            .join(format!("{:06}", coord.x))
    }

    fn path(&self, coord: TileCoord, etag: &str) -> PathBuf {
        self.tile_dir(coord).join(file_name(coord.y, etag))
    }

    /// Find the cache entry for a tile, returning its etag and mtime.
    async fn find(&self, coord: TileCoord) -> Option<(String, SystemTime)> {
        let prefix = format!("{:06}.", coord.y);
        let mut entries = tokio::fs::read_dir(self.tile_dir(coord)).await.ok()?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            // unexpected file names are skipped
            if let (Some(etag), Ok(mtime)) = (etag_from_name(name), meta.modified()) {
                return Some((etag, mtime));
            }
        }

        None
    }

    async fn read(&self, coord: TileCoord, etag: &str) -> Option<Vec<u8>> {
        if etag.is_empty() {
            return None;
        }
        tokio::fs::read(self.path(coord, etag)).await.ok()
    }

    async fn put(&self, coord: TileCoord, response: &TileResponse) -> Result<()> {
        let (Some(etag), Some(data)) = (response.etag.as_deref(), response.data.as_ref()) else {
            return Ok(());
        };
        if etag.is_empty() {
            return Ok(());
        }

        let path = self.path(coord, etag);
        if tokio::fs::metadata(&path).await.is_ok() {
            return Ok(());
        }

        // remove the outdated entry for this tile
        if let Some((existing, _)) = self.find(coord).await {
            if existing != etag {
                if let Err(e) = tokio::fs::remove_file(self.path(coord, &existing)).await {
                    log::debug!("Failed to remove outdated entry for {}: {}", coord, e);
                }
            }
        }

        tokio::fs::create_dir_all(self.tile_dir(coord)).await?;
        tokio::fs::write(&path, data.as_slice()).await?;
        log::debug!("Cached tile {} at {}", coord, path.display());

        self.vacuum().await
    }

    /// Trim the cache below its size limit, deleting older tiles first.
    pub async fn vacuum(&self) -> Result<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };

        let _guard = self.vacuum_lock.lock().await;
        let base = self.base.clone();
        tokio::task::spawn_blocking(move || trim(cache_entries(&base), limit))
            .await
            .map_err(|e| MapError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        Ok(())
    }
}

/// All cached files as (mtime, size, path).
fn cache_entries(base: &Path) -> Vec<(SystemTime, u64, PathBuf)> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(base).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((mtime, meta.len(), entry.into_path()));
    }
    entries
}

/// Delete the oldest entries until `limit` is met. Returns the number of
/// deleted files.
///
/// Files that vanished in the meantime count as deleted, other failures are
/// logged and skipped.
fn trim(mut entries: Vec<(SystemTime, u64, PathBuf)>, limit: u64) -> usize {
    let used: u64 = entries.iter().map(|(_, size, _)| size).sum();
    if used <= limit {
        return 0;
    }

    // delete some extra entries to avoid frequent deletes
    let mut excess = ((used - limit) as f64 * 1.1) as i64;
    log::debug!("Cache uses {} bytes, limit is {}", used, limit);

    entries.sort();
    let mut deleted = 0;
    for (_, size, path) in entries {
        match std::fs::remove_file(&path) {
            Ok(()) => deleted += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                log::warn!("Failed to remove {} from cache: {}", path.display(), e);
                continue;
            }
        }
        excess -= size as i64;
        if excess <= 0 {
            break;
        }
    }

    deleted
}

fn file_name(y: u32, etag: &str) -> String {
    format!("{:06}.{}.png", y, URL_SAFE.encode(etag.as_bytes()))
}

fn etag_from_name(name: &str) -> Option<String> {
    let safe = name.split('.').nth(1)?;
    let raw = URL_SAFE.decode(safe).ok()?;
    String::from_utf8(raw).ok()
}

#[async_trait]
impl TileProvider for DiskCache {
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

    /// Serve the tile from the cache if possible, else from the wrapped
    /// provider. With `cached_only`, a tile is only returned if it is young
    /// enough to skip revalidation.
    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        cached_only: bool,
    ) -> Result<TileResponse> {
        let etag = match etag {
            Some(etag) => Some(etag.to_string()),
            None => match self.find(coord).await {
                Some((etag, mtime)) => {
                    let age = SystemTime::now().duration_since(mtime).unwrap_or_default();
                    if age < self.min_age {
                        if let Some(data) = self.read(coord, &etag).await {
                            return Ok(TileResponse::new(Some(etag), data));
                        }
                    }
                    Some(etag)
                }
                None => None,
            },
        };

        let send_etag = etag.as_deref().filter(|e| !e.is_empty());
        let mut response = self.inner.fetch(coord, send_etag, cached_only).await?;

        if response.data.is_none() {
            if let Some(etag) = send_etag {
                if let Some(data) = self.read(coord, etag).await {
                    // touch the entry so it counts as fresh again
                    self.touch(coord, etag, &data).await;
                    return Ok(TileResponse::new(Some(etag.to_string()), data));
                }
            }
            // not modified, but the cached copy is gone
            response = self.inner.fetch(coord, None, cached_only).await?;
        }

        if let Err(e) = self.put(coord, &response).await {
            log::warn!("Failed to cache tile {}: {}", coord, e);
        }
        Ok(response)
    }
}

impl DiskCache {
    async fn touch(&self, coord: TileCoord, etag: &str, data: &[u8]) {
        if let Err(e) = tokio::fs::write(self.path(coord, etag), data).await {
            log::debug!("Failed to refresh cache entry for {}: {}", coord, e);
        }
    }
}
