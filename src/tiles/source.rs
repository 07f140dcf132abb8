use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{host_of, ServiceConfig};
use crate::core::tilemap::TileCoord;
use crate::{MapError, Result};

/// User agent sent with every tile request.
pub const USER_AGENT: &str = concat!(
    "mapmaker/",
    env!("CARGO_PKG_VERSION"),
    " +https://github.com/akeil/mapmaker"
);

/// Result of a tile request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileResponse {
    pub etag: Option<String>,
    /// Raw image data, `None` when the server answered "not modified".
    pub data: Option<Arc<Vec<u8>>>,
}

impl TileResponse {
    pub fn new(etag: Option<String>, data: Vec<u8>) -> Self {
        Self {
            etag,
            data: Some(Arc::new(data)),
        }
    }

    pub fn not_modified(etag: Option<String>) -> Self {
        Self { etag, data: None }
    }
}

/// Anything that can deliver slippy map tiles.
///
/// Implemented by the HTTP service and by every wrapper around it (disk
/// cache, memory cache, fallback).
#[async_trait]
pub trait TileProvider: Send + Sync {
    /// Unique name, e.g. used as directory name for the cache.
    fn name(&self) -> &str;

    /// The URL template of the underlying service.
    fn url_pattern(&self) -> &str;

    /// Host name of the underlying service.
    fn host(&self) -> String {
        host_of(self.url_pattern())
    }

    /// Configured tile size in pixels.
    fn tile_size(&self) -> u32;

    /// Fetch a single tile.
    ///
    /// With an `etag`, the provider may answer with `data == None` if the
    /// tile is unchanged. With `cached_only`, providers that would need a
    /// network request fail with [`MapError::NotCached`].
    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        cached_only: bool,
    ) -> Result<TileResponse>;
}

#[async_trait]
impl<T: TileProvider + ?Sized> TileProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn url_pattern(&self) -> &str {
        (**self).url_pattern()
    }

    fn host(&self) -> String {
        (**self).host()
    }

    fn tile_size(&self) -> u32 {
        (**self).tile_size()
    }

    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        cached_only: bool,
    ) -> Result<TileResponse> {
        (**self).fetch(coord, etag, cached_only).await
    }
}

/// A web service that serves slippy map tiles over HTTP.
///
/// Only failed connections and timeouts are retried; if the server responds
/// with an error status the request is not attempted again.
pub struct TileService {
    config: ServiceConfig,
    client: reqwest::Client,
    max_retries: usize,
    retry_delay: Duration,
}

impl TileService {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            config,
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
        })
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build the request URL for a tile with the given subdomain.
    pub fn url(&self, coord: TileCoord, subdomain: &str) -> String {
        let api = self.config.api_key.as_deref().unwrap_or("");
        self.format_url(coord, subdomain, api)
    }

    fn log_url(&self, coord: TileCoord, subdomain: &str) -> String {
        let api = if self.config.api_key.is_some() {
            "<API_KEY>"
        } else {
            "<NO_API_KEY>"
        };
        self.format_url(coord, subdomain, api)
    }

    fn format_url(&self, coord: TileCoord, subdomain: &str, api: &str) -> String {
        let retina = if self.config.tile_size >= 512 { "@2x" } else { "" };
        self.config
            .url
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{z}", &coord.z.to_string())
            .replace("{s}", subdomain)
            .replace("{r}", retina)
            .replace("{api}", api)
    }

    fn subdomain(&self) -> String {
        self.config
            .subdomains
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "a".to_string())
    }

    async fn request(&self, url: &str, etag: Option<&str>) -> Result<reqwest::Response> {
        let mut attempt = 1;
        loop {
            let mut request = self.client.get(url);
            if let Some(etag) = etag {
                request = request.header(IF_NONE_MATCH, etag);
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt <= self.max_retries => {
                    log::info!("Retry ({}) request after {}", attempt, e);
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    if attempt > 1 {
                        log::warn!("Request failed after {} retries", attempt - 1);
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[async_trait]
impl TileProvider for TileService {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn url_pattern(&self) -> &str {
        &self.config.url
    }

    fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    async fn fetch(
        &self,
        coord: TileCoord,
        etag: Option<&str>,
        cached_only: bool,
    ) -> Result<TileResponse> {
        if cached_only {
            return Err(MapError::NotCached(coord));
        }

        let subdomain = self.subdomain();
        let url = self.url(coord, &subdomain);
        let log_url = self.log_url(coord, &subdomain);
        log::debug!("GET {}", log_url);

        let response = match self.request(&url, etag).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Request for {:?} failed with {}", log_url, e);
                return Err(e);
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(TileResponse::not_modified(etag.map(str::to_string)));
        }
        if !status.is_success() {
            log::warn!("Request for {:?} failed with HTTP {}", log_url, status);
            return Err(MapError::Http {
                status: status.as_u16(),
                url: log_url,
            });
        }

        let recv_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(TileResponse::new(recv_etag, bytes.to_vec()))
    }
}
