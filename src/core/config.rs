//! Configuration for map styles, API keys, copyright notices and the cache.
//!
//! The built-in configuration is read first, a user supplied INI file is
//! layered on top of it key by key. Keys are case-insensitive.

use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::constants::{APP_NAME, TILE_SIZE};
use crate::{MapError, Result};

/// Built-in tile catalog and defaults.
pub const DEFAULT_CONFIG: &str = include_str!("default_config.ini");

/// Placeholder value used in the built-in `[keys]` section.
pub const API_KEY_PLACEHOLDER: &str = "<YOUR_API_KEY>";

/// Subdomains used for `{s}` when a service does not configure any.
pub const DEFAULT_SUBDOMAINS: &str = "abc";

/// Prefix for environment variables holding API keys.
pub const API_KEY_ENV_PREFIX: &str = "MAPMAKER_API_KEY_";

const DEFAULT_PARALLEL_DOWNLOADS: usize = 8;
const DEFAULT_MIN_HOURS: u64 = 24;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// A configured tile service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub name: String,
    pub url: String,
    /// Characters substituted for `{s}`, one per request.
    pub subdomains: Vec<String>,
    pub tile_size: u32,
    /// Resolved API key, `None` when no usable key is configured.
    pub api_key: Option<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let subdomains = if url.contains("{s}") {
            split_subdomains(DEFAULT_SUBDOMAINS)
        } else {
            Vec::new()
        };

        Self {
            name: name.into(),
            url,
            subdomains,
            tile_size: TILE_SIZE,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_subdomains(mut self, subdomains: &str) -> Self {
        self.subdomains = split_subdomains(subdomains);
        self
    }

    /// Host part of the URL template, e.g. `tile.openstreetmap.org`.
    pub fn host(&self) -> String {
        host_of(&self.url)
    }
}

/// Settings for the on-disk tile cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Size limit in bytes, `None` for no limit.
    pub limit: Option<i64>,
    pub min_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            limit: None,
            min_hours: DEFAULT_MIN_HOURS,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub parallel_downloads: usize,
    pub font: Option<PathBuf>,
    pub services: BTreeMap<String, ServiceConfig>,
    pub keys: BTreeMap<String, String>,
    pub copyrights: BTreeMap<String, String>,
    pub cache: CacheConfig,
    pub icons_base: Option<PathBuf>,
}

impl Config {
    /// The built-in configuration without any user settings.
    pub fn builtin() -> Result<Self> {
        let mut sections = Sections::new();
        merge_ini(&mut sections, DEFAULT_CONFIG, "<builtin>")?;
        Self::from_sections(sections)
    }

    /// The built-in configuration with the given INI text layered on top.
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let mut sections = Sections::new();
        merge_ini(&mut sections, DEFAULT_CONFIG, "<builtin>")?;
        merge_ini(&mut sections, text, "<string>")?;
        Self::from_sections(sections)
    }

    /// The built-in configuration with the file at `path` layered on top.
    ///
    /// A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut sections = Sections::new();
        merge_ini(&mut sections, DEFAULT_CONFIG, "<builtin>")?;

        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::debug!("Read configuration from {}", path.display());
                merge_ini(&mut sections, &text, &path.display().to_string())?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No configuration file at {}", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Self::from_sections(sections)
    }

    /// Default location of the user configuration file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.ini"))
    }

    /// Default base directory for the tile cache.
    pub fn default_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join(APP_NAME))
    }

    /// Default base directory for icon sets, used when `[icons] base` is unset.
    pub fn default_icons_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_NAME).join("icons"))
    }

    /// Names of all configured services, sorted.
    pub fn styles(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    /// Look up a service and resolve its API key.
    ///
    /// Resolution order: environment variable `MAPMAKER_API_KEY_<NAME>`,
    /// the `api_key` of the service section, then `[keys]` for the host.
    pub fn service(&self, name: &str) -> Result<ServiceConfig> {
        let key = name.trim().to_lowercase();
        let mut service = self
            .services
            .get(&key)
            .cloned()
            .ok_or_else(|| MapError::Config(format!("unknown map style {:?}", name)))?;

        service.api_key = std::env::var(api_key_env_var(&key))
            .ok()
            .and_then(usable_key)
            .or_else(|| service.api_key.clone().and_then(usable_key))
            .or_else(|| self.keys.get(&service.host()).cloned().and_then(usable_key));

        if service.url.contains("{api}") && service.api_key.is_none() {
            log::warn!("No API key configured for {:?}", service.name);
        }

        Ok(service)
    }

    /// Copyright notice for the given host, picked by the longest matching
    /// host suffix in `[copyright]`.
    pub fn copyright(&self, host: &str) -> Option<&str> {
        let host = host.to_lowercase();
        self.copyrights
            .iter()
            .filter(|(suffix, _)| host == **suffix || host.ends_with(&format!(".{}", suffix)))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, notice)| notice.as_str())
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_downloads < 1 {
            return Err(MapError::Config(
                "[mapmaker] parallel_downloads must be at least 1".to_string(),
            ));
        }

        for service in self.services.values() {
            for placeholder in ["{z}", "{x}", "{y}"] {
                if !service.url.contains(placeholder) {
                    return Err(MapError::Config(format!(
                        "URL for service {:?} lacks the {} placeholder",
                        service.name, placeholder
                    )));
                }
            }
            if service.url.contains("{s}") && service.subdomains.is_empty() {
                return Err(MapError::Config(format!(
                    "service {:?} uses {{s}} but has no subdomains",
                    service.name
                )));
            }
            if service.tile_size == 0 {
                return Err(MapError::Config(format!(
                    "service {:?} has tile_size 0",
                    service.name
                )));
            }
        }

        if let Some(limit) = self.cache.limit {
            if limit <= 0 {
                return Err(MapError::Config(format!(
                    "[cache] limit must be a positive number of bytes, got {}",
                    limit
                )));
            }
        }

        for suffix in self.copyrights.keys() {
            if !is_host_suffix(suffix) {
                return Err(MapError::Config(format!(
                    "[copyright] key {:?} is not a valid host name",
                    suffix
                )));
            }
        }

        Ok(())
    }

    fn from_sections(sections: Sections) -> Result<Self> {
        let empty = BTreeMap::new();
        let section = |name: &str| sections.get(name).unwrap_or(&empty);

        let general = section("mapmaker");
        let parallel_downloads = match general.get("parallel_downloads") {
            Some(raw) => parse_number::<usize>(raw, "[mapmaker] parallel_downloads")?,
            None => DEFAULT_PARALLEL_DOWNLOADS,
        };
        let font = general.get("font").filter(|v| !v.is_empty()).map(PathBuf::from);

        let mut services = BTreeMap::new();
        for (name, url) in section("services") {
            services.insert(name.clone(), ServiceConfig::new(name.clone(), url.clone()));
        }

        for (section_name, values) in &sections {
            let Some(name) = section_name.strip_prefix("service.") else {
                continue;
            };

            let mut service = match (services.remove(name), values.get("url")) {
                (Some(existing), None) => existing,
                (existing, Some(url)) => {
                    let mut service = ServiceConfig::new(name, url.clone());
                    if let Some(existing) = existing {
                        service.tile_size = existing.tile_size;
                    }
                    service
                }
                (None, None) => {
                    return Err(MapError::Config(format!(
                        "[{}] defines a new service but has no url",
                        section_name
                    )))
                }
            };

            if let Some(subdomains) = values.get("subdomains") {
                service.subdomains = split_subdomains(subdomains);
            }
            if let Some(raw) = values.get("tile_size") {
                service.tile_size =
                    parse_number::<u32>(raw, &format!("[{}] tile_size", section_name))?;
            }
            if let Some(key) = values.get("api_key") {
                service.api_key = Some(key.clone());
            }

            services.insert(name.to_string(), service);
        }

        let cache_section = section("cache");
        let cache = CacheConfig {
            limit: cache_section
                .get("limit")
                .filter(|v| !v.is_empty())
                .map(|raw| parse_number::<i64>(raw, "[cache] limit"))
                .transpose()?,
            min_hours: match cache_section.get("min_hours") {
                Some(raw) => parse_number::<u64>(raw, "[cache] min_hours")?,
                None => DEFAULT_MIN_HOURS,
            },
        };

        let icons_base = section("icons")
            .get("base")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            parallel_downloads,
            font,
            services,
            keys: section("keys").clone(),
            copyrights: section("copyright").clone(),
            cache,
            icons_base,
        })
    }
}

fn merge_ini(sections: &mut Sections, text: &str, origin: &str) -> Result<()> {
    // values are literal: no quote stripping, no backslash escapes
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    let ini = Ini::load_from_str_opt(text, options)
        .map_err(|e| MapError::Config(format!("failed to parse {}: {}", origin, e)))?;

    for (name, props) in ini.iter() {
        let Some(name) = name else {
            continue;
        };
        let entries = sections.entry(name.trim().to_lowercase()).or_default();
        for (key, value) in props.iter() {
            entries.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| MapError::Config(format!("{} must be a number, got {:?}", what, raw)))
}

fn split_subdomains(raw: &str) -> Vec<String> {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(String::from)
        .collect()
}

fn usable_key(key: String) -> Option<String> {
    let key = key.trim().to_string();
    if key.is_empty() || key == API_KEY_PLACEHOLDER {
        None
    } else {
        Some(key)
    }
}

/// Name of the environment variable that holds the API key for a service.
pub fn api_key_env_var(service: &str) -> String {
    let name: String = service
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{}{}", API_KEY_ENV_PREFIX, name)
}

/// Host part of a URL template.
///
/// Templates are not valid URLs (`{s}` in the host), so this does not use a
/// URL parser.
pub fn host_of(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    host.to_lowercase()
}

fn is_host_suffix(value: &str) -> bool {
    !value.is_empty()
        && value.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        })
}
