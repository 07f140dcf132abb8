//! Icon images by name.
//!
//! Icons are PNG files organized in icon sets, one directory per set below a
//! common base directory:
//!
//! ```text
//! <base>/maki/castle.png
//! <base>/temaki/castle.png
//! ```
//!
//! Sets are searched in alphabetical order and the first match wins.

use image::imageops::FilterType;
use image::RgbaImage;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::config::Config;
use crate::{MapError, Result};

const ICON_EXT: &str = "png";

type IconKey = (String, Option<u32>, Option<u32>);

/// Loads icon images by name from a directory of icon sets.
pub struct IconProvider {
    base: PathBuf,
    sets: OnceCell<Vec<IconSet>>,
    cache: Option<Mutex<HashMap<IconKey, Arc<RgbaImage>>>>,
}

impl IconProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            sets: OnceCell::new(),
            cache: None,
        }
    }

    /// Provider for the configured icon directory or the user's data
    /// directory.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .icons_base
            .clone()
            .or_else(Config::default_icons_dir)
            .map(Self::new)
    }

    /// Keep loaded icons in memory.
    pub fn cached(mut self) -> Self {
        self.cache = Some(Mutex::new(HashMap::new()));
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn sets(&self) -> Result<&[IconSet]> {
        self.sets
            .get_or_try_init(|| discover(&self.base))
            .map(Vec::as_slice)
    }

    /// Names of all available icons, sorted and without duplicates.
    pub fn index(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for set in self.sets()? {
            names.extend(set.index()?);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Load the icon with the given name.
    ///
    /// With only one of `width` and `height`, the icon is scaled keeping its
    /// aspect ratio.
    pub fn get(&self, name: &str, width: Option<u32>, height: Option<u32>) -> Result<Arc<RgbaImage>> {
        let key = (name.to_string(), width, height);
        if let Some(icon) = self.cached_icon(&key) {
            return Ok(icon);
        }

        for set in self.sets()? {
            if let Some(icon) = set.get(name)? {
                let icon = Arc::new(resize(icon, width, height));
                if let Some(cache) = &self.cache {
                    if let Ok(mut cache) = cache.lock() {
                        cache.insert(key, icon.clone());
                    }
                }
                return Ok(icon);
            }
        }

        Err(MapError::IconNotFound(name.to_string()))
    }

    fn cached_icon(&self, key: &IconKey) -> Option<Arc<RgbaImage>> {
        let cache = self.cache.as_ref()?;
        cache.lock().ok()?.get(key).cloned()
    }
}

impl std::fmt::Debug for IconProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconProvider")
            .field("base", &self.base)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

fn discover(base: &Path) -> Result<Vec<IconSet>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(base)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    log::debug!("Found {} icon sets in {}", dirs.len(), base.display());
    Ok(dirs.into_iter().map(|base| IconSet { base }).collect())
}

fn resize(icon: RgbaImage, width: Option<u32>, height: Option<u32>) -> RgbaImage {
    let (w, h) = icon.dimensions();
    if w == 0 || h == 0 {
        return icon;
    }

    let (tw, th) = match (width, height) {
        (Some(tw), Some(th)) => (tw, th),
        (Some(tw), None) => (tw, (h as u64 * tw as u64 / w as u64) as u32),
        (None, Some(th)) => ((w as u64 * th as u64 / h as u64) as u32, th),
        (None, None) => return icon,
    };

    if (tw, th) == (w, h) || tw == 0 || th == 0 {
        return icon;
    }
    image::imageops::resize(&icon, tw, th, FilterType::Lanczos3)
}

/// One directory of icons.
#[derive(Debug)]
struct IconSet {
    base: PathBuf,
}

impl IconSet {
    fn path(&self, name: &str) -> PathBuf {
        self.base.join(format!("{}.{}", name, ICON_EXT))
    }

    fn index(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.base)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ICON_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }

    fn get(&self, name: &str) -> Result<Option<RgbaImage>> {
        // names are plain file names, no paths
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name.starts_with('.') {
            return Ok(None);
        }

        let path = self.path(name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(image::open(&path)?.to_rgba8()))
    }
}
