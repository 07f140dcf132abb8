//! High level map assembly.
//!
//! A [`Map`] combines the area and zoom level with overlays, optional
//! hillshading and the decorations of a [`Composer`]. Rendering downloads
//! the tiles through the given provider and returns the final image.

use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

use crate::core::geo::{distance, BBox};
use crate::core::tilemap::TileMap;
use crate::decorations::{Area, Composer, Decoration};
use crate::layers::base::Layer;
use crate::rendering::canvas;
use crate::rendering::context::RenderContext;
use crate::tiles::source::TileProvider;
use crate::Result;

/// A map image to be rendered.
pub struct Map {
    bbox: BBox,
    zoom: u8,
    elements: Vec<Arc<dyn Layer>>,
    composer: Composer,
    shading: Option<Arc<dyn TileProvider>>,
    parallel_downloads: usize,
}

impl Map {
    pub fn new(bbox: BBox, zoom: u8) -> Self {
        Self {
            bbox,
            zoom,
            elements: Vec::new(),
            composer: Composer::new(),
            shading: None,
            parallel_downloads: 1,
        }
    }

    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.parallel_downloads = parallel.max(1);
        self
    }

    /// Add hillshading from the given tile provider.
    pub fn with_shading(mut self, provider: Arc<dyn TileProvider>) -> Self {
        self.shading = Some(provider);
        self
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    /// Add an overlay, drawn in the order of insertion.
    pub fn add_element(&mut self, element: Arc<dyn Layer>) {
        self.elements.push(element);
    }

    pub fn add_decoration(&mut self, area: Area, decoration: Box<dyn Decoration>) -> Result<()> {
        self.composer.add_decoration(area, decoration)
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn elements(&self) -> &[Arc<dyn Layer>] {
        &self.elements
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn tile_map(&self) -> Result<TileMap> {
        TileMap::from_bbox(&self.bbox, self.zoom)
    }

    /// Summary of the map that would be rendered with `provider`.
    ///
    /// Does not download anything, the dimensions are based on the
    /// configured tile size.
    pub fn info(&self, provider: &dyn TileProvider) -> Result<MapInfo> {
        let map = self.tile_map()?;
        let size = provider.tile_size() as f64;
        let bbox = &self.bbox;

        let (left, bottom) = map.to_pixel_fractions(bbox.minlat, bbox.minlon);
        let (right, top) = map.to_pixel_fractions(bbox.maxlat, bbox.maxlon);
        let px = |v: f64| (v * size).ceil() as i64;
        let width = (px(right) - px(left)).max(0) as u32;
        let height = (px(bottom) - px(top)).max(0) as u32;

        Ok(MapInfo {
            area: (
                distance(bbox.minlat, bbox.minlon, bbox.minlat, bbox.maxlon),
                distance(bbox.minlat, bbox.minlon, bbox.maxlat, bbox.minlon),
            ),
            zoom: self.zoom,
            dimensions: (width, height),
            tiles: map.num_tiles(),
            style: provider.name().to_string(),
            url_pattern: provider.url_pattern().to_string(),
        })
    }

    /// Download the tiles, draw overlays and decorations.
    pub async fn render(&self, provider: Arc<dyn TileProvider>) -> Result<RgbaImage> {
        let map = self.tile_map()?;
        let mut rc = RenderContext::new(provider, map.clone())
            .with_parallel_downloads(self.parallel_downloads);

        if let Some(shading) = &self.shading {
            log::info!("Render hillshading from {}", shading.name());
            let mut shade_rc = RenderContext::new(shading.clone(), map)
                .with_parallel_downloads(self.parallel_downloads);
            let shade = shade_rc.build().await?;
            rc.add_overlay(Box::new(Shading { img: shade }));
        }

        for element in &self.elements {
            rc.add_overlay(Box::new(element.clone()));
        }

        let img = rc.build().await?;
        Ok(self.composer.build(&rc, &img))
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("bbox", &self.bbox)
            .field("zoom", &self.zoom)
            .field("elements", &self.elements.len())
            .field("composer", &self.composer)
            .field("shading", &self.shading.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// A rendered shading image, placed over the crop box of the base map.
struct Shading {
    img: RgbaImage,
}

impl Layer for Shading {
    fn kind(&self) -> &'static str {
        "shading"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        let crop = rc.crop_box();
        canvas::composite(img, &self.img, crop.left as i64, crop.top as i64);
    }
}

/// Summary information about a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInfo {
    /// East-west and north-south extent in meters.
    pub area: (f64, f64),
    pub zoom: u8,
    /// Size of the map content in pixels, without margins.
    pub dimensions: (u32, u32),
    pub tiles: usize,
    pub style: String,
    pub url_pattern: String,
}

impl MapInfo {
    /// Area as whole meters, or as kilometers with one decimal if either
    /// side exceeds 1000 m.
    pub fn area_display(&self) -> String {
        let (w, h) = (self.area.0.trunc(), self.area.1.trunc());
        if w > 1000.0 || h > 1000.0 {
            let km = |v: f64| (v / 100.0).trunc() / 10.0;
            format!("{:.1} x {:.1} km", km(w), km(h))
        } else {
            format!("{} x {} m", w as u64, h as u64)
        }
    }
}

impl fmt::Display for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------------------------")?;
        writeln!(f, "Area:        {}", self.area_display())?;
        writeln!(f, "Zoom Level:  {}", self.zoom)?;
        writeln!(f, "Dimensions:  {} x {} px", self.dimensions.0, self.dimensions.1)?;
        writeln!(f, "Tiles:       {}", self.tiles)?;
        writeln!(f, "Map Style:   {}", self.style)?;
        writeln!(f, "URL Pattern: {}", self.url_pattern)?;
        write!(f, "-------------------------------")
    }
}
