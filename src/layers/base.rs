use image::RgbaImage;
use std::sync::Arc;

use crate::rendering::context::RenderContext;

/// A drawable map overlay with positions in lat/lon.
///
/// Layers draw on a transparent image the size of the stitched map; the
/// render context converts coordinates to pixels and blends the result onto
/// the map.
pub trait Layer: Send + Sync {
    /// Short name for log messages.
    fn kind(&self) -> &'static str;

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage);
}

impl<T: Layer + ?Sized> Layer for Arc<T> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        (**self).draw(rc, img)
    }
}

/// A group of layers drawn in order, e.g. the content of one GeoJSON file.
#[derive(Default)]
pub struct LayerGroup {
    layers: Vec<Box<dyn Layer>>,
}

impl LayerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn extend(&mut self, other: LayerGroup) {
        self.layers.extend(other.layers);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer> {
        self.layers.iter().map(|l| l.as_ref())
    }
}

impl Layer for LayerGroup {
    fn kind(&self) -> &'static str {
        "group"
    }

    fn draw(&self, rc: &RenderContext, img: &mut RgbaImage) {
        for layer in &self.layers {
            layer.draw(rc, img);
        }
    }
}

impl std::fmt::Debug for LayerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|l| l.kind()))
            .finish()
    }
}
