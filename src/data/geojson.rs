//! Draw GeoJSON objects on a map.
//!
//! Foreign members of a geometry control how it is drawn. For geometries
//! inside a Feature, members missing on the geometry are looked up in the
//! Feature's `properties`.
//!
//! | Geometry                    | Members                                          |
//! |-----------------------------|--------------------------------------------------|
//! | Point, MultiPoint           | `symbol`, `label`, `color`, `fill`, `border`,    |
//! |                             | `size`, `font_size`, `label_color`, `label_bg`,  |
//! |                             | `icon`                                           |
//! | LineString, MultiLineString | `color`, `width`                                 |
//! | Polygon, MultiPolygon       | `color`, `fill`, `width`                         |
//!
//! Colors are either strings (see [`crate::data::parse::color`]) or arrays
//! with 3 or 4 RGB(A) values, e.g. `[220, 220, 220, 100]`.

use image::Rgba;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::core::geo::LatLng;
use crate::data::parse;
use crate::icons::IconProvider;
use crate::layers::{IconMarker, Layer, LayerGroup, Placemark, Shape, Symbol, Track};
use crate::rendering::canvas::Color;
use crate::{MapError, Result};

/// A GeoJSON position, `[lon, lat]` with an optional altitude.
type Position = Vec<f64>;

/// GeoJSON objects by their `type` member.
///
/// Nested objects stay raw JSON so that their foreign members can be read
/// when they are wrapped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Value>,
    },
    Feature {
        geometry: Option<Value>,
    },
    FeatureCollection {
        features: Vec<Value>,
    },
}

/// Load GeoJSON from a JSON string or, if that fails, from a file path.
pub fn load(arg: &str) -> Result<LayerGroup> {
    load_with_icons(arg, None)
}

/// Like [`load`]; Points with an `icon` member are drawn with the icon from
/// the given provider.
pub fn load_with_icons(arg: &str, icons: Option<&IconProvider>) -> Result<LayerGroup> {
    match serde_json::from_str::<Value>(arg) {
        Ok(value) => wrap_object(&value, None, icons),
        Err(_) => load_path(Path::new(arg), icons),
    }
}

/// Load GeoJSON from a file.
pub fn load_path(path: &Path, icons: Option<&IconProvider>) -> Result<LayerGroup> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        MapError::Parse(format!("invalid GeoJSON {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&text)?;
    wrap_object(&value, None, icons)
}

/// Turn a parsed GeoJSON object into drawable layers.
pub fn wrap(value: &Value) -> Result<LayerGroup> {
    wrap_object(value, None, None)
}

fn wrap_object(
    value: &Value,
    feature: Option<&Map<String, Value>>,
    icons: Option<&IconProvider>,
) -> Result<LayerGroup> {
    let own = value
        .as_object()
        .ok_or_else(|| MapError::Parse("not a GeoJSON object".to_string()))?;
    if !own.contains_key("type") {
        return Err(MapError::Parse(
            "missing type attribute, not a GeoJSON object?".to_string(),
        ));
    }

    let obj: GeoJson = serde_json::from_value(value.clone())
        .map_err(|e| MapError::Parse(format!("invalid GeoJSON: {}", e)))?;
    let members = Members {
        own,
        feature,
        icons,
    };

    let mut group = LayerGroup::new();
    match obj {
        GeoJson::Point { coordinates } => {
            group.push(members.point(position(&coordinates)?)?);
        }
        GeoJson::MultiPoint { coordinates } => {
            for p in &coordinates {
                group.push(members.point(position(p)?)?);
            }
        }
        GeoJson::LineString { coordinates } => {
            group.push(Box::new(members.track(positions(&coordinates)?)?));
        }
        GeoJson::MultiLineString { coordinates } => {
            for line in &coordinates {
                group.push(Box::new(members.track(positions(line)?)?));
            }
        }
        GeoJson::Polygon { coordinates } => {
            if let Some(exterior) = coordinates.first() {
                group.push(Box::new(members.shape(positions(exterior)?)?));
            }
        }
        GeoJson::MultiPolygon { coordinates } => {
            for polygon in &coordinates {
                if let Some(exterior) = polygon.first() {
                    group.push(Box::new(members.shape(positions(exterior)?)?));
                }
            }
        }
        GeoJson::GeometryCollection { geometries } => {
            for geometry in &geometries {
                group.extend(wrap_object(geometry, feature, icons)?);
            }
        }
        GeoJson::Feature { geometry } => {
            // geometry can be null
            if let Some(geometry) = geometry.filter(|g| !g.is_null()) {
                let properties = own.get("properties").and_then(Value::as_object);
                group.extend(wrap_object(&geometry, properties, icons)?);
            }
        }
        GeoJson::FeatureCollection { features } => {
            for feature in &features {
                group.extend(wrap_object(feature, None, icons)?);
            }
        }
    }

    Ok(group)
}

fn position(p: &[f64]) -> Result<LatLng> {
    match p {
        [lon, lat, ..] => {
            let point = LatLng::new(*lat, *lon);
            if point.is_valid() {
                Ok(point)
            } else {
                Err(MapError::InvalidCoordinates(format!("{:?}", p)))
            }
        }
        _ => Err(MapError::InvalidCoordinates(format!(
            "a position needs two values, got {:?}",
            p
        ))),
    }
}

fn positions(points: &[Position]) -> Result<Vec<LatLng>> {
    points.iter().map(|p| position(p)).collect()
}

/// Foreign members of a geometry and the properties of its parent feature.
struct Members<'a> {
    own: &'a Map<String, Value>,
    feature: Option<&'a Map<String, Value>>,
    icons: Option<&'a IconProvider>,
}

impl<'a> Members<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.own
            .get(key)
            .or_else(|| self.feature.and_then(|f| f.get(key)))
            .filter(|v| !v.is_null())
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn uint(&self, key: &str) -> Option<u32> {
        self.int(key).and_then(|v| u32::try_from(v).ok())
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn color(&self, key: &str) -> Result<Option<Color>> {
        match self.get(key) {
            Some(Value::String(s)) if !s.is_empty() => parse::color(s).map(Some),
            Some(Value::Array(values)) => Ok(color_array(values)),
            _ => Ok(None),
        }
    }

    /// An icon if one is requested and available, a placemark otherwise.
    fn point(&self, position: LatLng) -> Result<Box<dyn Layer>> {
        if let (Some(name), Some(icons)) = (self.string("icon"), self.icons) {
            let size = self.uint("size");
            match icons.get(&name, size, size) {
                Ok(icon) => return Ok(Box::new(IconMarker::new(position, icon))),
                Err(e) => log::warn!("Draw placemark instead of icon: {}", e),
            }
        }
        Ok(Box::new(self.placemark(position)?))
    }

    fn placemark(&self, position: LatLng) -> Result<Placemark> {
        let symbol = self
            .string("symbol")
            .and_then(|s| s.parse::<Symbol>().ok())
            .unwrap_or_default();

        let mut placemark = Placemark::new(position).with_symbol(symbol);
        if let Some(color) = self.color("color")? {
            placemark = placemark.with_color(Some(color));
        }
        if let Some(fill) = self.color("fill")? {
            placemark = placemark.with_fill(Some(fill));
        }
        if let Some(border) = self.uint("border") {
            placemark = placemark.with_border(border);
        }
        if let Some(size) = self.uint("size") {
            placemark = placemark.with_size(size);
        }
        if let Some(label) = self.string("label") {
            placemark = placemark.with_label(label);
        }
        if let Some(font_size) = self.uint("font_size") {
            placemark = placemark.with_font_size(font_size as f32);
        }
        if let Some(color) = self.color("label_color")? {
            placemark = placemark.with_label_color(color);
        }
        placemark = placemark.with_label_background(self.color("label_bg")?);

        Ok(placemark)
    }

    fn track(&self, waypoints: Vec<LatLng>) -> Result<Track> {
        let mut track = Track::new(waypoints);
        if let Some(color) = self.color("color")? {
            track = track.with_color(color);
        }
        if let Some(width) = self.uint("width") {
            track = track.with_width(width as f32);
        }
        Ok(track)
    }

    fn shape(&self, points: Vec<LatLng>) -> Result<Shape> {
        let mut shape = Shape::new(points)?;
        if let Some(color) = self.color("color")? {
            shape = shape.with_color(Some(color));
        }
        shape = shape.with_fill(self.color("fill")?);
        if let Some(width) = self.uint("width") {
            shape = shape.with_width(width as f32);
        }
        Ok(shape)
    }
}

/// RGB(A) from a JSON array, `None` if the values are unusable.
fn color_array(values: &[Value]) -> Option<Color> {
    let component = |v: &Value| v.as_u64().and_then(|n| u8::try_from(n).ok());
    match values {
        [r, g, b] => Some(Rgba([component(r)?, component(g)?, component(b)?, 255])),
        [r, g, b, a] => Some(Rgba([
            component(r)?,
            component(g)?,
            component(b)?,
            component(a)?,
        ])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const POINT: &str = r#"{
        "coordinates": [123.45, 12.45],
        "type": "Point"
    }"#;

    #[test]
    fn test_load_str() {
        let group = load(POINT).unwrap();
        assert_eq!(group.len(), 1);
        assert_eq!(group.iter().next().map(|l| l.kind()), Some("placemark"));
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(POINT.as_bytes()).unwrap();

        let path = file.path().to_str().unwrap();
        assert_eq!(load(path).unwrap().len(), 1);
        assert_eq!(load_path(file.path(), None).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid() {
        for arg in [
            "invalid",
            "{}",
            "[]",
            "1",
            "/does/not/exists.json",
            r#"{"type": "INVALID"}"#,
            r#"{"type": "Point"}"#,
            r#"{"type": "Point", "coordinates": [1.0]}"#,
            r#"{"type": "Point", "coordinates": [10.0, 95.0]}"#,
        ] {
            assert!(load(arg).is_err(), "{:?}", arg);
        }
    }

    #[test]
    fn test_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"color": [255, 0, 0]},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[10.9, 47.4], [11.0, 47.41]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": null
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiPoint",
                        "coordinates": [[10.9, 47.4], [11.0, 47.41]]
                    }
                }
            ]
        }"#;
        let group = load(json).unwrap();
        let kinds: Vec<_> = group.iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, vec!["track", "placemark", "placemark"]);
    }

    #[test]
    fn test_geometry_collection_and_polygons() {
        let json = r##"{
            "type": "GeometryCollection",
            "geometries": [
                {
                    "type": "Polygon",
                    "fill": "#ff000080",
                    "coordinates": [
                        [[10.9, 47.4], [11.0, 47.4], [11.0, 47.5], [10.9, 47.4]],
                        [[10.95, 47.42], [10.96, 47.42], [10.96, 47.43], [10.95, 47.42]]
                    ]
                },
                {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[10.9, 47.4], [11.0, 47.4], [11.0, 47.5], [10.9, 47.4]]],
                        [[[12.9, 47.4], [13.0, 47.4], [13.0, 47.5], [12.9, 47.4]]]
                    ]
                }
            ]
        }"##;
        let group = load(json).unwrap();
        // exterior rings only, one shape per polygon
        let kinds: Vec<_> = group.iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, vec!["shape", "shape", "shape"]);
    }

    #[test]
    fn test_members_from_feature_properties() {
        let mut properties = Map::new();
        properties.insert("color".into(), serde_json::json!("#00ff00"));
        properties.insert("width".into(), serde_json::json!(3));
        properties.insert("label".into(), serde_json::json!(42));

        let own_value = serde_json::json!({"type": "Point", "color": [1, 2, 3, 4]});
        let own = own_value.as_object().unwrap();
        let members = Members {
            own,
            feature: Some(&properties),
            icons: None,
        };

        // own members win over feature properties
        assert_eq!(members.color("color").unwrap(), Some(Rgba([1, 2, 3, 4])));
        assert_eq!(members.uint("width"), Some(3));
        assert_eq!(members.string("label").as_deref(), Some("42"));
        assert_eq!(members.color("fill").unwrap(), None);
    }

    #[test]
    fn test_placemark_members() {
        let value = serde_json::json!({
            "type": "Point",
            "symbol": "triangle",
            "size": 10,
            "border": 2,
            "label": "Summit",
            "label_bg": [255, 255, 255]
        });
        let members = Members {
            own: value.as_object().unwrap(),
            feature: None,
            icons: None,
        };
        let placemark = members.placemark(LatLng::new(47.4, 11.0)).unwrap();
        assert_eq!(placemark.symbol, Symbol::Triangle);
        assert_eq!(placemark.size, 10);
        assert_eq!(placemark.border, 2);
        assert_eq!(placemark.label.as_deref(), Some("Summit"));
        assert_eq!(placemark.label_background, Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_unknown_symbol_falls_back_to_dot() {
        let value = serde_json::json!({"type": "Point", "symbol": "star"});
        let members = Members {
            own: value.as_object().unwrap(),
            feature: None,
            icons: None,
        };
        let placemark = members.placemark(LatLng::new(47.4, 11.0)).unwrap();
        assert_eq!(placemark.symbol, Symbol::Dot);
    }

    #[test]
    fn test_invalid_color_string() {
        let json = r#"{"type": "Point", "coordinates": [11.0, 47.4], "color": "blue-ish"}"#;
        assert!(load(json).is_err());
    }

    #[test]
    fn test_color_array() {
        let values: Vec<Value> = serde_json::from_str("[10, 20, 30]").unwrap();
        assert_eq!(color_array(&values), Some(Rgba([10, 20, 30, 255])));
        let values: Vec<Value> = serde_json::from_str("[10, 20]").unwrap();
        assert_eq!(color_array(&values), None);
        let values: Vec<Value> = serde_json::from_str("[300, 20, 30]").unwrap();
        assert_eq!(color_array(&values), None);
    }

    #[test]
    fn test_draws_on_map() {
        use crate::rendering::canvas::TRANSPARENT;
        use crate::testing::{map_image, render_context};

        let rc = render_context();
        let c = rc.bbox().center();
        let json = format!(
            r#"{{"type": "Point", "coordinates": [{}, {}], "fill": [255, 0, 0], "size": 8}}"#,
            c.lng, c.lat
        );
        let group = load(&json).unwrap();

        let mut img = map_image(&rc);
        group.draw(&rc, &mut img);
        let (x, y) = rc.to_pixels(c.lat, c.lng);
        assert_eq!(*img.get_pixel(x as u32, y as u32), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_collection_inherits_feature_properties() {
        use crate::testing::{map_image, render_context};

        let rc = render_context();
        let c = rc.bbox().center();
        let json = format!(
            r#"{{
                "type": "Feature",
                "geometry": {{
                    "type": "GeometryCollection",
                    "geometries": [{{"type": "Point", "coordinates": [{}, {}]}}]
                }},
                "properties": {{"fill": [255, 0, 0], "size": 8}}
            }}"#,
            c.lng, c.lat
        );
        let group = load(&json).unwrap();
        assert_eq!(group.len(), 1);

        let mut img = map_image(&rc);
        group.draw(&rc, &mut img);
        let (x, y) = rc.to_pixels(c.lat, c.lng);
        assert_eq!(*img.get_pixel(x as u32, y as u32), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_point_with_icon() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("maki")).unwrap();
        image::RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]))
            .save(dir.path().join("maki").join("castle.png"))
            .unwrap();
        let icons = IconProvider::new(dir.path());

        let json = r#"{
            "type": "MultiPoint",
            "icon": "castle",
            "coordinates": [[11.0, 47.4], [11.1, 47.4]]
        }"#;
        let group = load_with_icons(json, Some(&icons)).unwrap();
        let kinds: Vec<_> = group.iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, vec!["icon", "icon"]);

        // unknown icons fall back to a placemark
        let json = r#"{"type": "Point", "icon": "tower", "coordinates": [11.0, 47.4]}"#;
        let group = load_with_icons(json, Some(&icons)).unwrap();
        assert_eq!(group.iter().next().map(|l| l.kind()), Some("placemark"));

        // without a provider the icon member is ignored
        let json = r#"{"type": "Point", "icon": "castle", "coordinates": [11.0, 47.4]}"#;
        assert_eq!(load(json).unwrap().iter().next().map(|l| l.kind()), Some("placemark"));
    }
}
