//! Parsers for command line values: coordinates, colors, placements and the
//! compound arguments for titles and frames.

use image::Rgba;

use crate::core::constants::{MAX_LAT, MAX_ZOOM, MIN_LAT};
use crate::core::geo::{decimal, BBox};
use crate::decorations::{FrameStyle, Placement};
use crate::rendering::canvas::Color;
use crate::{MapError, Result};

fn err(msg: impl Into<String>) -> MapError {
    MapError::Parse(msg.into())
}

fn float(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(err(format!("not a number: {:?}", raw))),
    }
}

/// Parse a lat/lon pair like `47.437,10.953`.
///
/// Values may carry an `N`/`S` or `E`/`W` suffix and can be given in
/// degrees, minutes and seconds: `63° 4' 10.2'' N, 151° 0' 26.64'' W`.
pub fn coordinates(raw: &str) -> Result<(f64, f64)> {
    let lowered = raw.trim().to_lowercase();
    let parts: Vec<&str> = lowered.split(',').collect();
    if parts.len() != 2 {
        return Err(err(format!(
            "expected two values separated by \",\" in {:?}",
            raw
        )));
    }

    let (a, sign_lat) = hemisphere(parts[0], 'n', 's');
    let (b, sign_lon) = hemisphere(parts[1], 'e', 'w');

    let (lat, lon) = match (float(a), float(b)) {
        (Ok(lat), Ok(lon)) => (lat, lon),
        _ => (parse_dms(a)?, parse_dms(b)?),
    };

    let (lat, lon) = (lat * sign_lat, lon * sign_lon);
    if !(-90.0..=90.0).contains(&lat) {
        return Err(err(format!("latitude must be in range -90.0..90.0, got {}", lat)));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(err(format!(
            "longitude must be in range -180.0..180.0, got {}",
            lon
        )));
    }

    Ok((lat, lon))
}

/// Strip a hemisphere suffix and return the sign it stands for.
fn hemisphere(raw: &str, positive: char, negative: char) -> (&str, f64) {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_suffix(positive) {
        (rest, 1.0)
    } else if let Some(rest) = raw.strip_suffix(negative) {
        (rest, -1.0)
    } else {
        (raw, 1.0)
    }
}

fn parse_dms(raw: &str) -> Result<f64> {
    let (d, rest) = raw
        .split_once('°')
        .ok_or_else(|| err(format!("not a coordinate: {:?}", raw)))?;
    if rest.contains('°') {
        return Err(err(format!("degrees given twice in {:?}", raw)));
    }
    let d = float(d)?;

    // minutes are marked with ', seconds with ''
    let (m, rest) = match rest.split_once('\'') {
        Some((m, rest)) => (float(m)?, rest),
        None => (0.0, rest),
    };

    let (s, rest) = match rest.split_once("''") {
        Some((s, rest)) => (float(s)?, rest),
        None => (0.0, rest),
    };

    if !rest.trim().is_empty() {
        return Err(err(format!("extra content for DMS coordinates: {:?}", rest)));
    }

    Ok(decimal(d, m, s))
}

/// Parse an RGBA color from `R,G,B`, `R,G,B,A`, `#RRGGBB` or `#RRGGBBAA`.
pub fn color(raw: &str) -> Result<Color> {
    let invalid = || err(format!("invalid color {:?}", raw));
    if raw.trim().is_empty() {
        return Err(invalid());
    }

    let rgba: Vec<i64> = if let Some(hex) = raw.strip_prefix('#') {
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut values = Vec::with_capacity(4);
        for i in (0..hex.len()).step_by(2) {
            values.push(i64::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid())?);
        }
        if values.len() == 3 {
            values.push(255);
        }
        values
    } else {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if !(parts.len() == 3 || parts.len() == 4) {
            return Err(invalid());
        }
        let mut values = Vec::with_capacity(4);
        for part in parts {
            values.push(part.parse::<i64>().map_err(|_| invalid())?);
        }
        if values.len() == 3 {
            values.push(255);
        }
        values
    };

    let mut out = [0u8; 4];
    for (slot, v) in out.iter_mut().zip(&rgba) {
        *slot = u8::try_from(*v)
            .map_err(|_| err(format!("invalid color value {} in {:?}", v, raw)))?;
    }
    Ok(Rgba(out))
}

/// Parse an aspect ratio like `16:9` into a float.
pub fn aspect(raw: &str) -> Result<f64> {
    let (w, h) = raw
        .split_once(':')
        .ok_or_else(|| err(format!("invalid aspect ratio {:?}, expected format \"W:H\"", raw)))?;
    let (w, h) = (float(w)?, float(h)?);
    if w <= 0.0 || h <= 0.0 {
        return Err(err(format!("aspect ratio must be positive: {:?}", raw)));
    }
    Ok(w / h)
}

/// Parse a distance like `4km`, `500m` or `500` (meters) into meters.
pub fn distance(raw: &str) -> Result<f64> {
    let lowered = raw.trim().to_lowercase();
    let (value, factor) = if let Some(v) = lowered.strip_suffix("km") {
        (v, 1000.0)
    } else if let Some(v) = lowered.strip_suffix('m') {
        (v, 1.0)
    } else {
        (lowered.as_str(), 1.0)
    };

    let meters = float(value)? * factor;
    if meters <= 0.0 {
        return Err(err(format!("distance must be positive: {:?}", raw)));
    }
    Ok(meters)
}

/// Parse a bounding box from two corner coordinates, or from a center
/// coordinate and a radius.
pub fn bbox(first: &str, second: &str) -> Result<BBox> {
    let (lat0, lon0) = coordinates(first)?;

    let bbox = if second.contains(',') {
        let (lat1, lon1) = coordinates(second)?;
        BBox::new(lat0, lon0, lat1, lon1)?
    } else {
        BBox::from_radius(lat0, lon0, distance(second)?)?
    };

    for lat in [bbox.minlat, bbox.maxlat] {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(err(format!(
                "latitude {} is outside of the map ({}..{})",
                lat, MIN_LAT, MAX_LAT
            )));
        }
    }
    Ok(bbox)
}

/// Parse a placement like `NNE`, case-insensitive.
pub fn placement(raw: &str) -> Result<Placement> {
    raw.parse()
}

/// Parse margins from 1, 2 (vertical, horizontal) or 4 (top, right, bottom,
/// left) values.
pub fn margin<S: AsRef<str>>(values: &[S]) -> Result<(u32, u32, u32, u32)> {
    let mut parsed = Vec::with_capacity(values.len());
    for raw in values {
        let raw = raw.as_ref();
        let v: i64 = raw
            .trim()
            .parse()
            .map_err(|_| err(format!("invalid margin {:?}", raw)))?;
        if v < 0 {
            return Err(err(format!("invalid margin {}, must not be negative", v)));
        }
        parsed.push(u32::try_from(v).map_err(|_| err(format!("margin too large: {}", v)))?);
    }

    match parsed[..] {
        [v] => Ok((v, v, v, v)),
        [vertical, horizontal] => Ok((vertical, horizontal, vertical, horizontal)),
        [top, right, bottom, left] => Ok((top, right, bottom, left)),
        _ => Err(err(format!(
            "invalid number of arguments ({}) for margin, expected 1, 2, or 4 values",
            values.len()
        ))),
    }
}

/// Arguments for a title or comment.
#[derive(Debug, Clone, PartialEq)]
pub struct TextArgs {
    pub placement: Option<Placement>,
    pub border: Option<u32>,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub text: String,
}

/// Parse `[PLACEMENT] [BORDER] [COLOR] [BGCOLOR] TEXT...`.
///
/// Formal arguments are recognized until the first value that is none of
/// them; the remaining values make up the text.
pub fn text_args<S: AsRef<str>>(values: &[S]) -> Result<TextArgs> {
    let mut args = TextArgs {
        placement: None,
        border: None,
        color: None,
        background: None,
        text: String::new(),
    };

    let mut consumed = 0;
    for value in values {
        let value = value.as_ref();
        if args.placement.is_none() {
            if let Ok(p) = placement(value) {
                args.placement = Some(p);
                consumed += 1;
                continue;
            }
        }
        if args.border.is_none() {
            if let Ok(border) = value.trim().parse::<i64>() {
                let border = u32::try_from(border).map_err(|_| {
                    err(format!("invalid border width {:?}, must not be negative", value))
                })?;
                args.border = Some(border);
                consumed += 1;
                continue;
            }
        }
        if args.color.is_none() {
            if let Ok(c) = color(value) {
                args.color = Some(c);
                consumed += 1;
                continue;
            }
        }
        if args.background.is_none() {
            if let Ok(c) = color(value) {
                args.background = Some(c);
                consumed += 1;
                continue;
            }
        }
        break;
    }

    args.text = values[consumed..]
        .iter()
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    if args.text.trim().is_empty() {
        let all: Vec<&str> = values.iter().map(|v| v.as_ref()).collect();
        return Err(err(format!("missing text in {:?}", all.join(" "))));
    }

    Ok(args)
}

/// Arguments for the map frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameArgs {
    pub width: Option<u32>,
    pub color: Option<Color>,
    pub alt_color: Option<Color>,
    pub style: Option<FrameStyle>,
}

/// Parse up to four frame arguments in any order: width, color, alternate
/// color and style. The second color is the alternate color.
pub fn frame_args<S: AsRef<str>>(values: &[S]) -> Result<FrameArgs> {
    if values.len() > 4 {
        return Err(err(format!(
            "invalid number of arguments ({}) for frame, expected up to four: WIDTH, COLOR, ALT_COLOR and STYLE",
            values.len()
        )));
    }

    let mut args = FrameArgs::default();
    let mut unrecognized = Vec::new();
    for value in values {
        let value = value.as_ref();
        if args.width.is_none() {
            if let Ok(width) = value.trim().parse::<i64>() {
                let width = u32::try_from(width).map_err(|_| {
                    err(format!("invalid width {:?}, must not be negative", value))
                })?;
                args.width = Some(width);
                continue;
            }
        }
        if args.color.is_none() {
            if let Ok(c) = color(value) {
                args.color = Some(c);
                continue;
            }
        }
        if args.alt_color.is_none() {
            if let Ok(c) = color(value) {
                args.alt_color = Some(c);
                continue;
            }
        }
        if args.style.is_none() {
            if let Ok(style) = value.parse::<FrameStyle>() {
                args.style = Some(style);
                continue;
            }
        }
        unrecognized.push(value);
    }

    if !unrecognized.is_empty() {
        return Err(err(format!(
            "unrecognized frame parameters: {}",
            unrecognized.join(", ")
        )));
    }
    Ok(args)
}

/// Parse a zoom level in `0..=19`.
pub fn zoom(raw: &str) -> Result<u8> {
    match raw.trim().parse::<u8>() {
        Ok(z) if z <= MAX_ZOOM => Ok(z),
        _ => Err(err(format!(
            "invalid zoom level {:?}, expected 0..={}",
            raw, MAX_ZOOM
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_coordinates_valid() {
        let cases = [
            ("48°, 6°", (48.0, 6.0)),
            ("48° N, 6° E", (48.0, 6.0)),
            ("48°N, 6°E", (48.0, 6.0)),
            ("47° 30', 10°15'", (47.5, 10.25)),
            ("63° 4' 10.2'' N, 151° 0' 26.64'' W", (63.0695, -151.0074)),
            ("63°4'10.2''N,151°0'26.64''W", (63.0695, -151.0074)),
            ("43°21'18'', 42°26'21''", (43.355, 42.439167)),
            ("47.437,10.953", (47.437, 10.953)),
            ("47.437N,10.953E", (47.437, 10.953)),
            ("47.437 N, 10.953 E", (47.437, 10.953)),
            ("63.0695, -151.0074", (63.0695, -151.0074)),
            ("63.0695N, 151.0074W", (63.0695, -151.0074)),
        ];
        for (raw, (lat, lon)) in cases {
            let (a, b) = coordinates(raw).unwrap();
            assert!(close(a, lat) && close(b, lon), "{:?} => {}, {}", raw, a, b);
        }
    }

    #[test]
    fn test_coordinates_invalid() {
        let cases = [
            "",
            "xxx",
            "12,34,56",
            "123.45.56, 123",
            "47° 25'', 10°59''",
            "48°15°,6°7°",
            "500,456",
            "360°, -500°",
            "nan,10",
        ];
        for raw in cases {
            assert!(coordinates(raw).is_err(), "{:?}", raw);
        }
    }

    #[test]
    fn test_color_valid() {
        let cases = [
            ("0,0,0", [0, 0, 0, 255]),
            ("255,255,255", [255, 255, 255, 255]),
            ("10,20,30", [10, 20, 30, 255]),
            ("10,20,30,255", [10, 20, 30, 255]),
            ("10,20,30,128", [10, 20, 30, 128]),
            ("10,20,30,0", [10, 20, 30, 0]),
            ("010,020,030", [10, 20, 30, 255]),
            ("#5090aa", [80, 144, 170, 255]),
            ("#5090aaff", [80, 144, 170, 255]),
            ("#5090aabb", [80, 144, 170, 187]),
        ];
        for (raw, expected) in cases {
            assert_eq!(color(raw).unwrap(), Rgba(expected), "{:?}", raw);
        }
    }

    #[test]
    fn test_color_invalid() {
        let cases = [
            "",
            "   ",
            "\n",
            "0,0,a0",
            "0xff,0xff,0xff",
            "1,2",
            "10",
            "10,20,30,40,50",
            "255 255 255",
            "255;255;255",
            "300,50,50",
            "256,50,50",
            "-1,50,50",
            "1.5,22,33",
            "#00",
            "#00ff",
            "#foobar",
            "#0010203040",
            "#",
        ];
        for raw in cases {
            assert!(color(raw).is_err(), "{:?}", raw);
        }
    }

    #[test]
    fn test_aspect() {
        assert!((aspect("4:2").unwrap() - 2.0).abs() < 1e-4);
        assert!((aspect("16:9").unwrap() - 1.77777).abs() < 1e-4);
        assert!((aspect("2:3").unwrap() - 0.66666).abs() < 1e-4);

        for raw in ["", "123", "abc:def", "4:3:4", "4-3", "4/3", "-16:9", "0:2", "2:0"] {
            assert!(aspect(raw).is_err(), "{:?}", raw);
        }
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance("4km").unwrap(), 4000.0);
        assert_eq!(distance("4KM").unwrap(), 4000.0);
        assert_eq!(distance("500m").unwrap(), 500.0);
        assert_eq!(distance("500").unwrap(), 500.0);

        for raw in ["", "4 miles", "foo", "-5km", "0"] {
            assert!(distance(raw).is_err(), "{:?}", raw);
        }
    }

    #[test]
    fn test_bbox_valid() {
        let cases = [
            ("47.1,6.5", "47.2,6.6"),
            ("47.1, 6.5", "4km"),
            ("47.1,6.5", "4"),
            ("43°21'18'', 42°26'21''", "4km"),
        ];
        for (a, b) in cases {
            assert!(bbox(a, b).is_ok(), "{:?} {:?}", a, b);
        }

        let b = bbox("47.2,6.6", "47.1,6.5").unwrap();
        assert!(b.minlat < b.maxlat && b.minlon < b.maxlon);
    }

    #[test]
    fn test_bbox_invalid() {
        let cases = [
            ("", ""),
            ("47.1,6.5", ""),
            ("47.1,6.5", "4 miles"),
            ("47.1,6.5", "foo"),
            ("123", "4km"),
            ("abc", "4km"),
            ("89.0,6.5", "88.0,6.6"),
        ];
        for (a, b) in cases {
            assert!(bbox(a, b).is_err(), "{:?} {:?}", a, b);
        }
    }

    #[test]
    fn test_margin() {
        assert_eq!(margin(&["2"]).unwrap(), (2, 2, 2, 2));
        assert_eq!(margin(&["1", "2"]).unwrap(), (1, 2, 1, 2));
        assert_eq!(margin(&["1", "2", "3", "4"]).unwrap(), (1, 2, 3, 4));
        assert_eq!(margin(&["0", "0", "0", "0"]).unwrap(), (0, 0, 0, 0));

        let empty: [&str; 0] = [];
        assert!(margin(&empty).is_err());
        assert!(margin(&["1", "2", "3"]).is_err());
        assert!(margin(&["1", "2", "3", "4", "5"]).is_err());
        assert!(margin(&["-1"]).is_err());
        assert!(margin(&["5.5"]).is_err());
        assert!(margin(&["10px"]).is_err());
    }

    #[test]
    fn test_text_args() {
        let args = text_args(&["NW", "2", "255,0,0", "#ffffff", "My", "Map"]).unwrap();
        assert_eq!(args.placement, Some(Placement::NW));
        assert_eq!(args.border, Some(2));
        assert_eq!(args.color, Some(Rgba([255, 0, 0, 255])));
        assert_eq!(args.background, Some(Rgba([255, 255, 255, 255])));
        assert_eq!(args.text, "My Map");

        let args = text_args(&["Hello", "World"]).unwrap();
        assert_eq!(args.placement, None);
        assert_eq!(args.text, "Hello World");

        // formal arguments stop at the first free value
        let args = text_args(&["Tour", "N", "2"]).unwrap();
        assert_eq!(args.placement, None);
        assert_eq!(args.text, "Tour N 2");

        assert!(text_args(&["N", "2"]).is_err());
        assert!(text_args(&["N", "-2", "text"]).is_err());
    }

    #[test]
    fn test_frame_args() {
        let args = frame_args(&["coordinates", "#ff0000", "4", "0,0,255"]).unwrap();
        assert_eq!(args.width, Some(4));
        assert_eq!(args.color, Some(Rgba([255, 0, 0, 255])));
        assert_eq!(args.alt_color, Some(Rgba([0, 0, 255, 255])));
        assert_eq!(args.style, Some(FrameStyle::Coordinates));

        let empty: [&str; 0] = [];
        assert_eq!(frame_args(&empty).unwrap(), FrameArgs::default());

        assert!(frame_args(&["1", "2"]).is_err());
        assert!(frame_args(&["fancy"]).is_err());
        assert!(frame_args(&["-3"]).is_err());
        assert!(frame_args(&["1", "solid", "0,0,0", "1,1,1", "solid"]).is_err());
    }

    #[test]
    fn test_zoom() {
        assert_eq!(zoom("0").unwrap(), 0);
        assert_eq!(zoom("19").unwrap(), 19);
        assert!(zoom("20").is_err());
        assert!(zoom("-1").is_err());
        assert!(zoom("x").is_err());
    }
}
