use clap::Parser;
use mapmaker::data::parse;
use mapmaker::rendering::canvas::Color;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mapmaker")]
#[command(about = "Create map images from tile servers.", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Bounding box coordinates. Either two lat,lon pairs
    /// ("47.437,10.953 47.374,11.133") or a center point and a radius
    /// ("47.437,10.953 4km"). Southern and western values can be negative
    /// ("-33.86,151.21") or use a suffix ("33.86S,151.21").
    #[arg(value_name = "AREA", allow_hyphen_values = true)]
    pub area: String,

    /// Second corner of the bounding box or radius around the first.
    #[arg(value_name = "AREA", allow_hyphen_values = true)]
    pub area2: String,

    /// Where to save the generated image.
    #[arg(value_name = "PATH", default_value = "map.png")]
    pub path: PathBuf,

    /// Zoom level (0..19), higher means more detailed.
    #[arg(short, long, default_value_t = 8, value_parser = parse::zoom)]
    pub zoom: u8,

    /// Map style, one of the configured services.
    #[arg(short, long, default_value = "osm")]
    pub style: String,

    /// Aspect ratio (e.g. "16:9"), extends the bounding box to match.
    #[arg(short, long, value_parser = parse::aspect)]
    pub aspect: Option<f64>,

    /// Add hillshading.
    #[arg(long)]
    pub shading: bool,

    /// Add copyright notice.
    #[arg(long)]
    pub copyright: bool,

    /// Add a title: [PLACEMENT] [BORDER] [COLOR] [BGCOLOR] followed by the
    /// title text.
    #[arg(long, value_name = "ARGS", num_args = 1..)]
    pub title: Option<Vec<String>>,

    /// Add a comment, same arguments as for the title.
    #[arg(long, value_name = "ARGS", num_args = 1..)]
    pub comment: Option<Vec<String>>,

    /// Add a margin around the map ("TOP RIGHT BOTTOM LEFT", "VERTICAL
    /// HORIZONTAL" or "ALL").
    #[arg(long, value_name = "N", num_args = 1..=4)]
    pub margin: Option<Vec<String>>,

    /// Background color for the margin.
    #[arg(long, value_name = "RGBA", value_parser = parse::color)]
    pub background: Option<Color>,

    /// Draw a frame around the map area, any of WIDTH, COLOR, ALT_COLOR and
    /// STYLE.
    #[arg(long, value_name = "ARGS", num_args = 0..=4)]
    pub frame: Option<Vec<String>>,

    /// Draw a compass rose on the map.
    #[arg(long)]
    pub compass: bool,

    /// GeoJSON file or string to draw on the map.
    #[arg(long, value_name = "PATH")]
    pub geojson: Vec<String>,

    /// Create a map image for each available style, PATH is a directory.
    #[arg(long)]
    pub gallery: bool,

    /// Show map info, do not download tiles.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not output messages to the console.
    #[arg(long)]
    pub silent: bool,

    /// Alternative configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Alternative tile cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mapmaker", "47.437,10.953", "4km"]).unwrap();
        assert_eq!(cli.area, "47.437,10.953");
        assert_eq!(cli.area2, "4km");
        assert_eq!(cli.path, PathBuf::from("map.png"));
        assert_eq!(cli.zoom, 8);
        assert_eq!(cli.style, "osm");
        assert!(cli.title.is_none());
        assert!(cli.frame.is_none());
        assert!(cli.geojson.is_empty());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "mapmaker",
            "47.437,10.953",
            "47.374,11.133",
            "out.png",
            "-z",
            "12",
            "--style",
            "topo",
            "--frame",
            "--margin",
            "10",
            "20",
            "--geojson",
            "a.geojson",
            "--geojson",
            "b.geojson",
            "--title",
            "NW",
            "My",
            "Map",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("out.png"));
        assert_eq!(cli.zoom, 12);
        assert_eq!(cli.style, "topo");
        assert_eq!(cli.frame, Some(vec![]));
        assert_eq!(cli.margin, Some(vec!["10".to_string(), "20".to_string()]));
        assert_eq!(cli.geojson.len(), 2);
        assert_eq!(
            cli.title,
            Some(vec!["NW".to_string(), "My".to_string(), "Map".to_string()])
        );
    }

    #[test]
    fn test_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "mapmaker",
            "-z",
            "10",
            "-33.86,151.21",
            "-33.9,151.3",
            "-s",
            "topo",
        ])
        .unwrap();
        assert_eq!(cli.area, "-33.86,151.21");
        assert_eq!(cli.area2, "-33.9,151.3");
        assert_eq!(cli.zoom, 10);
        assert_eq!(cli.style, "topo");

        let bbox = parse::bbox(&cli.area, &cli.area2).unwrap();
        assert!(bbox.minlat < -33.8);
    }

    #[test]
    fn test_invalid_zoom() {
        assert!(Cli::try_parse_from(["mapmaker", "47.4,10.9", "4km", "-z", "20"]).is_err());
    }

    #[test]
    fn test_missing_area() {
        assert!(Cli::try_parse_from(["mapmaker", "47.4,10.9"]).is_err());
    }
}
