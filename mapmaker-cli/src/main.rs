mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use mapmaker::constants::HILLSHADE;
use mapmaker::data::{geojson, parse};
use mapmaker::decorations::{Area, Cartouche, CompassRose, Composer, Frame};
use mapmaker::icons::IconProvider;
use mapmaker::rendering::canvas::{self, BLACK, WHITE};
use mapmaker::{
    BBox, Config, DiskCache, Fallback, Map, MemoryCache, Placement, TileProvider, TileService,
};

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.silent);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.silent {
                eprintln!("ERROR: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// `info` by default, `warn` with `--silent`; `RUST_LOG` takes precedence.
fn init_logging(silent: bool) {
    let level = if silent { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => {
            log::info!("Using configuration from {}", path.display());
            Config::load(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => Config::builtin()?,
    };
    config.validate().context("invalid configuration")?;

    if !canvas::init_font(config.font.as_deref()) {
        log::warn!("No font available, text will not be drawn");
    }

    let mut bbox = parse::bbox(&cli.area, &cli.area2)?;
    if let Some(aspect) = cli.aspect {
        bbox = bbox.with_aspect(aspect)?;
    }

    let cache_dir = cli
        .cache_dir
        .clone()
        .or_else(Config::default_cache_dir)
        .context("no cache directory available, use --cache-dir")?;

    let app = App {
        cli,
        icons: IconProvider::from_config(&config).map(IconProvider::cached),
        config,
        cache_dir,
        bbox,
    };

    if cli.gallery {
        std::fs::create_dir_all(&cli.path)
            .with_context(|| format!("failed to create {}", cli.path.display()))?;
        for style in app.config.styles() {
            if style == HILLSHADE {
                continue;
            }
            let dst = cli.path.join(format!("{}.png", style));
            // continue with the next style on error
            if let Err(e) = app.make_map(style, &dst).await {
                log::error!("ERROR for {:?}: {:#}", style, e);
            }
        }
        Ok(())
    } else {
        app.make_map(&cli.style, &cli.path).await
    }
}

struct App<'a> {
    cli: &'a Cli,
    config: Config,
    icons: Option<IconProvider>,
    cache_dir: PathBuf,
    bbox: BBox,
}

impl App<'_> {
    /// Service wrapped in disk cache, memory cache and fallback to lower
    /// zoom levels.
    fn provider(&self, style: &str) -> Result<Arc<dyn TileProvider>> {
        let service = TileService::new(self.config.service(style)?)?;
        let disk = DiskCache::new(Arc::new(service), &self.cache_dir).with_config(&self.config.cache);
        let memory = MemoryCache::with_default_capacity(Arc::new(disk));
        Ok(Arc::new(Fallback::new(Arc::new(memory))))
    }

    async fn make_map(&self, style: &str, dst: &Path) -> Result<()> {
        let provider = self.provider(style)?;
        let map = self.build_map(provider.as_ref())?;

        let info = map.info(provider.as_ref())?;
        if !self.cli.silent {
            println!("{}", info);
        }

        if self.cli.dry_run {
            return Ok(());
        }

        let img = map.render(provider).await?;
        img.save_with_format(dst, image::ImageFormat::Png)
            .with_context(|| format!("failed to save {}", dst.display()))?;

        if !self.cli.silent {
            println!("Map saved to {}", dst.display());
        }
        Ok(())
    }

    fn build_map(&self, provider: &dyn TileProvider) -> Result<Map> {
        let cli = self.cli;
        let mut map = Map::new(self.bbox, cli.zoom)
            .with_parallel_downloads(self.config.parallel_downloads)
            .with_composer(self.composer()?);

        if cli.shading {
            map = map.with_shading(self.provider(HILLSHADE)?);
        }

        if let Some(values) = &cli.title {
            let args = parse::text_args(values)?;
            let color = args.color.unwrap_or(BLACK);
            let title = Cartouche::title(args.text)
                .with_placement(args.placement.unwrap_or(Placement::N))
                .with_color(color)
                .with_background(args.background)
                .with_border(args.border.unwrap_or(0), Some(color));
            map.add_decoration(text_area(title.placement), Box::new(title))?;
        }

        if let Some(values) = &cli.comment {
            let args = parse::text_args(values)?;
            let color = args.color.unwrap_or(BLACK);
            let comment = Cartouche::comment(args.text)
                .with_placement(args.placement.unwrap_or(Placement::SSE))
                .with_color(color)
                .with_background(args.background)
                .with_border(args.border.unwrap_or(0), Some(color));
            map.add_decoration(text_area(comment.placement), Box::new(comment))?;
        }

        if cli.copyright {
            match self.config.copyright(&provider.host()) {
                Some(notice) => {
                    let copyright = Cartouche::comment(notice)
                        .with_placement(Placement::ENE)
                        .with_font_size(8.0);
                    map.add_decoration(Area::Margin, Box::new(copyright))?;
                }
                None => log::warn!("No copyright notice for {}", provider.host()),
            }
        }

        if cli.compass {
            map.add_decoration(Area::Map, Box::new(CompassRose::new()))?;
        }

        for arg in &cli.geojson {
            let group = geojson::load_with_icons(arg, self.icons.as_ref())
                .with_context(|| format!("failed to load GeoJSON {:?}", arg))?;
            log::debug!("Loaded {} elements from {}", group.len(), arg);
            map.add_element(Arc::new(group));
        }

        Ok(map)
    }

    fn composer(&self) -> Result<Composer> {
        let cli = self.cli;
        let mut composer = Composer::new();
        composer.set_background(cli.background.unwrap_or(WHITE));

        if let Some(values) = &cli.margin {
            let (top, right, bottom, left) = parse::margin(values)?;
            composer.set_margin(top, right, bottom, left);
        }

        if let Some(values) = &cli.frame {
            let args = parse::frame_args(values)?;
            let frame = Frame::new(args.width.unwrap_or(5))
                .with_color(args.color.unwrap_or(BLACK))
                .with_alt_color(args.alt_color.unwrap_or(WHITE))
                .with_style(args.style.unwrap_or_default());
            composer.set_frame(Some(frame));
        }

        Ok(composer)
    }
}

/// Texts go to the margin unless placed in the center.
fn text_area(placement: Placement) -> Area {
    if Area::Margin.accepts(placement) {
        Area::Margin
    } else {
        Area::Map
    }
}
