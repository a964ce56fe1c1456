use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageFormat};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use skyline_atlas_core::export::to_json;
use skyline_atlas_core::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "skyline-atlas",
    about = "Fill a fixed-size texture atlas with the Skyline bottom-left packer",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill an atlas with pseudo-randomly sized and coloured squares
    Fill(FillArgs),
    /// Pack image files into a single atlas; images with no room are skipped
    Pack(PackArgs),
}

#[derive(Args, Debug, Clone)]
struct CanvasArgs {
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides canvas options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    /// Canvas width
    #[arg(long, default_value_t = 512, help_heading = "Canvas")]
    width: u32,
    /// Canvas height
    #[arg(long, default_value_t = 512, help_heading = "Canvas")]
    height: u32,
    /// Bytes per pixel: 1 (L) | 2 (LA) | 3 (RGB) | 4 (RGBA)
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=4), help_heading = "Canvas")]
    depth: u32,

    /// Export canvas stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct FillArgs {
    #[command(flatten)]
    canvas: CanvasArgs,
    /// Number of squares to request
    #[arg(long, default_value_t = 512, help_heading = "Fill")]
    count: usize,
    /// RNG seed; the same seed always produces the same atlas
    #[arg(long, default_value_t = 1_000_000_000, help_heading = "Fill")]
    seed: u64,
    /// Smallest square side
    #[arg(long, default_value_t = 10, help_heading = "Fill")]
    min_size: u32,
    /// Largest square side
    #[arg(long, default_value_t = 29, help_heading = "Fill")]
    max_size: u32,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    #[command(flatten)]
    canvas: CanvasArgs,
    /// Include globs, matched against paths relative to INPUT. If set, only matching files are packed
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude globs, matched against paths relative to INPUT
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Sort order: area_desc|height_desc|name_asc|none
    #[arg(long, default_value = "height_desc", value_parser = ["area_desc", "height_desc", "name_asc", "none"], help_heading = "Layout")]
    sort_order: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    if let Some(summary) = run(&cli)? {
        info!(
            requested = summary.requested,
            placed = summary.placed,
            "{}",
            summary.stats.summary()
        );
    }
    Ok(())
}

/// Outcome of one `fill` or `pack` run.
#[derive(Debug, Clone)]
struct RunSummary {
    requested: usize,
    placed: usize,
    stats: AtlasStats,
}

/// Dispatch a parsed command line. `None` means the configuration was only printed.
fn run(cli: &Cli) -> anyhow::Result<Option<RunSummary>> {
    match &cli.command {
        Commands::Fill(args) => run_fill(args),
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
    }
}

fn run_fill(args: &FillArgs) -> anyhow::Result<Option<RunSummary>> {
    if args.min_size == 0 || args.min_size > args.max_size {
        anyhow::bail!(
            "invalid square size range {}..={}",
            args.min_size,
            args.max_size
        );
    }
    let Some(cfg) = resolve_config(&args.canvas)? else {
        return Ok(None);
    };
    let mut atlas = TextureAtlas::new(cfg)?;
    let depth = atlas.depth();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut placed: Vec<(String, Region)> = Vec::new();

    for i in 0..args.count {
        let size = rng.gen_range(args.min_size..=args.max_size);
        let Some(region) = atlas.allocate(size, size)? else {
            debug!(i, size, "no room for square");
            continue;
        };
        let color = [
            rng.gen_range(0..200u8) + 55,
            rng.gen_range(0..200u8) + 55,
            rng.gen_range(0..200u8) + 55,
            255,
        ];
        let area = region.width as usize * region.height as usize;
        let pixels = solid_pixel(color, depth).repeat(area);
        atlas.set(&region, &pixels, region.width as usize * depth as usize)?;
        placed.push((format!("square_{i}"), region));
    }
    info!(
        requested = args.count,
        placed = placed.len(),
        "filled atlas"
    );
    let stats = finish(&mut atlas, &placed, &args.canvas)?;
    Ok(Some(RunSummary {
        requested: args.count,
        placed: placed.len(),
        stats,
    }))
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<Option<RunSummary>> {
    let Some(cfg) = resolve_config(&args.canvas)? else {
        return Ok(None);
    };
    let filter = InputFilter::new(&args.include, &args.exclude)?;
    let paths = collect_sources(&args.input, &filter)?;
    if paths.is_empty() {
        warn!(input = %args.input.display(), "no input images found");
    }
    let mut sources = load_sources(&args.input, &paths, cfg.depth, show_progress)?;
    sort_sources(&mut sources, &args.sort_order);

    let mut atlas = TextureAtlas::new(cfg)?;
    let depth = atlas.depth() as usize;
    let mut placed: Vec<(String, Region)> = Vec::with_capacity(sources.len());
    for src in &sources {
        let Some(region) = atlas.allocate(src.width, src.height)? else {
            warn!(key = %src.key, w = src.width, h = src.height, "no room for image, skipped");
            continue;
        };
        atlas
            .set(&region, &src.bytes, src.width as usize * depth)
            .with_context(|| format!("write {} into atlas", src.key))?;
        placed.push((src.key.clone(), region));
    }
    info!(
        inputs = sources.len(),
        placed = placed.len(),
        "packed images"
    );
    let stats = finish(&mut atlas, &placed, &args.canvas)?;
    Ok(Some(RunSummary {
        requested: sources.len(),
        placed: placed.len(),
        stats,
    }))
}

/// Commit the canvas to a PNG file, write metadata and stats, then release the atlas.
fn finish(
    atlas: &mut TextureAtlas,
    placed: &[(String, Region)],
    args: &CanvasArgs,
) -> anyhow::Result<AtlasStats> {
    if !args.dry_run {
        fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    }
    let png_path = args.out_dir.join(format!("{}.png", args.name));
    let mut target = PngTarget {
        path: png_path.clone(),
        dry_run: args.dry_run,
    };
    atlas
        .commit_to(&mut target)
        .with_context(|| format!("write {}", png_path.display()))?;

    let stats = atlas.stats();
    if args.dry_run {
        println!("{}", stats.summary());
    } else {
        info!(?png_path, "wrote atlas page");
        let json_path = args.out_dir.join(format!("{}.json", args.name));
        let meta = to_json(atlas, placed)?;
        fs::write(&json_path, serde_json::to_string_pretty(&meta)?)
            .with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, regions = placed.len(), "atlas written");
    }

    if let Some(stats_path) = &args.export_stats {
        if args.dry_run {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        }
    }
    atlas.release();
    Ok(stats)
}

/// Merge CLI options with the optional YAML file. Returns `None` when the merged
/// configuration was only printed.
fn resolve_config(args: &CanvasArgs) -> anyhow::Result<Option<AtlasConfig>> {
    let base = AtlasConfig::builder()
        .with_dimensions(args.width, args.height)
        .depth(args.depth)
        .build();
    let cfg = if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.into_atlas_config(base)
    } else {
        base
    };
    cfg.validate()?;
    // PNG output only covers L/LA/RGB/RGBA.
    if !(1..=4).contains(&cfg.depth) {
        anyhow::bail!("depth must be 1..=4, got {}", cfg.depth);
    }

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(None);
    }
    Ok(Some(cfg))
}

/// Upload target that stores the committed canvas as a PNG file.
struct PngTarget {
    path: PathBuf,
    dry_run: bool,
}

impl TextureTarget for PngTarget {
    fn upload(&mut self, view: &CanvasView<'_>) -> skyline_atlas_core::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        view.to_image()?
            .save_with_format(&self.path, ImageFormat::Png)?;
        Ok(())
    }
}

fn solid_pixel(color: [u8; 4], depth: u32) -> Vec<u8> {
    match depth {
        1 => vec![color[0]],
        2 => vec![color[0], color[3]],
        3 => color[..3].to_vec(),
        _ => color.to_vec(),
    }
}

/// Include/exclude globs, matched against paths relative to the pack input.
struct InputFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl InputFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
        })
    }

    /// Decodable image formats that pass both glob sets.
    fn accepts(&self, key: &str, path: &Path) -> bool {
        let decodable = matches!(
            ImageFormat::from_path(path),
            Ok(ImageFormat::Png | ImageFormat::Jpeg)
        );
        decodable
            && self.include.as_ref().is_none_or(|set| set.is_match(key))
            && !self.exclude.as_ref().is_some_and(|set| set.is_match(key))
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).with_context(|| format!("bad glob {pat:?}"))?);
    }
    Ok(Some(builder.build()?))
}

/// Key an input by its path relative to the pack root, with `/` separators.
fn source_key(root: &Path, path: &Path) -> String {
    let rel = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };
    rel.to_string_lossy().replace('\\', "/")
}

/// Accepted image files under `input` (or `input` itself), in file-name order.
fn collect_sources(input: &Path, filter: &InputFilter) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        let key = source_key(input, input);
        return Ok(if filter.accepts(&key, input) {
            vec![input.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !input.is_dir() {
        anyhow::bail!("input {} does not exist", input.display());
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skip unreadable entry");
                continue;
            }
        };
        let key = source_key(input, entry.path());
        if entry.file_type().is_file() && filter.accepts(&key, entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// A decoded input, already converted to the atlas depth.
#[derive(Debug, Clone)]
struct SourceImage {
    key: String,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

/// Decode every path into tightly packed pixels of `depth` bytes. Files that
/// fail to decode are logged and left out.
fn load_sources(
    root: &Path,
    paths: &[PathBuf],
    depth: u32,
    progress: bool,
) -> anyhow::Result<Vec<SourceImage>> {
    let bar = if progress {
        ProgressBar::new(paths.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(ProgressStyle::with_template(
        "{bar:30.cyan/blue} {pos}/{len} decoding {msg}",
    )?);

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let key = source_key(root, path);
        bar.set_message(key.clone());
        match image::open(path) {
            Ok(img) => sources.push(SourceImage {
                width: img.width(),
                height: img.height(),
                bytes: convert_to_depth(&img, depth)?,
                key,
            }),
            Err(e) => warn!(%key, error = %e, "cannot decode image, skipped"),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    debug!(decoded = sources.len(), of = paths.len(), "loaded input images");
    Ok(sources)
}

fn convert_to_depth(img: &DynamicImage, depth: u32) -> anyhow::Result<Vec<u8>> {
    Ok(match depth {
        1 => img.to_luma8().into_raw(),
        2 => img.to_luma_alpha8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        d => anyhow::bail!("unsupported depth {d}"),
    })
}

fn sort_sources(sources: &mut [SourceImage], order: &str) {
    match order {
        "area_desc" => sources.sort_by_key(|s| Reverse(s.width as u64 * s.height as u64)),
        "height_desc" => sources.sort_by_key(|s| (Reverse(s.height), Reverse(s.width))),
        "name_asc" => sources.sort_by(|a, b| a.key.cmp(&b.key)),
        _ => {}
    }
}

/// Level used when `RUST_LOG` is unset.
fn default_level(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` wins over `-v`/`-q`, except that `--quiet` always forces errors only.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = default_level(quiet, verbose);
    let filter = if quiet {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<u32>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> AtlasConfig {
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.depth {
            cfg.depth = v;
        }
        cfg
    }
}
