//! receipt-capture CLI.
//!
//! Replays a region capture against a saved viewport screenshot and prints the geometry
//! the browser overlay would compute.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use receipt_capture_lib::adapters::{
    DirectorySink, FileScreenshotSource, FixedViewport, HeadlessRenderer, RasterCropper,
};
use receipt_capture_lib::geometry;
use receipt_capture_lib::{
    CaptureConfig, CaptureServices, EventTarget, PageContext, Point, PointerEvent, Rect,
    ViewportMetadata,
};

#[derive(Parser, Debug)]
#[command(name = "receipt-capture")]
#[command(about = "Region capture and coordinate correction for receipt screenshots")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON). Defaults to the per-user config if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select a region of a saved viewport capture and store the cropped receipt
    Crop(CropArgs),
    /// Print the pixel rectangle for a page-space selection
    PixelRect(PixelRectArgs),
    /// Evaluate browser zoom from window widths
    Zoom(ZoomArgs),
}

#[derive(Args, Debug)]
struct CropArgs {
    /// Full-viewport PNG captured at device resolution
    #[arg(long)]
    frame: PathBuf,

    /// Drag start in viewport coordinates, `X,Y`
    #[arg(long, value_parser = parse_point)]
    from: Point,

    /// Drag end in viewport coordinates, `X,Y`
    #[arg(long, value_parser = parse_point)]
    to: Point,

    /// Page scroll offset, `X,Y`
    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    scroll: Point,

    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    #[arg(long)]
    outer_width: Option<f64>,

    #[arg(long, default_value_t = 1280.0)]
    inner_width: f64,

    /// Where to write the receipt (overrides config)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PixelRectArgs {
    /// Selection in page coordinates, `X,Y,W,H`
    #[arg(long, value_parser = parse_rect)]
    rect: Rect,

    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    scroll: Point,
}

#[derive(Args, Debug)]
struct ZoomArgs {
    #[arg(long)]
    outer: f64,

    #[arg(long)]
    inner: f64,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: could not start runtime: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(cli)) {
        error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = CaptureConfig::load_or_default(cli.config.as_deref())
        .context("Could not load capture config")?;

    match cli.command {
        Commands::Crop(args) => command_crop(config, args).await,
        Commands::PixelRect(args) => command_pixel_rect(args),
        Commands::Zoom(args) => command_zoom(args),
    }
}

async fn command_crop(config: CaptureConfig, args: CropArgs) -> Result<()> {
    let viewport = ViewportMetadata {
        scroll_x: args.scroll.x,
        scroll_y: args.scroll.y,
        device_pixel_ratio: args.dpr,
        outer_width: args.outer_width.unwrap_or(args.inner_width),
        inner_width: args.inner_width,
    };

    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => config.resolved_output_dir()?,
    };
    let sink = Arc::new(DirectorySink::new(out_dir));
    let services = CaptureServices {
        screenshots: Arc::new(FileScreenshotSource::new(&args.frame)),
        cropper: Arc::new(RasterCropper::new(config.artifact_format)),
        sink: sink.clone(),
        viewport: Arc::new(FixedViewport(viewport)),
    };

    let page = PageContext::new();
    let mut session = page.start_session(config, HeadlessRenderer::new(), services)?;

    let scroll = viewport.scroll();
    let at = |p: Point| PointerEvent::from_client(p, scroll, EventTarget::Surface);
    session.pointer_down(at(args.from))?;
    session.pointer_move(at(args.to))?;
    session.pointer_up(at(args.to))?;

    if !session.has_commit_affordance() {
        bail!("Selection is too small to capture.");
    }

    let report = session.commit().await?;
    let output = json!({
        "report": report,
        "paths": sink.written(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn command_pixel_rect(args: PixelRectArgs) -> Result<()> {
    let viewport = ViewportMetadata {
        scroll_x: args.scroll.x,
        scroll_y: args.scroll.y,
        device_pixel_ratio: args.dpr,
        ..ViewportMetadata::default()
    };
    let crop = geometry::crop_rect_for(args.rect, &viewport);
    println!("{}", serde_json::to_string_pretty(&crop)?);
    Ok(())
}

fn command_zoom(args: ZoomArgs) -> Result<()> {
    let zoom = geometry::compute_zoom(args.outer, args.inner);
    println!("{}", serde_json::to_string_pretty(&zoom)?);
    Ok(())
}

fn parse_numbers(raw: &str, expected: usize) -> Result<Vec<f64>, String> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("{}: {}", part, e)))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {} comma-separated numbers, got {}", expected, values.len()));
    }
    Ok(values)
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let v = parse_numbers(raw, 2)?;
    Ok(Point::new(v[0], v[1]))
}

fn parse_rect(raw: &str) -> Result<Rect, String> {
    let v = parse_numbers(raw, 4)?;
    if v[2] < 0.0 || v[3] < 0.0 {
        return Err("width and height must not be negative".to_string());
    }
    Ok(Rect::new(v[0], v[1], v[2], v[3]))
}
