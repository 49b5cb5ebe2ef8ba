use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use depthtext::DeviceTier;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "depthtext", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Put text behind the subject of a photo and write a PNG.
    Render(RenderArgs),
    /// Print the advisory validation report for a photo as JSON.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Text to draw.
    #[arg(long)]
    text: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Pre-segmented subject PNG (transparent background). Without it the
    /// heuristic fallback segments the photo.
    #[arg(long)]
    cutout: Option<PathBuf>,

    /// Device tier (desktop or mobile): selects limits, timeouts and the compositor.
    #[arg(long, default_value = "desktop")]
    tier: DeviceTier,

    /// Font family.
    #[arg(long, default_value = "sans-serif")]
    font_family: String,

    /// Font size in pixels of the input photo.
    #[arg(long, default_value_t = 64.0)]
    font_size: f32,

    /// Text color (#rgb, #rrggbb or #rrggbbaa).
    #[arg(long, default_value = "#ffffff")]
    color: String,

    /// Opacity in percent.
    #[arg(long, default_value_t = 100.0)]
    opacity: f32,

    /// Horizontal center of the text in input pixels (default: image center).
    #[arg(long)]
    x: Option<f32>,

    /// Vertical center of the text in input pixels (default: image center).
    #[arg(long)]
    y: Option<f32>,

    /// Rotation in degrees.
    #[arg(long, default_value_t = 0.0)]
    rotation: f32,

    /// Blur radius in pixels.
    #[arg(long, default_value_t = 0.0)]
    blur: f32,

    /// Bold weight.
    #[arg(long)]
    bold: bool,

    /// Italic style.
    #[arg(long)]
    italic: bool,

    /// Underline the text.
    #[arg(long)]
    underline: bool,

    /// JSON file overriding the tier's pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the run report (validation, source, metrics) as JSON here.
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Extra directory to load fonts from (repeatable).
    #[arg(long = "fonts-dir")]
    fonts_dir: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Device tier (desktop or mobile) whose limits are checked.
    #[arg(long, default_value = "desktop")]
    tier: DeviceTier,

    /// JSON file overriding the tier's pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Validate(args) => cmd_validate(args),
    }
}

fn load_config(path: Option<&Path>, tier: DeviceTier) -> anyhow::Result<depthtext::PipelineConfig> {
    Ok(match path {
        Some(p) => depthtext::PipelineConfig::from_json_file(p, tier)?,
        None => depthtext::PipelineConfig::for_tier(tier),
    })
}

fn read_photo(path: &Path) -> anyhow::Result<(Vec<u8>, &'static str)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read photo '{}'", path.display()))?;
    let mime = image::guess_format(&bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok((bytes, mime))
}

fn photo_dimensions(bytes: &[u8]) -> anyhow::Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff photo format")?
        .into_dimensions()
        .context("read photo dimensions")
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.tier)?;
    let (bytes, mime) = read_photo(&args.in_path)?;
    let fonts = depthtext::FontBook::with_dirs(&args.fonts_dir);
    if fonts.is_empty() {
        tracing::warn!("no fonts found; text will not be visible");
    }

    let (x, y) = match (args.x, args.y) {
        (Some(x), Some(y)) => (x, y),
        (x, y) => {
            let (w, h) = photo_dimensions(&bytes)?;
            (x.unwrap_or(w as f32 / 2.0), y.unwrap_or(h as f32 / 2.0))
        }
    };
    let text = depthtext::TextRenderOptions {
        content: args.text,
        font_size: args.font_size,
        font_family: args.font_family,
        color: args.color.parse()?,
        opacity_percent: args.opacity,
        x,
        y,
        rotation_degrees: args.rotation,
        blur_radius: args.blur,
        bold: args.bold,
        italic: args.italic,
        underline: args.underline,
    };

    let mut on_progress = |step: &str, percent: u8| tracing::info!(percent, "{step}");
    let out = match &args.cutout {
        Some(path) => {
            let cutout = image::open(path)
                .with_context(|| format!("open cutout '{}'", path.display()))?
                .to_rgba8();
            depthtext::run_pipeline(
                &bytes,
                mime,
                &text,
                depthtext::StaticCutout::new(cutout),
                &config,
                &fonts,
                &mut on_progress,
            )
            .await?
        }
        None => {
            depthtext::run_pipeline(
                &bytes,
                mime,
                &text,
                depthtext::Unavailable,
                &config,
                &fonts,
                &mut on_progress,
            )
            .await?
        }
    };

    for (issue, fix) in out
        .report
        .validation
        .issues
        .iter()
        .zip(&out.report.validation.recommendations)
    {
        tracing::warn!(%fix, "{issue}");
    }

    write_file(&args.out, &out.png)?;
    if let Some(path) = &args.metrics {
        let json = serde_json::to_vec_pretty(&out.report).context("serialize run report")?;
        write_file(path, &json)?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.tier)?;
    let (bytes, _) = read_photo(&args.in_path)?;
    let (w, h) = photo_dimensions(&bytes)?;
    let dims = depthtext::ImageDimensions::new(w, h)?;
    let report = depthtext::validate(bytes.len() as u64, dims, &config.optimization);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize validation report")?
    );
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
