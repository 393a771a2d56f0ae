use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use pinpoint::{
    AnnotationSource as _, AnnotationStore, Bounds, CancelToken, CaptureConfig, CaptureSession,
    CssStage, Draft, FrameTicks, PlaybackState, PresentationConfig, Presenter, Quality,
    RealtimeTicks, Resolution, RevealMode, RunStatus, SourceImage, Stage,
};

#[derive(Parser, Debug)]
#[command(name = "pinpoint", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one presentation pass to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render the frame shown at a given presentation time as a PNG.
    Frame(FrameArgs),
    /// Print the phase schedule computed on the deterministic clock.
    Plan(PlanArgs),
    /// Play in real time, logging the style changes a browser would receive.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Annotation as `point:X,Y:TEXT` or `area:LEFT,TOP,WIDTH,HEIGHT:TEXT`, in percent of the
    /// image. Repeat for each annotation; order is presentation order.
    #[arg(long = "mark", value_parser = parse_mark, required = true)]
    marks: Vec<Mark>,

    /// Presentation config JSON (camelCase keys).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Point zoom scale.
    #[arg(long)]
    zoom_scale: Option<f64>,

    /// Zoom-in (and zoom-out) duration in milliseconds.
    #[arg(long)]
    zoom_ms: Option<u64>,

    /// Hold duration in milliseconds.
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Delay before restarting from the first annotation, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Reveal captions one character at a time instead of with the zoom.
    #[arg(long, default_value_t = false)]
    typewriter: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Source image (PNG, JPEG, ...).
    #[arg(long)]
    image: PathBuf,

    /// Output resolution: 1080p, 1440p, 4k, or WIDTHxHEIGHT.
    #[arg(long, default_value = "1080p")]
    resolution: Resolution,

    /// Encoder quality: high, medium, or low.
    #[arg(long, default_value = "high")]
    quality: Quality,

    /// Output frame rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Caption font (TTF/OTF). Captions render without text when omitted.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Output directory; the file name is derived from resolution, quality, and fps.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long, default_value_t = 32)]
    chunk_size: usize,

    /// Render every frame even when it repeats the previous one.
    #[arg(long, default_value_t = false)]
    no_elision: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Presentation time in milliseconds.
    #[arg(long)]
    at_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Laps to schedule.
    #[arg(long, default_value_t = 1)]
    laps: u64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Source image; playback skips visual updates without one.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Laps to play before stopping.
    #[arg(long, default_value_t = 1)]
    laps: u64,

    /// Tick rate in frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

#[derive(Clone, Debug)]
struct Mark {
    draft: Draft,
    text: String,
}

fn parse_mark(s: &str) -> Result<Mark, String> {
    let mut parts = s.splitn(3, ':');
    let kind = parts.next().unwrap_or_default();
    let coords = parts
        .next()
        .ok_or_else(|| format!("mark '{s}' is missing coordinates"))?;
    let text = parts.next().unwrap_or_default().to_owned();
    let nums = coords
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("mark '{s}' has invalid coordinates: {e}"))?;

    let draft = match (kind, nums.as_slice()) {
        ("point", &[x, y]) => Draft::Point { x, y },
        ("area", &[left, top, width, height]) => {
            Draft::Area(Bounds::new(left, top, width, height))
        }
        ("point", _) => return Err(format!("point mark '{s}' needs X,Y")),
        ("area", _) => return Err(format!("area mark '{s}' needs LEFT,TOP,WIDTH,HEIGHT")),
        _ => return Err(format!("mark '{s}' must start with 'point:' or 'area:'")),
    };
    Ok(Mark { draft, text })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Play(args) => cmd_play(args),
    }
}

impl SceneArgs {
    fn presentation(&self) -> anyhow::Result<PresentationConfig> {
        let mut cfg = match &self.config {
            Some(path) => PresentationConfig::from_json_path(path)?,
            None => PresentationConfig::default(),
        };
        if let Some(v) = self.zoom_scale {
            cfg.zoom_scale = v;
        }
        if let Some(v) = self.zoom_ms {
            cfg.zoom_duration_ms = v;
        }
        if let Some(v) = self.hold_ms {
            cfg.point_display_time_ms = v;
        }
        if let Some(v) = self.delay_ms {
            cfg.transition_delay_ms = v;
        }
        if self.typewriter {
            cfg.reveal_mode = RevealMode::Typewriter;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn store(&self) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        for mark in &self.marks {
            match store.add(mark.draft, mark.text.clone()) {
                Ok(id) => {
                    let label = store.label(store.len() - 1).unwrap_or_default();
                    let kind = store.get(id).map_or("?", |a| a.shape.kind());
                    tracing::debug!(%label, kind, "annotation added");
                }
                Err(e) => tracing::warn!(error = %e, "annotation discarded"),
            }
        }
        store
    }
}

impl OutputArgs {
    fn capture_config(&self) -> anyhow::Result<CaptureConfig> {
        let mut cfg = CaptureConfig::new(self.resolution, self.quality, self.fps)?;
        if let Some(path) = &self.font {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            cfg.font = Some(Arc::new(bytes));
        }
        Ok(cfg)
    }

    fn image(&self) -> anyhow::Result<SourceImage> {
        Ok(pinpoint::load_image(&self.image)?)
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let presentation = args.scene.presentation()?;
    let mut capture = args.output.capture_config()?;
    capture.threading.parallel = args.parallel;
    capture.threading.threads = args.threads;
    capture.threading.chunk_size = args.chunk_size;
    capture.threading.static_frame_elision = !args.no_elision;

    let store = args.scene.store();
    let image = args.output.image()?;
    let session = CaptureSession::new(presentation, capture, &store, Some(image))?;
    let artifact = session.record_to_file(&args.out)?;

    if let Some(path) = &artifact.path {
        eprintln!(
            "wrote {} ({} frames, {:.2}s, {} rendered, {} elided)",
            path.display(),
            artifact.frames,
            artifact.duration.as_secs_f64(),
            artifact.stats.frames_rendered,
            artifact.stats.frames_elided,
        );
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let presentation = args.scene.presentation()?;
    let capture = args.output.capture_config()?;
    let store = args.scene.store();
    let image = args.output.image()?;
    let session = CaptureSession::new(presentation, capture, &store, Some(image))?;
    let frame = session.render_still(Duration::from_millis(args.at_ms))?;

    ensure_parent(&args.out)?;
    // Frames are opaque, so premultiplied and straight alpha coincide.
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Prints each phase transition as it happens.
struct SchedulePrinter;

impl Stage for SchedulePrinter {
    fn apply_focus(&mut self, _focus: pinpoint::FocalTransform) {}

    fn show_caption(&mut self, _caption: &pinpoint::Caption) {}

    fn phase_changed(&mut self, at: Duration, state: &PlaybackState) {
        println!(
            "{:>9} ms  {:<16}  item {}  lap {}",
            at.as_millis(),
            state.phase.to_string(),
            state.current_index + 1,
            state.laps + 1,
        );
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let presentation = args.scene.presentation()?;
    let mut store = args.scene.store();
    let lap = presentation.lap_duration(store.annotations().len());
    let mut presenter = Presenter::new(presentation, SchedulePrinter)?;
    if !presenter.start(&mut store, Duration::ZERO) {
        anyhow::bail!("no annotation can be presented");
    }

    // Timing does not depend on pixels.
    let image = SourceImage::solid(1, 1, [0, 0, 0, 255])?;
    let mut ticks = FrameTicks::new(pinpoint::Fps::whole(1000)?);
    let status = pinpoint::drive(
        &mut presenter,
        &mut store,
        &image,
        &mut ticks,
        &CancelToken::new(),
        Some(args.laps),
    );
    println!("lap duration: {} ms ({status:?})", lap.as_millis());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let presentation = args.scene.presentation()?;
    let mut store = args.scene.store();
    let image = args
        .image
        .as_deref()
        .map(pinpoint::load_image)
        .transpose()?;

    let mut presenter = Presenter::new(presentation, CssStage::new())?;
    let mut ticks = RealtimeTicks::at_fps(pinpoint::Fps::whole(args.fps)?);
    if !presenter.start(&mut store, Duration::ZERO) {
        anyhow::bail!("no annotation can be presented");
    }
    let status = pinpoint::drive(
        &mut presenter,
        &mut store,
        &image,
        &mut ticks,
        &CancelToken::new(),
        Some(args.laps),
    );

    let stage = presenter.into_stage();
    eprintln!(
        "playback {} after {} style updates ({} late ticks skipped)",
        match status {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Running => "interrupted",
        },
        stage.updates(),
        ticks.skipped(),
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
