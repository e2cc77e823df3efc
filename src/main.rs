// pip-overlay: picture-in-picture compositor demo.
//
// `live`     opens the webcam and shows it as an inset over a background.
//            1-4: corner   +/-: size   S: style   Space: start/stop   Esc: quit
// `snapshot` renders a still image as the inset and writes a PNG.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use image::imageops::FilterType;
use tracing_subscriber::EnvFilter;

use pip_overlay::camera::CameraCapture;
use pip_overlay::font::draw_text_5x7;
use pip_overlay::window::Drawer;
use pip_overlay::{
    AppConfig, FrameBuffer, FrameCompositor, ManualScheduler, PipConfigPatch, PipPosition,
    PipRenderer, PipStyle, SoftwareCanvas, StillImage,
};

#[derive(Parser, Debug)]
#[command(name = "pip-overlay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the webcam as a live inset in a window.
    Live(LiveArgs),
    /// Render a still image as the inset and save the result as PNG.
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug)]
struct PipArgs {
    /// Corner: top-left, top-right, bottom-left, bottom-right.
    #[arg(long)]
    position: Option<String>,

    /// Inset size in percent of the shorter side (clamped to 10..50).
    #[arg(long)]
    size: Option<f32>,

    /// Corner style: square, rounded, circle.
    #[arg(long)]
    style: Option<String>,

    /// Darkening behind the inset, 0..1.
    #[arg(long)]
    overlay_opacity: Option<f32>,
}

impl PipArgs {
    fn to_patch(&self) -> PipConfigPatch {
        PipConfigPatch {
            position: self.position.as_deref().map(PipPosition::parse_lossy),
            size: self.size,
            style: self.style.as_deref().map(PipStyle::parse_lossy),
            overlay_opacity: self.overlay_opacity,
            ..PipConfigPatch::default()
        }
    }
}

#[derive(Parser, Debug)]
struct LiveArgs {
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera index (overrides the config file).
    #[arg(long)]
    camera: Option<u32>,

    /// Image shown behind the inset.
    #[arg(long)]
    background: Option<PathBuf>,

    #[command(flatten)]
    pip: PipArgs,
}

#[derive(Parser, Debug)]
struct SnapshotArgs {
    /// Image drawn inside the inset.
    #[arg(long)]
    video: PathBuf,

    /// Image shown behind the inset.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 720)]
    height: usize,

    /// Frames to run before saving.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    pip: PipArgs,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Live(args) => run_live(args),
        Command::Snapshot(args) => run_snapshot(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load(p).with_context(|| format!("read config {}", p.display())),
        None => Ok(AppConfig::default()),
    }
}

/// Load an image scaled to fill `width` x `height`, or a dark gradient when none is given.
fn load_background(
    path: Option<&Path>,
    width: usize,
    height: usize,
) -> anyhow::Result<FrameBuffer> {
    let Some(path) = path else {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let t = y as f32 / height.max(1) as f32;
            let r = (30.0 + 20.0 * t) as u32;
            let g = (40.0 + 30.0 * t) as u32;
            let b = (70.0 + 60.0 * t) as u32;
            pixels.extend(std::iter::repeat_n((r << 16) | (g << 8) | b, width));
        }
        return Ok(FrameBuffer { width, height, pixels });
    };
    let img = image::open(path)
        .with_context(|| format!("open background {}", path.display()))?
        .to_rgb8();
    let img = image::imageops::resize(&img, width as u32, height as u32, FilterType::Triangle);
    Ok(FrameBuffer::from_rgb_image(&img))
}

fn run_live(args: LiveArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let patch = cfg.pip.merged(args.pip.to_patch());

    let cam_index = args.camera.unwrap_or(cfg.camera.index);
    let cam = CameraCapture::new(cam_index, cfg.camera.width, cfg.camera.height)
        .context("open camera")?;

    let (w, h) = (cfg.window.width, cfg.window.height);
    let background = load_background(args.background.as_deref(), w, h)?;
    let mut drawer = Drawer::new(&cfg.window.title, w, h, cfg.window.target_fps)?;

    let canvas = SoftwareCanvas::new(w, h)?;
    let mut renderer = PipRenderer::new(canvas, cam, ManualScheduler::new())?
        .with_compositor(FrameCompositor::new(cfg.placeholder_label.clone()));
    renderer.start_rendering(patch)?;

    let mut last_fps = 0;
    while drawer.is_open() && !drawer.esc_pressed() {
        /* Inputs: take effect on the next frame */
        if let Some(pos) = drawer.position_pressed() {
            renderer.set_position(pos);
        }
        let step = drawer.size_step();
        if step != 0 {
            let size = renderer.config().size + 2.0 * step as f32;
            renderer.set_size(size);
        }
        if drawer.s_pressed_once() {
            let next = renderer.config().style.next();
            renderer.set_style(next);
        }
        if drawer.space_pressed_once() {
            if renderer.is_rendering() {
                renderer.stop_rendering();
            } else {
                renderer.start_rendering(PipConfigPatch::default())?;
            }
        }

        /* Pull a camera frame, then run whatever frame callbacks are due */
        if renderer.is_rendering() {
            if let Some(cam) = renderer.video_mut() {
                cam.poll();
            }
        }
        for handle in renderer.scheduler_mut().take_due() {
            renderer.on_frame(handle);
        }

        /* Present: canvas over background, plus a HUD */
        let canvas = renderer.canvas().context("renderer lost its canvas")?;
        let mut screen = canvas.flatten_onto(&background)?;
        let stats = renderer.performance_stats();
        let cfg_now = renderer.config();
        let state = if renderer.is_rendering() { "LIVE" } else { "PAUSED" };
        let hud = format!(
            "{state} | {} {} {:.0}% | FPS: {} | {:.1} MS",
            cfg_now.position, cfg_now.style, cfg_now.size, stats.fps, stats.render_time_ms
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);
        drawer.present(&screen)?;

        if stats.fps != last_fps {
            tracing::info!(fps = stats.fps, render_ms = stats.render_time_ms, "render rate");
            last_fps = stats.fps;
        }
    }

    renderer.destroy();
    Ok(())
}

fn run_snapshot(args: SnapshotArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let patch = cfg.pip.merged(args.pip.to_patch());

    let video = StillImage::open(&args.video)
        .with_context(|| format!("open {}", args.video.display()))?;
    let background = load_background(args.background.as_deref(), args.width, args.height)?;

    let canvas = SoftwareCanvas::new(args.width, args.height)?;
    let mut renderer = PipRenderer::new(canvas, video, ManualScheduler::new())?
        .with_compositor(FrameCompositor::new(cfg.placeholder_label.clone()));
    renderer.start_rendering(patch)?;

    for _ in 0..args.frames.max(1) {
        for handle in renderer.scheduler_mut().take_due() {
            renderer.on_frame(handle);
        }
    }
    renderer.stop_rendering();

    let canvas = renderer.canvas().context("renderer lost its canvas")?;
    canvas
        .flatten_onto(&background)?
        .to_rgb_image()
        .save(&args.out)
        .with_context(|| format!("write {}", args.out.display()))?;

    let geom = renderer.geometry();
    tracing::info!(
        out = %args.out.display(),
        x = geom.x,
        y = geom.y,
        size = geom.width,
        render_ms = renderer.performance_stats().render_time_ms,
        "snapshot written"
    );
    renderer.destroy();
    Ok(())
}
