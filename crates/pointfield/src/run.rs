use std::io::{self, Write};

use animator::{CameraSettings, FieldSession, SessionOptions, Viewport};
use anyhow::{Context, Result};
use fieldconfig::{AntialiasSetting, FieldConfig};
use renderer::{Antialiasing, Renderer, RendererConfig};
use textures::{TextureCatalog, TextureFetcher};
use tracing_subscriber::EnvFilter;

use crate::cli::{RunArgs, SimulateArgs};
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&args, &paths)?;
    let renderer_config = renderer_config(&args, &config, &paths)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        cache = %paths.cache_dir().display(),
        size = ?renderer_config.surface_size,
        fps = ?renderer_config.target_fps,
        antialias = ?renderer_config.antialiasing,
        seed = ?renderer_config.session.seed,
        offline = renderer_config.fetcher.is_offline(),
        "resolved pointfield configuration"
    );
    Renderer::new(renderer_config).run()
}

/// Explicit `--config` files must exist; the default file is optional.
fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<FieldConfig> {
    match &args.config {
        Some(path) => FieldConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let path = paths.config_file();
            FieldConfig::load_or_default(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
    }
}

/// Merges the config file with command-line overrides.
fn renderer_config(
    args: &RunArgs,
    config: &FieldConfig,
    paths: &AppPaths,
) -> Result<RendererConfig> {
    let cache_dir = paths.texture_cache_dir();
    let fetcher = if args.offline || config.textures.offline {
        tracing::info!("remote texture fetch disabled (offline)");
        TextureFetcher::offline(cache_dir)
    } else {
        TextureFetcher::new(cache_dir, config.textures.fetch_timeout)
            .context("failed to construct texture client")?
    };

    let (default_colors, default_mask) = TextureCatalog::default_inputs();
    let colors = config.color_inputs().unwrap_or(default_colors);
    let mask = config.textures.mask.clone().unwrap_or(default_mask);

    let mut renderer_config = RendererConfig::new(fetcher);
    renderer_config.surface_size = args
        .size
        .unwrap_or((config.window.width, config.window.height));
    renderer_config.title = config.window.title.clone();
    let fps = args.fps.unwrap_or(config.window.fps);
    renderer_config.target_fps = (fps > 0.0).then_some(fps);
    renderer_config.antialiasing = antialiasing(args.antialias.unwrap_or(config.window.antialias));
    renderer_config.shader_compiler = args.shader_compiler;
    renderer_config.color_space = args.color_space;
    renderer_config.session = SessionOptions {
        seed: args.seed.or(config.field.seed),
        camera: CameraSettings {
            fov_y_degrees: config.camera.fov,
            near: config.camera.near,
            far: config.camera.far,
            distance: config.camera.distance,
        },
        point_scale: config.field.point_scale,
    };
    renderer_config.textures = TextureCatalog::from_inputs(&colors, &mask);
    renderer_config.orbit = config.camera.orbit;
    Ok(renderer_config)
}

fn antialiasing(setting: AntialiasSetting) -> Antialiasing {
    match setting {
        AntialiasSetting::Auto => Antialiasing::Auto,
        AntialiasSetting::Off => Antialiasing::Off,
        AntialiasSetting::Samples2 => Antialiasing::Samples(2),
        AntialiasSetting::Samples4 => Antialiasing::Samples(4),
        AntialiasSetting::Samples8 => Antialiasing::Samples(8),
        AntialiasSetting::Samples16 => Antialiasing::Samples(16),
    }
}

/// Totals gathered by a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    pub frames: u64,
    pub points: usize,
    /// Frames whose `move` value landed exactly on zero.
    pub move_resets: u64,
    pub final_cycle: usize,
}

pub fn simulate(args: SimulateArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = simulate_into(&args, &mut out)?;
    writeln!(
        out,
        "frames={} points={} move_resets={} final_cycle={}",
        summary.frames, summary.points, summary.move_resets, summary.final_cycle
    )?;
    Ok(())
}

fn simulate_into(args: &SimulateArgs, out: &mut impl Write) -> Result<SimulationSummary> {
    let options = SessionOptions {
        seed: args.seed,
        ..SessionOptions::default()
    };
    let (width, height) = args.size;
    let mut session = FieldSession::new(Viewport::new(width, height), options)
        .context("failed to build point field session")?;
    tracing::info!(
        frames = args.frames,
        width,
        height,
        points = session.field().len(),
        "simulating point field"
    );

    let mut move_resets = 0;
    for _ in 0..args.frames {
        let frame = session.advance();
        if frame.move_value == 0.0 {
            move_resets += 1;
        }
        if frame.clock % args.report_every == 0 {
            writeln!(
                out,
                "clock={} move={:.4} cycle={} next={} transition={:.4}",
                frame.clock,
                frame.move_value,
                frame.textures.current,
                frame.textures.next,
                frame.transition
            )?;
        }
    }

    Ok(SimulationSummary {
        frames: session.clock().frame(),
        points: session.field().len(),
        move_resets,
        final_cycle: session.clock().cycle_index(),
    })
}

pub fn print_paths() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("config dir:     {}", paths.config_dir().display());
    println!("config file:    {}", paths.config_file().display());
    println!("cache dir:      {}", paths.cache_dir().display());
    println!("texture cache:  {}", paths.texture_cache_dir().display());
    Ok(())
}
