use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fieldconfig::{parse_antialias, AntialiasSetting};
use renderer::{ColorSpaceMode, ShaderCompiler};

#[derive(Parser, Debug)]
#[command(
    name = "pointfield",
    author,
    version,
    about = "Animated point field of 262,144 textured sprites"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `pointfield.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0 = display refresh).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an MSAA sample count (2/4/8/16).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_color_space,
        default_value = "auto"
    )]
    pub color_space: ColorSpaceMode,

    /// Shader compiler backend: `naga` or `shaderc` (needs the `shaderc` feature).
    #[arg(
        long,
        value_name = "COMPILER",
        value_parser = parse_shader_compiler,
        default_value_t = ShaderCompiler::default()
    )]
    pub shader_compiler: ShaderCompiler,

    /// Seed for the random point attributes; omitted means fresh entropy.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Never touch the network; textures come from the cache or local files.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the animation without a window and print what each frame would draw.
    Simulate(SimulateArgs),
    /// Print resolved configuration and cache directories.
    Paths,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of frames to advance.
    #[arg(long, value_name = "N", default_value_t = 1600)]
    pub frames: u64,

    /// Viewport size the session is built for.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Print one line every N frames.
    #[arg(
        long,
        value_name = "N",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub report_every: u64,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero in both dimensions".into());
    }
    Ok((width, height))
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid fps '{value}'"))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("fps must be a non-negative number".into());
    }
    Ok(fps)
}

pub fn parse_shader_compiler(value: &str) -> Result<ShaderCompiler, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "shaderc" => Ok(ShaderCompiler::Shaderc),
        "naga" | "naga-glsl" => Ok(ShaderCompiler::NagaGlsl),
        other => Err(format!(
            "unknown shader compiler '{other}'; expected naga or shaderc"
        )),
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 800X600 ").unwrap(), (800, 600));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn parses_fps() {
        assert_eq!(parse_fps("30").unwrap(), 30.0);
        assert_eq!(parse_fps("0").unwrap(), 0.0);
        assert!(parse_fps("-1").is_err());
        assert!(parse_fps("inf").is_err());
    }

    #[test]
    fn parses_backends_and_color_spaces() {
        assert_eq!(parse_shader_compiler("naga").unwrap(), ShaderCompiler::NagaGlsl);
        assert_eq!(parse_shader_compiler("ShaderC").unwrap(), ShaderCompiler::Shaderc);
        assert!(parse_shader_compiler("glslang").is_err());
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert_eq!(parse_color_space("gamma").unwrap(), ColorSpaceMode::Gamma);
        assert!(parse_color_space("hdr").is_err());
    }

    #[test]
    fn simulate_subcommand_defaults() {
        let cli = Cli::try_parse_from(["pointfield", "simulate"]).unwrap();
        match cli.command {
            Some(Command::Simulate(args)) => {
                assert_eq!(args.frames, 1600);
                assert_eq!(args.size, (800, 600));
                assert_eq!(args.report_every, 100);
                assert_eq!(args.seed, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn report_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["pointfield", "simulate", "--report-every", "0"]).is_err());
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "pointfield",
            "--size",
            "640x480",
            "--fps",
            "30",
            "--antialias",
            "4",
            "--seed",
            "9",
            "--offline",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.size, Some((640, 480)));
        assert_eq!(cli.run.fps, Some(30.0));
        assert_eq!(cli.run.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(cli.run.seed, Some(9));
        assert!(cli.run.offline);
        assert_eq!(cli.run.color_space, ColorSpaceMode::Auto);
    }
}
