use animator::SessionOptions;
use textures::{TextureCatalog, TextureFetcher};

/// Shader compilation backend requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCompiler {
    /// Compile the generated GLSL through shaderc into SPIR-V.
    Shaderc,
    /// Hand GLSL to naga's built-in frontend.
    NagaGlsl,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        if cfg!(feature = "shaderc") {
            ShaderCompiler::Shaderc
        } else {
            ShaderCompiler::NagaGlsl
        }
    }
}

impl std::fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Gamma-encoded swapchain, matching how the hosted textures were authored.
    #[default]
    Auto,
    /// Treat shader outputs/textures as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and use sRGB swapchains/textures for conversion.
    Linear,
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Optional FPS cap; `None` renders once per display refresh.
    pub target_fps: Option<f32>,
    pub antialiasing: Antialiasing,
    pub shader_compiler: ShaderCompiler,
    pub color_space: ColorSpaceMode,
    /// Seed, camera and point-size settings for every session the window builds.
    pub session: SessionOptions,
    pub textures: TextureCatalog,
    pub fetcher: TextureFetcher,
    /// Enables mouse orbit, pan and zoom.
    pub orbit: bool,
}

impl RendererConfig {
    pub fn new(fetcher: TextureFetcher) -> Self {
        Self {
            surface_size: (1280, 720),
            title: "Point Field".to_string(),
            target_fps: None,
            antialiasing: Antialiasing::default(),
            shader_compiler: ShaderCompiler::default(),
            color_space: ColorSpaceMode::default(),
            session: SessionOptions::default(),
            textures: TextureCatalog::default(),
            fetcher,
            orbit: true,
        }
    }
}
