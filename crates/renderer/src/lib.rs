//! Windowed renderer for the point field.
//!
//! ```text
//!   pointfield CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                          │                                   │
//!                          ├─▶ FieldSession::advance() ─────────┤
//!                          └─▶ TextureLoader::poll() ──▶ GPU texture bank
//! ```
//!
//! `WindowState` owns the GPU resources, the animation session and the
//! background texture loader. Every redraw advances the session by one
//! frame, uploads the resulting uniforms and draws one instanced quad per
//! point.

mod compile;
mod gpu;
mod types;
mod window;

use anyhow::Result;

pub use types::*;

/// Thin entry point over the preview window.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and blocks until it is closed.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            compiler = %self.config.shader_compiler,
            "starting point field renderer"
        );
        window::run(&self.config)
    }
}
