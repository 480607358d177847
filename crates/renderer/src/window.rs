use std::sync::Arc;
use std::time::{Duration, Instant};

use animator::{FieldSession, OrbitControls, SessionError, Viewport};
use anyhow::{anyhow, Context, Result};
use textures::TextureLoader;
use tracing::{debug, error, info, trace, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;
/// Pixels of touchpad scroll that count as one wheel notch.
const PIXELS_PER_SCROLL_STEP: f64 = 50.0;

/// Everything the event loop mutates between frames.
///
/// Field order matters: the GPU state borrows the window's surface and has
/// to drop first.
struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
    session: FieldSession,
    loader: Option<TextureLoader>,
    orbit: Option<OrbitControls>,
    pointer: PointerState,
    pacer: FramePacer,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let session = FieldSession::new(Viewport::new(size.width, size.height), config.session)
            .context("failed to build point field")?;
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            session.field(),
            config.antialiasing,
            config.color_space,
            config.shader_compiler,
        )?;

        let loader = match TextureLoader::spawn(config.textures.clone(), config.fetcher.clone()) {
            Ok(loader) => Some(loader),
            Err(err) => {
                warn!(error = %err, "texture loader unavailable; rendering with placeholders");
                None
            }
        };

        let target_fps = match config.target_fps {
            None if gpu.is_software() => {
                warn!(
                    cap = SOFTWARE_FPS_CAP,
                    "software rasterizer detected; capping frame rate (override with --fps)"
                );
                Some(SOFTWARE_FPS_CAP)
            }
            other => other,
        };

        let orbit = config.orbit.then(|| OrbitControls::attach(session.camera()));

        Ok(Self {
            gpu,
            window,
            session,
            loader,
            orbit,
            pointer: PointerState::default(),
            pacer: FramePacer::new(target_fps),
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            debug!("ignoring resize to an empty surface");
            return;
        }
        self.gpu.resize(new_size);
        let viewport = Viewport::new(new_size.width, new_size.height);
        if viewport == self.session.viewport() {
            return;
        }
        if let Err(err) = rebuild_scene(&mut self.session, &mut self.orbit, viewport) {
            warn!(error = %err, "keeping previous point field");
            return;
        }
        self.gpu.reload_instances(self.session.field());
    }

    fn poll_textures(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        let events = loader.poll();
        if !events.is_empty() {
            debug!(arrived = events.len(), pending = loader.pending(), "texture events");
        }
        for event in events {
            self.gpu.apply_texture(event);
        }
        if loader.is_finished() {
            debug!("texture loader finished");
            self.loader = None;
        }
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.poll_textures();
        let frame = self.session.advance();
        self.gpu.render(&frame)
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let Some((dx, dy)) = self.pointer.move_to(position) else {
            return;
        };
        let Some(orbit) = self.orbit.as_mut() else {
            return;
        };
        let height = self.gpu.size().height as f32;
        match self.pointer.drag {
            Some(DragMode::Rotate) => orbit.rotate(dx, dy, height),
            Some(DragMode::Pan) => {
                let fov = self.session.camera().settings().fov_y_degrees;
                orbit.pan(dx, dy, height, fov);
            }
            None => return,
        }
        orbit.apply(self.session.camera_mut());
    }

    fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let Some(orbit) = self.orbit.as_mut() else {
            return;
        };
        orbit.zoom(scroll_steps(delta));
        orbit.apply(self.session.camera_mut());
    }
}

/// Rebuilds the session for `viewport` and hands the orbit controls a fresh
/// camera, so nothing from the previous scene carries over.
fn rebuild_scene(
    session: &mut FieldSession,
    orbit: &mut Option<OrbitControls>,
    viewport: Viewport,
) -> Result<(), SessionError> {
    session.rebuild(viewport)?;
    if orbit.is_some() {
        *orbit = Some(OrbitControls::attach(session.camera()));
    }
    Ok(())
}

/// Opens the window and runs the event loop until it is closed.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.surface_size.0, config.surface_size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, config)?;
    info!(
        width = state.session.viewport().width,
        height = state.session.viewport().height,
        points = state.session.field().len(),
        "point field ready"
    );
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } if is_exit_key(&event) => elwt.exit(),
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_cursor_moved(position);
                    }
                    WindowEvent::CursorLeft { .. } => state.pointer.release(),
                    WindowEvent::MouseInput {
                        state: button_state,
                        button,
                        ..
                    } => state.pointer.handle_button(button, button_state),
                    WindowEvent::MouseWheel { delta, .. } => state.handle_scroll(delta),
                    WindowEvent::Resized(new_size) => state.resize(new_size),
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        let _ = inner_size_writer.request_inner_size(state.gpu.size());
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        if !state.pacer.ready(now) {
                            return;
                        }
                        match state.render_frame() {
                            Ok(()) => state.pacer.mark_rendered(now),
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.gpu.reconfigure();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory; exiting");
                                elwt.exit();
                            }
                            Err(wgpu::SurfaceError::Timeout) => {
                                debug!("surface timeout; retrying next frame");
                            }
                            Err(other) => {
                                warn!(error = ?other, "surface error; retrying next frame");
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                match state.pacer.next_deadline() {
                    Some(deadline) if deadline > now => {
                        let wait_ms = deadline.saturating_duration_since(now).as_millis();
                        trace!(wait_ms, "pacer: waiting for next frame");
                        elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                    }
                    _ => {
                        trace!("pacer: issuing redraw");
                        state.window().request_redraw();
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

fn is_exit_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Converts a wheel event into zoom steps; positive zooms in.
fn scroll_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_SCROLL_STEP) as f32,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

impl DragMode {
    fn for_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(DragMode::Rotate),
            MouseButton::Right | MouseButton::Middle => Some(DragMode::Pan),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct PointerState {
    position: Option<PhysicalPosition<f64>>,
    drag: Option<DragMode>,
}

impl PointerState {
    /// Records the new cursor position and returns the movement since the
    /// last one while a drag is active.
    fn move_to(&mut self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        let previous = self.position.replace(position)?;
        self.drag?;
        Some((
            (position.x - previous.x) as f32,
            (position.y - previous.y) as f32,
        ))
    }

    fn handle_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if let Some(mode) = DragMode::for_button(button) {
                    self.drag = Some(mode);
                }
            }
            ElementState::Released => {
                if DragMode::for_button(button) == self.drag {
                    self.drag = None;
                }
            }
        }
    }

    fn release(&mut self) {
        self.drag = None;
        self.position = None;
    }
}

/// Spaces frames out when a frame-rate cap is set.
#[derive(Debug)]
struct FramePacer {
    interval: Option<Duration>,
    next_frame: Option<Instant>,
}

impl FramePacer {
    fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            interval,
            next_frame: None,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.next_frame.is_none_or(|deadline| now >= deadline)
    }

    fn mark_rendered(&mut self, now: Instant) {
        self.next_frame = self.interval.map(|interval| now + interval);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.next_frame
    }
}
