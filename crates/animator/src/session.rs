use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

use crate::camera::{CameraSettings, PerspectiveCamera};
use crate::clock::{AnimationClock, TexturePair};
use crate::field::PointField;
use crate::shading::POINT_SCALE;

/// Radians added to each model rotation axis per frame.
pub const ROTATION_STEP: f32 = 0.005;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("viewport {width}x{height} has no area")]
    EmptyViewport { width: u32, height: u32 },
}

/// Drawable size in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    fn validate(self) -> Result<Self, SessionError> {
        if self.width == 0 || self.height == 0 {
            return Err(SessionError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionOptions {
    /// Seed for attribute generation; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub camera: CameraSettings,
    /// Numerator of the perspective point-size falloff.
    pub point_scale: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            camera: CameraSettings::default(),
            point_scale: POINT_SCALE,
        }
    }
}

/// Everything the shading stage needs to draw one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCommands {
    pub clock: u64,
    pub move_value: f32,
    pub transition: f32,
    pub textures: TexturePair,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
    pub point_scale: f32,
}

impl FrameCommands {
    pub fn model_view(&self) -> Mat4 {
        self.view * self.model
    }
}

/// Owns the point field and every piece of mutable animation state.
#[derive(Debug)]
pub struct FieldSession {
    options: SessionOptions,
    generation: u64,
    viewport: Viewport,
    field: PointField,
    clock: AnimationClock,
    rotation_x: f32,
    rotation_y: f32,
    camera: PerspectiveCamera,
}

impl FieldSession {
    pub fn new(viewport: Viewport, options: SessionOptions) -> Result<Self, SessionError> {
        Self::build(viewport, options, 0)
    }

    fn build(viewport: Viewport, options: SessionOptions, generation: u64) -> Result<Self, SessionError> {
        let viewport = viewport.validate()?;
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(generation)),
            None => StdRng::from_entropy(),
        };
        let field = PointField::generate(&mut rng);
        let camera = PerspectiveCamera::new(options.camera, viewport.aspect());
        debug!(
            width = viewport.width,
            height = viewport.height,
            generation,
            points = field.len(),
            "built point field session"
        );
        Ok(Self {
            options,
            generation,
            viewport,
            field,
            clock: AnimationClock::new(),
            rotation_x: 0.0,
            rotation_y: 0.0,
            camera,
        })
    }

    /// Replaces the session with a fresh one sized for `viewport`.
    ///
    /// Grid positions come back identical; speed, offset, direction and
    /// press are drawn again. A seeded session stays reproducible because
    /// each rebuild advances the seed by one.
    pub fn rebuild(&mut self, viewport: Viewport) -> Result<(), SessionError> {
        let next = Self::build(viewport, self.options, self.generation.wrapping_add(1))?;
        info!(
            width = viewport.width,
            height = viewport.height,
            "rebuilt point field for resized viewport"
        );
        *self = next;
        Ok(())
    }

    /// Steps the animation by one frame.
    pub fn advance(&mut self) -> FrameCommands {
        self.clock.tick();
        self.rotation_x += ROTATION_STEP;
        self.rotation_y += ROTATION_STEP;
        self.commands()
    }

    /// Frame state without advancing.
    pub fn commands(&self) -> FrameCommands {
        FrameCommands {
            clock: self.clock.frame(),
            move_value: self.clock.move_value(),
            transition: self.clock.transition(),
            textures: self.clock.textures(),
            model: self.model(),
            view: self.camera.view(),
            projection: self.camera.projection(),
            viewport: self.viewport,
            point_scale: self.options.point_scale,
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotation_x) * Mat4::from_rotation_y(self.rotation_y)
    }

    pub fn field(&self) -> &PointField {
        &self.field
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }
}
