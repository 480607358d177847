//! Headless core of the point-field effect.
//!
//! A [`FieldSession`] owns the grid of points, the frame clock, the model
//! rotation and the camera. Each call to [`FieldSession::advance`] produces
//! the [`FrameCommands`] a renderer needs to draw one frame. Nothing here
//! touches the GPU.

pub mod camera;
pub mod clock;
pub mod field;
pub mod session;
pub mod shading;

pub use camera::{CameraSettings, OrbitControls, PerspectiveCamera};
pub use clock::{AnimationClock, TexturePair, CYCLE_LENGTH};
pub use field::{PointAttributes, PointField, GRID_SIDE, POINT_COUNT};
pub use session::{FieldSession, FrameCommands, SessionError, SessionOptions, Viewport};
