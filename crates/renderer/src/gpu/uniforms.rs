use animator::FrameCommands;
use bytemuck::{Pod, Zeroable};

/// std140 mirror of the `FieldParams` block in the generated GLSL.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FieldUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// `(width, height, 0, 0)` in physical pixels.
    pub viewport: [f32; 4],
    /// Frame counter, as the effect's `time` uniform.
    pub time: f32,
    pub move_value: f32,
    pub transition: f32,
    pub point_scale: f32,
}

impl FieldUniforms {
    pub fn from_frame(frame: &FrameCommands) -> Self {
        Self {
            model_view: frame.model_view().to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            viewport: [
                frame.viewport.width as f32,
                frame.viewport.height as f32,
                0.0,
                0.0,
            ],
            time: frame.clock as f32,
            move_value: frame.move_value,
            transition: frame.transition,
            point_scale: frame.point_scale,
        }
    }
}
