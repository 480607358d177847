//! GPU side of the point field.
//!
//! - `context` owns the wgpu instance, device and surface and reconfigures
//!   the swapchain when the window resizes.
//! - `textures` keeps the four color textures and the mask, starting from
//!   placeholders, and the per-cycle bind groups that pair them.
//! - `pipeline` compiles the point sprite shaders into an instanced,
//!   alpha-blended render pipeline.
//! - `uniforms` mirrors the shader's parameter block.
//! - `state` glues everything together behind the `GpuState` API used by
//!   `window`.

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::GpuState;
