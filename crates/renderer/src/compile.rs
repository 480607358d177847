use std::borrow::Cow;

use animator::shading::{DEPTH_TRAVEL, FADE_DEPTH, TEXTURE_EXTENT, WOBBLE_AMPLITUDE};
use anyhow::Result;
use wgpu::naga::ShaderStage;

use crate::types::ShaderCompiler;

pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    compiler: ShaderCompiler,
) -> Result<wgpu::ShaderModule> {
    compile(device, "point sprite vertex", vertex_source(), ShaderStage::Vertex, compiler)
}

pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    compiler: ShaderCompiler,
) -> Result<wgpu::ShaderModule> {
    compile(
        device,
        "point sprite fragment",
        fragment_source(),
        ShaderStage::Fragment,
        compiler,
    )
}

fn compile(
    device: &wgpu::Device,
    label: &str,
    source: String,
    stage: ShaderStage,
    compiler: ShaderCompiler,
) -> Result<wgpu::ShaderModule> {
    tracing::debug!(label, %compiler, "compiling shader");
    match compiler {
        ShaderCompiler::NagaGlsl => Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(source),
                stage,
                defines: &[],
            },
        })),
        ShaderCompiler::Shaderc => compile_shaderc(device, label, &source, stage),
    }
}

#[cfg(feature = "shaderc")]
fn compile_shaderc(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    use anyhow::{anyhow, Context};

    let kind = match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        other => anyhow::bail!("unsupported shader stage {other:?}"),
    };
    let compiler = shaderc::Compiler::new()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("failed to initialise shaderc"))?;
    let artifact = compiler
        .compile_into_spirv(source, kind, label, "main", None)
        .with_context(|| format!("shaderc failed to compile {label}"))?;
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::SpirV(Cow::Owned(artifact.as_binary().to_vec())),
    }))
}

#[cfg(not(feature = "shaderc"))]
fn compile_shaderc(
    _device: &wgpu::Device,
    _label: &str,
    _source: &str,
    _stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    anyhow::bail!("shaderc support is not enabled in this build")
}

/// Formats a constant so GLSL parses it as a float literal.
fn glsl_float(value: f32) -> String {
    let text = format!("{value}");
    if text.contains('.') || text.contains('e') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Uniform block shared by both stages.
///
/// The layout must match `FieldUniforms` in the gpu module.
const UNIFORM_BLOCK: &str = r"layout(std140, set = 0, binding = 0) uniform FieldParams {
    mat4 model_view;
    mat4 projection;
    vec4 viewport;
    float time;
    float move_value;
    float transition;
    float point_scale;
} params;
";

/// Instanced quad expansion of every point.
///
/// Each instance is one point; the four vertices of the strip are the sprite
/// corners, pushed out in clip space so the sprite covers `point_scale / -z`
/// pixels like a GL point sprite.
pub(crate) fn vertex_source() -> String {
    format!(
        r"#version 450
{UNIFORM_BLOCK}
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_coordinates;
layout(location = 2) in float a_speed;
layout(location = 3) in float a_offset;
layout(location = 4) in float a_direction;
layout(location = 5) in float a_press;

layout(location = 0) out vec2 v_uv;
layout(location = 1) out vec2 v_point_coord;
layout(location = 2) out float v_final_z;

const float WOBBLE_AMPLITUDE = {wobble};
const float DEPTH_TRAVEL = {travel};
const float TEXTURE_EXTENT = {extent};

const vec2 corners[4] = vec2[4](
    vec2(-0.5, -0.5),
    vec2(0.5, -0.5),
    vec2(-0.5, 0.5),
    vec2(0.5, 0.5)
);

void main() {{
    vec3 base = a_position;
    float wobble = sin(params.move_value * a_speed) * WOBBLE_AMPLITUDE;
    vec3 displaced = vec3(
        base.x + wobble,
        base.y + wobble,
        base.z + params.move_value * DEPTH_TRAVEL * a_speed + a_offset
    );
    vec3 final_position = mix(displaced, base, params.transition);

    vec4 view_position = params.model_view * vec4(final_position, 1.0);
    float point_size = params.point_scale / -view_position.z;
    vec4 clip = params.projection * view_position;

    vec2 corner = corners[gl_VertexIndex];
    clip.xy += corner * point_size * 2.0 / params.viewport.xy * clip.w;
    gl_Position = clip;

    v_uv = a_coordinates.xy / TEXTURE_EXTENT;
    v_point_coord = vec2(corner.x + 0.5, 0.5 - corner.y);
    v_final_z = final_position.z;
}}
",
        wobble = glsl_float(WOBBLE_AMPLITUDE),
        travel = glsl_float(DEPTH_TRAVEL),
        extent = glsl_float(TEXTURE_EXTENT),
    )
}

/// Cross-fade between the current and next color textures, masked into a
/// round sprite and faded by depth.
pub(crate) fn fragment_source() -> String {
    format!(
        r"#version 450
{UNIFORM_BLOCK}
layout(location = 0) in vec2 v_uv;
layout(location = 1) in vec2 v_point_coord;
layout(location = 2) in float v_final_z;

layout(location = 0) out vec4 out_color;

layout(set = 1, binding = 0) uniform texture2D current_texture;
layout(set = 1, binding = 1) uniform sampler current_sampler;
layout(set = 1, binding = 2) uniform texture2D next_texture;
layout(set = 1, binding = 3) uniform sampler next_sampler;
layout(set = 1, binding = 4) uniform texture2D mask_texture;
layout(set = 1, binding = 5) uniform sampler mask_sampler;

const float FADE_DEPTH = {fade};

void main() {{
    vec4 mask = texture(sampler2D(mask_texture, mask_sampler), v_point_coord);
    vec4 current = texture(sampler2D(current_texture, current_sampler), v_uv);
    vec4 next = texture(sampler2D(next_texture, next_sampler), v_uv);

    vec4 color = mix(current, next, smoothstep(0.0, 1.0, fract(params.move_value)));
    float fade = 1.0 - clamp(abs(v_final_z / FADE_DEPTH), 0.0, 1.0);
    out_color = vec4(color.rgb, color.a * mask.r * fade);
}}
",
        fade = glsl_float(FADE_DEPTH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_always_carry_a_decimal_point() {
        assert_eq!(glsl_float(5.0), "5.0");
        assert_eq!(glsl_float(900.0), "900.0");
        assert_eq!(glsl_float(0.25), "0.25");
    }

    #[test]
    fn vertex_source_injects_displacement_constants() {
        let source = vertex_source();
        assert!(source.starts_with("#version 450"));
        assert!(source.contains("const float WOBBLE_AMPLITUDE = 5.0;"));
        assert!(source.contains("const float DEPTH_TRAVEL = 20.0;"));
        assert!(source.contains("const float TEXTURE_EXTENT = 512.0;"));
        assert!(source.contains("mix(displaced, base, params.transition)"));
        assert!(source.contains("layout(location = 5) in float a_press;"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn fragment_source_binds_two_colors_and_mask() {
        let source = fragment_source();
        assert!(source.contains("const float FADE_DEPTH = 900.0;"));
        assert_eq!(source.matches("uniform texture2D").count(), 3);
        assert_eq!(source.matches("uniform sampler ").count(), 3);
        assert!(source.contains("color.a * mask.r * fade"));
    }

    #[test]
    fn both_stages_share_the_uniform_block() {
        assert!(vertex_source().contains(UNIFORM_BLOCK));
        assert!(fragment_source().contains(UNIFORM_BLOCK));
    }
}
