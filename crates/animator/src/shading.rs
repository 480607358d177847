//! CPU reference of the per-vertex and per-fragment functions.
//!
//! The renderer's GLSL is generated from the constants below, so these
//! functions and the GPU shaders evaluate the same expressions. They are
//! used by tests and by the headless simulation.

use glam::{Vec3, Vec4};

use crate::field::{PointAttributes, GRID_SIDE};

/// Amplitude of the sideways wobble in world units.
pub const WOBBLE_AMPLITUDE: f32 = 5.0;
/// Depth travelled per unit of `move` and `speed`.
pub const DEPTH_TRAVEL: f32 = 20.0;
/// Numerator of the perspective point-size falloff, in pixels.
pub const POINT_SCALE: f32 = 3000.0;
/// Depth at which points have faded out completely.
pub const FADE_DEPTH: f32 = 900.0;
/// Divisor mapping grid indices back into texture space.
pub const TEXTURE_EXTENT: f32 = GRID_SIDE as f32;

/// Displaced position before pulling back toward the rest position.
pub fn displaced(point: &PointAttributes, move_value: f32) -> Vec3 {
    let base = Vec3::from(point.position);
    let wobble = (move_value * point.speed).sin() * WOBBLE_AMPLITUDE;
    Vec3::new(
        base.x + wobble,
        base.y + wobble,
        base.z + move_value * DEPTH_TRAVEL * point.speed + point.offset,
    )
}

/// Final model-space position of a point.
///
/// `transition` is a raw sine sample; values below zero overshoot past the
/// displaced position and are intentionally not clamped.
pub fn displace(point: &PointAttributes, move_value: f32, transition: f32) -> Vec3 {
    let base = Vec3::from(point.position);
    let moved = displaced(point, move_value);
    moved * (1.0 - transition) + base * transition
}

/// Sprite size in pixels for a point at view-space depth `view_z`.
///
/// `view_z` is negative in front of the camera.
pub fn point_screen_size(view_z: f32, scale: f32) -> f32 {
    scale / -view_z
}

/// Texture lookup location for a point.
pub fn texture_uv(point: &PointAttributes) -> [f32; 2] {
    [
        point.coordinates[0] / TEXTURE_EXTENT,
        point.coordinates[1] / TEXTURE_EXTENT,
    ]
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `fract`: `x - floor(x)`.
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Weight of the next texture in the cross-fade.
pub fn blend_factor(move_value: f32) -> f32 {
    smoothstep(0.0, 1.0, fract(move_value))
}

/// Alpha multiplier that fades points far from the grid plane.
pub fn depth_fade(final_z: f32) -> f32 {
    1.0 - (final_z / FADE_DEPTH).abs().clamp(0.0, 1.0)
}

/// Composites one sprite fragment.
///
/// `current` and `next` are the two color samples at the point's UV,
/// `mask_red` the red channel of the mask at the sprite-local coordinate.
pub fn composite(current: Vec4, next: Vec4, mask_red: f32, move_value: f32, final_z: f32) -> Vec4 {
    let weight = blend_factor(move_value);
    let blended = current * (1.0 - weight) + next * weight;
    Vec4::new(
        blended.x,
        blended.y,
        blended.z,
        blended.w * mask_red * depth_fade(final_z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> PointAttributes {
        PointAttributes {
            position: [10.0, -20.0, 0.0],
            coordinates: [261.0, 246.0, 0.0],
            speed: 0.5,
            offset: 100.0,
            direction: 1.0,
            press: 0.7,
        }
    }

    #[test]
    fn displacement_follows_move_and_speed() {
        let p = point();
        let at_rest = displaced(&p, 0.0);
        assert_eq!(at_rest, Vec3::new(10.0, -20.0, 100.0));

        let moved = displaced(&p, 2.0);
        let wobble = (1.0f32).sin() * 5.0;
        assert!((moved.x - (10.0 + wobble)).abs() < 1e-5);
        assert!((moved.y - (-20.0 + wobble)).abs() < 1e-5);
        assert!((moved.z - (2.0 * 20.0 * 0.5 + 100.0)).abs() < 1e-5);
    }

    #[test]
    fn zero_transition_applies_full_displacement() {
        let p = point();
        assert_eq!(displace(&p, 1.5, 0.0), displaced(&p, 1.5));
    }

    #[test]
    fn full_transition_returns_to_base() {
        let p = point();
        let result = displace(&p, 3.2, 1.0);
        assert_eq!(result, Vec3::from(p.position));
    }

    #[test]
    fn negative_transition_overshoots() {
        let p = point();
        let displaced = displaced(&p, 1.0);
        let result = displace(&p, 1.0, -0.5);
        // Overshoot moves further away from the base than the displaced point.
        assert!(result.z > displaced.z);
        let expected = displaced + (displaced - Vec3::from(p.position)) * 0.5;
        assert!((result - expected).length() < 1e-3);
    }

    #[test]
    fn point_size_falls_off_with_depth() {
        assert_eq!(point_screen_size(-1000.0, POINT_SCALE), 3.0);
        assert_eq!(point_screen_size(-500.0, POINT_SCALE), 6.0);
    }

    #[test]
    fn uv_maps_grid_index_to_texture_space() {
        let uv = texture_uv(&point());
        assert_eq!(uv, [261.0 / 512.0, 246.0 / 512.0]);
    }

    #[test]
    fn blend_factor_rises_from_zero_to_one() {
        assert_eq!(blend_factor(0.0), 0.0);
        assert_eq!(blend_factor(1.0), 0.0);
        assert_eq!(blend_factor(3.0), 0.0);
        assert!((blend_factor(2.5) - 0.5).abs() < 1e-6);
        let mut last = 0.0;
        for step in 1..100 {
            let value = blend_factor(1.0 + step as f32 / 100.0);
            assert!(value > last);
            last = value;
        }
        assert!(last > 0.99);
    }

    #[test]
    fn depth_fade_clamps_to_unit_range() {
        assert_eq!(depth_fade(0.0), 1.0);
        assert!((depth_fade(450.0) - 0.5).abs() < 1e-6);
        assert!((depth_fade(-450.0) - 0.5).abs() < 1e-6);
        assert_eq!(depth_fade(900.0), 0.0);
        assert_eq!(depth_fade(5000.0), 0.0);
    }

    #[test]
    fn composite_masks_and_fades_alpha_only() {
        let a = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let b = Vec4::new(0.0, 0.0, 1.0, 1.0);

        let start = composite(a, b, 1.0, 0.0, 0.0);
        assert_eq!(start, a);

        let halfway = composite(a, b, 0.5, 0.5, 450.0);
        assert!((halfway.x - 0.5).abs() < 1e-6);
        assert!((halfway.z - 0.5).abs() < 1e-6);
        assert!((halfway.w - 0.25).abs() < 1e-6);

        let masked_out = composite(a, b, 0.0, 0.25, 0.0);
        assert_eq!(masked_out.w, 0.0);
        assert!(masked_out.x > 0.0);
    }
}
