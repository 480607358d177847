use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::Rng;

/// Points per grid row and column.
pub const GRID_SIDE: u32 = 512;
/// Total number of points in the field.
pub const POINT_COUNT: usize = (GRID_SIDE * GRID_SIDE) as usize;
/// World-space distance between neighbouring grid points.
pub const GRID_SPACING: f32 = 2.0;

const GRID_HALF: i32 = (GRID_SIDE / 2) as i32;

/// Per-point attributes uploaded once as an instance buffer.
///
/// The layout is shared with the vertex shader, so field order and `repr(C)`
/// must not change without updating the pipeline's vertex attributes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointAttributes {
    /// Rest position on the centered grid (`z` is always zero).
    pub position: [f32; 3],
    /// Grid index `(i, j, 0)` used for the texture lookup.
    pub coordinates: [f32; 3],
    /// Displacement rate in `[0.4, 1.0)`.
    pub speed: f32,
    /// Depth offset in `[-1000, 1000)`.
    pub offset: f32,
    /// Either `-1.0` or `1.0`. Uploaded but not read by the shaders.
    pub direction: f32,
    /// Press weight in `[0.4, 1.0)`. Uploaded but not read by the shaders.
    pub press: f32,
}

/// Immutable collection of every point in the effect.
#[derive(Clone, Debug)]
pub struct PointField {
    points: Vec<PointAttributes>,
}

impl PointField {
    /// Lays out the grid and draws fresh random attributes from `rng`.
    ///
    /// Grid positions depend only on the loop indices; everything random is
    /// pulled from `rng` in a fixed order so a seeded generator reproduces
    /// the same field.
    pub fn generate(rng: &mut StdRng) -> Self {
        let mut points = Vec::with_capacity(POINT_COUNT);
        for i in 0..GRID_SIDE as i32 {
            let x = (i - GRID_HALF) as f32 * GRID_SPACING;
            for j in 0..GRID_SIDE as i32 {
                let y = (j - GRID_HALF) as f32 * GRID_SPACING;
                let offset = rng.gen_range(-1000.0..1000.0);
                let speed = rng.gen_range(0.4..1.0);
                let direction = if rng.gen::<f64>() > 0.5 { 1.0 } else { -1.0 };
                let press = rng.gen_range(0.4..1.0);
                points.push(PointAttributes {
                    position: [x, y, 0.0],
                    coordinates: [i as f32, j as f32, 0.0],
                    speed,
                    offset,
                    direction,
                    press,
                });
            }
        }
        Self { points }
    }

    pub fn points(&self) -> &[PointAttributes] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw bytes for the GPU instance buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn field(seed: u64) -> PointField {
        PointField::generate(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn lays_out_full_centered_grid() {
        let field = field(1);
        assert_eq!(field.len(), POINT_COUNT);
        assert_eq!(field.len(), 262_144);

        let mut seen = HashSet::with_capacity(POINT_COUNT);
        for point in field.points() {
            let [x, y, z] = point.position;
            assert_eq!(z, 0.0);
            assert_eq!(x % GRID_SPACING, 0.0);
            assert_eq!(y % GRID_SPACING, 0.0);
            assert!((-512.0..=510.0).contains(&x));
            assert!((-512.0..=510.0).contains(&y));
            assert!(seen.insert((x as i32, y as i32)), "duplicate base position");
        }
    }

    #[test]
    fn coordinates_match_grid_position() {
        let field = field(2);
        let first = field.points()[0];
        assert_eq!(first.position, [-512.0, -512.0, 0.0]);
        assert_eq!(first.coordinates, [0.0, 0.0, 0.0]);

        // j is the inner loop.
        let second = field.points()[1];
        assert_eq!(second.position, [-512.0, -510.0, 0.0]);
        assert_eq!(second.coordinates, [0.0, 1.0, 0.0]);

        let last = field.points()[POINT_COUNT - 1];
        assert_eq!(last.position, [510.0, 510.0, 0.0]);
        assert_eq!(last.coordinates, [511.0, 511.0, 0.0]);

        for point in field.points() {
            let [i, j, k] = point.coordinates;
            assert_eq!(k, 0.0);
            assert_eq!(point.position[0], (i - 256.0) * GRID_SPACING);
            assert_eq!(point.position[1], (j - 256.0) * GRID_SPACING);
        }
    }

    #[test]
    fn random_attributes_stay_in_range() {
        let field = field(3);
        let mut saw_positive = false;
        let mut saw_negative = false;
        for point in field.points() {
            assert!((0.4..1.0).contains(&point.speed), "speed {}", point.speed);
            assert!((-1000.0..1000.0).contains(&point.offset), "offset {}", point.offset);
            assert!((0.4..1.0).contains(&point.press), "press {}", point.press);
            assert!(point.direction == 1.0 || point.direction == -1.0);
            saw_positive |= point.direction > 0.0;
            saw_negative |= point.direction < 0.0;
        }
        assert!(saw_positive && saw_negative);
    }

    #[test]
    fn same_seed_reproduces_field() {
        let a = field(42);
        let b = field(42);
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn instance_bytes_cover_every_point() {
        let field = field(4);
        assert_eq!(std::mem::size_of::<PointAttributes>(), 40);
        assert_eq!(field.as_bytes().len(), POINT_COUNT * 40);
    }
}
