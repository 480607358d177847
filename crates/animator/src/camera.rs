use glam::{Mat4, Vec3};

/// Lens and placement of the perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial distance from the origin along +Z.
    pub distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 70.0,
            near: 0.1,
            far: 3000.0,
            distance: 1000.0,
        }
    }
}

/// Perspective camera looking at a target point.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    settings: CameraSettings,
    aspect: f32,
    eye: Vec3,
    target: Vec3,
    up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(settings: CameraSettings, aspect: f32) -> Self {
        Self {
            settings,
            aspect,
            eye: Vec3::new(0.0, 0.0, settings.distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// World-to-view transform.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// View-to-clip transform with a `0..1` depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.settings.fov_y_degrees.to_radians(),
            self.aspect,
            self.settings.near,
            self.settings.far,
        )
    }

    fn place(&mut self, eye: Vec3, target: Vec3) {
        self.eye = eye;
        self.target = target;
    }
}

/// Mouse-driven orbit around the camera target.
///
/// Rotation and dolly are expressed in spherical coordinates relative to the
/// target; pan slides the target and the eye together in the view plane.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    radius: f32,
    /// Angle from the +Y axis.
    polar: f32,
    /// Angle around +Y, measured from +Z.
    azimuth: f32,
    target: Vec3,
    min_radius: f32,
    max_radius: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

const POLAR_EPSILON: f32 = 1e-3;

impl OrbitControls {
    /// Starts from the camera's current placement.
    pub fn attach(camera: &PerspectiveCamera) -> Self {
        let offset = camera.eye() - camera.target();
        let radius = offset.length().max(f32::EPSILON);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        let settings = camera.settings();
        Self {
            radius,
            polar,
            azimuth,
            target: camera.target(),
            min_radius: settings.near * 10.0,
            max_radius: settings.far,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Orbits by a pointer delta in pixels over a viewport of `height` pixels.
    ///
    /// A drag across the full viewport height turns the camera by one full
    /// revolution.
    pub fn rotate(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        let turn = std::f32::consts::TAU / height * self.rotate_speed;
        self.azimuth -= dx * turn;
        self.polar = (self.polar - dy * turn).clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
    }

    /// Moves the target in the view plane so content follows the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, height: f32, fov_y_degrees: f32) {
        let height = height.max(1.0);
        let world_per_pixel = 2.0 * self.radius * (fov_y_degrees.to_radians() * 0.5).tan() / height;
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        self.target += (-right * dx + up * dy) * world_per_pixel;
    }

    /// Dollies toward (`steps > 0`) or away from the target.
    pub fn zoom(&mut self, steps: f32) {
        let scale = 0.95f32.powf(steps * self.zoom_speed);
        self.radius = (self.radius * scale).clamp(self.min_radius, self.max_radius);
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + Vec3::new(
                self.radius * sin_polar * self.azimuth.sin(),
                self.radius * self.polar.cos(),
                self.radius * sin_polar * self.azimuth.cos(),
            )
    }

    /// Writes the orbit placement back into the camera.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.place(self.eye(), self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(CameraSettings::default(), 800.0 / 600.0)
    }

    #[test]
    fn default_camera_sits_on_positive_z() {
        let camera = camera();
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, 1000.0));
        let origin_in_view = camera.view().transform_point3(Vec3::ZERO);
        assert!((origin_in_view.z + 1000.0).abs() < 1e-3);
        assert!((camera.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let camera = camera();
        let projection = camera.projection();
        let near = projection.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = projection.project_point3(Vec3::new(0.0, 0.0, -3000.0));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn attach_recovers_initial_placement() {
        let camera = camera();
        let controls = OrbitControls::attach(&camera);
        assert!((controls.radius() - 1000.0).abs() < 1e-3);
        assert!((controls.polar() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(controls.azimuth().abs() < 1e-6);
        assert!((controls.eye() - camera.eye()).length() < 1e-2);
    }

    #[test]
    fn rotate_keeps_distance_and_clamps_poles() {
        let mut camera = camera();
        let mut controls = OrbitControls::attach(&camera);
        controls.rotate(150.0, 0.0, 600.0);
        controls.apply(&mut camera);
        assert!((camera.eye().length() - 1000.0).abs() < 1e-2);
        assert!(camera.eye().x.abs() > 1.0);

        controls.rotate(0.0, 10_000.0, 600.0);
        assert!(controls.polar() >= POLAR_EPSILON);
        controls.rotate(0.0, -20_000.0, 600.0);
        assert!(controls.polar() <= std::f32::consts::PI - POLAR_EPSILON);
    }

    #[test]
    fn zoom_is_bounded_by_clip_planes() {
        let camera = camera();
        let mut controls = OrbitControls::attach(&camera);
        controls.zoom(5.0);
        assert!(controls.radius() < 1000.0);
        controls.zoom(10_000.0);
        assert!((controls.radius() - 1.0).abs() < 1e-4);
        controls.zoom(-10_000.0);
        assert!((controls.radius() - 3000.0).abs() < 1e-2);
    }

    #[test]
    fn pan_moves_target_in_view_plane() {
        let mut camera = camera();
        let mut controls = OrbitControls::attach(&camera);
        controls.pan(100.0, 0.0, 600.0, 70.0);
        controls.apply(&mut camera);
        assert!(camera.target().x < 0.0);
        assert!(camera.target().z.abs() < 1e-3);
        assert!((camera.eye().z - 1000.0).abs() < 1e-2);
    }
}
