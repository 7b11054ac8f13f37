use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

const MIN_POLAR: f32 = 1e-3;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 20.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

/// Camera orbiting the origin. Drag and wheel input accumulate into pending
/// deltas that [`OrbitCamera::update`] applies a damped share of each frame.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    azimuth: f32,
    polar: f32,
    fov_y: f32,
    damping: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    pub fn new(position: Vec3, fov_degrees: f32, damping: f32) -> Self {
        let offset = position;
        let distance = offset.length().max(MIN_DISTANCE);
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        Self {
            target: Vec3::ZERO,
            distance,
            azimuth,
            polar: polar.clamp(MIN_POLAR, PI - MIN_POLAR),
            fov_y: fov_degrees.to_radians(),
            damping: damping.clamp(f32::EPSILON, 1.0),
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.distance
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    /// Queues a drag of `dx`, `dy` pixels; a drag across the full viewport
    /// height turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.pending_azimuth -= TAU * dx / height;
        self.pending_polar -= TAU * dy / height;
    }

    /// Queues a zoom; positive `lines` moves the camera closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_zoom -= lines * 0.1;
    }

    /// Applies one damped step of the pending input.
    pub fn update(&mut self) {
        let share = self.damping;
        self.azimuth += self.pending_azimuth * share;
        self.polar =
            (self.polar + self.pending_polar * share).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.distance = (self.distance * (1.0 + self.pending_zoom * share))
            .clamp(MIN_DISTANCE, MAX_DISTANCE);

        let keep = 1.0 - share;
        self.pending_azimuth *= keep;
        self.pending_polar *= keep;
        self.pending_zoom *= keep;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(f32::EPSILON), NEAR, FAR)
    }
}
