//! Camera for the 3D waterfall

use glam::{Mat4, Vec3};

/// Allowed tilt range
pub const TILT_RANGE: (f32, f32) = (0.0, 5.0);
/// Allowed camera distance range
pub const ZOOM_RANGE: (f32, f32) = (1.0, 4.0);

const FOV_Y_DEG: f32 = 50.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 10.0;
const EYE_HEIGHT: f32 = 0.85;
const TARGET: Vec3 = Vec3::new(0.0, 0.20, -0.8);
const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -0.45, 0.0);
const MODEL_SCALE: Vec3 = Vec3::new(10.0, 1.0, 1.0);

/// Tilt, distance and drag bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// How far the surface leans back with distance (0-5)
    pub tilt: f32,
    /// Eye distance along +Z (1-4)
    pub zoom_level: f32,
    pub dragging: bool,
    pub drag_start_y: f64,
    pub drag_start_tilt: f32,
}

impl CameraState {
    pub fn new(tilt: f32, zoom_level: f32) -> Self {
        Self {
            tilt: tilt.clamp(TILT_RANGE.0, TILT_RANGE.1),
            zoom_level: zoom_level.clamp(ZOOM_RANGE.0, ZOOM_RANGE.1),
            dragging: false,
            drag_start_y: 0.0,
            drag_start_tilt: 0.0,
        }
    }

    pub fn projection(aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, Z_NEAR, Z_FAR)
    }

    pub fn view(&self) -> Mat4 {
        let eye = Vec3::new(0.0, EYE_HEIGHT, self.zoom_level);
        Mat4::look_at_rh(eye, TARGET, Vec3::Y)
    }

    /// Lowers the surface and stretches it horizontally
    pub fn model() -> Mat4 {
        Mat4::from_translation(MODEL_OFFSET) * Mat4::from_scale(MODEL_SCALE)
    }

    /// Combined matrix for a `width` x `height` viewport
    pub fn mvp(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        Self::projection(aspect) * self.view() * Self::model()
    }
}
