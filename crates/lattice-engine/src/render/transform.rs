//! CPU-side matrix math for the instanced cube scene.
//!
//! Matrices are column-major `glam::Mat4`, matching WGSL `mat4x4<f32>` layout.
//! Projection uses a 0..1 depth range (wgpu clip space) and right-handed view.

use glam::{Mat4, Vec3};

use crate::config::RendererConfig;

/// Fixed perspective camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            eye: Vec3::from_array(config.camera_eye),
            target: Vec3::from_array(config.camera_target),
            up: Vec3::from_array(config.camera_up),
            fov_y_degrees: config.fov_y_degrees,
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// `projection * view` for the given aspect ratio (width / height).
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        projection * view
    }
}

/// Square grid the instances are laid out on, centred on the origin in the XY plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridLayout {
    side: usize,
    spacing: f32,
}

impl GridLayout {
    /// Grid with `ceil(sqrt(count))` cells per side.
    pub fn new(count: usize, spacing: f32) -> Self {
        let side = (count as f64).sqrt().ceil() as usize;
        Self { side: side.max(1), spacing }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Translation of instance `index`. Row-major: index 0 is the bottom-left cell.
    pub fn translation(&self, index: usize) -> Vec3 {
        let half = (self.side as f32 - 1.0) / 2.0;
        let col = (index % self.side) as f32;
        let row = (index / self.side) as f32;
        Vec3::new((col - half) * self.spacing, (row - half) * self.spacing, 0.0)
    }
}

/// World matrix of instance `index` at `time` seconds:
/// `translate(t) · rotateX(0.9·time + index) · rotateY(time + index)`.
pub fn instance_world(translation: Vec3, time: f64, index: usize) -> Mat4 {
    let phase = index as f64;
    Mat4::from_translation(translation)
        * Mat4::from_rotation_x((time * 0.9 + phase) as f32)
        * Mat4::from_rotation_y((time + phase) as f32)
}

/// Normal matrix: inverse-transpose of the world matrix.
#[inline]
pub fn normal_matrix(world: Mat4) -> Mat4 {
    world.inverse().transpose()
}

/// Unit-length light direction, or `None` for a zero / non-finite vector.
#[inline]
pub fn normalize_light(direction: Vec3) -> Option<Vec3> {
    direction.try_normalize()
}
