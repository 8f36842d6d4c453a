//! Perspective camera framing the pixel-space screen quad.
//!
//! The quad spans `0..width` by `0..height` at `z = 0`. The eye sits on the
//! quad's centre line at the distance where the vertical field of view covers
//! exactly `height` pixels, so the quad fills the viewport for any size.
use glam::{Mat4, Vec2, Vec3};

use crate::uniforms::{Uniform, UniformTable, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    /// `projection * view * model`.
    pub combined: Mat4,
    pub resolution: Vec2,
    pub aspect: f32,
}

impl ViewProjection {
    pub fn for_viewport(frustum: Frustum, width: u32, height: u32) -> Self {
        let resolution = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        let aspect = resolution.x / resolution.y;
        let fov = frustum.fov_degrees.to_radians();

        let distance = (resolution.y * 0.5) / (fov * 0.5).tan();
        let target = Vec3::new(resolution.x * 0.5, resolution.y * 0.5, 0.0);
        let eye = target + Vec3::Z * distance;
        let far = frustum.far.max(distance * 2.0);

        let model = Mat4::IDENTITY;
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(fov, aspect, frustum.near, far);

        Self {
            model,
            view,
            projection,
            combined: projection * view * model,
            resolution,
            aspect,
        }
    }

    pub fn write_uniforms(&self, table: &mut UniformTable) {
        table.set(Uniform::Mvp, UniformValue::Mat4(self.combined));
        table.set(Uniform::Model, UniformValue::Mat4(self.model));
        table.set(Uniform::View, UniformValue::Mat4(self.view));
        table.set(Uniform::Projection, UniformValue::Mat4(self.projection));
        table.set(Uniform::Resolution, UniformValue::Vec2(self.resolution));
        table.set(Uniform::Ratio, UniformValue::Float(self.aspect));
    }
}
