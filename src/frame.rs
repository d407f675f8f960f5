//! Per-frame transforms and uniform upload.

use crate::gl::{Capability, ClearMask, Context};
use crate::light::{self, Material, LIGHT_DIRECTION};
use crate::math::{Mat4, Vec3};
use crate::model::Model;
use crate::projection::Projection;
use crate::shader_program::ShaderProgram;

/// Angle of the fixed tilt applied to the surface, about +X.
pub const SURFACE_TILT: f32 = 1.5;
/// Distance the surface is pushed away from the eye.
pub const SURFACE_DISTANCE: f32 = 10.0;

/// Model-view for a given trackball view.
pub fn model_view(view: &Mat4) -> Mat4 {
    Mat4::translation(0.0, 0.0, -SURFACE_DISTANCE) * Mat4::axis_rotation(Vec3::X, SURFACE_TILT) * *view
}

/// Transpose of the inverse model-view. Identity when the model-view is singular.
pub fn normal_matrix(model_view: &Mat4) -> Mat4 {
    match model_view.inverse() {
        Some(inverse) => inverse.transpose(),
        None => {
            log::debug!("singular model-view, using identity normal matrix");
            Mat4::identity()
        }
    }
}

/// Everything that changes between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub model_view_projection: Mat4,
    pub normal_matrix: Mat4,
    pub light_position: Vec3,
}

impl FrameUniforms {
    pub fn compute(projection: &Projection, view: &Mat4, light_offset: f32) -> Self {
        let model_view = model_view(view);
        Self {
            model_view_projection: projection.matrix() * model_view,
            normal_matrix: normal_matrix(&model_view),
            light_position: light::light_coordinates(light_offset),
        }
    }

    /// Uploads the frame and material uniforms to the current program.
    pub fn upload(&self, gl: &mut Context, program: &ShaderProgram, material: &Material) {
        gl.uniform_matrix4(
            program.model_view_projection_matrix,
            &self.model_view_projection.to_cols_array(),
        );
        gl.uniform_matrix4(program.normal_matrix, &self.normal_matrix.to_cols_array());

        gl.uniform3f(program.light_position, self.light_position.to_array());
        gl.uniform3f(program.light_direction, LIGHT_DIRECTION.to_array());
        gl.uniform3f(program.light_vec, [0.0; 3]);

        gl.uniform1f(program.shininess, material.shininess);
        gl.uniform3f(program.ambient_color, material.ambient.to_array());
        gl.uniform3f(program.diffuse_color, material.diffuse.to_array());
        gl.uniform3f(program.specular_color, material.specular.to_array());
        gl.uniform4f(program.color, material.color);
    }
}

/// Clears to opaque black, uploads the frame and draws the surface.
pub fn draw_frame(
    gl: &mut Context,
    program: &ShaderProgram,
    model: &Model,
    material: &Material,
    uniforms: &FrameUniforms,
) {
    gl.clear_color(0.0, 0.0, 0.0, 1.0);
    gl.clear(ClearMask::COLOR | ClearMask::DEPTH);
    gl.enable(Capability::DepthTest);

    program.use_program(gl);
    uniforms.upload(gl, program, material);
    model.draw(gl, program);
}
