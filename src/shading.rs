//! The surface program: shader sources and the Phong kernel that runs them.
//!
//! # Architecture
//!
//! The device handles clipping, viewport mapping, rasterization and depth.
//! The kernel handles:
//! - Transforming vertices to clip space
//! - Producing the interpolated normal and position
//! - Computing the lit fragment color
//!
//! Lighting is a point-light Phong model evaluated per fragment in the same
//! space the vertex stage outputs (`vertPos` is the divided clip position).
//! Colors above 1.0 are kept through the sum and only clamped when packed.

use crate::colors;
use crate::gl::{DrawKernel, GlslType, ShaderKernel, UniformValue};
use crate::math::{Mat4, Vec3, Vec4};
use crate::render::{FragmentShader, Varyings};

pub const VERTEX_SHADER_SOURCE: &str = include_str!("../shaders/surface.vert");
pub const FRAGMENT_SHADER_SOURCE: &str = include_str!("../shaders/surface.frag");

/// Interface names shared by the shader sources and the [`ShaderProgram`](crate::shader_program::ShaderProgram).
pub mod names {
    pub const VERTEX: &str = "vertex";
    pub const NORMAL: &str = "normal";
    pub const MODEL_VIEW_PROJECTION: &str = "ModelViewProjectionMatrix";
    pub const NORMAL_MATRIX: &str = "normalMatrix";
    pub const COLOR: &str = "color";
    pub const AMBIENT_COLOR: &str = "ambientColor";
    pub const DIFFUSE_COLOR: &str = "diffuseColor";
    pub const SPECULAR_COLOR: &str = "specularColor";
    pub const SHININESS: &str = "shininess";
    pub const LIGHT_POSITION: &str = "lightPosition";
    pub const LIGHT_DIRECTION: &str = "lightDirection";
    pub const LIGHT_VEC: &str = "lightVec";
}

// Varying layout: normal xyz, then position xyz.
const NORMAL_SLOT: usize = 0;
const POSITION_SLOT: usize = 3;

/// Kernel for the surface program.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhongKernel;

impl ShaderKernel for PhongKernel {
    fn attributes(&self) -> &'static [(&'static str, GlslType)] {
        &[(names::VERTEX, GlslType::Vec3), (names::NORMAL, GlslType::Vec3)]
    }

    fn uniforms(&self) -> &'static [(&'static str, GlslType)] {
        &[
            (names::MODEL_VIEW_PROJECTION, GlslType::Mat4),
            (names::NORMAL_MATRIX, GlslType::Mat4),
            (names::COLOR, GlslType::Vec4),
            (names::AMBIENT_COLOR, GlslType::Vec3),
            (names::DIFFUSE_COLOR, GlslType::Vec3),
            (names::SPECULAR_COLOR, GlslType::Vec3),
            (names::SHININESS, GlslType::Float),
            (names::LIGHT_POSITION, GlslType::Vec3),
        ]
    }

    fn begin_draw<'a>(&'a self, uniforms: &[UniformValue]) -> Box<dyn DrawKernel + 'a> {
        let get = |i: usize| uniforms.get(i).copied().unwrap_or(UniformValue::Float(0.0));
        Box::new(PhongDraw {
            model_view_projection: get(0).as_mat4(),
            normal_matrix: get(1).as_mat4(),
            color: get(2).as_vec4(),
            ambient: get(3).as_vec3(),
            diffuse: get(4).as_vec3(),
            specular: get(5).as_vec3(),
            shininess: get(6).as_f32(),
            light_position: get(7).as_vec3(),
        })
    }
}

/// Uniform values captured for one draw call.
#[derive(Debug, Clone, Copy)]
pub struct PhongDraw {
    model_view_projection: Mat4,
    normal_matrix: Mat4,
    color: Vec4,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
    shininess: f32,
    light_position: Vec3,
}

impl PhongDraw {
    /// Lit color before packing, one channel per component of `color`.
    pub fn light(&self, normal: Vec3, position: Vec3) -> Vec4 {
        let n = normal.normalize();
        let l = (self.light_position - position).normalize();

        let lambertian = n.dot(l).max(0.0);
        let mut specular = 0.0;
        if lambertian > 0.0 {
            let r = (-l).reflect(n);
            let v = (-position).normalize();
            specular = r.dot(v).max(0.0).powf(self.shininess);
        }

        let light = self.ambient + self.diffuse * lambertian + self.specular * specular;
        Vec4::new(
            self.color.x * light.x,
            self.color.y * light.y,
            self.color.z * light.z,
            self.color.w,
        )
    }
}

impl DrawKernel for PhongDraw {
    fn vertex(&self, attributes: &[Vec4]) -> (Vec4, Varyings) {
        let position = attributes.first().map_or(Vec3::ZERO, |a| a.xyz());
        let normal = attributes.get(1).map_or(Vec3::ZERO, |a| a.xyz());

        let clip = self.model_view_projection * Vec4::point(position);
        let divided = if clip.w.abs() > f32::EPSILON {
            clip.xyz() * (1.0 / clip.w)
        } else {
            clip.xyz()
        };
        let normal = (self.normal_matrix * Vec4::direction(normal)).xyz();

        let mut varyings = Varyings::default();
        varyings.0[NORMAL_SLOT..NORMAL_SLOT + 3].copy_from_slice(&normal.to_array());
        varyings.0[POSITION_SLOT..POSITION_SLOT + 3].copy_from_slice(&divided.to_array());
        (clip, varyings)
    }
}

impl FragmentShader for PhongDraw {
    #[inline]
    fn shade(&self, varyings: &Varyings) -> u32 {
        let v = &varyings.0;
        let normal = Vec3::new(v[NORMAL_SLOT], v[NORMAL_SLOT + 1], v[NORMAL_SLOT + 2]);
        let position = Vec3::new(v[POSITION_SLOT], v[POSITION_SLOT + 1], v[POSITION_SLOT + 2]);
        let c = self.light(normal, position);
        colors::pack_color(c.x, c.y, c.z, c.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{compile, link, ShaderStage};
    use approx::assert_relative_eq;

    fn draw_state() -> PhongDraw {
        PhongDraw {
            model_view_projection: Mat4::identity(),
            normal_matrix: Mat4::identity(),
            color: Vec4::new(1.0, 1.0, 0.0, 1.0),
            ambient: Vec3::new(0.5, 0.0, 0.4),
            diffuse: Vec3::new(3.3, 1.5, 5.0),
            specular: Vec3::new(2.0, 1.0, 3.0),
            shininess: 1.0,
            light_position: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn surface_sources_link_with_kernel() {
        let vertex = compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE).unwrap();
        let fragment = compile(ShaderStage::Fragment, FRAGMENT_SHADER_SOURCE).unwrap();
        let program = link(&vertex, &fragment, Box::new(PhongKernel)).unwrap();

        assert_eq!(program.attribute_index(names::VERTEX), Some(0));
        assert_eq!(program.attribute_index(names::NORMAL), Some(1));
        assert!(program.uniform_index(names::LIGHT_DIRECTION).is_some());
        assert!(program.uniform_index(names::LIGHT_VEC).is_some());
    }

    #[test]
    fn facing_light_gets_full_diffuse() {
        // Light straight above the point, normal toward it, eye along the normal.
        let lit = draw_state().light(Vec3::Z, Vec3::new(0.0, 0.0, -0.5));
        // ambient + diffuse + specular (angle 0 => factor 1), blue masked by color
        assert_relative_eq!(lit.x, 0.5 + 3.3 + 2.0, epsilon = 1e-5);
        assert_relative_eq!(lit.y, 0.0 + 1.5 + 1.0, epsilon = 1e-5);
        assert_relative_eq!(lit.z, 0.0);
        assert_relative_eq!(lit.w, 1.0);
    }

    #[test]
    fn facing_away_is_ambient_only() {
        let lit = draw_state().light(-Vec3::Z, Vec3::new(0.0, 0.0, -0.5));
        assert_relative_eq!(lit.x, 0.5);
        assert_relative_eq!(lit.y, 0.0);
    }

    #[test]
    fn vertex_stage_outputs_clip_position_and_normal() {
        let draw = draw_state();
        let (clip, varyings) = draw.vertex(&[
            Vec4::new(0.25, -0.5, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
        ]);
        assert_eq!(clip, Vec4::new(0.25, -0.5, 0.0, 1.0));
        assert_eq!(&varyings.0[..6], &[0.0, 1.0, 0.0, 0.25, -0.5, 0.0]);
    }
}
