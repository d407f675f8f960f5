//! The linked surface program and its cached locations.

use crate::error::ShaderError;
use crate::gl::{Context, Location, ProgramId, ShaderKernel};
use crate::shading::names;

/// A linked program plus every attribute and uniform location the renderer uses.
///
/// Locations are resolved once in [`ShaderProgram::new`]. Names the program
/// does not declare stay at [`Location::INVALID`], and uploads to them are
/// dropped by the context.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    program: ProgramId,

    pub attrib_vertex: Location,
    pub attrib_normal: Location,

    pub model_view_projection_matrix: Location,
    pub normal_matrix: Location,
    pub color: Location,

    pub ambient_color: Location,
    pub diffuse_color: Location,
    pub specular_color: Location,
    pub shininess: Location,

    pub light_position: Location,
    pub light_direction: Location,
    pub light_vec: Location,
}

impl ShaderProgram {
    /// Compiles and links the two stages, then resolves all locations.
    pub fn new(
        gl: &mut Context,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
        kernel: Box<dyn ShaderKernel>,
    ) -> Result<Self, ShaderError> {
        let program = gl.create_program(vertex_source, fragment_source, kernel)?;
        log::debug!("{name}: linked program {program:?}");
        let uniform = |n: &str| gl.uniform_location(program, n);

        Ok(Self {
            program,
            attrib_vertex: gl.attrib_location(program, names::VERTEX),
            attrib_normal: gl.attrib_location(program, names::NORMAL),
            model_view_projection_matrix: uniform(names::MODEL_VIEW_PROJECTION),
            normal_matrix: uniform(names::NORMAL_MATRIX),
            color: uniform(names::COLOR),
            ambient_color: uniform(names::AMBIENT_COLOR),
            diffuse_color: uniform(names::DIFFUSE_COLOR),
            specular_color: uniform(names::SPECULAR_COLOR),
            shininess: uniform(names::SHININESS),
            light_position: uniform(names::LIGHT_POSITION),
            light_direction: uniform(names::LIGHT_DIRECTION),
            light_vec: uniform(names::LIGHT_VEC),
        })
    }

    /// Makes this program current.
    pub fn use_program(&self, gl: &mut Context) {
        gl.use_program(self.program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{PhongKernel, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};

    #[test]
    fn resolves_surface_locations() {
        let mut gl = Context::new(4, 4);
        let program = ShaderProgram::new(
            &mut gl,
            "Basic",
            VERTEX_SHADER_SOURCE,
            FRAGMENT_SHADER_SOURCE,
            Box::new(PhongKernel),
        )
        .unwrap();

        assert!(program.attrib_vertex.is_valid());
        assert!(program.attrib_normal.is_valid());
        assert!(program.model_view_projection_matrix.is_valid());
        assert!(program.light_vec.is_valid());
    }

    #[test]
    fn undeclared_names_stay_invalid() {
        let mut gl = Context::new(4, 4);
        let vertex = "attribute vec3 vertex; attribute vec3 normal;\n\
                      uniform mat4 ModelViewProjectionMatrix; uniform mat4 normalMatrix;\n\
                      void main() {}";
        let fragment = "uniform vec4 color; uniform vec3 ambientColor; uniform vec3 diffuseColor;\n\
                        uniform vec3 specularColor; uniform float shininess; uniform vec3 lightPosition;\n\
                        void main() {}";
        let program =
            ShaderProgram::new(&mut gl, "Basic", vertex, fragment, Box::new(PhongKernel)).unwrap();

        assert_eq!(program.light_direction, Location::INVALID);
        assert_eq!(program.light_vec, Location::INVALID);
    }

    #[test]
    fn compile_failure_is_reported() {
        let mut gl = Context::new(4, 4);
        let err = ShaderProgram::new(
            &mut gl,
            "Basic",
            "this is not a shader",
            FRAGMENT_SHADER_SOURCE,
            Box::new(PhongKernel),
        )
        .unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }
}
