//! Device-side geometry for the surface.
//!
//! A [`Model`] owns a position buffer and a normal buffer on the graphics
//! context. It remembers which surface parameters it last uploaded so the
//! mesh is only regenerated when the shape actually changes.

use crate::gl::{BufferId, BufferUsage, Context, PrimitiveMode};
use crate::shader_program::ShaderProgram;
use crate::surface::{MeshOptions, SurfaceMesh, SurfaceParams};

pub struct Model {
    name: String,
    vertex_buffer: BufferId,
    normal_buffer: BufferId,
    count: usize,
    uploaded: Option<(SurfaceParams, MeshOptions)>,
    generation: u64,
}

impl Model {
    /// Creates an empty model with its buffers allocated on `gl`.
    pub fn new(gl: &mut Context, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex_buffer: gl.create_buffer(),
            normal_buffer: gl.create_buffer(),
            count: 0,
            uploaded: None,
            generation: 0,
        }
    }

    /// Number of vertices the next draw covers.
    pub fn count(&self) -> usize {
        self.count
    }

    /// How many times the mesh has been generated and uploaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn normal_buffer(&self) -> BufferId {
        self.normal_buffer
    }

    /// Replaces the position data. The vertex count follows the new data.
    pub fn buffer_data(&mut self, gl: &mut Context, vertices: &[f32]) {
        gl.bind_buffer(Some(self.vertex_buffer));
        gl.buffer_data(vertices, BufferUsage::StreamDraw);
        self.count = vertices.len() / 3;
    }

    /// Replaces the normal data.
    pub fn buffer_normals(&mut self, gl: &mut Context, normals: &[f32]) {
        gl.bind_buffer(Some(self.normal_buffer));
        gl.buffer_data(normals, BufferUsage::StreamDraw);
    }

    pub fn upload_mesh(&mut self, gl: &mut Context, mesh: &SurfaceMesh) {
        self.buffer_data(gl, &mesh.positions);
        self.buffer_normals(gl, &mesh.normals);
    }

    /// Generates and uploads the surface unless the same shape is already on the device.
    ///
    /// Returns true when a new mesh was uploaded.
    pub fn ensure_surface(
        &mut self,
        gl: &mut Context,
        params: &SurfaceParams,
        options: MeshOptions,
    ) -> bool {
        if self.uploaded == Some((*params, options)) {
            return false;
        }
        let mesh = SurfaceMesh::build(params, options);
        self.upload_mesh(gl, &mesh);
        self.uploaded = Some((*params, options));
        self.generation += 1;
        log::debug!(
            "{}: generated mesh #{} with {} vertices",
            self.name,
            self.generation,
            self.count
        );
        true
    }

    /// Binds both buffers to the program's attributes and draws a triangle strip.
    pub fn draw(&self, gl: &mut Context, program: &ShaderProgram) {
        gl.bind_buffer(Some(self.vertex_buffer));
        gl.vertex_attrib_pointer(program.attrib_vertex, 3);
        gl.enable_vertex_attrib_array(program.attrib_vertex);

        gl.bind_buffer(Some(self.normal_buffer));
        gl.vertex_attrib_pointer(program.attrib_normal, 3);
        gl.enable_vertex_attrib_array(program.attrib_normal);

        gl.draw_arrays(PrimitiveMode::TriangleStrip, 0, self.count);
    }
}
