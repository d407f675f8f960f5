//! Application context.
//!
//! The [`App`] owns the graphics context, the surface program, the geometry
//! and the interaction state for the whole session. Every event handler
//! finishes its update and redraw before returning.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::frame::{self, FrameUniforms};
use crate::gl::{Context, ShaderKernel};
use crate::input::{InputController, Key};
use crate::light::Material;
use crate::math::Mat4;
use crate::model::Model;
use crate::projection::Projection;
use crate::shader_program::ShaderProgram;
use crate::shading::{PhongKernel, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
use crate::surface::{MeshOptions, SurfaceParams};
use crate::trackball::Trackball;

pub struct App {
    gl: Context,
    program: ShaderProgram,
    surface: Model,
    trackball: Trackball,
    input: InputController,
    projection: Projection,
    material: Material,
    params: SurfaceParams,
    mesh_options: MeshOptions,
    frames_drawn: u64,
}

impl App {
    /// Initializes with the built-in surface shaders.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Self::with_shaders(
            config,
            VERTEX_SHADER_SOURCE,
            FRAGMENT_SHADER_SOURCE,
            Box::new(PhongKernel),
        )
    }

    /// Initializes the context and program, uploads the surface and draws the first frame.
    pub fn with_shaders(
        config: &AppConfig,
        vertex_source: &str,
        fragment_source: &str,
        kernel: Box<dyn ShaderKernel>,
    ) -> Result<Self, AppError> {
        let (width, height) = (config.window.width, config.window.height);
        if width == 0 || height == 0 {
            return Err(AppError::Context(format!(
                "cannot create a {width}x{height} drawing surface"
            )));
        }
        let mut gl = Context::new(width, height);

        let program = ShaderProgram::new(&mut gl, "Basic", vertex_source, fragment_source, kernel)?;
        program.use_program(&mut gl);

        let mut surface = Model::new(&mut gl, "Surface");
        surface.ensure_surface(&mut gl, &config.surface, config.mesh_options());

        let mut app = Self {
            gl,
            program,
            surface,
            trackball: Trackball::new(width, height, config.view_distance),
            input: InputController::new(config.light_step),
            projection: Projection::default(),
            material: Material::default(),
            params: config.surface,
            mesh_options: config.mesh_options(),
            frames_drawn: 0,
        };
        log::info!(
            "initialized {}x{} surface with {} vertices",
            width,
            height,
            app.surface.count()
        );
        app.draw();
        Ok(app)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Renders one frame from the current state.
    pub fn draw(&mut self) {
        let uniforms = FrameUniforms::compute(
            &self.projection,
            &self.trackball.view_matrix(),
            self.input.light_offset(),
        );
        frame::draw_frame(&mut self.gl, &self.program, &self.surface, &self.material, &uniforms);
        self.frames_drawn += 1;
        log::trace!("frame {} drawn", self.frames_drawn);
    }

    /// Regenerates the geometry when its parameters changed, then redraws.
    fn redraw(&mut self) {
        self.surface
            .ensure_surface(&mut self.gl, &self.params, self.mesh_options);
        self.draw();
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Handles a key by name. Returns true when a frame was drawn.
    pub fn on_key(&mut self, name: &str) -> bool {
        if !self.input.handle_key(Key::from_name(name)) {
            return false;
        }
        self.redraw();
        true
    }

    pub fn on_mouse_down(&mut self, x: f32, y: f32) {
        self.trackball.begin_drag(x, y);
    }

    /// Returns true when the drag rotated the view and a frame was drawn.
    pub fn on_mouse_move(&mut self, x: f32, y: f32) -> bool {
        if !self.trackball.drag_to(x, y) {
            return false;
        }
        self.draw();
        true
    }

    pub fn on_mouse_up(&mut self) {
        self.trackball.end_drag();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gl.resize(width, height);
        self.trackball.set_viewport(width, height);
        self.draw();
    }

    /// Replaces the surface shape and redraws.
    pub fn set_surface_params(&mut self, params: SurfaceParams) {
        self.params = params;
        self.redraw();
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.trackball.set_view(view);
        self.draw();
    }

    /// Drops any accumulated rotation and redraws.
    pub fn reset_view(&mut self) {
        self.trackball.reset();
        self.draw();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn light_offset(&self) -> f32 {
        self.input.light_offset()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.trackball.view_matrix()
    }

    /// Number of times the mesh has been generated.
    pub fn surface_generation(&self) -> u64 {
        self.surface.generation()
    }

    pub fn surface(&self) -> &Model {
        &self.surface
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn context(&self) -> &Context {
        &self.gl
    }

    /// The last rendered frame as ARGB8888 bytes.
    pub fn frame_buffer(&self) -> &[u8] {
        self.gl.frame_bytes()
    }
}
