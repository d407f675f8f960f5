//! Immediate-mode software graphics device.
//!
//! [`Context`] exposes a small subset of the familiar GL call surface
//! (buffers, programs, attribute pointers, uniforms, clear, draw arrays) and
//! executes it on the CPU rasterizer in [`crate::render`].
//!
//! As with a real graphics API, misuse after initialization is not an error
//! the caller sees: invalid locations, missing bindings and out-of-range
//! draws are ignored and only logged.

mod shader;

pub use shader::{
    compile, link, CompiledShader, Declaration, DrawKernel, GlslType, LinkedProgram, Qualifier,
    ShaderKernel, ShaderStage, UniformValue,
};

use std::ops::BitOr;

use image::RgbaImage;

use crate::colors;
use crate::error::ShaderError;
use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::{
    ClipSpaceClipper, ClipSpacePolygon, ClipSpaceVertex, EdgeFunctionRasterizer, Renderer,
    ScreenVertex,
};

/// Number of vertex attribute slots.
pub const MAX_VERTEX_ATTRIBS: usize = 8;

/// An attribute or uniform location. `-1` marks an unresolved location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location(i32);

impl Location {
    pub const INVALID: Location = Location(-1);

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    fn from_index(index: Option<usize>) -> Self {
        index
            .and_then(|i| i32::try_from(i).ok())
            .map_or(Location::INVALID, Location)
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::INVALID
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(usize);

/// Data store usage hint, mirroring `STATIC_DRAW` and friends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    TriangleStrip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
}

/// Buffers selected by [`Context::clear`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearMask(u8);

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask(0b01);
    pub const DEPTH: ClearMask = ClearMask(0b10);

    pub fn contains(self, other: ClearMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClearMask {
    type Output = ClearMask;

    fn bitor(self, rhs: ClearMask) -> ClearMask {
        ClearMask(self.0 | rhs.0)
    }
}

/// Counters exposed for tests and the debug log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub draw_calls: usize,
    pub uploads: usize,
    pub triangles: usize,
    pub fragments: usize,
}

#[derive(Debug, Default)]
struct BufferObject {
    data: Vec<f32>,
    usage: Option<BufferUsage>,
}

#[derive(Clone, Copy, Debug, Default)]
struct AttribSlot {
    buffer: Option<BufferId>,
    size: usize,
    enabled: bool,
}

struct Program {
    linked: LinkedProgram,
    uniform_values: Vec<UniformValue>,
}

pub struct Context {
    renderer: Renderer,
    rasterizer: EdgeFunctionRasterizer,
    clipper: ClipSpaceClipper,
    buffers: Vec<BufferObject>,
    programs: Vec<Program>,
    array_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
    attrib_slots: [AttribSlot; MAX_VERTEX_ATTRIBS],
    clear_color: [f32; 4],
    depth_test: bool,
    stats: Stats,
}

impl Context {
    /// Creates a context drawing into a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            renderer: Renderer::new(width, height),
            rasterizer: EdgeFunctionRasterizer::new(),
            clipper: ClipSpaceClipper::new(),
            buffers: Vec::new(),
            programs: Vec::new(),
            array_buffer: None,
            current_program: None,
            attrib_slots: [AttribSlot::default(); MAX_VERTEX_ATTRIBS],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            depth_test: false,
            stats: Stats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.renderer.width()
    }

    pub fn height(&self) -> u32 {
        self.renderer.height()
    }

    /// Resizes the drawing surface. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn draw_calls(&self) -> usize {
        self.stats.draw_calls
    }

    /// Number of `buffer_data` calls that replaced a data store.
    pub fn uploads(&self) -> usize {
        self.stats.uploads
    }

    /// The last rendered frame as ARGB8888 bytes.
    pub fn frame_bytes(&self) -> &[u8] {
        self.renderer.as_bytes()
    }

    /// Pixel at (x, y) in ARGB8888.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.renderer.pixel(x, y)
    }

    pub fn capture(&self) -> RgbaImage {
        self.renderer.capture()
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn enable(&mut self, capability: Capability) {
        match capability {
            Capability::DepthTest => self.depth_test = true,
        }
    }

    pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = [r, g, b, a];
    }

    pub fn clear(&mut self, mask: ClearMask) {
        if mask.contains(ClearMask::COLOR) {
            let [r, g, b, a] = self.clear_color;
            self.renderer.clear(colors::pack_color(r, g, b, a));
        }
        if mask.contains(ClearMask::DEPTH) {
            self.renderer.clear_depth();
        }
    }

    // =========================================================================
    // Buffers
    // =========================================================================

    pub fn create_buffer(&mut self) -> BufferId {
        self.buffers.push(BufferObject::default());
        BufferId(self.buffers.len() - 1)
    }

    pub fn bind_buffer(&mut self, buffer: Option<BufferId>) {
        self.array_buffer = buffer.filter(|id| id.0 < self.buffers.len());
    }

    /// Replaces the bound buffer's data store.
    pub fn buffer_data(&mut self, data: &[f32], usage: BufferUsage) {
        let Some(id) = self.array_buffer else {
            log::debug!("buffer_data with no buffer bound, ignored");
            return;
        };
        let buffer = &mut self.buffers[id.0];
        buffer.data.clear();
        buffer.data.extend_from_slice(data);
        buffer.usage = Some(usage);
        self.stats.uploads += 1;
    }

    /// Number of floats stored in `buffer`.
    pub fn buffer_len(&self, buffer: BufferId) -> usize {
        self.buffers.get(buffer.0).map_or(0, |b| b.data.len())
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<BufferUsage> {
        self.buffers.get(buffer.0).and_then(|b| b.usage)
    }

    // =========================================================================
    // Programs
    // =========================================================================

    /// Compiles both stages and links them with `kernel`.
    ///
    /// Fails on the first stage that does not compile, or at link time.
    pub fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        kernel: Box<dyn ShaderKernel>,
    ) -> Result<ProgramId, ShaderError> {
        let vertex = compile(ShaderStage::Vertex, vertex_source)?;
        let fragment = compile(ShaderStage::Fragment, fragment_source)?;
        let linked = link(&vertex, &fragment, kernel)?;
        let uniform_values = linked.uniform_types().map(UniformValue::zero).collect();

        self.programs.push(Program {
            linked,
            uniform_values,
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    pub fn use_program(&mut self, program: ProgramId) {
        if program.0 < self.programs.len() {
            self.current_program = Some(program);
        }
    }

    pub fn attrib_location(&self, program: ProgramId, name: &str) -> Location {
        Location::from_index(
            self.programs
                .get(program.0)
                .and_then(|p| p.linked.attribute_index(name)),
        )
    }

    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Location {
        Location::from_index(
            self.programs
                .get(program.0)
                .and_then(|p| p.linked.uniform_index(name)),
        )
    }

    // =========================================================================
    // Vertex attributes
    // =========================================================================

    /// Sources attribute `location` from the bound buffer, `size` floats per vertex.
    pub fn vertex_attrib_pointer(&mut self, location: Location, size: usize) {
        let Some(slot) = location.index().and_then(|i| self.attrib_slots.get_mut(i)) else {
            log::debug!("vertex_attrib_pointer on invalid location {}", location.raw());
            return;
        };
        if !(1..=4).contains(&size) {
            log::debug!("vertex_attrib_pointer with size {size}, ignored");
            return;
        }
        slot.buffer = self.array_buffer;
        slot.size = size;
    }

    pub fn enable_vertex_attrib_array(&mut self, location: Location) {
        match location.index().and_then(|i| self.attrib_slots.get_mut(i)) {
            Some(slot) => slot.enabled = true,
            None => log::debug!("enable_vertex_attrib_array on invalid location {}", location.raw()),
        }
    }

    // =========================================================================
    // Uniforms
    // =========================================================================

    fn set_uniform(&mut self, location: Location, value: UniformValue) {
        let Some(program) = self.current_program.map(|id| &mut self.programs[id.0]) else {
            log::debug!("uniform upload with no program in use, ignored");
            return;
        };
        let Some(slot) = location.index().and_then(|i| program.uniform_values.get_mut(i)) else {
            // Location -1 is silently ignored, as in GL.
            return;
        };
        if slot.ty() != value.ty() {
            log::debug!("uniform type mismatch at location {}, ignored", location.raw());
            return;
        }
        *slot = value;
    }

    pub fn uniform1f(&mut self, location: Location, value: f32) {
        self.set_uniform(location, UniformValue::Float(value));
    }

    pub fn uniform2f(&mut self, location: Location, value: [f32; 2]) {
        self.set_uniform(location, UniformValue::Vec2(Vec2::new(value[0], value[1])));
    }

    pub fn uniform3f(&mut self, location: Location, value: [f32; 3]) {
        self.set_uniform(location, UniformValue::Vec3(Vec3::new(value[0], value[1], value[2])));
    }

    pub fn uniform4f(&mut self, location: Location, value: [f32; 4]) {
        self.set_uniform(
            location,
            UniformValue::Vec4(Vec4::new(value[0], value[1], value[2], value[3])),
        );
    }

    /// Uploads a matrix given in column-major order.
    pub fn uniform_matrix4(&mut self, location: Location, columns: &[f32; 16]) {
        self.set_uniform(location, UniformValue::Mat4(Mat4::from_cols_array(columns)));
    }

    /// Reads back a uniform of the current program.
    pub fn uniform_value(&self, location: Location) -> Option<UniformValue> {
        let program = &self.programs[self.current_program?.0];
        program.uniform_values.get(location.index()?).copied()
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Gathers the kernel's attribute arrays for `first..first + count`.
    ///
    /// Disabled arrays read the constant (0, 0, 0, 1). Returns `None` when an
    /// enabled array is too short for the requested range.
    fn gather_attributes(
        &self,
        program: &Program,
        first: usize,
        count: usize,
    ) -> Option<Vec<Vec<Vec4>>> {
        program
            .linked
            .kernel_attribute_slots()
            .iter()
            .map(|&index| {
                let slot = self.attrib_slots.get(index).copied().unwrap_or_default();
                let constant = Vec4::new(0.0, 0.0, 0.0, 1.0);
                match slot.buffer.filter(|_| slot.enabled) {
                    None => Some(vec![constant; count]),
                    Some(id) => {
                        let data = &self.buffers[id.0].data;
                        if (first + count) * slot.size > data.len() {
                            return None;
                        }
                        Some(
                            data[first * slot.size..(first + count) * slot.size]
                                .chunks_exact(slot.size)
                                .map(|c| {
                                    let mut v = [0.0, 0.0, 0.0, 1.0];
                                    v[..c.len()].copy_from_slice(c);
                                    Vec4::new(v[0], v[1], v[2], v[3])
                                })
                                .collect(),
                        )
                    }
                }
            })
            .collect()
    }

    /// Draws `count` vertices starting at `first` with the current program.
    pub fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) {
        let Some(program_id) = self.current_program else {
            log::debug!("draw_arrays with no program in use, ignored");
            return;
        };
        let program = &self.programs[program_id.0];
        let Some(attributes) = self.gather_attributes(program, first, count) else {
            log::warn!("draw_arrays range {first}..{} exceeds bound buffer, ignored", first + count);
            return;
        };

        let uniforms: Vec<UniformValue> = program
            .linked
            .kernel_uniform_slots()
            .iter()
            .map(|&slot| program.uniform_values[slot])
            .collect();
        let kernel = program.linked.kernel().begin_draw(&uniforms);

        // Vertex stage
        let mut inputs = vec![Vec4::new(0.0, 0.0, 0.0, 1.0); attributes.len()];
        let transformed: Vec<ClipSpaceVertex> = (0..count)
            .map(|i| {
                for (input, array) in inputs.iter_mut().zip(&attributes) {
                    *input = array[i];
                }
                let (position, varyings) = kernel.vertex(&inputs);
                ClipSpaceVertex::new(position, varyings)
            })
            .collect();

        // Primitive assembly
        let triangles: Vec<[usize; 3]> = match mode {
            PrimitiveMode::Triangles => (0..count / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect(),
            // Odd triangles swap their first two vertices to keep a consistent winding.
            PrimitiveMode::TriangleStrip => (0..count.saturating_sub(2))
                .map(|i| if i % 2 == 0 { [i, i + 1, i + 2] } else { [i + 1, i, i + 2] })
                .collect(),
        };

        let width = self.renderer.width() as f32;
        let height = self.renderer.height() as f32;
        let to_screen = |v: &ClipSpaceVertex| {
            let inv_w = 1.0 / v.position.w;
            ScreenVertex::new(
                (v.position.x * inv_w + 1.0) * 0.5 * width,
                (1.0 - v.position.y * inv_w) * 0.5 * height,
                inv_w,
                &v.varyings,
            )
        };

        let mut framebuffer = self.renderer.as_framebuffer();
        let mut fragments = 0;
        for [a, b, c] in &triangles {
            let corners = [&transformed[*a], &transformed[*b], &transformed[*c]];
            if self.clipper.trivially_outside(corners) {
                continue;
            }
            if self.clipper.fully_inside(corners) {
                let screen = corners.map(to_screen);
                fragments += self.rasterizer.fill_triangle(
                    [&screen[0], &screen[1], &screen[2]],
                    &mut framebuffer,
                    kernel.as_ref(),
                    self.depth_test,
                );
                continue;
            }
            let polygon = self.clipper.clip_polygon(ClipSpacePolygon::from_triangle(
                *corners[0],
                *corners[1],
                *corners[2],
            ));
            for (v0, v1, v2) in polygon.triangulate() {
                let screen = [to_screen(v0), to_screen(v1), to_screen(v2)];
                fragments += self.rasterizer.fill_triangle(
                    [&screen[0], &screen[1], &screen[2]],
                    &mut framebuffer,
                    kernel.as_ref(),
                    self.depth_test,
                );
            }
        }

        self.stats.draw_calls += 1;
        self.stats.triangles += triangles.len();
        self.stats.fragments += fragments;
        log::trace!(
            "draw_arrays {:?}: {} vertices, {} triangles, {} fragments",
            mode,
            count,
            triangles.len(),
            fragments
        );
    }
}
