//! A twisted-knot surface viewer on a CPU graphics device.
//!
//! The viewer drives an immediate-mode software context ([`gl::Context`])
//! the way a browser page drives WebGL: buffers, a linked program with
//! cached locations, per-frame uniforms and a triangle-strip draw. SDL2 is
//! used only for the window and for presenting the finished frame.
//!
//! # Quick Start
//!
//! ```ignore
//! use knotview::prelude::*;
//!
//! let config = AppConfig::default();
//! let mut app = App::new(&config)?;
//! app.on_key("ArrowRight");
//! ```

// Public API - exposed to library consumers
pub mod app;
pub mod colors;
pub mod config;
pub mod error;
pub mod frame;
pub mod gl;
pub mod input;
pub mod light;
pub mod math;
pub mod model;
pub mod projection;
pub mod shader_program;
pub mod shading;
pub mod surface;
pub mod trackball;
pub mod window;

// Internal modules - used within the crate only
pub(crate) mod render;

pub use app::App;
pub use error::{AppError, ConfigError, ShaderError};

/// Prelude module for convenient imports.
pub mod prelude {
    // Application
    pub use crate::app::App;
    pub use crate::config::AppConfig;
    pub use crate::error::{AppError, ConfigError, ShaderError};

    // Surface
    pub use crate::surface::{Connectivity, MeshOptions, NormalSource, SurfaceMesh, SurfaceParams};

    // Math
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Window & Input
    pub use crate::input::{InputController, Key};
    pub use crate::window::{show_fallback, Window, WindowEvent};
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::render::{
        ClipSpaceVertex, EdgeFunctionRasterizer, FragmentShader, FrameBuffer, ScreenVertex,
        Varyings,
    };
}
