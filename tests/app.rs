use approx::assert_relative_eq;
use knotview::prelude::*;
use knotview::shading::{PhongKernel, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};

/// A small window keeps the software frames cheap.
fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.window.width = 64;
    config.window.height = 64;
    config
}

fn app() -> App {
    App::new(&test_config()).unwrap()
}

#[test]
fn init_uploads_surface_and_draws_once() {
    let app = app();
    assert_eq!(app.surface_generation(), 1);
    assert_eq!(app.frames_drawn(), 1);
    assert_eq!(app.context().draw_calls(), 1);
    assert_eq!(app.context().uploads(), 2);
    // 200 x 200 grid stitched: 199 row pairs of 400 vertices, 198 joins of 2
    assert_eq!(app.surface().count(), 199 * 400 + 198 * 2);
}

#[test]
fn raw_connectivity_draws_the_flat_list() {
    let config = AppConfig {
        connectivity: Connectivity::Raw,
        normals: NormalSource::Aliased,
        ..test_config()
    };
    let app = App::new(&config).unwrap();
    assert_eq!(app.surface().count(), 40_000);
    assert_eq!(app.context().buffer_len(app.surface().vertex_buffer()), 120_000);
    assert_eq!(app.context().buffer_len(app.surface().normal_buffer()), 120_000);
}

#[test]
fn first_frame_shows_the_surface_on_black() {
    let app = app();
    let image = app.context().capture();
    let black = image.pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
    let lit = image.pixels().count() - black;
    assert!(black > 0, "background should be cleared to opaque black");
    assert!(lit > 0, "surface should cover some pixels");
    assert_eq!(app.frame_buffer().len(), 64 * 64 * 4);
}

#[test]
fn arrow_keys_move_light_without_regenerating() {
    let mut app = app();
    for _ in 0..5 {
        assert!(app.on_key("ArrowRight"));
    }
    assert_relative_eq!(app.light_offset(), 0.5, epsilon = 1e-6);
    assert_eq!(app.frames_drawn(), 6);
    assert_eq!(app.surface_generation(), 1);

    for _ in 0..5 {
        app.on_key("ArrowLeft");
    }
    assert_relative_eq!(app.light_offset(), 0.0, epsilon = 1e-6);
}

#[test]
fn unknown_key_changes_nothing() {
    let mut app = app();
    assert!(!app.on_key("Enter"));
    assert_eq!(app.light_offset(), 0.0);
    assert_eq!(app.frames_drawn(), 1);
}

#[test]
fn light_offset_changes_the_image() {
    let mut app = app();
    let before = app.frame_buffer().to_vec();
    app.on_key("ArrowRight");
    app.on_key("ArrowRight");
    assert_ne!(before, app.frame_buffer());
}

#[test]
fn surface_change_regenerates() {
    let mut app = app();
    let params = SurfaceParams {
        theta: std::f64::consts::FRAC_PI_4,
        ..SurfaceParams::default()
    };
    app.set_surface_params(params);
    assert_eq!(app.surface_generation(), 2);
    app.set_surface_params(params);
    assert_eq!(app.surface_generation(), 2);
    assert_eq!(app.frames_drawn(), 3);
}

#[test]
fn drag_rotates_and_redraws() {
    let mut app = app();
    app.on_mouse_down(32.0, 32.0);
    assert!(app.on_mouse_move(48.0, 32.0));
    app.on_mouse_up();
    assert!(!app.on_mouse_move(60.0, 10.0));

    assert_ne!(app.view_matrix(), Mat4::identity());
    assert_eq!(app.frames_drawn(), 2);
}

#[test]
fn set_view_redraws_and_reset_restores_the_first_frame() {
    let mut app = app();
    let first = app.frame_buffer().to_vec();

    let view = Mat4::axis_rotation(Vec3::new(0.0, 1.0, 0.0), std::f32::consts::FRAC_PI_2);
    app.set_view(view);
    assert_eq!(app.view_matrix(), view);
    assert_eq!(app.frames_drawn(), 2);
    assert_ne!(app.frame_buffer(), &first[..]);

    app.reset_view();
    assert_eq!(app.view_matrix(), Mat4::identity());
    assert_eq!(app.frames_drawn(), 3);
    assert_eq!(app.frame_buffer(), &first[..]);
    assert_eq!(app.surface_generation(), 1);
}

#[test]
fn reset_view_ends_a_drag() {
    let mut app = app();
    app.on_mouse_down(32.0, 32.0);
    assert!(app.on_mouse_move(48.0, 32.0));
    app.reset_view();
    assert_eq!(app.view_matrix(), Mat4::identity());
    assert!(!app.on_mouse_move(60.0, 10.0));
}

#[test]
fn invalid_vertex_shader_is_fatal_before_any_draw() {
    let err = App::with_shaders(
        &test_config(),
        "attribute vec3 vertex;\nthis is not glsl",
        FRAGMENT_SHADER_SOURCE,
        Box::new(PhongKernel),
    )
    .err()
    .unwrap();

    assert!(matches!(err, AppError::Shader(ShaderError::Compile { .. })));
    let message = err.fallback_message();
    assert!(message.starts_with("Sorry, could not initialize the graphics context: "));
    assert!(message.contains("Error in vertex shader:  ERROR: 0:2: 'this' : syntax error"));
}

#[test]
fn link_failure_is_fatal() {
    let fragment = "varying vec3 missing;\nvoid main() {}";
    let err = App::with_shaders(
        &test_config(),
        VERTEX_SHADER_SOURCE,
        fragment,
        Box::new(PhongKernel),
    )
    .err()
    .unwrap();
    assert!(matches!(err, AppError::Shader(ShaderError::Link(_))));
    assert!(err.to_string().starts_with("Link error in program:  "));
}

#[test]
fn zero_sized_surface_is_a_context_error() {
    let mut config = test_config();
    config.window.width = 0;
    let err = App::new(&config).err().unwrap();
    assert!(matches!(err, AppError::Context(_)));
    assert_eq!(err.fallback_message(), "Sorry, could not get a graphics context.");
}

#[test]
fn resize_keeps_drawing() {
    let mut app = app();
    app.resize(32, 48);
    assert_eq!(app.context().width(), 32);
    assert_eq!(app.frame_buffer().len(), 32 * 48 * 4);
    assert_eq!(app.frames_drawn(), 2);
}

#[test]
fn strip_mode_is_used_for_the_surface() {
    // The device counts strip triangles as count - 2.
    let app = app();
    let stats = app.context().stats();
    assert_eq!(stats.triangles, app.surface().count() - 2);
}
