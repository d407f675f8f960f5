use knotview::prelude::*;

const FALLBACK_TITLE: &str = "knotview";

/// Logs a fatal initialization error and shows the fallback text.
fn fail(err: AppError) -> String {
    let message = err.fallback_message();
    log::error!("{err}");
    show_fallback(FALLBACK_TITLE, &message);
    message
}

fn main() -> Result<(), String> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| fail(e.into()))?;
    let mut window = Window::new(&config.window.title, config.window.width, config.window.height)
        .map_err(|e| fail(AppError::Context(e)))?;
    let mut app = App::new(&config).map_err(fail)?;

    window.present(app.frame_buffer())?;
    log::info!("running");

    'running: loop {
        let mut redraw = false;
        for event in window.wait_events() {
            match event {
                WindowEvent::Quit => break 'running,
                WindowEvent::Key(name) => redraw |= app.on_key(&name),
                WindowEvent::MouseDown { x, y } => app.on_mouse_down(x, y),
                WindowEvent::MouseMove { x, y } => redraw |= app.on_mouse_move(x, y),
                WindowEvent::MouseUp => app.on_mouse_up(),
                WindowEvent::Resize(w, h) => {
                    window.resize(w, h)?;
                    app.resize(w, h);
                    redraw = true;
                }
            }
        }
        if redraw {
            window.present(app.frame_buffer())?;
        }
    }

    log::info!("shutting down after {} frames", app.frames_drawn());
    Ok(())
}
