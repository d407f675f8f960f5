use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::messagebox::{show_simple_message_box, MessageBoxFlag};
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Quit,
    /// Key press, named like DOM `KeyboardEvent.key` for arrows.
    Key(String),
    MouseDown { x: f32, y: f32 },
    MouseMove { x: f32, y: f32 },
    MouseUp,
    Resize(u32, u32),
}

/// Maps an SDL keycode to the name the input controller understands.
fn key_name(keycode: Keycode) -> String {
    match keycode {
        Keycode::Left => "ArrowLeft".to_string(),
        Keycode::Right => "ArrowRight".to_string(),
        other => other.name(),
    }
}

fn translate(event: Event) -> Option<WindowEvent> {
    match event {
        Event::Quit { .. }
        | Event::KeyDown {
            keycode: Some(Keycode::Escape),
            ..
        } => Some(WindowEvent::Quit),
        Event::KeyDown {
            keycode: Some(keycode),
            ..
        } => Some(WindowEvent::Key(key_name(keycode))),
        Event::MouseButtonDown {
            mouse_btn: MouseButton::Left,
            x,
            y,
            ..
        } => Some(WindowEvent::MouseDown {
            x: x as f32,
            y: y as f32,
        }),
        Event::MouseMotion { x, y, .. } => Some(WindowEvent::MouseMove {
            x: x as f32,
            y: y as f32,
        }),
        Event::MouseButtonUp {
            mouse_btn: MouseButton::Left,
            ..
        } => Some(WindowEvent::MouseUp),
        Event::Window {
            win_event: sdl2::event::WindowEvent::Resized(w, h),
            ..
        } => Some(WindowEvent::Resize(w.max(1) as u32, h.max(1) as u32)),
        _ => None,
    }
}

/// Shows a blocking error dialog in place of the rendered surface.
pub fn show_fallback(title: &str, message: &str) {
    if let Err(e) = show_simple_message_box(
        MessageBoxFlag::ERROR,
        title,
        message,
        None::<&sdl2::video::Window>,
    ) {
        log::warn!("could not show message box: {e}");
    }
}

pub struct Window {
    // Fields drop in declaration order: the texture must go before its creator.
    texture: sdl2::render::Texture<'static>,
    texture_creator: Box<sdl2::render::TextureCreator<sdl2::video::WindowContext>>,
    canvas: sdl2::render::Canvas<sdl2::video::Window>,
    event_pump: sdl2::EventPump,
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump()?;

        // SAFETY: texture_creator is heap-allocated and lives as long as Window,
        // and the texture field is declared (and so dropped) before it.
        let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
            unsafe { &*(texture_creator.as_ref() as *const _) };
        let texture = texture_creator_ref
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(|e| e.to_string())?;

        Ok(Self {
            texture,
            texture_creator,
            canvas,
            event_pump,
            width,
            height,
        })
    }

    /// Blocks until at least one event arrives, then drains the queue.
    pub fn wait_events(&mut self) -> Vec<WindowEvent> {
        let first = self.event_pump.wait_event();
        std::iter::once(first)
            .chain(self.event_pump.poll_iter())
            .filter_map(translate)
            .collect()
    }

    pub fn present(&mut self, buffer: &[u8]) -> Result<(), String> {
        self.texture
            .update(None, buffer, (self.width * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas
            .copy(&self.texture, None, Some(Rect::new(0, 0, self.width, self.height)))?;
        self.canvas.present();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), String> {
        self.width = width;
        self.height = height;
        // SAFETY: Same as in new() - texture_creator outlives texture
        let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
            unsafe { &*(self.texture_creator.as_ref() as *const _) };
        self.texture = texture_creator_ref
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_use_dom_names() {
        assert_eq!(key_name(Keycode::Left), "ArrowLeft");
        assert_eq!(key_name(Keycode::Right), "ArrowRight");
        assert_ne!(key_name(Keycode::Up), "ArrowLeft");
    }
}
