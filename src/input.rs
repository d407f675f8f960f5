//! Keyboard handling for the light offset.

/// Keys the viewer reacts to, by their DOM-style names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Owns the light offset, the only state keyboard input changes.
#[derive(Debug, Clone)]
pub struct InputController {
    light_offset: f32,
    step: f32,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl InputController {
    /// Controller starting at offset 0 that moves by `step` per key press.
    pub fn new(step: f32) -> Self {
        Self {
            light_offset: 0.0,
            step,
        }
    }

    pub fn light_offset(&self) -> f32 {
        self.light_offset
    }

    /// Applies a key press. Returns true when the offset changed and a redraw is due.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowLeft => self.light_offset -= self.step,
            Key::ArrowRight => self.light_offset += self.step,
            Key::Other => return false,
        }
        log::debug!("light offset {:.3}", self.light_offset);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn arrows_step_the_offset() {
        let mut input = InputController::default();
        for _ in 0..5 {
            assert!(input.handle_key(Key::from_name("ArrowRight")));
        }
        assert_relative_eq!(input.light_offset(), 0.5, epsilon = 1e-6);

        for _ in 0..5 {
            input.handle_key(Key::ArrowLeft);
        }
        assert_relative_eq!(input.light_offset(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut input = InputController::default();
        assert!(!input.handle_key(Key::from_name("a")));
        assert!(!input.handle_key(Key::from_name("arrowleft")));
        assert_eq!(input.light_offset(), 0.0);
    }
}
