//! Input state management

use std::collections::{HashMap, HashSet};
use winit::keyboard::KeyCode;

/// Everything a key can be bound to in the demo
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    ToggleBloom,
    ExposureUp,
    ExposureDown,
    ToggleCapture,
    ToggleFullscreen,
    Exit,
}

/// Tracks keyboard and mouse input state per frame
pub struct InputState {
    /// Keys currently held down
    keys_down: HashSet<KeyCode>,
    /// Keys pressed this frame
    keys_just_pressed: HashSet<KeyCode>,

    /// Current cursor position in window pixels
    pub mouse_position: (f64, f64),
    /// Raw accumulated mouse delta (for cursor-locked mode)
    raw_mouse_delta: (f64, f64),
    /// Scroll wheel lines accumulated this frame
    scroll_delta: f32,

    /// Action map: action -> list of key bindings
    action_map: HashMap<Action, Vec<KeyCode>>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            keys_just_pressed: HashSet::new(),
            mouse_position: (0.0, 0.0),
            raw_mouse_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            action_map: Self::default_action_map(),
        }
    }

    fn default_action_map() -> HashMap<Action, Vec<KeyCode>> {
        let mut map = HashMap::new();
        map.insert(Action::MoveForward, vec![KeyCode::KeyW]);
        map.insert(Action::MoveBackward, vec![KeyCode::KeyS]);
        map.insert(Action::MoveLeft, vec![KeyCode::KeyA]);
        map.insert(Action::MoveRight, vec![KeyCode::KeyD]);
        map.insert(Action::ToggleBloom, vec![KeyCode::KeyB, KeyCode::Space]);
        map.insert(Action::ExposureUp, vec![KeyCode::KeyE]);
        map.insert(Action::ExposureDown, vec![KeyCode::KeyQ]);
        map.insert(Action::ToggleCapture, vec![KeyCode::F1]);
        map.insert(Action::ToggleFullscreen, vec![KeyCode::F11]);
        map.insert(Action::Exit, vec![KeyCode::Escape]);
        map
    }

    /// Process a key press event
    pub fn process_key_down(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_just_pressed.insert(key);
        }
    }

    /// Process a key release event
    pub fn process_key_up(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    /// Process cursor movement (window coordinates)
    pub fn process_mouse_move(&mut self, x: f64, y: f64) {
        self.mouse_position = (x, y);
    }

    /// Process raw mouse delta (device motion, for locked cursor)
    pub fn process_mouse_raw_delta(&mut self, dx: f64, dy: f64) {
        self.raw_mouse_delta.0 += dx;
        self.raw_mouse_delta.1 += dy;
    }

    /// Process a scroll wheel event, in lines
    pub fn process_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Drop held keys, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.keys_down.clear();
    }

    /// Call at end of frame to clear per-frame state
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.raw_mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    // --- Query methods ---

    /// Is an action currently held? (any bound key is down)
    pub fn is_action_pressed(&self, action: Action) -> bool {
        self.action_map
            .get(&action)
            .is_some_and(|keys| keys.iter().any(|k| self.keys_down.contains(k)))
    }

    /// Was an action just pressed this frame?
    pub fn is_action_just_pressed(&self, action: Action) -> bool {
        self.action_map
            .get(&action)
            .is_some_and(|keys| keys.iter().any(|k| self.keys_just_pressed.contains(k)))
    }

    /// Is `key` one of the keys bound to `action`?
    pub fn is_bound(&self, action: Action, key: KeyCode) -> bool {
        self.action_map
            .get(&action)
            .is_some_and(|keys| keys.contains(&key))
    }

    /// Get the raw mouse delta (accumulated device motion)
    pub fn raw_mouse_delta(&self) -> (f64, f64) {
        self.raw_mouse_delta
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_transitions() {
        let mut input = InputState::new();

        input.process_key_down(KeyCode::KeyW);
        assert!(input.is_action_pressed(Action::MoveForward));
        assert!(input.is_action_just_pressed(Action::MoveForward));

        // End frame clears just_pressed
        input.end_frame();
        assert!(input.is_action_pressed(Action::MoveForward));
        assert!(!input.is_action_just_pressed(Action::MoveForward));

        // Key repeat does not count as a fresh press
        input.process_key_down(KeyCode::KeyW);
        assert!(!input.is_action_just_pressed(Action::MoveForward));

        input.process_key_up(KeyCode::KeyW);
        assert!(!input.is_action_pressed(Action::MoveForward));
    }

    #[test]
    fn test_action_map() {
        let mut input = InputState::new();
        assert!(!input.is_action_pressed(Action::MoveForward));

        input.process_key_down(KeyCode::KeyW);
        assert!(input.is_action_pressed(Action::MoveForward));
        assert!(input.is_action_just_pressed(Action::MoveForward));
        assert!(!input.is_action_pressed(Action::MoveBackward));
    }

    #[test]
    fn test_bloom_toggle_has_two_keys() {
        let mut input = InputState::new();
        input.process_key_down(KeyCode::Space);
        assert!(input.is_action_just_pressed(Action::ToggleBloom));
        input.end_frame();
        input.process_key_up(KeyCode::Space);
        input.process_key_down(KeyCode::KeyB);
        assert!(input.is_action_just_pressed(Action::ToggleBloom));
    }

    #[test]
    fn test_is_bound() {
        let input = InputState::new();
        assert!(input.is_bound(Action::Exit, KeyCode::Escape));
        assert!(input.is_bound(Action::ToggleCapture, KeyCode::F1));
        assert!(!input.is_bound(Action::ToggleFullscreen, KeyCode::F1));
    }

    #[test]
    fn test_mouse_and_scroll_reset_each_frame() {
        let mut input = InputState::new();
        input.process_mouse_raw_delta(3.0, -2.0);
        input.process_mouse_raw_delta(1.0, 1.0);
        input.process_scroll(1.5);
        assert_eq!(input.raw_mouse_delta(), (4.0, -1.0));
        assert_eq!(input.scroll_delta(), 1.5);

        input.end_frame();
        assert_eq!(input.raw_mouse_delta(), (0.0, 0.0));
        assert_eq!(input.scroll_delta(), 0.0);
    }

    #[test]
    fn test_release_all() {
        let mut input = InputState::new();
        input.process_key_down(KeyCode::KeyA);
        input.release_all();
        assert!(!input.is_action_pressed(Action::MoveLeft));
    }
}
