//! Input Module
//!
//! Platform-agnostic input for the placement states. The engine only needs
//! "pointer position + button/key edges": the host application feeds key
//! and button events plus the world-space point under the cursor, and the
//! states read actions through [`KeyBindings`].
//!
//! # Example
//!
//! ```rust,ignore
//! use modular_builder_engine::input::{InputState, KeyCode, PlacementAction, PointerSample};
//! use glam::Vec3;
//!
//! let mut input = InputState::new();
//! input.set_pointer(PointerSample::at(Vec3::new(2.0, 0.0, 3.0)));
//! input.handle_key(KeyCode::MouseLeft, true);
//! if input.action_just_pressed(PlacementAction::Confirm) {
//!     // commit placement
//! }
//! input.end_frame();
//! ```

pub mod bindings;
pub mod handler;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use bindings::{KeyBindings, PlacementAction};
pub use handler::InputState;

/// Generic key and button codes, independent of windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyCode {
    MouseLeft,
    MouseRight,
    MouseMiddle,
    Escape,
    Enter,
    Delete,
    Backspace,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    KeyQ,
    KeyR,
    KeyZ,
    /// Any other key, identified by the host's scan code
    Other(u16),
}

/// State of a key (pressed or released)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

impl KeyState {
    fn apply(&mut self, pressed: bool) {
        self.just_pressed = pressed && !self.pressed;
        self.just_released = !pressed && self.pressed;
        self.pressed = pressed;
    }

    fn clear_edges(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Where the pointer meets the scene this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// World-space hit point
    pub position: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Screen position in pixels, y growing downward (drives handle lift and rotation)
    pub screen: Vec2,
}

impl PointerSample {
    /// Pointer on flat ground at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::Y,
            screen: Vec2::ZERO,
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_screen(mut self, screen: Vec2) -> Self {
        self.screen = screen;
        self
    }
}

/// Axis of a transform gizmo handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleAxis {
    X,
    Y,
    Z,
}

impl HandleAxis {
    pub fn vector(&self) -> Vec3 {
        match self {
            HandleAxis::X => Vec3::X,
            HandleAxis::Y => Vec3::Y,
            HandleAxis::Z => Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_edges() {
        let mut state = KeyState::default();
        state.apply(true);
        assert!(state.pressed && state.just_pressed && !state.just_released);
        state.clear_edges();
        state.apply(false);
        assert!(!state.pressed && state.just_released);
    }

    #[test]
    fn test_handle_axis_vectors() {
        assert_eq!(HandleAxis::X.vector(), Vec3::X);
        assert_eq!(HandleAxis::Y.vector(), Vec3::Y);
        assert_eq!(HandleAxis::Z.vector(), Vec3::Z);
    }
}
