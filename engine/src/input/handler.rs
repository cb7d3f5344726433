//! Input Handler
//!
//! Per-frame input state for the placement states: key edges resolved into
//! actions through [`KeyBindings`], the world-space pointer sample and the
//! transform handle currently under the pointer.

use std::collections::HashMap;

use super::bindings::{KeyBindings, PlacementAction};
use super::{HandleAxis, KeyCode, KeyState, PointerSample};

/// Current input state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Key states mapped by KeyCode
    keys: HashMap<KeyCode, KeyState>,
    /// Action states mapped by PlacementAction
    actions: HashMap<PlacementAction, KeyState>,
    /// Key-to-action bindings
    bindings: KeyBindings,
    /// Where the pointer meets the scene, if it does
    pointer: Option<PointerSample>,
    /// Gizmo axis under the pointer, reported by the UI layer
    hovered_handle: Option<HandleAxis>,
}

impl InputState {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::new())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            keys: HashMap::new(),
            actions: HashMap::new(),
            bindings,
            pointer: None,
            hovered_handle: None,
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Handle a key or mouse button event
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        self.keys.entry(key).or_default().apply(pressed);

        for action in self.bindings.actions_for(key).to_vec() {
            // An action stays held while any of its keys is held
            let held = pressed
                || self
                    .bindings
                    .keys_for(action)
                    .iter()
                    .any(|k| *k != key && self.key_pressed(*k));
            self.actions.entry(action).or_default().apply(held);
        }
    }

    /// Update where the pointer meets the scene.
    pub fn set_pointer(&mut self, pointer: PointerSample) {
        self.pointer = Some(pointer);
    }

    /// The pointer left the scene (e.g. it is over a panel).
    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    pub fn set_hovered_handle(&mut self, axis: Option<HandleAxis>) {
        self.hovered_handle = axis;
    }

    /// Clear per-frame state (call at end of frame)
    pub fn end_frame(&mut self) {
        for state in self.keys.values_mut() {
            state.clear_edges();
        }
        for state in self.actions.values_mut() {
            state.clear_edges();
        }
    }

    // Query methods

    pub fn pointer(&self) -> Option<&PointerSample> {
        self.pointer.as_ref()
    }

    pub fn hovered_handle(&self) -> Option<HandleAxis> {
        self.hovered_handle
    }

    /// Check if a key is currently pressed
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|s| s.pressed)
    }

    /// Check if a key was just pressed this frame
    pub fn key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|s| s.just_pressed)
    }

    /// Check if a key was just released this frame
    pub fn key_just_released(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|s| s.just_released)
    }

    /// Check if an action is currently active
    pub fn action_pressed(&self, action: PlacementAction) -> bool {
        self.actions.get(&action).is_some_and(|s| s.pressed)
    }

    /// Check if an action was just triggered this frame
    pub fn action_just_pressed(&self, action: PlacementAction) -> bool {
        self.actions.get(&action).is_some_and(|s| s.just_pressed)
    }

    /// Check if an action was just released this frame
    pub fn action_just_released(&self, action: PlacementAction) -> bool {
        self.actions.get(&action).is_some_and(|s| s.just_released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_key_edges_resolve_to_actions() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::MouseLeft, true);
        assert!(input.action_just_pressed(PlacementAction::Confirm));
        assert!(input.action_pressed(PlacementAction::Confirm));

        input.end_frame();
        assert!(!input.action_just_pressed(PlacementAction::Confirm));
        assert!(input.action_pressed(PlacementAction::Confirm));

        input.handle_key(KeyCode::MouseLeft, false);
        assert!(input.action_just_released(PlacementAction::Confirm));
        assert!(!input.action_pressed(PlacementAction::Confirm));
    }

    #[test]
    fn test_repeated_press_is_not_a_new_edge() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyR, true);
        input.end_frame();
        input.handle_key(KeyCode::KeyR, true);
        assert!(!input.key_just_pressed(KeyCode::KeyR));
        assert!(input.key_pressed(KeyCode::KeyR));
    }

    #[test]
    fn test_action_held_by_second_key() {
        let mut bindings = KeyBindings::new();
        bindings.bind(KeyCode::Enter, PlacementAction::Confirm);
        let mut input = InputState::with_bindings(bindings);

        input.handle_key(KeyCode::MouseLeft, true);
        input.handle_key(KeyCode::Enter, true);
        input.handle_key(KeyCode::MouseLeft, false);
        assert!(input.action_pressed(PlacementAction::Confirm));
        assert!(!input.action_just_released(PlacementAction::Confirm));
    }

    #[test]
    fn test_pointer_and_handle() {
        let mut input = InputState::new();
        assert!(input.pointer().is_none());
        input.set_pointer(PointerSample::at(Vec3::new(1.0, 0.0, 2.0)));
        input.set_hovered_handle(Some(HandleAxis::X));
        assert_eq!(input.pointer().map(|p| p.position), Some(Vec3::new(1.0, 0.0, 2.0)));
        assert_eq!(input.hovered_handle(), Some(HandleAxis::X));
        input.clear_pointer();
        assert!(input.pointer().is_none());
    }
}
