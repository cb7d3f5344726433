//! Input Bindings Module
//!
//! Maps physical keys to logical placement actions so the placement states
//! never look at concrete keys, allowing the layout to be remapped or loaded
//! from configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::KeyCode;

/// Logical actions understood by the placement states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementAction {
    /// Commit / start a stroke / grab a handle (default: left mouse)
    Confirm,
    /// Leave the current interaction (default: Escape)
    Cancel,
    /// Tap to quarter-turn, hold to rotate towards the pointer (default: R)
    Rotate,
    /// Hold to lift the piece vertically (default: Left Shift)
    FastPlace,
    /// Combined with FastPlace, slide horizontally instead (default: Left Ctrl)
    FastPlaceHorizontal,
    /// Delete the current selection (default: Delete)
    Delete,
}

/// Key to action map. One key may drive several actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    key_to_actions: HashMap<KeyCode, Vec<PlacementAction>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Create bindings with the default layout.
    ///
    /// - Left mouse = Confirm
    /// - Escape = Cancel
    /// - R = Rotate
    /// - Shift (Left) = FastPlace
    /// - Ctrl (Left) = FastPlaceHorizontal
    /// - Delete = Delete
    pub fn new() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(KeyCode::MouseLeft, PlacementAction::Confirm);
        bindings.bind(KeyCode::Escape, PlacementAction::Cancel);
        bindings.bind(KeyCode::KeyR, PlacementAction::Rotate);
        bindings.bind(KeyCode::ShiftLeft, PlacementAction::FastPlace);
        bindings.bind(KeyCode::ControlLeft, PlacementAction::FastPlaceHorizontal);
        bindings.bind(KeyCode::Delete, PlacementAction::Delete);
        bindings
    }

    /// Bindings with nothing mapped.
    pub fn empty() -> Self {
        Self {
            key_to_actions: HashMap::new(),
        }
    }

    /// Bind a key to an action. Duplicate bindings are ignored.
    pub fn bind(&mut self, key: KeyCode, action: PlacementAction) {
        let actions = self.key_to_actions.entry(key).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    /// Remove a single key/action pairing.
    pub fn unbind(&mut self, key: KeyCode, action: PlacementAction) {
        if let Some(actions) = self.key_to_actions.get_mut(&key) {
            actions.retain(|a| *a != action);
        }
    }

    /// Actions driven by `key`.
    pub fn actions_for(&self, key: KeyCode) -> &[PlacementAction] {
        self.key_to_actions
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every key bound to `action`.
    pub fn keys_for(&self, action: PlacementAction) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self
            .key_to_actions
            .iter()
            .filter(|(_, actions)| actions.contains(&action))
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.actions_for(KeyCode::MouseLeft), &[PlacementAction::Confirm]);
        assert_eq!(bindings.actions_for(KeyCode::Escape), &[PlacementAction::Cancel]);
        assert_eq!(bindings.keys_for(PlacementAction::Rotate), vec![KeyCode::KeyR]);
        assert!(bindings.actions_for(KeyCode::KeyZ).is_empty());
    }

    #[test]
    fn test_rebind() {
        let mut bindings = KeyBindings::new();
        bindings.unbind(KeyCode::KeyR, PlacementAction::Rotate);
        bindings.bind(KeyCode::KeyQ, PlacementAction::Rotate);
        bindings.bind(KeyCode::KeyQ, PlacementAction::Rotate);
        assert_eq!(bindings.keys_for(PlacementAction::Rotate), vec![KeyCode::KeyQ]);
        assert_eq!(bindings.actions_for(KeyCode::KeyQ).len(), 1);
    }

    #[test]
    fn test_bindings_from_json() {
        let json = r#"{"key_to_actions":{"Enter":["Confirm"],"Escape":["Cancel"]}}"#;
        let bindings: KeyBindings = serde_json::from_str(json).expect("valid bindings");
        assert_eq!(bindings.actions_for(KeyCode::Enter), &[PlacementAction::Confirm]);
    }
}
