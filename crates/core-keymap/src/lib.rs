//! User key bindings: a flat map from `(key, modifiers)` to an action name.
//!
//! Action names are script-addressable symbols; dispatch looks the name up
//! in the interpreter's global scope. User bindings always win over the
//! built-in handlers, and binding an already-bound chord replaces it.

use core_input::KeyInput;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Keymap {
    bindings: HashMap<KeyInput, String>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind a chord to an action name, replacing any existing binding.
    pub fn bind(&mut self, key: KeyInput, action: impl Into<String>) {
        let action = action.into();
        debug!(target: "keymap", ?key, action = %action, "bind");
        self.bindings.insert(key, action);
    }

    /// Remove a binding; false when the chord was not bound.
    pub fn unbind(&mut self, key: &KeyInput) -> bool {
        let removed = self.bindings.remove(key).is_some();
        if removed {
            debug!(target: "keymap", ?key, "unbind");
        }
        removed
    }

    pub fn lookup(&self, key: &KeyInput) -> Option<&str> {
        self.bindings.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyInput, &str)> {
        self.bindings.iter().map(|(k, v)| (k, v.as_str()))
    }
}
