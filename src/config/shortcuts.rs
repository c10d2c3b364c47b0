use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Encapsulates a string representing some key event, like `"C-c"`, `"right"` or `" "`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputStr(pub String);

impl From<KeyEvent> for InputStr {
    fn from(event: KeyEvent) -> Self {
        let mut s = String::new();
        let is_char = matches!(event.code, KeyCode::Char(_));

        // Modifiers
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("C-");
        }
        if event.modifiers.contains(KeyModifiers::SHIFT) && !is_char {
            s.push_str("S-");
        }
        if event.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("A-");
        }

        // Actual key
        match event.code {
            KeyCode::Char(c) => s.push(c),
            other => s.push_str(&format!("{:?}", other).to_lowercase()),
        }

        InputStr(s)
    }
}

/// Stores a table of [Command] shortcuts.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Shortcuts(pub HashMap<InputStr, Command>);

impl Shortcuts {
    pub fn get_from_event(&self, event: KeyEvent) -> Option<Command> {
        self.0.get(&event.into()).cloned()
    }
}
