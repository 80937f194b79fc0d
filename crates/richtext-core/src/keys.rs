use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::Editor;
use crate::error::Result;
use crate::node::{ElementKind, MarkKind};
use crate::query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Enter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// Not a shortcut; the caller's generic input handling owns it.
    Ignored,
}

impl Editor {
    pub fn handle_key(&mut self, input: KeyInput) -> Result<KeyOutcome> {
        let Modifiers { ctrl, shift } = input.modifiers;
        match input.key {
            Key::Char(c) if ctrl => {
                match c.to_ascii_lowercase() {
                    'b' => self.toggle_mark(MarkKind::Bold)?,
                    'i' => self.toggle_mark(MarkKind::Italic)?,
                    'u' => self.toggle_mark(MarkKind::Underline)?,
                    'l' => self.toggle_block(ElementKind::BulletedList)?,
                    'n' => self.toggle_block(ElementKind::NumberedList)?,
                    _ => return Ok(KeyOutcome::Ignored),
                }
                trace!(key = %c, "shortcut");
                Ok(KeyOutcome::Handled)
            }
            Key::Enter if self.in_checklist() => {
                if shift {
                    self.exit_checklist()?;
                } else {
                    self.continue_checklist()?;
                }
                Ok(KeyOutcome::Handled)
            }
            _ => Ok(KeyOutcome::Ignored),
        }
    }

    fn in_checklist(&self) -> bool {
        query::anchor_block(self.doc(), self.selection())
            .is_some_and(|(_, kind)| kind == ElementKind::ChecklistItem)
    }
}
