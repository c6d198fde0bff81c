//! Notes — colored sticky notes persisted in the `notes` slot.

use serde::{Deserialize, Serialize};

use crate::error::UtilityError;
use crate::services::slot::{Slot, check_index};
use crate::store::LocalStore;

pub const NOTES_SLOT: &str = "notes";
pub const DEFAULT_NOTE_COLOR: &str = "#ffd54f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub color: String,
}

pub struct NotesService {
    store: LocalStore,
    slot: Slot<Note>,
}

impl NotesService {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store, slot: Slot::new(NOTES_SLOT) }
    }

    /// # Errors
    ///
    /// Returns a store error if the slot cannot be read.
    pub async fn list(&self) -> Result<Vec<Note>, UtilityError> {
        self.slot.load(&self.store).await
    }

    /// Append a note. `color` defaults to [`DEFAULT_NOTE_COLOR`].
    ///
    /// # Errors
    ///
    /// Returns `Validation` for blank text or a color that is not `#rrggbb`,
    /// or a store error.
    pub async fn add(&self, text: &str, color: Option<&str>) -> Result<Vec<Note>, UtilityError> {
        if text.trim().is_empty() {
            return Err(UtilityError::validation("note text is empty"));
        }
        let color = color.unwrap_or(DEFAULT_NOTE_COLOR);
        if !is_hex_color(color) {
            return Err(UtilityError::validation(format!("invalid note color: {color}")));
        }

        let note = Note { text: text.to_string(), color: color.to_ascii_lowercase() };
        self.slot
            .update(&self.store, move |notes| {
                notes.push(note);
                Ok(())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `Validation` if `index` is out of range, or a store error.
    pub async fn delete(&self, index: usize) -> Result<Vec<Note>, UtilityError> {
        self.slot
            .update(&self.store, |notes| {
                check_index(notes.len(), index, "note")?;
                notes.remove(index);
                Ok(())
            })
            .await
    }
}

fn is_hex_color(color: &str) -> bool {
    color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
