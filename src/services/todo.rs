//! To-do list — tasks persisted in the `tasks` slot.

use serde::{Deserialize, Serialize};

use crate::error::UtilityError;
use crate::services::slot::{Slot, check_index};
use crate::store::LocalStore;

pub const TASKS_SLOT: &str = "tasks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

pub struct TodoService {
    store: LocalStore,
    slot: Slot<Task>,
}

impl TodoService {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store, slot: Slot::new(TASKS_SLOT) }
    }

    /// # Errors
    ///
    /// Returns a store error if the slot cannot be read.
    pub async fn list(&self) -> Result<Vec<Task>, UtilityError> {
        self.slot.load(&self.store).await
    }

    /// Append a task. Text is kept as entered; blank text is rejected.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for blank text, or a store error.
    pub async fn add(&self, text: &str) -> Result<Vec<Task>, UtilityError> {
        if text.trim().is_empty() {
            return Err(UtilityError::validation("task text is empty"));
        }
        let task = Task { text: text.to_string(), done: false };
        self.slot
            .update(&self.store, move |tasks| {
                tasks.push(task);
                Ok(())
            })
            .await
    }

    /// Flip the `done` flag of the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `index` is out of range, or a store error.
    pub async fn toggle(&self, index: usize) -> Result<Vec<Task>, UtilityError> {
        self.slot
            .update(&self.store, |tasks| {
                check_index(tasks.len(), index, "task")?;
                tasks[index].done = !tasks[index].done;
                Ok(())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `Validation` if `index` is out of range, or a store error.
    pub async fn delete(&self, index: usize) -> Result<Vec<Task>, UtilityError> {
        self.slot
            .update(&self.store, |tasks| {
                check_index(tasks.len(), index, "task")?;
                tasks.remove(index);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
#[path = "todo_test.rs"]
mod tests;
