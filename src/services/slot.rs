//! Named slots — one record per widget holding that widget's list.
//!
//! DESIGN
//! ======
//! A slot is the record whose `id` is the slot name under the reserved
//! `widget:` prefix and whose `items` field holds a JSON array. The record
//! API refuses to write ids under that prefix. Updates are read-modify-write against the store, so
//! each slot serializes its own writers behind an async mutex; readers go
//! straight to the store.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::UtilityError;
use crate::store::{LocalStore, Record};

/// Id prefix owned by widget slots.
pub const SLOT_PREFIX: &str = "widget:";

/// Record id of the slot called `name`.
#[must_use]
pub fn slot_id(name: &str) -> String {
    format!("{SLOT_PREFIX}{name}")
}

/// Whether `id` belongs to a widget slot.
#[must_use]
pub fn is_slot_id(id: &str) -> bool {
    id.starts_with(SLOT_PREFIX)
}

/// Stored shape of a slot: `{"items": [...]}`.
#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct SlotPayload<T> {
    #[serde(default)]
    items: Vec<T>,
}

pub struct Slot<T> {
    name: &'static str,
    id: String,
    guard: Mutex<()>,
    _item: PhantomData<fn() -> T>,
}

impl<T> Slot<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, id: slot_id(name), guard: Mutex::new(()), _item: PhantomData }
    }

    /// Load the slot's items. A slot that was never written is empty.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record cannot be read or decoded.
    pub async fn load(&self, store: &LocalStore) -> Result<Vec<T>, UtilityError> {
        let Some(record) = store.get(&self.id).await? else {
            return Ok(Vec::new());
        };
        let payload: SlotPayload<T> = record.decode()?;
        Ok(payload.items)
    }

    /// Apply `edit` to the current items and persist the result.
    ///
    /// Nothing is written when `edit` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from `edit`, or a store error.
    pub async fn update<F>(&self, store: &LocalStore, edit: F) -> Result<Vec<T>, UtilityError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<(), UtilityError> + Send,
    {
        let _guard = self.guard.lock().await;
        let mut items = self.load(store).await?;
        edit(&mut items)?;

        let payload = SlotPayload { items };
        let record = Record::from_payload(Some(self.id.clone()), &payload)
            .map_err(|e| UtilityError::validation(format!("cannot serialize {} slot: {e}", self.name)))?;
        store.put(record).await?;
        debug!(slot = self.name, items = payload.items.len(), "slot saved");
        Ok(payload.items)
    }
}

/// Check that `index` addresses an element of a list of `len` items.
pub(crate) fn check_index(len: usize, index: usize, what: &str) -> Result<(), UtilityError> {
    if index < len {
        Ok(())
    } else {
        Err(UtilityError::validation(format!("no {what} at index {index}")))
    }
}
