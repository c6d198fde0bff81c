//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the local store handle, one service per widget and the offline
//! shell. Widgets own their slot locks, so the same service instance must be
//! shared by every request.

use std::sync::Arc;

use crate::services::currency::CurrencyService;
use crate::services::notes::NotesService;
use crate::services::passwords::PasswordService;
use crate::services::todo::TodoService;
use crate::shell::OfflineShell;
use crate::store::LocalStore;

/// Shared application state. Clone is required by Axum; every field is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub todo: Arc<TodoService>,
    pub notes: Arc<NotesService>,
    pub passwords: Arc<PasswordService>,
    pub currency: Arc<CurrencyService>,
    pub shell: Arc<OfflineShell>,
}

impl AppState {
    #[must_use]
    pub fn new(store: LocalStore, currency: CurrencyService, shell: OfflineShell) -> Self {
        Self {
            todo: Arc::new(TodoService::new(store.clone())),
            notes: Arc::new(NotesService::new(store.clone())),
            passwords: Arc::new(PasswordService::new(store.clone())),
            currency: Arc::new(currency),
            shell: Arc::new(shell),
            store,
        }
    }
}
