//! Password generator and saved-password list (`passwords` slot).
//!
//! Generation samples uniformly from a fixed charset. The default RNG is
//! `rand::rng()`, a thread-local CSPRNG reseeded from the OS.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::UtilityError;
use crate::services::slot::{Slot, check_index};
use crate::store::LocalStore;

pub const PASSWORDS_SLOT: &str = "passwords";
pub const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+";
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_PASSWORD_LENGTH: usize = 32;
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEntry {
    pub name: String,
    pub password: String,
}

/// Generate a password of `length` characters from [`PASSWORD_CHARSET`].
///
/// # Errors
///
/// Returns `Validation` if `length` is outside
/// `MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH`.
pub fn generate_password<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Result<String, UtilityError> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(UtilityError::validation(format!(
            "password length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}"
        )));
    }
    Ok((0..length)
        .map(|_| char::from(PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())]))
        .collect())
}

pub struct PasswordService {
    store: LocalStore,
    slot: Slot<PasswordEntry>,
}

impl PasswordService {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store, slot: Slot::new(PASSWORDS_SLOT) }
    }

    /// Generate with the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an out-of-range length.
    pub fn generate(&self, length: usize) -> Result<String, UtilityError> {
        generate_password(length, &mut rand::rng())
    }

    /// # Errors
    ///
    /// Returns a store error if the slot cannot be read.
    pub async fn list(&self) -> Result<Vec<PasswordEntry>, UtilityError> {
        self.slot.load(&self.store).await
    }

    /// Save a labelled password. Both label and password are required.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if either value is empty, or a store error.
    pub async fn save(&self, name: &str, password: &str) -> Result<Vec<PasswordEntry>, UtilityError> {
        if name.is_empty() || password.is_empty() {
            return Err(UtilityError::validation("enter a name and generate a password first"));
        }
        let entry = PasswordEntry { name: name.to_string(), password: password.to_string() };
        self.slot
            .update(&self.store, move |entries| {
                entries.push(entry);
                Ok(())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `Validation` if `index` is out of range, or a store error.
    pub async fn delete(&self, index: usize) -> Result<Vec<PasswordEntry>, UtilityError> {
        self.slot
            .update(&self.store, |entries| {
                check_index(entries.len(), index, "password")?;
                entries.remove(index);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
#[path = "passwords_test.rs"]
mod tests;
