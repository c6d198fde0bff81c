//! Utility widgets.
//!
//! ARCHITECTURE
//! ============
//! Each widget is independent. Widgets with persisted state (to-do, notes,
//! passwords) own one slot in the local store; the converters and the QR
//! generator are pure transforms.

pub mod currency;
pub mod notes;
pub mod passwords;
pub mod pdf;
pub mod qr;
pub mod slot;
pub mod todo;
pub mod units;
