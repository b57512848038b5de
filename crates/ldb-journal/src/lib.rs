//! Engineering change order (ECO) journals.
//!
//! A [`Journal`] is an ordered list of field-level edit records captured
//! against one block. It can be replayed forward (redo) or backward (undo)
//! against any [`JournalTarget`], persisted as a CRC-checked file, and read
//! back on another copy of the same design.
//!
//! [`EcoSlots`] holds the two journals a block may own at once: the
//! *active* journal still recording edits, and the *pending* journal that
//! has been finished but not yet committed or undone.
//!
//! The edit record type is a parameter: this crate sequences and persists
//! edits, the block that owns them decides what an edit means.

pub mod error;
pub mod file;
pub mod journal;
pub mod slots;
pub mod target;

pub use error::{JournalError, JournalResult};
pub use file::{read_eco_file, write_eco_file, EcoFileConfig, SyncMode, ECO_MAGIC};
pub use journal::Journal;
pub use slots::EcoSlots;
pub use target::{Direction, JournalTarget};
