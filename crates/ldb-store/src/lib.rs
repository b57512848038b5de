//! Typed object tables for the layout database.
//!
//! Every entity kind lives in an [`ObjectTable`] owned by its parent: the
//! database root owns technologies, libraries, chips, GDS libraries and
//! properties; a library owns its masters; a block owns its instances and
//! nets. Cross-references are [`Id`](ldb_types::Id) handles resolved through
//! the owning table, never stored references.
//!
//! # Design Rules
//!
//! 1. Identifiers are assigned in allocation order starting at 1.
//! 2. A destroyed identifier is never handed out again by the same table.
//! 3. Iteration visits live entries in allocation order.
//! 4. Tables stream themselves with their holes, so identifiers survive a
//!    write/read cycle unchanged.
//! 5. Tables are not internally synchronized; callers hold exclusive access
//!    while mutating.

pub mod entity;
pub mod error;
pub mod mem;
pub mod name_cache;
pub mod registry;
pub mod table;

pub use entity::{Entity, TopLevelEntity};
pub use error::{StoreError, StoreResult};
pub use mem::{MemInfo, MemSize};
pub use name_cache::{CachedName, NameCache};
pub use registry::DynTable;
pub use table::ObjectTable;
