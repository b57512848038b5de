//! The layout database root.
//!
//! A [`Database`] aggregates technologies, libraries, one chip with its
//! block hierarchy, embedded GDS libraries, and properties, all held in
//! [`ObjectTable`](ldb_store::ObjectTable)s and cross-referenced by id. The
//! whole root streams to and from a single versioned binary frame.
//!
//! Incremental edits to a [`Block`] can be captured in an ECO journal,
//! saved to a file, and later committed or undone, on the same block or on
//! a copy loaded from the same snapshot.
//!
//! Roots created through [`registry`] are tracked process-wide by unique id.

pub mod block;
pub mod chip;
pub mod config;
pub mod database;
pub mod eco;
pub mod edit;
pub mod error;
pub mod gds;
pub mod library;
pub mod observer;
pub mod property;
pub mod registry;
pub mod report;
pub mod tech;

pub use block::{Block, ITermRef, Inst, Net};
pub use chip::Chip;
pub use config::DbConfig;
pub use database::Database;
pub use edit::BlockEdit;
pub use error::{DbError, DbResult};
pub use gds::GdsLib;
pub use library::{Lib, MTerm, Master, MasterRef};
pub use observer::{DatabaseObserver, ObserverHandle, ObserverId, SharedObserver};
pub use property::{PropValue, Property};
pub use registry::SharedDatabase;
pub use report::DbStats;
pub use tech::{Layer, Tech};

pub use ldb_types::{
    Id, IoType, LayerType, Logger, ObjectRef, ObjectType, Orient, PlacementStatus, Point,
    RecordingLogger, SchemaVersion, SigType, Subsystem, TracingLogger,
};

#[cfg(test)]
mod fixtures;
