//! Foundation types for the layout database (LDB).
//!
//! This crate provides the identifier, tag, and value types shared by every
//! other LDB crate, together with the schema constants that gate the binary
//! stream format and the structured logger contract.
//!
//! # Key Types
//!
//! - [`Id`] — Stable table-scoped handle for one entity kind
//! - [`ObjectType`] — Closed set of top-level table tags used for dispatch
//! - [`SchemaVersion`] / [`SchemaCheckpoint`] — Stream compatibility gates
//! - [`Logger`] — Subsystem-tagged, code-numbered diagnostics sink

pub mod error;
pub mod geom;
pub mod id;
pub mod kinds;
pub mod log;
pub mod object_type;
pub mod schema;

pub use error::TypeError;
pub use geom::Point;
pub use id::Id;
pub use kinds::{IoType, LayerType, Orient, PlacementStatus, SigType};
pub use log::{Level, LogRecord, Logger, RecordingLogger, Subsystem, TracingLogger};
pub use object_type::{ObjectRef, ObjectType};
pub use schema::{
    SchemaCheckpoint, SchemaVersion, DB_MAGIC1, DB_MAGIC2, SCHEMA_MAJOR, SCHEMA_MINOR,
};
