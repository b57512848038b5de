use std::fmt;

use serde::{Deserialize, Serialize};

/// First magic word of a database stream ("LAYO").
pub const DB_MAGIC1: u32 = 0x4C41_594F;
/// Second magic word of a database stream ("UTDB").
pub const DB_MAGIC2: u32 = 0x5554_4442;

/// Schema major revision. A stream is only readable when its major matches.
pub const SCHEMA_MAJOR: u32 = 0;
/// Schema minor revision written by this release.
pub const SCHEMA_MINOR: u32 = SchemaCheckpoint::CURRENT.minor();

/// Named points in the schema minor history.
///
/// Checkpoints are totally ordered by their minor number; a stream "has" a
/// checkpoint when its minor is at or above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum SchemaCheckpoint {
    /// Oldest minor this release can still read.
    Initial = 1,
    /// Blocks and libraries carry their own technology reference. Older
    /// streams store one shared technology id after the chip id.
    BlockTech = 2,
    /// The GDS library table is part of the frame.
    GdsLibInBlock = 3,
    /// Masters carry width and height.
    MasterSize = 4,
}

impl SchemaCheckpoint {
    /// The newest checkpoint; its minor is [`SCHEMA_MINOR`].
    pub const CURRENT: Self = Self::MasterSize;

    pub const fn minor(self) -> u32 {
        self as u32
    }
}

/// A (major, minor) schema pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The schema written by this release.
    pub const fn current() -> Self {
        Self::new(SCHEMA_MAJOR, SCHEMA_MINOR)
    }

    /// Returns `true` if this version includes the given checkpoint.
    pub fn has(self, checkpoint: SchemaCheckpoint) -> bool {
        self.minor >= checkpoint.minor()
    }

    /// Returns `true` if this release can read a stream of this version.
    pub fn is_readable(self) -> bool {
        self.major == SCHEMA_MAJOR
            && self.minor >= SchemaCheckpoint::Initial.minor()
            && self.minor <= SCHEMA_MINOR
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
