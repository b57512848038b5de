use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Tag of a top-level object table owned by a database root.
///
/// The set is closed: every variant has exactly one table in every root, and
/// the declaration order is the order tables appear in the stream frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    Tech = 1,
    Lib = 2,
    Chip = 3,
    GdsLib = 4,
    Property = 5,
}

impl ObjectType {
    /// All tags, in stream order.
    pub const ALL: [ObjectType; 5] = [
        ObjectType::Tech,
        ObjectType::Lib,
        ObjectType::Chip,
        ObjectType::GdsLib,
        ObjectType::Property,
    ];

    /// The wire tag.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a wire tag.
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            1 => Ok(Self::Tech),
            2 => Ok(Self::Lib),
            3 => Ok(Self::Chip),
            4 => Ok(Self::GdsLib),
            5 => Ok(Self::Property),
            _ => Err(TypeError::UnknownTag {
                kind: "object type",
                tag,
            }),
        }
    }

    /// Short lowercase name used in reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Lib => "lib",
            Self::Chip => "chip",
            Self::GdsLib => "gds_lib",
            Self::Property => "prop",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped cross-reference to an entry of a top-level table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectType,
    pub id: u32,
}

impl ObjectRef {
    pub const fn new(kind: ObjectType, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}
