use ldb_types::{SchemaCheckpoint, SchemaVersion, SCHEMA_MAJOR, SCHEMA_MINOR};
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::istream::IStream;
use crate::ostream::OStream;

/// Two magic words identifying a kind of file, plus a human-readable name
/// used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Magic {
    pub word1: u32,
    pub word2: u32,
    pub what: &'static str,
}

impl Magic {
    pub const fn new(word1: u32, word2: u32, what: &'static str) -> Self {
        Self { word1, word2, what }
    }
}

/// Write a frame header: both magic words and the stream's schema pair.
pub fn write_frame_header(out: &mut OStream<'_>, magic: Magic) -> StreamResult<()> {
    out.write_u32(magic.word1)?;
    out.write_u32(magic.word2)?;
    let schema = out.schema();
    out.write_u32(schema.major)?;
    out.write_u32(schema.minor)
}

/// Read and validate a frame header.
///
/// Gates run in field order and fail before any payload is read: magic
/// words, then an exact major match, then the minor window
/// `[Initial, SCHEMA_MINOR]`. On success the stream's schema is set to the
/// version found so gated fields decode as written.
pub fn read_frame_header(inp: &mut IStream<'_>, magic: Magic) -> StreamResult<SchemaVersion> {
    let found1 = inp.read_u32()?;
    let found2 = inp.read_u32()?;
    if found1 != magic.word1 || found2 != magic.word2 {
        return Err(StreamError::InvalidMagic {
            what: magic.what,
            found1,
            found2,
            expected1: magic.word1,
            expected2: magic.word2,
        });
    }

    let major = inp.read_u32()?;
    if major != SCHEMA_MAJOR {
        return Err(StreamError::IncompatibleMajor {
            found: major,
            expected: SCHEMA_MAJOR,
        });
    }

    let minor = inp.read_u32()?;
    let found = SchemaVersion::new(major, minor);
    if minor < SchemaCheckpoint::Initial.minor() {
        return Err(StreamError::MinorTooOld {
            found,
            oldest: SchemaVersion::new(SCHEMA_MAJOR, SchemaCheckpoint::Initial.minor()),
        });
    }
    if minor > SCHEMA_MINOR {
        return Err(StreamError::MinorTooNew {
            found,
            current: SchemaVersion::current(),
        });
    }

    debug!(what = magic.what, schema = %found, "frame header accepted");
    inp.set_schema(found);
    Ok(found)
}
