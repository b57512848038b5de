use ldb_types::{SchemaVersion, TypeError};

/// Errors produced while encoding or decoding a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The leading magic words do not identify this kind of file.
    #[error(
        "not a {what} file: found magic {found1:#010x}/{found2:#010x}, expected {expected1:#010x}/{expected2:#010x}"
    )]
    InvalidMagic {
        what: &'static str,
        found1: u32,
        found2: u32,
        expected1: u32,
        expected2: u32,
    },

    /// The schema major does not match this release.
    #[error("incompatible schema revision: major {found}, expected {expected}")]
    IncompatibleMajor { found: u32, expected: u32 },

    /// The schema minor predates the oldest readable revision.
    #[error("incompatible schema revision {found}, older than {oldest}")]
    MinorTooOld {
        found: SchemaVersion,
        oldest: SchemaVersion,
    },

    /// The schema minor is newer than this release understands.
    #[error("incompatible schema revision {found} > {current}, newer than supported")]
    MinorTooNew {
        found: SchemaVersion,
        current: SchemaVersion,
    },

    /// The stream ended in the middle of a value.
    #[error("unexpected end of stream at byte {offset}")]
    UnexpectedEof { offset: u64 },

    /// A value decoded to something structurally impossible.
    #[error("corrupt stream at byte {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// An enumeration tag is outside the known set.
    #[error("invalid tag at byte {offset}: {source}")]
    InvalidTag {
        offset: u64,
        #[source]
        source: TypeError,
    },

    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Returns `true` for magic and schema gate failures.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::IncompatibleMajor { .. }
                | Self::MinorTooOld { .. }
                | Self::MinorTooNew { .. }
        )
    }
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
