use std::io;

use ldb_stream::StreamError;

/// Errors produced by journal replay and persistence.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// I/O error while reading or writing an ECO file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The ECO file or journal payload failed to decode.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Payload CRC does not match the recorded checksum.
    #[error("ECO checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The declared payload length exceeds the configured bound.
    #[error("ECO payload of {length} bytes exceeds limit of {max} bytes")]
    TooLarge { length: u64, max: u64 },

    /// The payload decoded but left unread bytes behind.
    #[error("ECO payload has {extra} trailing bytes")]
    TrailingBytes { extra: u64 },

    /// An edit could not be applied to the target.
    #[error("replay failed at edit {index}: {reason}")]
    Replay { index: usize, reason: String },
}

/// Convenience alias used throughout the journal crate.
pub type JournalResult<T> = std::result::Result<T, JournalError>;
