use std::io;

use ldb_journal::JournalError;
use ldb_store::StoreError;
use ldb_stream::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{kind} named {name:?} already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("no {kind} named {name:?}")]
    NameNotFound { kind: &'static str, name: String },

    #[error("the database already has a chip")]
    ChipExists,

    #[error("the database has no chip")]
    NoChip,

    #[error("instance {inst} has no terminal {term}")]
    InvalidTerm { inst: u32, term: u32 },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl DbError {
    /// Returns `true` for malformed or incompatible stream data.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Stream(e) => e.is_format_error(),
            Self::Journal(JournalError::Stream(e)) => e.is_format_error(),
            Self::Journal(
                JournalError::ChecksumMismatch { .. }
                | JournalError::TooLarge { .. }
                | JournalError::TrailingBytes { .. },
            ) => true,
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
