/// Errors from object table operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live entry has this identifier.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },

    /// The identifier is already held by a live entry.
    #[error("{kind} {id} is already occupied")]
    Occupied { kind: &'static str, id: u32 },

    /// The identifier lies past the end of the table.
    #[error("{kind} {id} is past the end of the table (next id {next})")]
    OutOfRange { kind: &'static str, id: u32, next: u32 },

    /// The null identifier cannot name an entry.
    #[error("null {kind} identifier")]
    NullId { kind: &'static str },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
