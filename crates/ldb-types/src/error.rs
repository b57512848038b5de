use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown {kind} tag: {tag}")]
    UnknownTag { kind: &'static str, tag: u8 },

    #[error("invalid {kind} name: {name}")]
    UnknownName { kind: &'static str, name: String },
}
