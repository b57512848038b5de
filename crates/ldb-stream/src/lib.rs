//! Binary stream codec for the layout database.
//!
//! Values are written in a fixed field order with no self-description: the
//! reader must ask for exactly the fields the writer emitted, in the same
//! order. Both directions carry the [`SchemaVersion`] of the stream so that
//! entity codecs can gate fields introduced by later schema minors.
//!
//! # Encoding
//!
//! - Integers and floats: little-endian, fixed width
//! - `bool`: one byte (`0` or `1`)
//! - Strings: `u32` byte length followed by UTF-8 bytes
//! - Sequences: `u32` element count followed by the elements
//! - Identifiers: the raw `u32` table index (`0` is null)
//! - Enumerations: one-byte wire tag
//!
//! [`SchemaVersion`]: ldb_types::SchemaVersion

pub mod error;
pub mod frame;
pub mod istream;
pub mod ostream;
pub mod streamable;

pub use error::{StreamError, StreamResult};
pub use frame::{read_frame_header, write_frame_header, Magic};
pub use istream::IStream;
pub use ostream::OStream;
pub use streamable::Streamable;
