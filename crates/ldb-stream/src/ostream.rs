use std::io::Write;

use ldb_types::{SchemaCheckpoint, SchemaVersion};

use crate::error::StreamResult;
use crate::streamable::Streamable;

/// Ordered binary writer.
///
/// Wraps any [`Write`] and tracks the number of bytes emitted. The schema
/// carried by the stream is the one entity codecs must honour when deciding
/// which gated fields to emit; a freshly created stream always carries the
/// current schema.
pub struct OStream<'a> {
    inner: &'a mut dyn Write,
    schema: SchemaVersion,
    written: u64,
}

impl<'a> OStream<'a> {
    /// Create a writer emitting the current schema.
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self::with_schema(inner, SchemaVersion::current())
    }

    /// Create a writer emitting an explicit schema.
    pub fn with_schema(inner: &'a mut dyn Write, schema: SchemaVersion) -> Self {
        Self {
            inner,
            schema,
            written: 0,
        }
    }

    /// Schema the stream is being written at.
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Returns `true` if the stream's schema includes the checkpoint.
    pub fn has(&self, checkpoint: SchemaCheckpoint) -> bool {
        self.schema.has(checkpoint)
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Write any streamable value.
    pub fn put<T: Streamable>(&mut self, value: &T) -> StreamResult<()> {
        value.write_to(self)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> StreamResult<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> StreamResult<()> {
        self.write_bytes(&[v])
    }

    pub fn write_bool(&mut self, v: bool) -> StreamResult<()> {
        self.write_u8(u8::from(v))
    }

    pub fn write_u32(&mut self, v: u32) -> StreamResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> StreamResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> StreamResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> StreamResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a length prefix for a sequence or string.
    pub fn write_len(&mut self, len: usize) -> StreamResult<()> {
        let len = u32::try_from(len).map_err(|_| crate::StreamError::Corrupt {
            offset: self.written,
            reason: format!("length {len} exceeds u32"),
        })?;
        self.write_u32(len)
    }

    pub fn write_str(&mut self, s: &str) -> StreamResult<()> {
        self.write_len(s.len())?;
        self.write_bytes(s.as_bytes())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> StreamResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}
