use std::io::{self, Read};

use ldb_types::{SchemaCheckpoint, SchemaVersion, TypeError};

use crate::error::{StreamError, StreamResult};
use crate::streamable::Streamable;

/// Upper bound on speculative preallocation for length-prefixed values.
const MAX_PREALLOC: usize = 4096;

/// Ordered binary reader, the mirror of [`OStream`](crate::OStream).
///
/// The schema starts as the current release's and is replaced by the
/// version found in a frame header, so gated fields are read exactly when
/// the writer emitted them.
pub struct IStream<'a> {
    inner: &'a mut dyn Read,
    schema: SchemaVersion,
    consumed: u64,
}

impl<'a> IStream<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self {
            inner,
            schema: SchemaVersion::current(),
            consumed: 0,
        }
    }

    /// Schema of the stream being read.
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Set the schema once it is known from a header.
    pub fn set_schema(&mut self, schema: SchemaVersion) {
        self.schema = schema;
    }

    /// Returns `true` if the stream's schema includes the checkpoint.
    pub fn has(&self, checkpoint: SchemaCheckpoint) -> bool {
        self.schema.has(checkpoint)
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Read any streamable value.
    pub fn get<T: Streamable>(&mut self) -> StreamResult<T> {
        T::read_from(self)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.consumed += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(StreamError::UnexpectedEof {
                offset: self.consumed,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn read_array<const N: usize>(&mut self) -> StreamResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> StreamResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> StreamResult<bool> {
        let offset = self.consumed;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::Corrupt {
                offset,
                reason: format!("invalid bool byte {other}"),
            }),
        }
    }

    pub fn read_u32(&mut self) -> StreamResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> StreamResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> StreamResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> StreamResult<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read a length prefix written by `OStream::write_len`.
    pub fn read_len(&mut self) -> StreamResult<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Capacity to reserve for a sequence of `len` elements.
    pub fn prealloc(len: usize) -> usize {
        len.min(MAX_PREALLOC)
    }

    pub fn read_bytes(&mut self, len: usize) -> StreamResult<Vec<u8>> {
        let offset = self.consumed;
        let mut buf = Vec::with_capacity(Self::prealloc(len));
        let got = Read::take(&mut *self.inner, len as u64).read_to_end(&mut buf)?;
        self.consumed += got as u64;
        if got != len {
            return Err(StreamError::UnexpectedEof {
                offset: offset + got as u64,
            });
        }
        Ok(buf)
    }

    pub fn read_string(&mut self) -> StreamResult<String> {
        let len = self.read_len()?;
        let offset = self.consumed;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| StreamError::Corrupt {
            offset,
            reason: format!("invalid UTF-8: {e}"),
        })
    }

    /// Decode a one-byte enumeration tag.
    pub fn read_tag<T>(&mut self, decode: impl FnOnce(u8) -> Result<T, TypeError>) -> StreamResult<T> {
        let offset = self.consumed;
        let tag = self.read_u8()?;
        decode(tag).map_err(|source| StreamError::InvalidTag { offset, source })
    }
}
