use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ldb_stream::{read_frame_header, write_frame_header, IStream, Magic, OStream, Streamable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{JournalError, JournalResult};
use crate::journal::Journal;

/// Magic words at the start of every ECO file: "ECOJ" "OURN".
pub const ECO_MAGIC: Magic = Magic::new(0x4543_4F4A, 0x4F55_524E, "ECO journal");

/// Flush/sync strategy for ECO files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after the file is written.
    EveryWrite,
    /// Rely on OS page-cache buffering.
    #[default]
    OsDefault,
}

/// Configuration for ECO file persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcoFileConfig {
    /// Sync strategy applied after writing.
    pub sync_mode: SyncMode,
    /// Largest payload accepted on read (default: 64 MiB).
    pub max_bytes: u64,
}

impl Default for EcoFileConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Write `journal` to `path`, replacing any existing file.
///
/// On-disk format:
/// ```text
/// [frame header: magic1, magic2, schema major, schema minor]
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (encoded journal)]
/// ```
pub fn write_eco_file<E: Streamable>(
    path: &Path,
    journal: &Journal<E>,
    config: &EcoFileConfig,
) -> JournalResult<()> {
    let mut payload = Vec::new();
    OStream::new(&mut payload).put(journal)?;
    let crc = crc32fast::hash(&payload);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    {
        let mut out = OStream::new(&mut writer);
        write_frame_header(&mut out, ECO_MAGIC)?;
        out.write_len(payload.len())?;
        out.write_u32(crc)?;
        out.write_bytes(&payload)?;
    }
    writer.flush()?;
    if config.sync_mode == SyncMode::EveryWrite {
        writer.get_ref().sync_all()?;
    }

    debug!(path = %path.display(), edits = journal.len(), len = payload.len(), "ECO file written");
    Ok(())
}

/// Read a journal from `path`.
///
/// The header gates run first; then the payload length is checked against
/// `config.max_bytes`, the CRC is verified, and the payload must decode
/// without leftover bytes.
pub fn read_eco_file<E: Streamable>(path: &Path, config: &EcoFileConfig) -> JournalResult<Journal<E>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut inp = IStream::new(&mut reader);
    let schema = read_frame_header(&mut inp, ECO_MAGIC)?;

    let length = inp.read_u32()? as u64;
    if length > config.max_bytes {
        return Err(JournalError::TooLarge {
            length,
            max: config.max_bytes,
        });
    }
    let expected = inp.read_u32()?;
    let payload = inp.read_bytes(length as usize)?;
    let actual = crc32fast::hash(&payload);
    if actual != expected {
        return Err(JournalError::ChecksumMismatch { expected, actual });
    }

    let mut src = payload.as_slice();
    let mut body = IStream::new(&mut src);
    body.set_schema(schema);
    let journal: Journal<E> = body.get()?;
    let extra = length - body.position();
    if extra != 0 {
        return Err(JournalError::TrailingBytes { extra });
    }

    debug!(path = %path.display(), edits = journal.len(), %schema, "ECO file read");
    Ok(journal)
}
