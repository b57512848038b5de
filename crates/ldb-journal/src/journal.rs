use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use tracing::{debug, warn};

use crate::error::{JournalError, JournalResult};
use crate::target::{Direction, JournalTarget};

/// Ordered list of edit records scoped to one block.
#[derive(Clone, Debug, PartialEq)]
pub struct Journal<E> {
    edits: Vec<E>,
}

impl<E> Journal<E> {
    pub fn new() -> Self {
        Self { edits: Vec::new() }
    }

    /// Append one edit record.
    pub fn record(&mut self, edit: E) {
        self.edits.push(edit);
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[E] {
        &self.edits
    }

    /// Apply every edit in recording order.
    ///
    /// If edit `k` fails, edits `0..k` are reverted before the error is
    /// returned, so the target is left as it was found.
    pub fn redo<T: JournalTarget<E> + ?Sized>(&self, target: &mut T) -> JournalResult<()> {
        for (index, edit) in self.edits.iter().enumerate() {
            if let Err(reason) = target.apply_edit(edit, Direction::Forward) {
                rollback(target, self.edits[..index].iter().rev(), Direction::Backward);
                return Err(JournalError::Replay { index, reason });
            }
        }
        debug!(edits = self.edits.len(), "journal redo complete");
        Ok(())
    }

    /// Revert every edit in reverse recording order.
    ///
    /// If edit `k` fails, the edits after it are re-applied before the
    /// error is returned.
    pub fn undo<T: JournalTarget<E> + ?Sized>(&self, target: &mut T) -> JournalResult<()> {
        for (index, edit) in self.edits.iter().enumerate().rev() {
            if let Err(reason) = target.apply_edit(edit, Direction::Backward) {
                rollback(target, self.edits[index + 1..].iter(), Direction::Forward);
                return Err(JournalError::Replay { index, reason });
            }
        }
        debug!(edits = self.edits.len(), "journal undo complete");
        Ok(())
    }
}

/// Re-apply already replayed edits in the opposite direction.
fn rollback<'a, E: 'a, T: JournalTarget<E> + ?Sized>(
    target: &mut T,
    edits: impl Iterator<Item = &'a E>,
    direction: Direction,
) {
    for edit in edits {
        if let Err(reason) = target.apply_edit(edit, direction) {
            warn!(%reason, "journal rollback step failed");
        }
    }
}

impl<E> Default for Journal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Streamable> Streamable for Journal<E> {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.edits)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self { edits: inp.get()? })
    }
}
