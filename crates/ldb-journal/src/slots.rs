use tracing::debug;

use crate::journal::Journal;

/// The active and pending journal slots of one block.
///
/// - `begin` discards any active journal and starts a new one.
/// - `end` moves the active journal to pending, discarding the previous
///   pending journal. With no active journal it does nothing.
/// - `take_pending` hands the pending journal to commit or undo and leaves
///   the slot empty.
#[derive(Clone, Debug)]
pub struct EcoSlots<E> {
    active: Option<Journal<E>>,
    pending: Option<Journal<E>>,
}

impl<E> EcoSlots<E> {
    pub fn new() -> Self {
        Self {
            active: None,
            pending: None,
        }
    }

    /// Start recording into a fresh active journal.
    pub fn begin(&mut self) {
        if let Some(old) = self.active.replace(Journal::new()) {
            debug!(discarded = old.len(), "active journal replaced");
        }
    }

    /// Stop recording and move the active journal into the pending slot.
    pub fn end(&mut self) {
        let Some(finished) = self.active.take() else {
            return;
        };
        if let Some(old) = self.pending.replace(finished) {
            debug!(discarded = old.len(), "pending journal replaced");
        }
    }

    /// Returns `true` while an active journal is recording.
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Record an edit if a journal is active; otherwise drop it.
    pub fn record(&mut self, edit: E) {
        if let Some(active) = self.active.as_mut() {
            active.record(edit);
        }
    }

    /// Returns `true` if there is no active journal or it recorded nothing.
    pub fn active_is_empty(&self) -> bool {
        self.active.as_ref().map_or(true, Journal::is_empty)
    }

    /// Edits recorded by the active journal, or zero.
    pub fn active_len(&self) -> usize {
        self.active.as_ref().map_or(0, Journal::len)
    }

    pub fn pending(&self) -> Option<&Journal<E>> {
        self.pending.as_ref()
    }

    /// Replace the pending journal unconditionally.
    pub fn set_pending(&mut self, journal: Journal<E>) {
        self.pending = Some(journal);
    }

    /// Remove and return the pending journal.
    pub fn take_pending(&mut self) -> Option<Journal<E>> {
        self.pending.take()
    }

    /// Drop both journals.
    pub fn clear(&mut self) {
        self.active = None;
        self.pending = None;
    }
}

impl<E> Default for EcoSlots<E> {
    fn default() -> Self {
        Self::new()
    }
}
