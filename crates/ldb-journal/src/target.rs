/// Replay direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Re-apply the edit's new value.
    Forward,
    /// Restore the edit's old value.
    Backward,
}

/// Something a journal of `E` edits can be replayed against.
///
/// Implementations apply the edit directly; a replay is never itself
/// recorded into a journal.
pub trait JournalTarget<E> {
    fn apply_edit(&mut self, edit: &E, direction: Direction) -> Result<(), String>;
}
