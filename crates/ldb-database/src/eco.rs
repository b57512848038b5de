//! ECO entry points on the database.
//!
//! The in-memory journal operations live on [`Block`]; the versions here
//! resolve the block by id and add file persistence and logging. Failures
//! are logged under the ECO subsystem and returned.

use std::path::Path;

use ldb_journal::{read_eco_file, write_eco_file};
use ldb_types::{Id, Subsystem};
use tracing::debug;

use crate::block::Block;
use crate::database::Database;
use crate::edit::BlockEdit;
use crate::error::DbResult;

impl Database {
    pub fn begin_eco(&mut self, block: Id<Block>) -> DbResult<()> {
        self.try_block_mut(block)?.begin_eco();
        Ok(())
    }

    pub fn end_eco(&mut self, block: Id<Block>) -> DbResult<()> {
        self.try_block_mut(block)?.end_eco();
        Ok(())
    }

    pub fn eco_empty(&self, block: Id<Block>) -> DbResult<bool> {
        Ok(self.try_block(block)?.eco_empty())
    }

    pub fn check_eco(&self, block: Id<Block>) -> DbResult<usize> {
        Ok(self.try_block(block)?.check_eco())
    }

    /// Save the block's pending journal. Without one nothing is written.
    pub fn write_eco(&self, block: Id<Block>, path: &Path) -> DbResult<()> {
        let Some(journal) = self.try_block(block)?.pending_eco() else {
            debug!(%block, "no pending ECO to write");
            return Ok(());
        };
        if let Err(e) = write_eco_file(path, journal, &self.config().eco_file()) {
            self.logger().error(
                Subsystem::Eco,
                3,
                format_args!("Cannot write ECO file {}: {}", path.display(), e),
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Load a journal from `path` as the block's pending journal. On
    /// failure the previous pending journal is kept.
    pub fn read_eco(&mut self, block: Id<Block>, path: &Path) -> DbResult<()> {
        self.try_block(block)?;
        let journal = match read_eco_file::<BlockEdit>(path, &self.config().eco_file()) {
            Ok(journal) => journal,
            Err(e) => {
                self.logger().error(
                    Subsystem::Eco,
                    2,
                    format_args!("Cannot read ECO file {}: {}", path.display(), e),
                );
                return Err(e.into());
            }
        };
        debug!(%block, edits = journal.len(), "pending ECO loaded");
        self.try_block_mut(block)?.set_pending_eco(journal);
        Ok(())
    }

    /// Replay the pending journal forward. A no-op without one.
    pub fn commit_eco(&mut self, block: Id<Block>) -> DbResult<()> {
        let result = self.try_block_mut(block)?.commit_eco();
        if let Err(e) = result {
            self.logger().error(
                Subsystem::Eco,
                4,
                format_args!("ECO commit on block {block} failed: {e}"),
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Revert the pending journal. A no-op without one.
    pub fn undo_eco(&mut self, block: Id<Block>) -> DbResult<()> {
        let result = self.try_block_mut(block)?.undo_eco();
        if let Err(e) = result {
            self.logger().error(
                Subsystem::Eco,
                4,
                format_args!("ECO undo on block {block} failed: {e}"),
            );
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ldb_journal::Journal;
    use ldb_types::Point;

    use super::*;
    use crate::error::DbError;
    use crate::fixtures::{reload, sample};

    #[test]
    fn journal_moves_between_databases_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("move.eco");
        let mut s = sample();
        let snapshot = reload(&s.db);

        s.db.begin_eco(s.block).unwrap();
        s.db.block_mut(s.block)
            .unwrap()
            .set_inst_location(s.inst, Point::new(10, 20))
            .unwrap();
        assert_eq!(s.db.check_eco(s.block).unwrap(), 1);
        assert!(!s.db.eco_empty(s.block).unwrap());
        s.db.end_eco(s.block).unwrap();
        s.db.write_eco(s.block, &path).unwrap();

        let mut other = snapshot;
        let top = other.top_block().unwrap();
        other.read_eco(top, &path).unwrap();
        other.commit_eco(top).unwrap();

        let block = other.block(top).unwrap();
        let i1 = block.find_inst("i1").unwrap();
        assert_eq!(block.insts().get(i1).unwrap().location, Point::new(10, 20));
        assert_eq!(other, s.db);
    }

    #[test]
    fn undo_through_the_database() {
        let mut s = sample();
        let before = reload(&s.db);
        s.db.begin_eco(s.block).unwrap();
        s.db.block_mut(s.block)
            .unwrap()
            .set_inst_location(s.inst, Point::new(5, 5))
            .unwrap();
        s.db.end_eco(s.block).unwrap();
        s.db.undo_eco(s.block).unwrap();
        assert_eq!(s.db, before);
    }

    #[test]
    fn nothing_is_written_without_a_pending_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.eco");
        let s = sample();
        s.db.write_eco(s.block, &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn unreadable_file_keeps_the_pending_journal() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = sample();
        s.db.begin_eco(s.block).unwrap();
        s.db.block_mut(s.block)
            .unwrap()
            .set_inst_location(s.inst, Point::new(1, 1))
            .unwrap();
        s.db.end_eco(s.block).unwrap();

        let err = s
            .db
            .read_eco(s.block, &dir.path().join("missing.eco"))
            .unwrap_err();
        assert!(matches!(err, DbError::Journal(_)));
        assert!(s.logger.has_code(Subsystem::Eco, 2));
        assert_eq!(s.db.block(s.block).unwrap().pending_eco_len(), Some(1));

        let garbage = dir.path().join("garbage.eco");
        fs::write(&garbage, b"not a journal at all").unwrap();
        assert!(s.db.read_eco(s.block, &garbage).unwrap_err().is_format_error());
        assert_eq!(s.db.block(s.block).unwrap().pending_eco_len(), Some(1));
    }

    #[test]
    fn unwritable_path_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = sample();
        s.db.begin_eco(s.block).unwrap();
        s.db.block_mut(s.block)
            .unwrap()
            .set_inst_location(s.inst, Point::new(1, 1))
            .unwrap();
        s.db.end_eco(s.block).unwrap();

        let path = dir.path().join("no_such_dir").join("x.eco");
        assert!(s.db.write_eco(s.block, &path).is_err());
        assert!(s.logger.has_code(Subsystem::Eco, 3));
    }

    #[test]
    fn replay_failure_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("destroy.eco");
        let mut s = sample();
        s.db.begin_eco(s.block).unwrap();
        s.db.block_mut(s.block).unwrap().destroy_inst(s.inst).unwrap();
        s.db.end_eco(s.block).unwrap();
        s.db.write_eco(s.block, &path).unwrap();

        // The instance is already gone, so replaying the destroy fails.
        s.db.read_eco(s.block, &path).unwrap();
        let before = reload(&s.db);
        assert!(matches!(s.db.commit_eco(s.block), Err(DbError::Journal(_))));
        assert!(s.logger.has_code(Subsystem::Eco, 4));
        assert_eq!(s.db, before);
        assert_eq!(s.db.block(s.block).unwrap().pending_eco_len(), Some(1));
    }

    #[test]
    fn far_out_creation_in_a_checksummed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("far.eco");
        let mut s = sample();
        let inst = s.db.block(s.block).unwrap().insts().get(s.inst).unwrap().clone();
        let mut journal = Journal::new();
        journal.record(BlockEdit::CreateInst {
            id: Id::from_raw(20_000_000),
            inst,
        });
        s.db.block_mut(s.block).unwrap().set_pending_eco(journal);
        s.db.write_eco(s.block, &path).unwrap();

        let mut other = reload(&s.db);
        let top = other.top_block().unwrap();
        other.read_eco(top, &path).unwrap();
        assert!(other.commit_eco(top).is_err());
        assert_eq!(other.block(top).unwrap().insts().len(), 1);
        assert_eq!(other.block(top).unwrap().pending_eco_len(), Some(1));
    }

    #[test]
    fn unknown_block_is_an_error() {
        let mut s = sample();
        let ghost = Id::from_raw(9);
        assert!(matches!(s.db.begin_eco(ghost), Err(DbError::Store(_))));
        assert!(s.db.eco_empty(ghost).is_err());
    }
}
