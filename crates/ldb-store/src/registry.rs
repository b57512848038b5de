use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::{Id, ObjectType};
use tracing::trace;

use crate::entity::TopLevelEntity;
use crate::mem::{MemInfo, MemSize};
use crate::table::ObjectTable;

/// Type-erased view of a top-level table.
///
/// The database root hands these out by [`ObjectType`] so that generic
/// code (cross-reference checks, the stream frame, the memory report) can
/// walk every table without naming each one.
pub trait DynTable {
    /// Tag of the entity kind this table holds.
    fn object_type(&self) -> ObjectType;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a live entry has this raw identifier.
    fn contains_raw(&self, id: u32) -> bool;

    /// Raw identifiers of live entries in allocation order.
    fn raw_ids(&self) -> Vec<u32>;

    fn collect_mem_info(&self, info: &mut MemInfo);

    fn write_table(&self, out: &mut OStream<'_>) -> StreamResult<()>;

    /// Replace this table's contents with the table read from `inp`.
    fn read_table(&mut self, inp: &mut IStream<'_>) -> StreamResult<()>;
}

impl<T> DynTable for ObjectTable<T>
where
    T: TopLevelEntity + Streamable + MemSize,
{
    fn object_type(&self) -> ObjectType {
        T::OBJECT_TYPE
    }

    fn len(&self) -> usize {
        ObjectTable::len(self)
    }

    fn contains_raw(&self, id: u32) -> bool {
        self.contains(Id::from_raw(id))
    }

    fn raw_ids(&self) -> Vec<u32> {
        self.iter().map(|(id, _)| id.raw()).collect()
    }

    fn collect_mem_info(&self, info: &mut MemInfo) {
        ObjectTable::collect_mem_info(self, info);
    }

    fn write_table(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        self.write_to(out)
    }

    fn read_table(&mut self, inp: &mut IStream<'_>) -> StreamResult<()> {
        *self = ObjectTable::read_from(inp)?;
        trace!(kind = %T::OBJECT_TYPE, live = self.len(), "table read");
        Ok(())
    }
}
