use std::fmt;

use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::Id;

use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::mem::{MemInfo, MemSize};

/// Homogeneous slotted storage for one entity kind.
///
/// Slot `i` holds the entry with identifier `i + 1`. Destroying an entry
/// leaves a hole; holes are never refilled by `create`, so an identifier
/// keeps naming the same entity (or nothing) for the table's lifetime.
/// Only [`insert_at`](Self::insert_at) may fill a hole, which is how a
/// journal undo restores a destroyed entity under its original identifier.
#[derive(Clone)]
pub struct ObjectTable<T> {
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> ObjectTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a new entry and return its identifier.
    pub fn create(&mut self, value: T) -> Id<T> {
        self.create_with(|_| value)
    }

    /// Allocate a new entry built from its own identifier.
    pub fn create_with(&mut self, build: impl FnOnce(Id<T>) -> T) -> Id<T> {
        let id = self.next_id();
        self.slots.push(Some(build(id)));
        self.live += 1;
        id
    }

    /// Identifier the next `create` will return.
    pub fn next_id(&self) -> Id<T> {
        Id::from_raw(self.slots.len() as u32 + 1)
    }

    /// Remove an entry. Returns it if it was live.
    pub fn destroy(&mut self, id: Id<T>) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.take()?;
        self.live -= 1;
        Some(value)
    }

    /// Resolve an identifier in O(1).
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        let index = (id.raw() as usize).checked_sub(1)?;
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.slot_mut(id)?.as_mut()
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entries in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (Id::from_raw(i as u32 + 1), v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (Id::from_raw(i as u32 + 1), v)))
    }

    /// Identifiers of live entries in allocation order.
    pub fn ids(&self) -> Vec<Id<T>> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Live entries in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// First live entry matching the predicate.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Id<T>> {
        self.iter().find(|(_, v)| pred(v)).map(|(id, _)| id)
    }

    fn slot_mut(&mut self, id: Id<T>) -> Option<&mut Option<T>> {
        let index = (id.raw() as usize).checked_sub(1)?;
        self.slots.get_mut(index)
    }
}

impl<T: Entity> ObjectTable<T> {
    /// Resolve an identifier or report it missing.
    pub fn try_get(&self, id: Id<T>) -> StoreResult<&T> {
        self.get(id).ok_or(StoreError::NotFound {
            kind: T::KIND,
            id: id.raw(),
        })
    }

    pub fn try_get_mut(&mut self, id: Id<T>) -> StoreResult<&mut T> {
        self.get_mut(id).ok_or(StoreError::NotFound {
            kind: T::KIND,
            id: id.raw(),
        })
    }

    /// Place an entry under a specific identifier.
    ///
    /// The identifier must name a hole or be [`next_id`](Self::next_id).
    /// Fails if it is null, live, or past the end of the table.
    pub fn insert_at(&mut self, id: Id<T>, value: T) -> StoreResult<()> {
        if id.is_null() {
            return Err(StoreError::NullId { kind: T::KIND });
        }
        if id > self.next_id() {
            return Err(StoreError::OutOfRange {
                kind: T::KIND,
                id: id.raw(),
                next: self.next_id().raw(),
            });
        }
        let index = id.raw() as usize - 1;
        if index == self.slots.len() {
            self.slots.push(None);
        }
        let slot = &mut self.slots[index];
        if slot.is_some() {
            return Err(StoreError::Occupied {
                kind: T::KIND,
                id: id.raw(),
            });
        }
        *slot = Some(value);
        self.live += 1;
        Ok(())
    }
}

impl<T: MemSize> ObjectTable<T> {
    /// Accumulate every live entry into `info`.
    pub fn collect_mem_info(&self, info: &mut MemInfo) {
        for value in self.values() {
            value.collect_mem_info(info);
        }
    }
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two tables are equal when they hold equal entries under the same
/// identifiers. Trailing holes are not compared.
impl<T: PartialEq> PartialEq for ObjectTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.live == other.live && self.iter().eq(other.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// On-wire layout: slot count, then one presence byte per slot, each
/// live slot followed by its entry. Holes cost one byte, so a decoder never
/// holds more slots than the bytes it has consumed.
impl<T: Streamable> Streamable for ObjectTable<T> {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_len(self.slots.len())?;
        for slot in &self.slots {
            out.write_bool(slot.is_some())?;
            if let Some(value) = slot {
                out.put(value)?;
            }
        }
        Ok(())
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let slot_count = inp.read_len()?;
        let mut table = Self::new();
        table.slots.reserve(IStream::prealloc(slot_count));
        for _ in 0..slot_count {
            if inp.read_bool()? {
                table.slots.push(Some(T::read_from(inp)?));
                table.live += 1;
            } else {
                table.slots.push(None);
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldb_stream::StreamError;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Cell(String);

    impl Entity for Cell {
        const KIND: &'static str = "cell";
    }

    impl Streamable for Cell {
        fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
            out.write_str(&self.0)
        }

        fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
            Ok(Cell(inp.read_string()?))
        }
    }

    impl MemSize for Cell {}

    fn cell(s: &str) -> Cell {
        Cell(s.to_string())
    }

    #[test]
    fn ids_start_at_one_in_allocation_order() {
        let mut t = ObjectTable::new();
        let a = t.create(cell("a"));
        let b = t.create(cell("b"));
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(t.get(a), Some(&cell("a")));
        assert_eq!(t.get(Id::null()), None);
    }

    #[test]
    fn destroyed_ids_are_not_reused() {
        let mut t = ObjectTable::new();
        let a = t.create(cell("a"));
        assert_eq!(t.destroy(a), Some(cell("a")));
        assert_eq!(t.destroy(a), None);
        let b = t.create(cell("b"));
        assert_ne!(a, b);
        assert!(!t.contains(a));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn iteration_skips_holes() {
        let mut t = ObjectTable::new();
        let a = t.create(cell("a"));
        let b = t.create(cell("b"));
        let c = t.create(cell("c"));
        t.destroy(b);
        let seen: Vec<_> = t.iter().map(|(id, v)| (id, v.0.clone())).collect();
        assert_eq!(seen, vec![(a, "a".to_string()), (c, "c".to_string())]);
        assert_eq!(t.ids(), vec![a, c]);
    }

    #[test]
    fn create_with_sees_own_id() {
        let mut t = ObjectTable::new();
        let id = t.create_with(|id| Cell(format!("cell{}", id.raw())));
        assert_eq!(t.get(id).unwrap().0, "cell1");
    }

    #[test]
    fn insert_at_fills_hole_and_rejects_live() {
        let mut t = ObjectTable::new();
        let a = t.create(cell("a"));
        t.destroy(a);
        t.insert_at(a, cell("again")).unwrap();
        assert_eq!(t.get(a).unwrap().0, "again");
        assert_eq!(
            t.insert_at(a, cell("x")).unwrap_err(),
            StoreError::Occupied { kind: "cell", id: 1 }
        );
        assert_eq!(
            t.insert_at(Id::null(), cell("x")).unwrap_err(),
            StoreError::NullId { kind: "cell" }
        );
    }

    #[test]
    fn insert_at_appends_only_at_next_id() {
        let mut t = ObjectTable::new();
        t.insert_at(Id::from_raw(1), cell("a")).unwrap();
        assert_eq!(t.next_id().raw(), 2);
        assert_eq!(
            t.insert_at(Id::from_raw(3), cell("c")).unwrap_err(),
            StoreError::OutOfRange { kind: "cell", id: 3, next: 2 }
        );
        assert_eq!(
            t.insert_at(Id::from_raw(u32::MAX), cell("z")).unwrap_err(),
            StoreError::OutOfRange { kind: "cell", id: u32::MAX, next: 2 }
        );
        assert_eq!(t.len(), 1);
        assert_eq!(t.next_id().raw(), 2);
    }

    #[test]
    fn equality_ignores_trailing_holes() {
        let mut a = ObjectTable::new();
        a.create(cell("a"));
        let mut b = ObjectTable::new();
        b.create(cell("a"));
        let extra = b.create(cell("b"));
        b.destroy(extra);
        assert_eq!(a, b);

        let mut c = ObjectTable::new();
        let hole = c.create(cell("x"));
        c.create(cell("a"));
        c.destroy(hole);
        assert_ne!(a, c);
    }

    #[test]
    fn try_get_reports_kind() {
        let t: ObjectTable<Cell> = ObjectTable::new();
        let err = t.try_get(Id::from_raw(9)).unwrap_err();
        assert_eq!(err.to_string(), "cell 9 not found");
    }

    #[test]
    fn stream_preserves_ids_and_holes() {
        let mut t = ObjectTable::new();
        t.create(cell("a"));
        let b = t.create(cell("b"));
        t.create(cell("c"));
        let d = t.create(cell("d"));
        t.destroy(b);
        t.destroy(d);

        let mut buf = Vec::new();
        OStream::new(&mut buf).put(&t).unwrap();
        let mut src = buf.as_slice();
        let back: ObjectTable<Cell> = IStream::new(&mut src).get().unwrap();

        assert_eq!(back, t);
        assert_eq!(back.next_id(), t.next_id());
        assert_eq!(back.get(Id::from_raw(3)).unwrap().0, "c");
    }

    #[test]
    fn huge_slot_count_fails_at_end_of_input() {
        let mut buf = Vec::new();
        {
            let mut out = OStream::new(&mut buf);
            out.write_u32(u32::MAX).unwrap();
            out.write_bool(false).unwrap();
            out.write_bool(true).unwrap();
            out.write_str("a").unwrap();
        }
        let mut src = buf.as_slice();
        let err = IStream::new(&mut src).get::<ObjectTable<Cell>>().unwrap_err();
        assert!(matches!(err, StreamError::UnexpectedEof { .. }));
    }

    #[test]
    fn stream_rejects_bad_presence_byte() {
        let mut buf = Vec::new();
        {
            let mut out = OStream::new(&mut buf);
            out.write_u32(1).unwrap();
            out.write_u8(7).unwrap();
        }
        let mut src = buf.as_slice();
        let err = IStream::new(&mut src).get::<ObjectTable<Cell>>().unwrap_err();
        assert!(matches!(err, StreamError::Corrupt { .. }));
    }

    #[test]
    fn mem_info_counts_live_entries() {
        let mut t = ObjectTable::new();
        t.create(cell("a"));
        let b = t.create(cell("b"));
        t.destroy(b);
        let mut info = MemInfo::new();
        t.collect_mem_info(&mut info);
        assert_eq!(info.cnt, 1);
        assert_eq!(info.size, std::mem::size_of::<Cell>() as u64);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(u16),
        Destroy(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u16>().prop_map(Op::Create),
            any::<usize>().prop_map(Op::Destroy),
        ]
    }

    proptest! {
        #[test]
        fn live_ids_keep_resolving_to_their_entity(ops in proptest::collection::vec(op(), 0..64)) {
            let mut t = ObjectTable::new();
            let mut issued: Vec<(Id<Cell>, String, bool)> = Vec::new();
            for op in ops {
                match op {
                    Op::Create(n) => {
                        let name = format!("c{n}");
                        let id = t.create(Cell(name.clone()));
                        prop_assert!(issued.iter().all(|(old, _, _)| *old != id));
                        issued.push((id, name, true));
                    }
                    Op::Destroy(i) if !issued.is_empty() => {
                        let i = i % issued.len();
                        let entry = &mut issued[i];
                        let removed = t.destroy(entry.0);
                        prop_assert_eq!(removed.is_some(), entry.2);
                        entry.2 = false;
                    }
                    Op::Destroy(_) => {}
                }
                for (id, name, alive) in &issued {
                    match t.get(*id) {
                        Some(c) => {
                            prop_assert!(*alive);
                            prop_assert_eq!(&c.0, name);
                        }
                        None => prop_assert!(!*alive),
                    }
                }
            }
            prop_assert_eq!(t.len(), issued.iter().filter(|e| e.2).count());
        }
    }
}
