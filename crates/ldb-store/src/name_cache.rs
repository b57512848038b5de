use std::collections::HashMap;
use std::mem::size_of;

use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::Id;

use crate::entity::Entity;
use crate::mem::{string_heap, MemInfo, MemSize};
use crate::table::ObjectTable;

/// One interned string and the number of holders referencing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedName {
    pub name: String,
    pub refs: u32,
}

impl Entity for CachedName {
    const KIND: &'static str = "name";
}

impl MemSize for CachedName {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
    }
}

impl Streamable for CachedName {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.write_u32(self.refs)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let name = inp.read_string()?;
        let refs = inp.read_u32()?;
        Ok(Self { name, refs })
    }
}

/// Shared string-interning table.
///
/// Identical names used by many entities are stored once and referenced by
/// identifier. Each `add` takes a reference and each `release` drops one;
/// the entry is destroyed when the count reaches zero. The reverse lookup
/// map is derived state and is rebuilt after a read.
#[derive(Debug, Default)]
pub struct NameCache {
    names: ObjectTable<CachedName>,
    index: HashMap<String, Id<CachedName>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, taking one reference.
    pub fn add(&mut self, name: &str) -> Id<CachedName> {
        if let Some(&id) = self.index.get(name) {
            if let Some(entry) = self.names.get_mut(id) {
                entry.refs += 1;
                return id;
            }
        }
        let id = self.names.create(CachedName {
            name: name.to_string(),
            refs: 1,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    /// Drop one reference; the entry is removed when none remain.
    pub fn release(&mut self, id: Id<CachedName>) {
        let Some(entry) = self.names.get_mut(id) else {
            return;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            if let Some(removed) = self.names.destroy(id) {
                self.index.remove(&removed.name);
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<Id<CachedName>> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: Id<CachedName>) -> Option<&str> {
        self.names.get(id).map(|e| e.name.as_str())
    }

    pub fn refs(&self, id: Id<CachedName>) -> u32 {
        self.names.get(id).map_or(0, |e| e.refs)
    }

    /// Number of distinct interned names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn collect_mem_info(&self, info: &mut MemInfo) {
        self.names.collect_mem_info(info);
    }
}

impl PartialEq for NameCache {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Streamable for NameCache {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.names)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let names: ObjectTable<CachedName> = inp.get()?;
        let index = names.iter().map(|(id, e)| (e.name.clone(), id)).collect();
        Ok(Self { names, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_share_one_entry() {
        let mut cache = NameCache::new();
        let a = cache.add("hybridBondX");
        let b = cache.add("hybridBondX");
        let c = cache.add("hybridBondY");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.refs(a), 2);
        assert_eq!(cache.name(c), Some("hybridBondY"));
    }

    #[test]
    fn release_removes_at_zero() {
        let mut cache = NameCache::new();
        let a = cache.add("x");
        cache.add("x");
        cache.release(a);
        assert_eq!(cache.find("x"), Some(a));
        cache.release(a);
        assert_eq!(cache.find("x"), None);
        assert!(cache.is_empty());

        let again = cache.add("x");
        assert_ne!(again, a);
    }

    #[test]
    fn release_of_unknown_id_is_ignored() {
        let mut cache = NameCache::new();
        cache.release(Id::from_raw(5));
        assert!(cache.is_empty());
    }

    #[test]
    fn read_rebuilds_lookup() {
        let mut cache = NameCache::new();
        let a = cache.add("alpha");
        let gone = cache.add("beta");
        cache.release(gone);
        cache.add("gamma");

        let mut buf = Vec::new();
        OStream::new(&mut buf).put(&cache).unwrap();
        let mut src = buf.as_slice();
        let back: NameCache = IStream::new(&mut src).get().unwrap();

        assert_eq!(back, cache);
        assert_eq!(back.find("alpha"), Some(a));
        assert_eq!(back.find("beta"), None);
        assert_eq!(back.len(), 2);
    }
}
