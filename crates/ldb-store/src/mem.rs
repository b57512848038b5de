use std::collections::BTreeMap;
use std::mem::size_of;

/// Recursive entry-count and byte-size accounting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub cnt: u64,
    pub size: u64,
    pub children: BTreeMap<String, MemInfo>,
}

impl MemInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The named child bucket, created on first use.
    pub fn child(&mut self, name: &str) -> &mut MemInfo {
        self.children.entry(name.to_string()).or_default()
    }

    /// Account for one entry of `bytes` bytes.
    pub fn add(&mut self, bytes: usize) {
        self.cnt += 1;
        self.size += bytes as u64;
    }

    /// Average entry size, or zero when empty.
    pub fn avg_size(&self) -> f64 {
        if self.cnt == 0 {
            0.0
        } else {
            self.size as f64 / self.cnt as f64
        }
    }

    /// Size of this level plus all descendants.
    pub fn total_size(&self) -> u64 {
        self.size + self.children.values().map(MemInfo::total_size).sum::<u64>()
    }
}

/// Memory accounting for one entity.
///
/// The default counts the inline size only. Entities that own strings,
/// vectors, or nested tables override it to add heap bytes and to recurse
/// into named child buckets.
pub trait MemSize: Sized {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>());
    }
}

/// Heap bytes held by a string.
pub fn string_heap(s: &str) -> usize {
    s.len()
}
