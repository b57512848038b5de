use std::mem::size_of;

use ldb_store::{Entity, MemInfo, MemSize, ObjectTable, TopLevelEntity};
use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::{Id, ObjectType};

use crate::block::Block;

/// A chip: the owner of the block hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chip {
    pub(crate) top: Id<Block>,
    pub(crate) blocks: ObjectTable<Block>,
}

impl Chip {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The top block, once one has been created.
    pub fn top(&self) -> Option<Id<Block>> {
        self.top.non_null()
    }

    pub fn blocks(&self) -> &ObjectTable<Block> {
        &self.blocks
    }

    pub fn block(&self, id: Id<Block>) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_mut(&mut self, id: Id<Block>) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    pub fn find_block(&self, name: &str) -> Option<Id<Block>> {
        self.blocks.find(|b| b.name == name)
    }
}

impl Entity for Chip {
    const KIND: &'static str = "chip";
}

impl TopLevelEntity for Chip {
    const OBJECT_TYPE: ObjectType = ObjectType::Chip;
}

impl MemSize for Chip {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>());
        self.blocks.collect_mem_info(info.child("block"));
    }
}

impl Streamable for Chip {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.top)?;
        out.put(&self.blocks)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            top: inp.get()?,
            blocks: inp.get()?,
        })
    }
}
