use std::mem::size_of;

use ldb_store::mem::string_heap;
use ldb_store::{Entity, MemInfo, MemSize, ObjectTable, TopLevelEntity};
use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::{Id, IoType, ObjectType, SchemaCheckpoint, SigType};

use crate::tech::Tech;

/// A cell library bound to one technology.
#[derive(Clone, Debug, PartialEq)]
pub struct Lib {
    pub name: String,
    /// Present in streams from [`SchemaCheckpoint::BlockTech`] on; older
    /// streams get it back-filled from the shared technology.
    pub tech: Id<Tech>,
    pub hier_delimiter: char,
    masters: ObjectTable<Master>,
}

/// A cell (macro or standard cell) definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Master {
    pub name: String,
    /// Database-wide unique master number.
    pub master_id: u32,
    pub width: i32,
    pub height: i32,
    mterms: ObjectTable<MTerm>,
}

/// A terminal (pin) of a master.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MTerm {
    pub name: String,
    pub io: IoType,
    pub sig: SigType,
}

/// Database-wide address of a master: its library and its slot there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MasterRef {
    pub lib: Id<Lib>,
    pub master: Id<Master>,
}

impl Lib {
    pub(crate) fn new(name: &str, tech: Id<Tech>, hier_delimiter: char) -> Self {
        Self {
            name: name.to_string(),
            tech,
            hier_delimiter,
            masters: ObjectTable::new(),
        }
    }

    pub fn masters(&self) -> &ObjectTable<Master> {
        &self.masters
    }

    pub fn masters_mut(&mut self) -> &mut ObjectTable<Master> {
        &mut self.masters
    }

    pub fn find_master(&self, name: &str) -> Option<Id<Master>> {
        self.masters.find(|m| m.name == name)
    }
}

impl Master {
    pub(crate) fn new(name: &str, master_id: u32, width: i32, height: i32) -> Self {
        Self {
            name: name.to_string(),
            master_id,
            width,
            height,
            mterms: ObjectTable::new(),
        }
    }

    /// Add a terminal. Terminals are never removed, so a terminal's index
    /// on an instance is its identifier minus one.
    pub fn create_mterm(&mut self, name: &str, io: IoType, sig: SigType) -> Id<MTerm> {
        self.mterms.create(MTerm {
            name: name.to_string(),
            io,
            sig,
        })
    }

    pub fn mterms(&self) -> &ObjectTable<MTerm> {
        &self.mterms
    }

    /// Index of the named terminal on an instance of this master.
    pub fn term_index(&self, name: &str) -> Option<u32> {
        self.mterms
            .find(|t| t.name == name)
            .map(|id| id.raw() - 1)
    }

    pub fn term_count(&self) -> u32 {
        self.mterms.len() as u32
    }
}

impl Entity for Lib {
    const KIND: &'static str = "lib";
}

impl TopLevelEntity for Lib {
    const OBJECT_TYPE: ObjectType = ObjectType::Lib;
}

impl Entity for Master {
    const KIND: &'static str = "master";
}

impl Entity for MTerm {
    const KIND: &'static str = "mterm";
}

impl MemSize for Lib {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
        self.masters.collect_mem_info(info.child("master"));
    }
}

impl MemSize for Master {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
        self.mterms.collect_mem_info(info.child("mterm"));
    }
}

impl MemSize for MTerm {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
    }
}

impl Streamable for Lib {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        if out.has(SchemaCheckpoint::BlockTech) {
            out.put(&self.tech)?;
        }
        out.put(&self.hier_delimiter)?;
        out.put(&self.masters)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let name = inp.read_string()?;
        let tech = if inp.has(SchemaCheckpoint::BlockTech) {
            inp.get()?
        } else {
            Id::null()
        };
        Ok(Self {
            name,
            tech,
            hier_delimiter: inp.get()?,
            masters: inp.get()?,
        })
    }
}

impl Streamable for Master {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.write_u32(self.master_id)?;
        if out.has(SchemaCheckpoint::MasterSize) {
            out.write_i32(self.width)?;
            out.write_i32(self.height)?;
        }
        out.put(&self.mterms)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let name = inp.read_string()?;
        let master_id = inp.read_u32()?;
        let (width, height) = if inp.has(SchemaCheckpoint::MasterSize) {
            (inp.read_i32()?, inp.read_i32()?)
        } else {
            (0, 0)
        };
        Ok(Self {
            name,
            master_id,
            width,
            height,
            mterms: inp.get()?,
        })
    }
}

impl Streamable for MTerm {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.put(&self.io)?;
        out.put(&self.sig)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            io: inp.get()?,
            sig: inp.get()?,
        })
    }
}

impl Streamable for MasterRef {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.lib)?;
        out.put(&self.master)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            lib: inp.get()?,
            master: inp.get()?,
        })
    }
}
