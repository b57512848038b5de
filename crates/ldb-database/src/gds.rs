use std::mem::size_of;

use ldb_store::mem::string_heap;
use ldb_store::{Entity, MemInfo, MemSize, TopLevelEntity};
use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::ObjectType;

/// An embedded GDSII library: units and structure names.
#[derive(Clone, Debug, PartialEq)]
pub struct GdsLib {
    pub name: String,
    /// User units per database unit.
    pub uu_per_dbu: f64,
    pub structures: Vec<String>,
}

impl GdsLib {
    pub(crate) fn new(name: &str, uu_per_dbu: f64) -> Self {
        Self {
            name: name.to_string(),
            uu_per_dbu,
            structures: Vec::new(),
        }
    }
}

impl Entity for GdsLib {
    const KIND: &'static str = "gds_lib";
}

impl TopLevelEntity for GdsLib {
    const OBJECT_TYPE: ObjectType = ObjectType::GdsLib;
}

impl MemSize for GdsLib {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        let heap: usize = self
            .structures
            .iter()
            .map(|s| size_of::<String>() + string_heap(s))
            .sum();
        info.add(size_of::<Self>() + string_heap(&self.name) + heap);
    }
}

impl Streamable for GdsLib {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.write_f64(self.uu_per_dbu)?;
        out.put(&self.structures)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            uu_per_dbu: inp.read_f64()?,
            structures: inp.get()?,
        })
    }
}
