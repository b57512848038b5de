use std::mem::size_of;

use ldb_store::mem::string_heap;
use ldb_store::{Entity, MemInfo, MemSize, ObjectTable, TopLevelEntity};
use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::{Id, LayerType, ObjectType};

/// A process technology: units and the layer stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Tech {
    pub name: String,
    pub dbu_per_micron: u32,
    layers: ObjectTable<Layer>,
}

/// One technology layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub kind: LayerType,
    /// 1-based position among routing layers, zero for other kinds.
    pub routing_level: u32,
}

impl Tech {
    pub(crate) fn new(name: &str, dbu_per_micron: u32) -> Self {
        Self {
            name: name.to_string(),
            dbu_per_micron,
            layers: ObjectTable::new(),
        }
    }

    /// Append a layer to the top of the stack.
    pub fn create_layer(&mut self, name: &str, kind: LayerType) -> Id<Layer> {
        let routing_level = if kind == LayerType::Routing {
            self.routing_layer_count() + 1
        } else {
            0
        };
        self.layers.create(Layer {
            name: name.to_string(),
            kind,
            routing_level,
        })
    }

    pub fn layers(&self) -> &ObjectTable<Layer> {
        &self.layers
    }

    pub fn find_layer(&self, name: &str) -> Option<Id<Layer>> {
        self.layers.find(|l| l.name == name)
    }

    pub fn routing_layer_count(&self) -> u32 {
        self.layers
            .values()
            .filter(|l| l.kind == LayerType::Routing)
            .count() as u32
    }
}

impl Entity for Tech {
    const KIND: &'static str = "tech";
}

impl TopLevelEntity for Tech {
    const OBJECT_TYPE: ObjectType = ObjectType::Tech;
}

impl Entity for Layer {
    const KIND: &'static str = "layer";
}

impl MemSize for Tech {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
        self.layers.collect_mem_info(info.child("layer"));
    }
}

impl MemSize for Layer {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(size_of::<Self>() + string_heap(&self.name));
    }
}

impl Streamable for Tech {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.write_u32(self.dbu_per_micron)?;
        out.put(&self.layers)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            dbu_per_micron: inp.read_u32()?,
            layers: inp.get()?,
        })
    }
}

impl Streamable for Layer {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.put(&self.kind)?;
        out.write_u32(self.routing_level)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            kind: inp.get()?,
            routing_level: inp.read_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_levels_count_only_routing_layers() {
        let mut tech = Tech::new("T", 1000);
        let m1 = tech.create_layer("metal1", LayerType::Routing);
        let v1 = tech.create_layer("via1", LayerType::Cut);
        let m2 = tech.create_layer("metal2", LayerType::Routing);

        assert_eq!(tech.layers().get(m1).unwrap().routing_level, 1);
        assert_eq!(tech.layers().get(v1).unwrap().routing_level, 0);
        assert_eq!(tech.layers().get(m2).unwrap().routing_level, 2);
        assert_eq!(tech.routing_layer_count(), 2);
        assert_eq!(tech.find_layer("via1"), Some(v1));
    }

    #[test]
    fn mem_info_nests_layers() {
        let mut tech = Tech::new("T", 2000);
        tech.create_layer("metal1", LayerType::Routing);
        let mut info = MemInfo::new();
        tech.collect_mem_info(&mut info);
        assert_eq!(info.cnt, 1);
        assert_eq!(info.children["layer"].cnt, 1);
    }
}
