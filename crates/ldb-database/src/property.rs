use std::fmt;
use std::mem::size_of;

use ldb_store::mem::string_heap;
use ldb_store::{CachedName, Entity, MemInfo, MemSize, TopLevelEntity};
use ldb_stream::{IStream, OStream, StreamError, StreamResult, Streamable};
use ldb_types::{Id, ObjectRef, ObjectType};

/// Typed value of a property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Int(i32),
    Bool(bool),
    Double(f64),
    String(String),
}

impl PropValue {
    const INT: u8 = 0;
    const BOOL: u8 = 1;
    const DOUBLE: u8 = 2;
    const STRING: u8 = 3;

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

/// A named, typed annotation on a top-level entity.
///
/// `owner` is the unique id of the database holding the property. It is
/// process-local, so it is rebound after every read and ignored by
/// equality.
#[derive(Clone, Debug)]
pub struct Property {
    pub(crate) name: Id<CachedName>,
    pub(crate) owner: u32,
    pub target: ObjectRef,
    pub value: PropValue,
}

impl Property {
    /// Interned name identifier; resolve through the database name cache.
    pub fn name_id(&self) -> Id<CachedName> {
        self.name
    }

    pub fn owner(&self) -> u32 {
        self.owner
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.target == other.target && self.value == other.value
    }
}

impl Entity for Property {
    const KIND: &'static str = "prop";
}

impl TopLevelEntity for Property {
    const OBJECT_TYPE: ObjectType = ObjectType::Property;
}

impl MemSize for Property {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        let heap = match &self.value {
            PropValue::String(s) => string_heap(s),
            _ => 0,
        };
        info.add(size_of::<Self>() + heap);
    }
}

impl Streamable for PropValue {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        match self {
            Self::Int(v) => {
                out.write_u8(Self::INT)?;
                out.write_i32(*v)
            }
            Self::Bool(v) => {
                out.write_u8(Self::BOOL)?;
                out.write_bool(*v)
            }
            Self::Double(v) => {
                out.write_u8(Self::DOUBLE)?;
                out.write_f64(*v)
            }
            Self::String(v) => {
                out.write_u8(Self::STRING)?;
                out.write_str(v)
            }
        }
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let offset = inp.position();
        match inp.read_u8()? {
            Self::INT => Ok(Self::Int(inp.read_i32()?)),
            Self::BOOL => Ok(Self::Bool(inp.read_bool()?)),
            Self::DOUBLE => Ok(Self::Double(inp.read_f64()?)),
            Self::STRING => Ok(Self::String(inp.read_string()?)),
            other => Err(StreamError::Corrupt {
                offset,
                reason: format!("unknown property value tag {other}"),
            }),
        }
    }
}

impl Streamable for Property {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.name)?;
        out.write_u32(self.owner)?;
        out.put(&self.target)?;
        out.put(&self.value)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.get()?,
            owner: inp.read_u32()?,
            target: inp.get()?,
            value: inp.get()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_owner() {
        let a = Property {
            name: Id::from_raw(1),
            owner: 3,
            target: ObjectRef::new(ObjectType::Chip, 1),
            value: PropValue::Int(5),
        };
        let mut b = a.clone();
        b.owner = 99;
        assert_eq!(a, b);
        b.value = PropValue::Int(6);
        assert_ne!(a, b);
    }

    #[test]
    fn value_accessors() {
        assert_eq!(PropValue::Int(4).as_int(), Some(4));
        assert_eq!(PropValue::Int(4).as_bool(), None);
        assert_eq!(PropValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(PropValue::Double(0.5).to_string(), "0.5");
    }
}
