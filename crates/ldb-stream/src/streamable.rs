use ldb_types::{
    Id, IoType, LayerType, ObjectRef, ObjectType, Orient, PlacementStatus, Point, SchemaVersion,
    SigType,
};

use crate::error::{StreamError, StreamResult};
use crate::istream::IStream;
use crate::ostream::OStream;

/// A value with a fixed-order binary encoding.
///
/// `read_from` must consume exactly the bytes `write_to` produced for the
/// same schema; codecs consult `out.has(..)` / `inp.has(..)` to gate fields
/// introduced by later schema minors.
pub trait Streamable: Sized {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()>;

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self>;
}

macro_rules! primitive {
    ($ty:ty, $write:ident, $read:ident) => {
        impl Streamable for $ty {
            fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
                out.$write(*self)
            }

            fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
                inp.$read()
            }
        }
    };
}

primitive!(u8, write_u8, read_u8);
primitive!(bool, write_bool, read_bool);
primitive!(u32, write_u32, read_u32);
primitive!(i32, write_i32, read_i32);
primitive!(u64, write_u64, read_u64);
primitive!(f64, write_f64, read_f64);

impl Streamable for String {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(self)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        inp.read_string()
    }
}

impl Streamable for char {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_u32(u32::from(*self))
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let offset = inp.position();
        let raw = inp.read_u32()?;
        char::from_u32(raw).ok_or_else(|| StreamError::Corrupt {
            offset,
            reason: format!("invalid char scalar {raw:#x}"),
        })
    }
}

impl<T: Streamable> Streamable for Vec<T> {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_len(self.len())?;
        for item in self {
            item.write_to(out)?;
        }
        Ok(())
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let len = inp.read_len()?;
        let mut items = Vec::with_capacity(IStream::prealloc(len));
        for _ in 0..len {
            items.push(T::read_from(inp)?);
        }
        Ok(items)
    }
}

impl<T> Streamable for Id<T> {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_u32(self.raw())
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Id::from_raw(inp.read_u32()?))
    }
}

impl Streamable for Point {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_i32(self.x)?;
        out.write_i32(self.y)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let x = inp.read_i32()?;
        let y = inp.read_i32()?;
        Ok(Point { x, y })
    }
}

impl Streamable for SchemaVersion {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_u32(self.major)?;
        out.write_u32(self.minor)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let major = inp.read_u32()?;
        let minor = inp.read_u32()?;
        Ok(SchemaVersion { major, minor })
    }
}

impl Streamable for ObjectRef {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        self.kind.write_to(out)?;
        out.write_u32(self.id)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let kind = ObjectType::read_from(inp)?;
        let id = inp.read_u32()?;
        Ok(ObjectRef { kind, id })
    }
}

macro_rules! tagged {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Streamable for $ty {
                fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
                    out.write_u8(self.tag())
                }

                fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
                    inp.read_tag(<$ty>::from_tag)
                }
            }
        )+
    };
}

tagged!(ObjectType, Orient, PlacementStatus, IoType, SigType, LayerType);
