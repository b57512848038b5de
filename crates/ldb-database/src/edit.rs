use ldb_stream::{IStream, OStream, StreamError, StreamResult, Streamable};
use ldb_types::{Id, Orient, PlacementStatus, Point};

use crate::block::{Inst, Net};

/// One field-level change to a block, carrying enough state to be applied
/// in either direction.
///
/// Destroy edits carry a snapshot of the removed entity so undo can restore
/// it under its original identifier. Connections are always detached by
/// separate `Disconnect` edits before the owning instance or net goes away.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockEdit {
    CreateInst { id: Id<Inst>, inst: Inst },
    DestroyInst { id: Id<Inst>, inst: Inst },
    InstLocation { inst: Id<Inst>, old: Point, new: Point },
    InstOrient { inst: Id<Inst>, old: Orient, new: Orient },
    InstStatus { inst: Id<Inst>, old: PlacementStatus, new: PlacementStatus },
    CreateNet { id: Id<Net>, net: Net },
    DestroyNet { id: Id<Net>, net: Net },
    Connect { inst: Id<Inst>, term: u32, net: Id<Net> },
    /// `slot` is the position the terminal held in the net's list.
    Disconnect { inst: Id<Inst>, term: u32, net: Id<Net>, slot: u32 },
}

impl BlockEdit {
    const CREATE_INST: u8 = 1;
    const DESTROY_INST: u8 = 2;
    const INST_LOCATION: u8 = 3;
    const INST_ORIENT: u8 = 4;
    const INST_STATUS: u8 = 5;
    const CREATE_NET: u8 = 6;
    const DESTROY_NET: u8 = 7;
    const CONNECT: u8 = 8;
    const DISCONNECT: u8 = 9;

    fn tag(&self) -> u8 {
        match self {
            Self::CreateInst { .. } => Self::CREATE_INST,
            Self::DestroyInst { .. } => Self::DESTROY_INST,
            Self::InstLocation { .. } => Self::INST_LOCATION,
            Self::InstOrient { .. } => Self::INST_ORIENT,
            Self::InstStatus { .. } => Self::INST_STATUS,
            Self::CreateNet { .. } => Self::CREATE_NET,
            Self::DestroyNet { .. } => Self::DESTROY_NET,
            Self::Connect { .. } => Self::CONNECT,
            Self::Disconnect { .. } => Self::DISCONNECT,
        }
    }
}

impl Streamable for BlockEdit {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_u8(self.tag())?;
        match self {
            Self::CreateInst { id, inst } | Self::DestroyInst { id, inst } => {
                out.put(id)?;
                out.put(inst)
            }
            Self::InstLocation { inst, old, new } => {
                out.put(inst)?;
                out.put(old)?;
                out.put(new)
            }
            Self::InstOrient { inst, old, new } => {
                out.put(inst)?;
                out.put(old)?;
                out.put(new)
            }
            Self::InstStatus { inst, old, new } => {
                out.put(inst)?;
                out.put(old)?;
                out.put(new)
            }
            Self::CreateNet { id, net } | Self::DestroyNet { id, net } => {
                out.put(id)?;
                out.put(net)
            }
            Self::Connect { inst, term, net } => {
                out.put(inst)?;
                out.write_u32(*term)?;
                out.put(net)
            }
            Self::Disconnect { inst, term, net, slot } => {
                out.put(inst)?;
                out.write_u32(*term)?;
                out.put(net)?;
                out.write_u32(*slot)
            }
        }
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        let offset = inp.position();
        let edit = match inp.read_u8()? {
            Self::CREATE_INST => Self::CreateInst {
                id: inp.get()?,
                inst: inp.get()?,
            },
            Self::DESTROY_INST => Self::DestroyInst {
                id: inp.get()?,
                inst: inp.get()?,
            },
            Self::INST_LOCATION => Self::InstLocation {
                inst: inp.get()?,
                old: inp.get()?,
                new: inp.get()?,
            },
            Self::INST_ORIENT => Self::InstOrient {
                inst: inp.get()?,
                old: inp.get()?,
                new: inp.get()?,
            },
            Self::INST_STATUS => Self::InstStatus {
                inst: inp.get()?,
                old: inp.get()?,
                new: inp.get()?,
            },
            Self::CREATE_NET => Self::CreateNet {
                id: inp.get()?,
                net: inp.get()?,
            },
            Self::DESTROY_NET => Self::DestroyNet {
                id: inp.get()?,
                net: inp.get()?,
            },
            Self::CONNECT => Self::Connect {
                inst: inp.get()?,
                term: inp.read_u32()?,
                net: inp.get()?,
            },
            Self::DISCONNECT => Self::Disconnect {
                inst: inp.get()?,
                term: inp.read_u32()?,
                net: inp.get()?,
                slot: inp.read_u32()?,
            },
            other => {
                return Err(StreamError::Corrupt {
                    offset,
                    reason: format!("unknown edit tag {other}"),
                })
            }
        };
        Ok(edit)
    }
}
