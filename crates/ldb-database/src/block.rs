use std::fmt;
use std::mem::size_of;

use ldb_journal::{Direction, EcoSlots, Journal, JournalResult, JournalTarget};
use ldb_store::mem::string_heap;
use ldb_store::{Entity, MemInfo, MemSize, ObjectTable, StoreError};
use ldb_stream::{IStream, OStream, StreamResult, Streamable};
use ldb_types::{Id, Orient, PlacementStatus, Point, SchemaCheckpoint, SigType};
use tracing::debug;

use crate::edit::BlockEdit;
use crate::error::{DbError, DbResult};
use crate::library::MasterRef;
use crate::tech::Tech;

/// A node of the design hierarchy.
///
/// A block owns its instances and nets, and the pair of ECO journals that
/// capture edits made to them. Every mutator below goes through one edit
/// record, so replaying a journal and editing directly share a code path.
#[derive(Clone, Debug)]
pub struct Block {
    pub name: String,
    /// Present in streams from [`SchemaCheckpoint::BlockTech`] on.
    pub tech: Id<Tech>,
    pub(crate) parent: Id<Block>,
    pub(crate) children: Vec<Id<Block>>,
    insts: ObjectTable<Inst>,
    nets: ObjectTable<Net>,
    eco: EcoSlots<BlockEdit>,
    /// Count of edits applied, directly or by replay.
    revision: u64,
    /// Revision at which the pending journal was ended on this block.
    pending_applied_at: Option<u64>,
}

/// An instance of a master inside a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inst {
    pub name: String,
    pub master: MasterRef,
    pub location: Point,
    pub orient: Orient,
    pub status: PlacementStatus,
    /// Net attached to each master terminal, null when unconnected.
    iterms: Vec<Id<Net>>,
}

/// A net connecting instance terminals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Net {
    pub name: String,
    pub sig: SigType,
    iterms: Vec<ITermRef>,
}

/// One terminal of one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ITermRef {
    pub inst: Id<Inst>,
    pub term: u32,
}

impl Inst {
    pub(crate) fn new(name: &str, master: MasterRef, term_count: u32) -> Self {
        Self {
            name: name.to_string(),
            master,
            location: Point::origin(),
            orient: Orient::default(),
            status: PlacementStatus::default(),
            iterms: vec![Id::null(); term_count as usize],
        }
    }

    /// Net on terminal `term`, if connected.
    pub fn net(&self, term: u32) -> Option<Id<Net>> {
        self.iterms.get(term as usize).and_then(|n| n.non_null())
    }

    pub fn term_count(&self) -> u32 {
        self.iterms.len() as u32
    }
}

impl Net {
    pub(crate) fn new(name: &str, sig: SigType) -> Self {
        Self {
            name: name.to_string(),
            sig,
            iterms: Vec::new(),
        }
    }

    /// Connected instance terminals in connection order.
    pub fn iterms(&self) -> &[ITermRef] {
        &self.iterms
    }
}

impl Block {
    pub(crate) fn new(name: &str, tech: Id<Tech>, parent: Id<Block>) -> Self {
        Self {
            name: name.to_string(),
            tech,
            parent,
            children: Vec::new(),
            insts: ObjectTable::new(),
            nets: ObjectTable::new(),
            eco: EcoSlots::new(),
            revision: 0,
            pending_applied_at: None,
        }
    }

    pub fn parent(&self) -> Option<Id<Block>> {
        self.parent.non_null()
    }

    pub fn children(&self) -> &[Id<Block>] {
        &self.children
    }

    pub fn insts(&self) -> &ObjectTable<Inst> {
        &self.insts
    }

    pub fn nets(&self) -> &ObjectTable<Net> {
        &self.nets
    }

    pub fn find_inst(&self, name: &str) -> Option<Id<Inst>> {
        self.insts.find(|i| i.name == name)
    }

    pub fn find_net(&self, name: &str) -> Option<Id<Net>> {
        self.nets.find(|n| n.name == name)
    }

    fn inst(&self, id: Id<Inst>) -> DbResult<&Inst> {
        Ok(self.insts.try_get(id)?)
    }

    /// Create an unplaced instance with `term_count` unconnected terminals.
    pub fn create_inst(&mut self, name: &str, master: MasterRef, term_count: u32) -> DbResult<Id<Inst>> {
        if self.find_inst(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: Inst::KIND,
                name: name.to_string(),
            });
        }
        let id = self.insts.next_id();
        self.perform(BlockEdit::CreateInst {
            id,
            inst: Inst::new(name, master, term_count),
        })?;
        Ok(id)
    }

    /// Disconnect every terminal of the instance, then remove it.
    pub fn destroy_inst(&mut self, id: Id<Inst>) -> DbResult<()> {
        let inst = self.inst(id)?;
        let connected: Vec<u32> = (0..inst.term_count()).filter(|&t| inst.net(t).is_some()).collect();
        for term in connected {
            self.disconnect(id, term)?;
        }
        let inst = self.inst(id)?.clone();
        self.perform(BlockEdit::DestroyInst { id, inst })
    }

    pub fn set_inst_location(&mut self, id: Id<Inst>, location: Point) -> DbResult<()> {
        let old = self.inst(id)?.location;
        self.perform(BlockEdit::InstLocation {
            inst: id,
            old,
            new: location,
        })
    }

    pub fn set_inst_orient(&mut self, id: Id<Inst>, orient: Orient) -> DbResult<()> {
        let old = self.inst(id)?.orient;
        self.perform(BlockEdit::InstOrient {
            inst: id,
            old,
            new: orient,
        })
    }

    pub fn set_inst_status(&mut self, id: Id<Inst>, status: PlacementStatus) -> DbResult<()> {
        let old = self.inst(id)?.status;
        self.perform(BlockEdit::InstStatus {
            inst: id,
            old,
            new: status,
        })
    }

    pub fn create_net(&mut self, name: &str, sig: SigType) -> DbResult<Id<Net>> {
        if self.find_net(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: Net::KIND,
                name: name.to_string(),
            });
        }
        let id = self.nets.next_id();
        self.perform(BlockEdit::CreateNet {
            id,
            net: Net::new(name, sig),
        })?;
        Ok(id)
    }

    /// Disconnect every terminal on the net, then remove it.
    pub fn destroy_net(&mut self, id: Id<Net>) -> DbResult<()> {
        let attached = self.nets.try_get(id)?.iterms.clone();
        for iterm in attached.into_iter().rev() {
            self.disconnect(iterm.inst, iterm.term)?;
        }
        let net = self.nets.try_get(id)?.clone();
        self.perform(BlockEdit::DestroyNet { id, net })
    }

    /// Attach terminal `term` of `inst` to `net`, replacing any existing
    /// connection on that terminal.
    pub fn connect(&mut self, inst: Id<Inst>, term: u32, net: Id<Net>) -> DbResult<()> {
        self.nets.try_get(net)?;
        let current = self.checked_term(inst, term)?;
        if current == Some(net) {
            return Ok(());
        }
        if current.is_some() {
            self.disconnect(inst, term)?;
        }
        self.perform(BlockEdit::Connect { inst, term, net })
    }

    /// Detach terminal `term` of `inst`. Unconnected terminals are ignored.
    pub fn disconnect(&mut self, inst: Id<Inst>, term: u32) -> DbResult<()> {
        let Some(net) = self.checked_term(inst, term)? else {
            return Ok(());
        };
        let iterm = ITermRef { inst, term };
        let slot = self
            .nets
            .try_get(net)?
            .iterms
            .iter()
            .position(|r| *r == iterm)
            .ok_or_else(|| DbError::InvalidOperation(format!("net {net} does not list {inst}/{term}")))?;
        self.perform(BlockEdit::Disconnect {
            inst,
            term,
            net,
            slot: slot as u32,
        })
    }

    fn checked_term(&self, inst: Id<Inst>, term: u32) -> DbResult<Option<Id<Net>>> {
        let i = self.inst(inst)?;
        if term >= i.term_count() {
            return Err(DbError::InvalidTerm {
                inst: inst.raw(),
                term,
            });
        }
        Ok(i.net(term))
    }

    fn perform(&mut self, edit: BlockEdit) -> DbResult<()> {
        self.apply_edit(&edit, Direction::Forward)
            .map_err(DbError::InvalidOperation)?;
        self.eco.record(edit);
        Ok(())
    }

    /// Discard any active journal and start recording edits.
    pub fn begin_eco(&mut self) {
        self.eco.begin();
    }

    /// Stop recording; the finished journal becomes the pending one.
    pub fn end_eco(&mut self) {
        if self.eco.is_recording() {
            self.eco.end();
            self.pending_applied_at = Some(self.revision);
        }
    }

    /// `true` if no journal is recording or it has recorded nothing.
    pub fn eco_empty(&self) -> bool {
        self.eco.active_is_empty()
    }

    /// Number of edits in the active journal.
    pub fn check_eco(&self) -> usize {
        self.eco.active_len()
    }

    pub fn is_recording_eco(&self) -> bool {
        self.eco.is_recording()
    }

    /// Number of edits in the pending journal, if there is one.
    pub fn pending_eco_len(&self) -> Option<usize> {
        self.eco.pending().map(|j| j.len())
    }

    pub fn pending_eco(&self) -> Option<&Journal<BlockEdit>> {
        self.eco.pending()
    }

    /// Install a journal produced elsewhere as the pending one.
    pub fn set_pending_eco(&mut self, journal: Journal<BlockEdit>) {
        self.eco.set_pending(journal);
        self.pending_applied_at = None;
    }

    /// Replay the pending journal forward and discard it. Does nothing
    /// without a pending journal.
    ///
    /// A journal ended on this block is already reflected in it; if no edit
    /// has been applied since `end_eco`, the replay is skipped. On failure
    /// the block is rolled back and the journal stays pending.
    pub fn commit_eco(&mut self) -> JournalResult<()> {
        let Some(journal) = self.eco.take_pending() else {
            return Ok(());
        };
        if self.pending_applied_at.take() == Some(self.revision) {
            debug!(block = %self.name, edits = journal.len(), "pending ECO already applied");
            return Ok(());
        }
        debug!(block = %self.name, edits = journal.len(), "committing ECO");
        let result = journal.redo(self);
        if result.is_err() {
            self.eco.set_pending(journal);
        }
        result
    }

    /// Revert the pending journal and discard it. Does nothing without a
    /// pending journal. On failure the block is rolled back and the
    /// journal stays pending.
    pub fn undo_eco(&mut self) -> JournalResult<()> {
        let Some(journal) = self.eco.take_pending() else {
            return Ok(());
        };
        self.pending_applied_at = None;
        debug!(block = %self.name, edits = journal.len(), "undoing ECO");
        let result = journal.undo(self);
        if result.is_err() {
            self.eco.set_pending(journal);
        }
        result
    }

    fn insert_inst(&mut self, id: Id<Inst>, inst: &Inst) -> Result<(), String> {
        self.insts.insert_at(id, inst.clone()).map_err(|e| e.to_string())
    }

    fn remove_inst(&mut self, id: Id<Inst>) -> Result<(), String> {
        let inst = self.insts.try_get(id).map_err(|e| e.to_string())?;
        if inst.iterms.iter().any(|n| !n.is_null()) {
            return Err(format!("instance {id} is still connected"));
        }
        self.insts.destroy(id);
        Ok(())
    }

    fn insert_net(&mut self, id: Id<Net>, net: &Net) -> Result<(), String> {
        self.nets.insert_at(id, net.clone()).map_err(|e| e.to_string())
    }

    fn remove_net(&mut self, id: Id<Net>) -> Result<(), String> {
        let net = self.nets.try_get(id).map_err(|e| e.to_string())?;
        if !net.iterms.is_empty() {
            return Err(format!("net {id} is still connected"));
        }
        self.nets.destroy(id);
        Ok(())
    }

    fn term_cell(&mut self, iterm: ITermRef) -> Result<&mut Id<Net>, String> {
        let ITermRef { inst, term } = iterm;
        self.insts
            .get_mut(inst)
            .and_then(|i| i.iterms.get_mut(term as usize))
            .ok_or_else(|| format!("no terminal {term} on instance {inst}"))
    }

    /// Connect `iterm` to `net`, at `slot` in the net's list or at the end.
    fn attach(&mut self, iterm: ITermRef, net: Id<Net>, slot: Option<u32>) -> Result<(), String> {
        let len = self.nets.try_get(net).map_err(|e| e.to_string())?.iterms.len();
        let at = match slot {
            None => len,
            Some(s) if s as usize <= len => s as usize,
            Some(s) => return Err(format!("net {net} has no slot {s}")),
        };
        let cell = self.term_cell(iterm)?;
        if !cell.is_null() {
            return Err(format!(
                "terminal {} of instance {} is already connected",
                iterm.term, iterm.inst
            ));
        }
        *cell = net;
        if let Some(n) = self.nets.get_mut(net) {
            n.iterms.insert(at, iterm);
        }
        Ok(())
    }

    fn detach(&mut self, iterm: ITermRef, net: Id<Net>) -> Result<(), String> {
        self.nets.try_get(net).map_err(|e| e.to_string())?;
        let cell = self.term_cell(iterm)?;
        if *cell != net {
            return Err(format!(
                "terminal {} of instance {} is not on net {net}",
                iterm.term, iterm.inst
            ));
        }
        *cell = Id::null();
        if let Some(n) = self.nets.get_mut(net) {
            n.iterms.retain(|r| *r != iterm);
        }
        Ok(())
    }

    fn inst_mut(&mut self, id: Id<Inst>) -> Result<&mut Inst, String> {
        self.insts.try_get_mut(id).map_err(|e: StoreError| e.to_string())
    }
}

/// Journal replay. Edits applied here are never recorded.
impl JournalTarget<BlockEdit> for Block {
    fn apply_edit(&mut self, edit: &BlockEdit, direction: Direction) -> Result<(), String> {
        self.revision += 1;
        let forward = direction == Direction::Forward;
        match edit {
            BlockEdit::CreateInst { id, inst } | BlockEdit::DestroyInst { id, inst } => {
                let creating = matches!(edit, BlockEdit::CreateInst { .. }) == forward;
                if creating {
                    self.insert_inst(*id, inst)
                } else {
                    self.remove_inst(*id)
                }
            }
            BlockEdit::InstLocation { inst, old, new } => {
                let field = &mut self.inst_mut(*inst)?.location;
                swap_field(field, "location", *inst, (*old, *new), forward)
            }
            BlockEdit::InstOrient { inst, old, new } => {
                let field = &mut self.inst_mut(*inst)?.orient;
                swap_field(field, "orientation", *inst, (*old, *new), forward)
            }
            BlockEdit::InstStatus { inst, old, new } => {
                let field = &mut self.inst_mut(*inst)?.status;
                swap_field(field, "placement status", *inst, (*old, *new), forward)
            }
            BlockEdit::CreateNet { id, net } | BlockEdit::DestroyNet { id, net } => {
                let creating = matches!(edit, BlockEdit::CreateNet { .. }) == forward;
                if creating {
                    self.insert_net(*id, net)
                } else {
                    self.remove_net(*id)
                }
            }
            BlockEdit::Connect { inst, term, net } => {
                let iterm = ITermRef { inst: *inst, term: *term };
                if forward {
                    self.attach(iterm, *net, None)
                } else {
                    self.detach(iterm, *net)
                }
            }
            BlockEdit::Disconnect { inst, term, net, slot } => {
                let iterm = ITermRef { inst: *inst, term: *term };
                if forward {
                    self.detach(iterm, *net)
                } else {
                    self.attach(iterm, *net, Some(*slot))
                }
            }
        }
    }
}

/// Move `field` from one side of `(old, new)` to the other, failing if it
/// does not hold the side the replay direction starts from.
fn swap_field<V: Copy + PartialEq + fmt::Debug>(
    field: &mut V,
    what: &str,
    inst: Id<Inst>,
    (old, new): (V, V),
    forward: bool,
) -> Result<(), String> {
    let (from, to) = if forward { (old, new) } else { (new, old) };
    if *field != from {
        return Err(format!("instance {inst} {what} is {field:?}, expected {from:?}"));
    }
    *field = to;
    Ok(())
}

/// Journals are transient and excluded from equality.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tech == other.tech
            && self.parent == other.parent
            && self.children == other.children
            && self.insts == other.insts
            && self.nets == other.nets
    }
}

impl Entity for Block {
    const KIND: &'static str = "block";
}

impl Entity for Inst {
    const KIND: &'static str = "inst";
}

impl Entity for Net {
    const KIND: &'static str = "net";
}

impl MemSize for Block {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(
            size_of::<Self>()
                + string_heap(&self.name)
                + self.children.len() * size_of::<Id<Block>>(),
        );
        self.insts.collect_mem_info(info.child("inst"));
        self.nets.collect_mem_info(info.child("net"));
    }
}

impl MemSize for Inst {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(
            size_of::<Self>() + string_heap(&self.name) + self.iterms.len() * size_of::<Id<Net>>(),
        );
    }
}

impl MemSize for Net {
    fn collect_mem_info(&self, info: &mut MemInfo) {
        info.add(
            size_of::<Self>() + string_heap(&self.name) + self.iterms.len() * size_of::<ITermRef>(),
        );
    }
}

impl Streamable for Block {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        if out.has(SchemaCheckpoint::BlockTech) {
            out.put(&self.tech)?;
        }
        out.put(&self.parent)?;
        out.put(&self.children)?;
        out.put(&self.insts)?;
        out.put(&self.nets)
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
            parent: inp.get()?,
            children: inp.get()?,
            insts: inp.get()?,
            nets: inp.get()?,
            eco: EcoSlots::new(),
            revision: 0,
            pending_applied_at: None,
        })
    }
}

impl Streamable for Inst {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.put(&self.master)?;
        out.put(&self.location)?;
        out.put(&self.orient)?;
        out.put(&self.status)?;
        out.put(&self.iterms)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            master: inp.get()?,
            location: inp.get()?,
            orient: inp.get()?,
            status: inp.get()?,
            iterms: inp.get()?,
        })
    }
}

impl Streamable for Net {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.write_str(&self.name)?;
        out.put(&self.sig)?;
        out.put(&self.iterms)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            name: inp.read_string()?,
            sig: inp.get()?,
            iterms: inp.get()?,
        })
    }
}

impl Streamable for ITermRef {
    fn write_to(&self, out: &mut OStream<'_>) -> StreamResult<()> {
        out.put(&self.inst)?;
        out.write_u32(self.term)
    }

    fn read_from(inp: &mut IStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            inst: inp.get()?,
            term: inp.read_u32()?,
        })
    }
}
