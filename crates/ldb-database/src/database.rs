use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ldb_store::{CachedName, DynTable, NameCache, ObjectTable};
use ldb_stream::{
    read_frame_header, write_frame_header, IStream, Magic, OStream, StreamError, Streamable,
};
use ldb_types::log::missing_logger;
use ldb_types::{
    Id, Logger, ObjectRef, ObjectType, SchemaCheckpoint, SchemaVersion, Subsystem, DB_MAGIC1,
    DB_MAGIC2,
};
use tracing::{debug, info};

use crate::block::{Block, Inst};
use crate::chip::Chip;
use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::gds::GdsLib;
use crate::library::{Lib, Master, MasterRef};
use crate::observer::ObserverList;
use crate::property::{PropValue, Property};
use crate::tech::Tech;

/// Source of process-unique database ids. Never reset.
static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

const FRAME_NAME: &str = "layout database";

/// Everything `clear()` resets and `read()` replaces.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Contents {
    pub(crate) master_id: u32,
    pub(crate) chip: Id<Chip>,
    pub(crate) techs: ObjectTable<Tech>,
    pub(crate) libs: ObjectTable<Lib>,
    pub(crate) chips: ObjectTable<Chip>,
    pub(crate) gds_libs: ObjectTable<GdsLib>,
    pub(crate) props: ObjectTable<Property>,
    pub(crate) names: NameCache,
}

impl Contents {
    fn table(&self, kind: ObjectType) -> &dyn DynTable {
        match kind {
            ObjectType::Tech => &self.techs,
            ObjectType::Lib => &self.libs,
            ObjectType::Chip => &self.chips,
            ObjectType::GdsLib => &self.gds_libs,
            ObjectType::Property => &self.props,
        }
    }

    fn table_mut(&mut self, kind: ObjectType) -> &mut dyn DynTable {
        match kind {
            ObjectType::Tech => &mut self.techs,
            ObjectType::Lib => &mut self.libs,
            ObjectType::Chip => &mut self.chips,
            ObjectType::GdsLib => &mut self.gds_libs,
            ObjectType::Property => &mut self.props,
        }
    }

    /// Streams older than the per-block technology checkpoint stored one
    /// technology for the whole database. Hand it to the top block and to
    /// every library.
    fn backfill_legacy_tech(&mut self, tech: Id<Tech>) {
        for (_, lib) in self.libs.iter_mut() {
            lib.tech = tech;
        }
        let Some(chip) = self.chips.get_mut(self.chip) else {
            return;
        };
        let top = chip.top;
        if let Some(block) = chip.blocks.get_mut(top) {
            block.tech = tech;
        }
    }

    fn rebind_property_owners(&mut self, owner: u32) {
        for (_, prop) in self.props.iter_mut() {
            prop.owner = owner;
        }
    }
}

/// Whether a table is part of a frame written at `schema`.
fn table_in_stream(kind: ObjectType, schema: SchemaVersion) -> bool {
    kind != ObjectType::GdsLib || schema.has(SchemaCheckpoint::GdsLibInBlock)
}

/// The root of one design: technologies, libraries, the chip hierarchy,
/// GDS libraries, properties, and the shared name cache.
///
/// A root is not internally synchronized. Wrap it in the registry's
/// [`SharedDatabase`](crate::SharedDatabase) or otherwise hold exclusive
/// access while mutating.
pub struct Database {
    magic1: u32,
    magic2: u32,
    schema: SchemaVersion,
    pub(crate) contents: Contents,
    unique_id: u32,
    logger: Option<Arc<dyn Logger>>,
    pub(crate) observers: ObserverList,
    config: DbConfig,
}

impl Database {
    /// Create an unregistered root with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DbConfig::default())
    }

    pub fn with_config(config: DbConfig) -> Self {
        let unique_id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        debug!(unique_id, "database created");
        Self {
            magic1: DB_MAGIC1,
            magic2: DB_MAGIC2,
            schema: SchemaVersion::current(),
            contents: Contents::default(),
            unique_id,
            logger: None,
            observers: ObserverList::default(),
            config,
        }
    }

    /// Process-unique id, stable across `clear()`.
    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    /// In-memory schema. Always the current one after a successful read.
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DbConfig) {
        self.config = config;
    }

    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = Some(logger);
    }

    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    /// The installed logger. A root without one cannot report anything and
    /// terminates the process.
    pub fn logger(&self) -> &dyn Logger {
        match &self.logger {
            Some(logger) => logger.as_ref(),
            None => missing_logger(),
        }
    }

    fn magic(&self) -> Magic {
        Magic::new(self.magic1, self.magic2, FRAME_NAME)
    }

    /// The table holding entities of `kind`.
    pub fn table(&self, kind: ObjectType) -> &dyn DynTable {
        self.contents.table(kind)
    }

    /// Dispatch on a raw type tag. An unknown tag is an internal
    /// inconsistency and terminates through the logger.
    pub fn object_table_by_tag(&self, tag: u8) -> &dyn DynTable {
        match ObjectType::from_tag(tag) {
            Ok(kind) => self.table(kind),
            Err(_) => self.logger().critical(
                Subsystem::Odb,
                438,
                format_args!("Internal inconsistency: no table found for type {tag}"),
            ),
        }
    }

    /// Returns `true` if `target` names a live top-level entity.
    pub fn contains(&self, target: ObjectRef) -> bool {
        self.table(target.kind).contains_raw(target.id)
    }

    // Technologies

    pub fn create_tech(&mut self, name: &str, dbu_per_micron: u32) -> DbResult<Id<Tech>> {
        if self.find_tech(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "tech",
                name: name.to_string(),
            });
        }
        Ok(self.contents.techs.create(Tech::new(name, dbu_per_micron)))
    }

    pub fn techs(&self) -> &ObjectTable<Tech> {
        &self.contents.techs
    }

    pub fn tech_mut(&mut self, id: Id<Tech>) -> Option<&mut Tech> {
        self.contents.techs.get_mut(id)
    }

    pub fn find_tech(&self, name: &str) -> Option<Id<Tech>> {
        self.contents.techs.find(|t| t.name == name)
    }

    /// The single technology of a single-technology database.
    pub fn tech(&self) -> Option<&Tech> {
        if self.contents.techs.len() > 1 {
            self.logger().critical(
                Subsystem::Odb,
                432,
                format_args!("tech() is obsolete in a multi-tech db"),
            );
        }
        self.contents.techs.values().next()
    }

    // Libraries and masters

    /// Create a library. Without an explicit delimiter the configured
    /// default is used.
    pub fn create_lib(
        &mut self,
        name: &str,
        tech: Id<Tech>,
        hier_delimiter: Option<char>,
    ) -> DbResult<Id<Lib>> {
        self.contents.techs.try_get(tech)?;
        if self.find_lib(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "lib",
                name: name.to_string(),
            });
        }
        let delimiter = hier_delimiter.unwrap_or(self.config.default_hier_delimiter);
        Ok(self.contents.libs.create(Lib::new(name, tech, delimiter)))
    }

    pub fn libs(&self) -> &ObjectTable<Lib> {
        &self.contents.libs
    }

    pub fn lib_mut(&mut self, id: Id<Lib>) -> Option<&mut Lib> {
        self.contents.libs.get_mut(id)
    }

    pub fn find_lib(&self, name: &str) -> Option<Id<Lib>> {
        self.contents.libs.find(|l| l.name == name)
    }

    /// Create a master in `lib` and mint its database-wide master id.
    pub fn create_master(
        &mut self,
        lib: Id<Lib>,
        name: &str,
        width: i32,
        height: i32,
    ) -> DbResult<MasterRef> {
        let target = self.contents.libs.try_get_mut(lib)?;
        if target.find_master(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "master",
                name: name.to_string(),
            });
        }
        let master_id = self.contents.master_id + 1;
        let master = target
            .masters_mut()
            .create(Master::new(name, master_id, width, height));
        self.contents.master_id = master_id;
        Ok(MasterRef { lib, master })
    }

    pub fn master(&self, r: MasterRef) -> Option<&Master> {
        self.contents.libs.get(r.lib)?.masters().get(r.master)
    }

    pub fn master_mut(&mut self, r: MasterRef) -> Option<&mut Master> {
        self.contents.libs.get_mut(r.lib)?.masters_mut().get_mut(r.master)
    }

    /// First master with this name, searching libraries in creation order.
    pub fn find_master(&self, name: &str) -> Option<MasterRef> {
        self.contents.libs.iter().find_map(|(lib, l)| {
            l.find_master(name).map(|master| MasterRef { lib, master })
        })
    }

    /// Number of master ids minted so far.
    pub fn number_of_masters(&self) -> u32 {
        self.contents.master_id
    }

    /// Destroy every master not instantiated in any block of the chip.
    /// Returns the number removed.
    pub fn remove_unused_masters(&mut self) -> usize {
        let used: HashSet<MasterRef> = self
            .chip()
            .map(|chip| {
                chip.blocks()
                    .values()
                    .flat_map(|b| b.insts().values().map(|i| i.master))
                    .collect()
            })
            .unwrap_or_default();

        let mut removed = 0;
        for (lib, l) in self.contents.libs.iter_mut() {
            let unused: Vec<Id<Master>> = l
                .masters()
                .ids()
                .into_iter()
                .filter(|&master| !used.contains(&MasterRef { lib, master }))
                .collect();
            for master in unused {
                l.masters_mut().destroy(master);
                removed += 1;
            }
        }
        debug!(removed, "removed unused masters");
        removed
    }

    // Chip and blocks

    /// Create the database's chip. A database holds at most one.
    pub fn create_chip(&mut self) -> DbResult<Id<Chip>> {
        if !self.contents.chip.is_null() {
            return Err(DbError::ChipExists);
        }
        let id = self.contents.chips.create(Chip::new());
        self.contents.chip = id;
        Ok(id)
    }

    /// Destroy the chip and every property attached to it.
    pub fn destroy_chip(&mut self) -> DbResult<()> {
        let id = self.contents.chip.non_null().ok_or(DbError::NoChip)?;
        let target = ObjectRef::new(ObjectType::Chip, id.raw());
        for prop in self.properties_of(target) {
            self.destroy_property(prop)?;
        }
        self.contents.chips.destroy(id);
        self.contents.chip = Id::null();
        Ok(())
    }

    pub fn chip_id(&self) -> Option<Id<Chip>> {
        self.contents.chip.non_null()
    }

    pub fn chip(&self) -> Option<&Chip> {
        self.contents.chips.get(self.contents.chip)
    }

    pub fn chip_mut(&mut self) -> Option<&mut Chip> {
        self.contents.chips.get_mut(self.contents.chip)
    }

    pub fn chips(&self) -> &ObjectTable<Chip> {
        &self.contents.chips
    }

    /// Create a block in the chip. Without a parent the block becomes the
    /// top block, which must not exist yet.
    pub fn create_block(
        &mut self,
        parent: Option<Id<Block>>,
        name: &str,
        tech: Id<Tech>,
    ) -> DbResult<Id<Block>> {
        self.contents.techs.try_get(tech)?;
        let chip = self.chip_mut().ok_or(DbError::NoChip)?;
        if chip.find_block(name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "block",
                name: name.to_string(),
            });
        }
        match parent {
            None if !chip.top.is_null() => Err(DbError::InvalidOperation(
                "chip already has a top block".to_string(),
            )),
            None => {
                let id = chip.blocks.create(Block::new(name, tech, Id::null()));
                chip.top = id;
                Ok(id)
            }
            Some(parent) => {
                chip.blocks.try_get(parent)?;
                let id = chip.blocks.create(Block::new(name, tech, parent));
                if let Some(p) = chip.blocks.get_mut(parent) {
                    p.children.push(id);
                }
                Ok(id)
            }
        }
    }

    pub fn top_block(&self) -> Option<Id<Block>> {
        self.chip()?.top()
    }

    pub fn block(&self, id: Id<Block>) -> Option<&Block> {
        self.chip()?.block(id)
    }

    pub fn block_mut(&mut self, id: Id<Block>) -> Option<&mut Block> {
        self.chip_mut()?.block_mut(id)
    }

    pub fn find_block(&self, name: &str) -> Option<Id<Block>> {
        self.chip()?.find_block(name)
    }

    /// Like [`find_block`](Self::find_block), for callers that treat a
    /// missing block as an error.
    pub fn block_by_name(&self, name: &str) -> DbResult<Id<Block>> {
        self.find_block(name).ok_or_else(|| DbError::NameNotFound {
            kind: "block",
            name: name.to_string(),
        })
    }

    pub(crate) fn try_block(&self, id: Id<Block>) -> DbResult<&Block> {
        let chip = self.chip().ok_or(DbError::NoChip)?;
        Ok(chip.blocks.try_get(id)?)
    }

    pub(crate) fn try_block_mut(&mut self, id: Id<Block>) -> DbResult<&mut Block> {
        let chip = self.chip_mut().ok_or(DbError::NoChip)?;
        Ok(chip.blocks.try_get_mut(id)?)
    }

    /// Instantiate `master` in `block` with one unconnected terminal per
    /// master terminal.
    pub fn create_inst(&mut self, block: Id<Block>, name: &str, master: MasterRef) -> DbResult<Id<Inst>> {
        let terms = self
            .master(master)
            .ok_or(DbError::Store(ldb_store::StoreError::NotFound {
                kind: "master",
                id: master.master.raw(),
            }))?
            .term_count();
        self.try_block_mut(block)?.create_inst(name, master, terms)
    }

    // GDS libraries

    pub fn create_gds_lib(&mut self, name: &str, uu_per_dbu: f64) -> DbResult<Id<GdsLib>> {
        if self.contents.gds_libs.find(|g| g.name == name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "gds_lib",
                name: name.to_string(),
            });
        }
        Ok(self.contents.gds_libs.create(GdsLib::new(name, uu_per_dbu)))
    }

    pub fn gds_libs(&self) -> &ObjectTable<GdsLib> {
        &self.contents.gds_libs
    }

    pub fn gds_lib_mut(&mut self, id: Id<GdsLib>) -> Option<&mut GdsLib> {
        self.contents.gds_libs.get_mut(id)
    }

    // Properties

    /// Attach a named property to a live top-level entity. Names are
    /// unique per target.
    pub fn create_property(
        &mut self,
        target: ObjectRef,
        name: &str,
        value: PropValue,
    ) -> DbResult<Id<Property>> {
        if !self.contains(target) {
            return Err(DbError::InvalidOperation(format!(
                "property target {target} does not exist"
            )));
        }
        if self.find_property(target, name).is_some() {
            return Err(DbError::DuplicateName {
                kind: "prop",
                name: name.to_string(),
            });
        }
        let name = self.contents.names.add(name);
        Ok(self.contents.props.create(Property {
            name,
            owner: self.unique_id,
            target,
            value,
        }))
    }

    pub fn find_property(&self, target: ObjectRef, name: &str) -> Option<Id<Property>> {
        let name = self.contents.names.find(name)?;
        self.contents
            .props
            .find(|p| p.target == target && p.name == name)
    }

    pub fn property(&self, id: Id<Property>) -> Option<&Property> {
        self.contents.props.get(id)
    }

    pub fn property_mut(&mut self, id: Id<Property>) -> Option<&mut Property> {
        self.contents.props.get_mut(id)
    }

    pub fn property_name(&self, id: Id<Property>) -> Option<&str> {
        let prop = self.contents.props.get(id)?;
        self.contents.names.name(prop.name)
    }

    /// Properties attached to `target`, in creation order.
    pub fn properties_of(&self, target: ObjectRef) -> Vec<Id<Property>> {
        self.contents
            .props
            .iter()
            .filter(|(_, p)| p.target == target)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn destroy_property(&mut self, id: Id<Property>) -> DbResult<()> {
        self.contents.props.try_get(id)?;
        if let Some(prop) = self.contents.props.destroy(id) {
            self.contents.names.release(prop.name);
        }
        Ok(())
    }

    pub fn properties(&self) -> &ObjectTable<Property> {
        &self.contents.props
    }

    pub fn names(&self) -> &NameCache {
        &self.contents.names
    }

    /// Resolve an interned name.
    pub fn name(&self, id: Id<CachedName>) -> Option<&str> {
        self.contents.names.name(id)
    }

    // Lifecycle

    /// Drop every entity and reset the schema. The unique id, logger,
    /// observers, and configuration survive. Identifiers issued before the
    /// call are invalid afterwards.
    pub fn clear(&mut self) {
        self.contents = Contents::default();
        self.magic1 = DB_MAGIC1;
        self.magic2 = DB_MAGIC2;
        self.schema = SchemaVersion::current();
        debug!(unique_id = self.unique_id, "database cleared");
    }

    // Stream

    /// Write the whole database at the current schema.
    pub fn write(&self, writer: &mut dyn Write) -> DbResult<()> {
        let mut out = OStream::new(writer);
        self.write_frame(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write at an older schema for readers of earlier releases. Fields
    /// introduced after `schema` are dropped.
    pub fn write_at_schema(&self, writer: &mut dyn Write, schema: SchemaVersion) -> DbResult<()> {
        let mut out = OStream::with_schema(writer, schema);
        self.write_frame(&mut out)?;
        out.flush()?;
        Ok(())
    }

    fn write_frame(&self, out: &mut OStream<'_>) -> DbResult<()> {
        write_frame_header(out, self.magic())?;
        out.write_u32(self.contents.master_id)?;
        out.put(&self.contents.chip)?;
        if !out.has(SchemaCheckpoint::BlockTech) {
            let legacy = self.contents.techs.ids().first().copied().unwrap_or_default();
            out.put(&legacy)?;
        }
        for kind in ObjectType::ALL {
            if table_in_stream(kind, out.schema()) {
                self.table(kind).write_table(out)?;
            }
        }
        out.put(&self.contents.names)?;
        debug!(bytes = out.position(), schema = %out.schema(), "database written");
        Ok(())
    }

    /// Replace this database's contents with a stream.
    ///
    /// The frame header is validated before anything else is read. The
    /// stream is decoded into fresh tables; on any error the database is
    /// left as it was. On success the load-time fix-ups run, the schema is
    /// set to the current one, and observers receive `post_read_db`.
    pub fn read(&mut self, reader: &mut dyn Read) -> DbResult<()> {
        let mut inp = IStream::new(reader);
        let found = read_frame_header(&mut inp, self.magic())?;

        let mut staged = Contents {
            master_id: inp.read_u32()?,
            chip: inp.get()?,
            ..Contents::default()
        };
        let legacy_tech: Option<Id<Tech>> = if inp.has(SchemaCheckpoint::BlockTech) {
            None
        } else {
            Some(inp.get()?)
        };
        for kind in ObjectType::ALL {
            if table_in_stream(kind, found) {
                staged.table_mut(kind).read_table(&mut inp)?;
            }
        }
        staged.names = NameCache::read_from(&mut inp)?;

        if !staged.chip.is_null() && !staged.chips.contains(staged.chip) {
            return Err(StreamError::Corrupt {
                offset: inp.position(),
                reason: format!("root chip {} is not in the chip table", staged.chip),
            }
            .into());
        }
        if let Some(tech) = legacy_tech {
            staged.backfill_legacy_tech(tech);
        }
        staged.rebind_property_owners(self.unique_id);

        self.contents = staged;
        self.schema = SchemaVersion::current();
        info!(
            read = %found,
            schema = %self.schema,
            techs = self.contents.techs.len(),
            libs = self.contents.libs.len(),
            "database loaded"
        );
        self.trigger_post_read_db();
        Ok(())
    }

    /// Write the database to a file.
    pub fn write_file(&self, path: &Path) -> DbResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Replace this database's contents with a file.
    pub fn read_file(&mut self, path: &Path) -> DbResult<()> {
        let mut reader = BufReader::new(File::open(path)?);
        self.read(&mut reader)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep equality of every table and the name cache. Magic words, schema,
/// unique id, logger, observers, and configuration are not compared.
impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("unique_id", &self.unique_id)
            .field("schema", &self.schema)
            .field("contents", &self.contents)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{logged_db, reload, rich_sample, sample};
    use ldb_types::{LayerType, Point};

    #[test]
    fn unique_ids_are_distinct() {
        let a = Database::new();
        let b = Database::new();
        assert_ne!(a.unique_id(), b.unique_id());
        assert_eq!(a.schema(), SchemaVersion::current());
    }

    #[test]
    fn small_design_survives_write_and_read() {
        let s = sample();
        let mut buf = Vec::new();
        s.db.write(&mut buf).unwrap();

        let (mut back, _) = logged_db();
        back.read(&mut buf.as_slice()).unwrap();

        let tech = back.find_tech("T").unwrap();
        assert_eq!(back.techs().get(tech).unwrap().dbu_per_micron, 1000);
        let lib = back.find_lib("L").unwrap();
        assert_eq!(back.libs().get(lib).unwrap().tech, tech);

        let master = back.find_master("M").unwrap();
        let m = back.master(master).unwrap();
        assert_eq!((m.width, m.height), (380, 1400));
        assert_eq!(m.term_count(), 2);
        assert_eq!(m.term_index("Y"), Some(1));

        let top = back.top_block().unwrap();
        let block = back.block(top).unwrap();
        let i1 = block.find_inst("i1").unwrap();
        assert_eq!(block.insts().get(i1).unwrap().master, master);
        assert_eq!(back.number_of_masters(), 1);
        assert_eq!(back, s.db);
    }

    #[test]
    fn rich_design_survives_write_and_read() {
        let s = rich_sample();
        let back = reload(&s.db);
        assert_eq!(back, s.db);

        let top = back.block(back.top_block().unwrap()).unwrap();
        let i1 = top.find_inst("i1").unwrap();
        assert_eq!(top.insts().get(i1).unwrap().location, Point::new(100, 200));
        let child = back.find_block("die2").unwrap();
        assert_eq!(top.children(), &[child]);
        assert_eq!(back.block(child).unwrap().parent(), back.top_block());
        assert_eq!(back.gds_libs().len(), 1);
    }

    #[test]
    fn read_rebinds_property_owners() {
        let s = rich_sample();
        let back = reload(&s.db);
        assert!(back
            .properties()
            .values()
            .all(|p| p.owner() == back.unique_id()));
        assert_ne!(back.unique_id(), s.db.unique_id());
    }

    #[test]
    fn chip_bonding_properties_share_interned_names() {
        let mut s = rich_sample();
        let chip = ObjectRef::new(ObjectType::Chip, s.db.chip_id().unwrap().raw());
        assert_eq!(s.db.properties_of(chip).len(), 3);

        let x = s.db.find_property(chip, "hybridBondX").unwrap();
        assert_eq!(s.db.property(x).unwrap().value.as_int(), Some(1));
        assert_eq!(s.db.property_name(x), Some("hybridBondX"));

        let tech = ObjectRef::new(ObjectType::Tech, s.tech.raw());
        s.db.create_property(tech, "hybridBondX", PropValue::Bool(true))
            .unwrap();
        let name = s.db.property(x).unwrap().name_id();
        assert_eq!(s.db.names().refs(name), 2);

        s.db.destroy_property(x).unwrap();
        assert_eq!(s.db.names().refs(name), 1);
        assert_eq!(s.db.find_property(chip, "hybridBondX"), None);
    }

    #[test]
    fn property_errors() {
        let mut s = sample();
        let chip = ObjectRef::new(ObjectType::Chip, s.db.chip_id().unwrap().raw());
        s.db.create_property(chip, "p", PropValue::Int(1)).unwrap();
        assert!(matches!(
            s.db.create_property(chip, "p", PropValue::Int(2)),
            Err(DbError::DuplicateName { kind: "prop", .. })
        ));
        let ghost = ObjectRef::new(ObjectType::Lib, 42);
        assert!(matches!(
            s.db.create_property(ghost, "p", PropValue::Int(2)),
            Err(DbError::InvalidOperation(_))
        ));
    }

    #[test]
    fn destroying_the_chip_drops_its_properties() {
        let mut s = rich_sample();
        s.db.destroy_chip().unwrap();
        assert!(s.db.chip().is_none());
        assert_eq!(s.db.properties().len(), 1);
        assert_eq!(s.db.names().find("hybridBondX"), None);
        assert!(matches!(s.db.destroy_chip(), Err(DbError::NoChip)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut s = sample();
        assert!(matches!(
            s.db.create_tech("T", 1),
            Err(DbError::DuplicateName { kind: "tech", .. })
        ));
        assert!(matches!(
            s.db.create_lib("L", s.tech, None),
            Err(DbError::DuplicateName { kind: "lib", .. })
        ));
        assert!(matches!(
            s.db.create_master(s.lib, "M", 1, 1),
            Err(DbError::DuplicateName { kind: "master", .. })
        ));
        assert!(matches!(
            s.db.create_block(Some(s.block), "top", s.tech),
            Err(DbError::DuplicateName { kind: "block", .. })
        ));
        assert!(matches!(s.db.create_chip(), Err(DbError::ChipExists)));
        assert!(matches!(
            s.db.create_block(None, "other", s.tech),
            Err(DbError::InvalidOperation(_))
        ));
    }

    #[test]
    fn library_delimiter_defaults_from_config() {
        let mut db = Database::with_config(DbConfig {
            default_hier_delimiter: '|',
            ..DbConfig::default()
        });
        let tech = db.create_tech("T", 1000).unwrap();
        let a = db.create_lib("a", tech, None).unwrap();
        let b = db.create_lib("b", tech, Some('.')).unwrap();
        assert_eq!(db.libs().get(a).unwrap().hier_delimiter, '|');
        assert_eq!(db.libs().get(b).unwrap().hier_delimiter, '.');
    }

    #[test]
    fn master_ids_are_minted_database_wide() {
        let mut s = sample();
        let lib2 = s.db.create_lib("L2", s.tech, None).unwrap();
        let other = s.db.create_master(lib2, "M", 1, 1).unwrap();
        assert_eq!(s.db.master(other).unwrap().master_id, 2);
        assert_eq!(s.db.number_of_masters(), 2);
        // First library in creation order wins a name lookup.
        assert_eq!(s.db.find_master("M"), Some(s.master));
    }

    #[test]
    fn unused_masters_are_removed() {
        let mut s = rich_sample();
        let spare = s.db.create_master(s.lib, "SPARE", 1, 1).unwrap();
        assert_eq!(s.db.remove_unused_masters(), 1);
        assert!(s.db.master(spare).is_none());
        assert!(s.db.master(s.master).is_some());
        assert_eq!(s.db.number_of_masters(), 2);
    }

    #[test]
    fn block_lookup_by_name() {
        let s = rich_sample();
        assert_eq!(s.db.block_by_name("top").unwrap(), s.block);
        assert!(matches!(
            s.db.block_by_name("nope"),
            Err(DbError::NameNotFound { kind: "block", .. })
        ));
    }

    #[test]
    fn instance_of_unknown_master_fails() {
        let mut s = sample();
        let ghost = MasterRef {
            lib: s.lib,
            master: Id::from_raw(7),
        };
        assert!(matches!(
            s.db.create_inst(s.block, "x", ghost),
            Err(DbError::Store(_))
        ));
    }

    #[test]
    fn altered_magic_is_rejected_before_payload() {
        let s = sample();
        let mut buf = Vec::new();
        s.db.write(&mut buf).unwrap();
        buf[0] ^= 0xFF;

        let (mut back, _) = logged_db();
        let err = back.read(&mut buf.as_slice()).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("not a layout database file"));
    }

    #[test]
    fn other_major_is_rejected() {
        let s = sample();
        let mut buf = Vec::new();
        s.db.write(&mut buf).unwrap();
        buf[8..12].copy_from_slice(&7u32.to_le_bytes());

        let (mut back, _) = logged_db();
        let err = back.read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            DbError::Stream(StreamError::IncompatibleMajor { found: 7, .. })
        ));
    }

    #[test]
    fn newer_minor_names_both_versions() {
        let s = sample();
        let mut buf = Vec::new();
        s.db.write(&mut buf).unwrap();
        let newer = SchemaVersion::current().minor + 1;
        buf[12..16].copy_from_slice(&newer.to_le_bytes());

        let (mut back, _) = logged_db();
        let message = back.read(&mut buf.as_slice()).unwrap_err().to_string();
        assert!(message.contains(&format!("0.{newer}")));
        assert!(message.contains(&SchemaVersion::current().to_string()));
    }

    #[test]
    fn failed_read_leaves_database_unchanged() {
        let s = rich_sample();
        let mut buf = Vec::new();
        s.db.write(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);

        let mut target = sample().db;
        let before = reload(&target);
        assert!(target.read(&mut buf.as_slice()).is_err());
        assert_eq!(target, before);
    }

    #[test]
    fn legacy_stream_backfills_technology() {
        let s = sample();
        let initial = SchemaVersion::new(0, SchemaCheckpoint::Initial.minor());
        let mut buf = Vec::new();
        s.db.write_at_schema(&mut buf, initial).unwrap();

        let (mut back, _) = logged_db();
        back.read(&mut buf.as_slice()).unwrap();
        assert_eq!(back.schema(), SchemaVersion::current());

        let tech = back.find_tech("T").unwrap();
        let top = back.top_block().unwrap();
        assert_eq!(back.block(top).unwrap().tech, tech);
        let lib = back.find_lib("L").unwrap();
        assert_eq!(back.libs().get(lib).unwrap().tech, tech);
        // Sizes postdate the initial minor.
        let m = back.master(back.find_master("M").unwrap()).unwrap();
        assert_eq!((m.width, m.height), (0, 0));
    }

    #[test]
    fn gds_table_is_absent_before_its_checkpoint() {
        let s = rich_sample();
        let old = SchemaVersion::new(0, SchemaCheckpoint::BlockTech.minor());
        let mut buf = Vec::new();
        s.db.write_at_schema(&mut buf, old).unwrap();

        let (mut back, _) = logged_db();
        back.read(&mut buf.as_slice()).unwrap();
        assert!(back.gds_libs().is_empty());
        assert_eq!(back.properties().len(), s.db.properties().len());
    }

    #[test]
    fn every_object_type_has_a_table() {
        let s = rich_sample();
        for kind in ObjectType::ALL {
            let table = s.db.table(kind);
            assert_eq!(table.object_type(), kind);
            assert_eq!(s.db.object_table_by_tag(kind.tag()).object_type(), kind);
        }
        assert_eq!(s.db.table(ObjectType::Property).len(), 4);
    }

    #[test]
    #[should_panic(expected = "[CRITICAL ODB-0438]")]
    fn unknown_table_tag_is_critical() {
        let (db, _) = logged_db();
        db.object_table_by_tag(99);
    }

    #[test]
    #[should_panic(expected = "[CRITICAL ODB-0432]")]
    fn single_tech_accessor_in_multi_tech_db_is_critical() {
        let s = rich_sample();
        s.db.tech();
    }

    #[test]
    fn single_tech_accessor() {
        let s = sample();
        let tech = s.db.tech().unwrap();
        assert_eq!(tech.name, "T");
        let metal1 = tech.find_layer("metal1").unwrap();
        assert_eq!(tech.layers().get(metal1).unwrap().kind, LayerType::Routing);
    }

    #[test]
    fn clear_invalidates_ids_and_keeps_identity() {
        let mut s = rich_sample();
        let id = s.db.unique_id();
        s.db.clear();
        assert_eq!(s.db.unique_id(), id);
        assert!(s.db.techs().get(s.tech).is_none());
        assert!(s.db.chip().is_none());
        assert!(s.db.names().is_empty());
        assert_eq!(s.db.number_of_masters(), 0);
        assert!(s.db.has_logger());
        assert_eq!(s.db, Database::new());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.db");
        let s = rich_sample();
        s.db.write_file(&path).unwrap();

        let (mut back, _) = logged_db();
        back.read_file(&path).unwrap();
        assert_eq!(back, s.db);
        assert!(matches!(
            back.read_file(&dir.path().join("missing.db")),
            Err(DbError::Io(_))
        ));
    }
}
