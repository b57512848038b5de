//! Shared builders for unit tests.

use std::sync::Arc;

use ldb_types::{Id, IoType, LayerType, ObjectRef, ObjectType, Point, RecordingLogger, SigType};

use crate::block::{Block, Inst};
use crate::database::Database;
use crate::library::{Lib, MasterRef};
use crate::property::PropValue;
use crate::tech::Tech;

/// A root with a recording logger installed.
pub(crate) fn logged_db() -> (Database, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::new());
    let mut db = Database::new();
    db.set_logger(logger.clone());
    (db, logger)
}

pub(crate) struct Sample {
    pub db: Database,
    pub logger: Arc<RecordingLogger>,
    pub tech: Id<Tech>,
    pub lib: Id<Lib>,
    pub master: MasterRef,
    pub block: Id<Block>,
    pub inst: Id<Inst>,
}

/// Technology "T" with one routing layer, library "L" holding master "M"
/// with pins "A" (input) and "Y" (output), a chip whose top block holds
/// instance "i1" of "M" at the origin.
pub(crate) fn sample() -> Sample {
    let (mut db, logger) = logged_db();
    let tech = db.create_tech("T", 1000).unwrap();
    db.tech_mut(tech)
        .unwrap()
        .create_layer("metal1", LayerType::Routing);
    let lib = db.create_lib("L", tech, None).unwrap();
    let master = db.create_master(lib, "M", 380, 1400).unwrap();
    {
        let m = db.master_mut(master).unwrap();
        m.create_mterm("A", IoType::Input, SigType::Signal);
        m.create_mterm("Y", IoType::Output, SigType::Signal);
    }
    db.create_chip().unwrap();
    let block = db.create_block(None, "top", tech).unwrap();
    let inst = db.create_inst(block, "i1", master).unwrap();
    Sample {
        db,
        logger,
        tech,
        lib,
        master,
        block,
        inst,
    }
}

/// The sample plus nets, a child block, a GDS library, and chip-level
/// bonding properties.
pub(crate) fn rich_sample() -> Sample {
    let mut s = sample();
    let db = &mut s.db;
    let tech2 = db.create_tech("T2", 2000).unwrap();
    db.tech_mut(tech2).unwrap().create_layer("via1", LayerType::Cut);

    let top = db.block_mut(s.block).unwrap();
    let net = top.create_net("n1", SigType::Signal).unwrap();
    top.connect(s.inst, 1, net).unwrap();
    top.set_inst_location(s.inst, Point::new(100, 200)).unwrap();
    let child = db.create_block(Some(s.block), "die2", tech2).unwrap();
    db.create_inst(child, "u1", s.master).unwrap();

    let gds = db.create_gds_lib("io_ring", 0.001).unwrap();
    db.gds_lib_mut(gds).unwrap().structures.push("PAD".to_string());

    let chip = ObjectRef::new(ObjectType::Chip, db.chip_id().unwrap().raw());
    db.create_property(chip, "hybridBondX", PropValue::Int(1)).unwrap();
    db.create_property(chip, "hybridBondY", PropValue::Int(2)).unwrap();
    db.create_property(chip, "hybridBondSpacing", PropValue::Double(9.5))
        .unwrap();
    let tech_ref = ObjectRef::new(ObjectType::Tech, s.tech.raw());
    db.create_property(tech_ref, "vendor", PropValue::String("acme".into()))
        .unwrap();
    s
}

/// Serialize and load into a fresh root.
pub(crate) fn reload(db: &Database) -> Database {
    let mut buf = Vec::new();
    db.write(&mut buf).unwrap();
    let (mut back, _) = logged_db();
    back.read(&mut buf.as_slice()).unwrap();
    back
}
