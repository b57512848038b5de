use ldb_types::ObjectType;

/// Anything stored in an [`ObjectTable`](crate::ObjectTable).
pub trait Entity {
    /// Lowercase kind name used in diagnostics and reports.
    const KIND: &'static str;
}

/// Entities held directly by the database root, reachable by type tag.
pub trait TopLevelEntity: Entity {
    const OBJECT_TYPE: ObjectType;
}
