//! Process-wide table of live database roots.
//!
//! One mutex guards the table; it is taken explicitly by each of the three
//! functions below and never held across calls. Unique ids come from an
//! atomic counter independent of this lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::DbConfig;
use crate::database::Database;

/// A registered root. Lock it for exclusive access.
pub type SharedDatabase = Arc<Mutex<Database>>;

static ROOTS: Mutex<Option<HashMap<u32, SharedDatabase>>> = Mutex::new(None);

fn roots() -> MutexGuard<'static, Option<HashMap<u32, SharedDatabase>>> {
    ROOTS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_db(db: &SharedDatabase) -> MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create and register a root with the default configuration.
pub fn create() -> SharedDatabase {
    create_with_config(DbConfig::default())
}

pub fn create_with_config(config: DbConfig) -> SharedDatabase {
    let db = Database::with_config(config);
    let id = db.unique_id();
    let shared = Arc::new(Mutex::new(db));
    roots()
        .get_or_insert_with(HashMap::new)
        .insert(id, Arc::clone(&shared));
    debug!(id, "database registered");
    shared
}

/// Unregister a root. Returns `false` if it was not registered. The root
/// itself is freed when the last handle drops.
pub fn destroy(db: &SharedDatabase) -> bool {
    let id = lock_db(db).unique_id();
    let removed = roots().as_mut().and_then(|m| m.remove(&id)).is_some();
    if removed {
        debug!(id, "database unregistered");
    }
    removed
}

/// Look up a registered root by unique id.
pub fn get_database(id: u32) -> Option<SharedDatabase> {
    roots().as_ref()?.get(&id).cloned()
}

/// Number of registered roots.
pub fn count() -> usize {
    roots().as_ref().map_or(0, HashMap::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The table is process-wide and tests run in parallel, so only
    // assertions about this test's own roots are stable.
    #[test]
    fn registered_roots_are_found_until_destroyed() {
        let a = create();
        let b = create_with_config(DbConfig {
            default_hier_delimiter: '.',
            ..DbConfig::default()
        });
        let a_id = lock_db(&a).unique_id();
        let b_id = lock_db(&b).unique_id();
        assert_ne!(a_id, b_id);
        assert!(count() >= 2);

        let found = get_database(b_id).unwrap();
        assert!(Arc::ptr_eq(&found, &b));
        assert_eq!(lock_db(&found).config().default_hier_delimiter, '.');

        assert!(destroy(&a));
        assert!(!destroy(&a));
        assert!(get_database(a_id).is_none());
        assert!(get_database(b_id).is_some());
        assert!(destroy(&b));
    }

    #[test]
    fn destroyed_root_stays_usable_through_its_handle() {
        let db = create();
        destroy(&db);
        let mut guard = lock_db(&db);
        assert!(guard.create_tech("T", 100).is_ok());
    }
}
