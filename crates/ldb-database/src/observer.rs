use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use ldb_types::Id;
use tracing::debug;

use crate::block::Block;
use crate::database::Database;
use crate::error::DbResult;
use crate::library::Lib;
use crate::tech::Tech;

/// Listener for database load milestones.
///
/// Every method has an empty default so observers implement only what they
/// care about.
pub trait DatabaseObserver: Send {
    /// Receives a handle that removes this observer from its database, or
    /// `None` once it has been removed.
    fn set_unregister(&mut self, _handle: Option<ObserverHandle>) {}

    /// A technology description and its library were loaded.
    fn post_read_lef(&mut self, _tech: &Tech, _lib: &Lib) {}

    /// A full design description was loaded into `block`.
    fn post_read_def(&mut self, _block: &Block) {}

    /// A floorplan-only design description was loaded into `block`.
    fn post_read_floorplan_def(&mut self, _block: &Block) {}

    /// A whole serialized database was loaded.
    fn post_read_db(&mut self, _db: &Database) {}
}

pub type SharedObserver = Arc<Mutex<dyn DatabaseObserver>>;

/// Registration key of one observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Registered = Vec<(ObserverId, SharedObserver)>;

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// De-registration callback handed to an observer.
///
/// Holds only a weak reference, so it does nothing once the database is
/// gone.
#[derive(Clone)]
pub struct ObserverHandle {
    id: ObserverId,
    list: Weak<Mutex<Registered>>,
}

impl ObserverHandle {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Remove the observer from its database. Returns `false` if it was
    /// already gone.
    pub fn unregister(&self) -> bool {
        let Some(list) = self.list.upgrade() else {
            return false;
        };
        let mut entries = lock(&*list);
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        entries.len() != before
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle").field("id", &self.id).finish()
    }
}

/// Observers of one database in registration order.
#[derive(Default)]
pub(crate) struct ObserverList {
    entries: Arc<Mutex<Registered>>,
    next: u64,
}

impl ObserverList {
    fn add(&mut self, observer: SharedObserver) -> ObserverHandle {
        self.next += 1;
        let id = ObserverId(self.next);
        lock(&*self.entries).push((id, observer));
        ObserverHandle {
            id,
            list: Arc::downgrade(&self.entries),
        }
    }

    fn remove(&mut self, id: ObserverId) -> Option<SharedObserver> {
        let mut entries = lock(&*self.entries);
        let pos = entries.iter().position(|(o, _)| *o == id)?;
        Some(entries.remove(pos).1)
    }

    /// Registered observers, copied so none of the list lock is held while
    /// they run.
    fn snapshot(&self) -> Vec<SharedObserver> {
        lock(&*self.entries).iter().map(|(_, o)| Arc::clone(o)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        lock(&*self.entries).len()
    }
}

impl Database {
    /// Register an observer and hand it its de-registration handle.
    pub fn add_observer(&mut self, observer: SharedObserver) -> ObserverId {
        let handle = self.observers.add(Arc::clone(&observer));
        let id = handle.id();
        lock(&*observer).set_unregister(Some(handle));
        debug!(?id, "observer added");
        id
    }

    /// Unregister an observer and clear its handle. Returns `false` if it
    /// was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(id) {
            Some(observer) => {
                lock(&*observer).set_unregister(None);
                debug!(?id, "observer removed");
                true
            }
            None => false,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Notify observers that `tech` and `lib` were loaded.
    pub fn trigger_post_read_lef(&self, tech: Id<Tech>, lib: Id<Lib>) -> DbResult<()> {
        let tech = self.contents.techs.try_get(tech)?;
        let lib = self.contents.libs.try_get(lib)?;
        for observer in self.observers.snapshot() {
            lock(&*observer).post_read_lef(tech, lib);
        }
        Ok(())
    }

    /// Notify observers that a design was loaded into `block`. A floorplan
    /// load calls `post_read_floorplan_def`, a full load `post_read_def`.
    pub fn trigger_post_read_def(&self, block: Id<Block>, floorplan: bool) -> DbResult<()> {
        let block = self.try_block(block)?;
        for observer in self.observers.snapshot() {
            let mut o = lock(&*observer);
            if floorplan {
                o.post_read_floorplan_def(block);
            } else {
                o.post_read_def(block);
            }
        }
        Ok(())
    }

    /// Notify observers that this database was read from a stream.
    pub fn trigger_post_read_db(&self) {
        for observer in self.observers.snapshot() {
            lock(&*observer).post_read_db(self);
        }
    }
}
