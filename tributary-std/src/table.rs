//! Registration table.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tributary_core::{DispatchError, DynHandler, Event};

/// Maps event names to handlers.
///
/// Registration happens on caller tasks while lookups happen on the dispatch
/// task, so the map sits behind a lock. Lookups clone the handler's `Arc` and
/// release the lock before the handler runs.
///
/// Once [`seal`](Self::seal)ed the table is empty for good and rejects
/// inserts with [`DispatchError::Closed`].
pub struct HandlerTable<E: Event> {
    inner: RwLock<Inner<E>>,
}

struct Inner<E: Event> {
    handlers: HashMap<String, Arc<dyn DynHandler<E>>>,
    sealed: bool,
}

impl<E: Event> HandlerTable<E> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                handlers: HashMap::new(),
                sealed: false,
            }),
        }
    }

    /// Insert or replace the handler for `name`.
    ///
    /// Returns the replaced handler, if any.
    pub fn insert(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn DynHandler<E>>,
    ) -> Result<Option<Arc<dyn DynHandler<E>>>, DispatchError> {
        let mut inner = self.write();
        if inner.sealed {
            return Err(DispatchError::Closed);
        }
        Ok(inner.handlers.insert(name.into(), handler))
    }

    /// Remove the handler for `name`. Returns whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.write().handlers.remove(name).is_some()
    }

    /// Look up the handler for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DynHandler<E>>> {
        self.read().handlers.get(name).cloned()
    }

    /// Whether a handler is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().handlers.contains_key(name)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.read().handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handler and reject further inserts.
    ///
    /// Returns `true` for the call that actually sealed the table.
    pub fn seal(&self) -> bool {
        let mut inner = self.write();
        if inner.sealed {
            return false;
        }
        inner.sealed = true;
        inner.handlers.clear();
        true
    }

    /// Whether the table has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.read().sealed
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Inner<E>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<E>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event> Default for HandlerTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for HandlerTable<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        let mut names: Vec<_> = inner.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerTable")
            .field("handlers", &names)
            .field("sealed", &inner.sealed)
            .finish()
    }
}
