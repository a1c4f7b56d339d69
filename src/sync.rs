//! Read/write-locked facade over [`CorrelationIndex`].

use crate::compact_set::CompactSet;
use crate::correlator::{CorrelationError, CorrelationIndex};
use crate::json::{JsonStore, ReadError, WriteError};
use parking_lot::RwLock;

/// A [`CorrelationIndex`] behind a single coarse read/write lock.
///
/// Composition, not inheritance: the unsynchronized index is owned whole,
/// and every public operation acquires the lock, delegates, and releases on
/// every exit path via the RAII guard, including panics in the delegate.
/// Queries take the shared lock; mutations take the exclusive lock.
/// Persisting via [`SharedCorrelationIndex::save`] takes the shared lock,
/// so serialization observes a consistent snapshot without blocking other
/// readers; [`SharedCorrelationIndex::load`] mutates and takes the
/// exclusive lock.
#[derive(Debug, Default)]
pub struct SharedCorrelationIndex {
    inner: RwLock<CorrelationIndex>,
}

impl SharedCorrelationIndex {
    pub fn new(index: CorrelationIndex) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    /// Recover the unsynchronized index.
    pub fn into_inner(self) -> CorrelationIndex {
        self.inner.into_inner()
    }

    pub fn add_system(&self, system_tag: &str) -> bool {
        self.inner.write().add_system(system_tag)
    }

    pub fn remove_system(&self, system_tag: &str) {
        self.inner.write().remove_system(system_tag)
    }

    pub fn add_blocked_system(&self, system_tag: &str) {
        self.inner.write().add_blocked_system(system_tag)
    }

    pub fn remove_blocked_system(&self, system_tag: &str) {
        self.inner.write().remove_blocked_system(system_tag)
    }

    pub fn add_core(&self, core_id: &str) -> bool {
        self.inner.write().add_core(core_id)
    }

    pub fn remove_core(&self, core_id: &str) {
        self.inner.write().remove_core(core_id)
    }

    pub fn add_correlation(
        &self,
        core_id: &str,
        system_tag: &str,
        peripheral_id: &str,
    ) -> Result<(), CorrelationError> {
        self.inner
            .write()
            .add_correlation(core_id, system_tag, peripheral_id)
    }

    pub fn remove_id(&self, system_tag: &str, peripheral_id: &str) {
        self.inner.write().remove_id(system_tag, peripheral_id)
    }

    pub fn cores_for(&self, system_tag: &str, peripheral_id: &str) -> CompactSet<String> {
        self.inner.read().cores_for(system_tag, peripheral_id)
    }

    pub fn ids_for(&self, core_id: &str, system_tag: &str) -> CompactSet<String> {
        self.inner.read().ids_for(core_id, system_tag)
    }

    pub fn systems(&self) -> CompactSet<String> {
        self.inner.read().systems()
    }

    pub fn cores(&self) -> CompactSet<String> {
        self.inner.read().cores()
    }

    /// Persist under the shared lock: the store sees a consistent snapshot
    /// while other readers proceed.
    pub fn save(&self, store: &JsonStore) -> Result<(), WriteError> {
        let guard = self.inner.read();
        store.write(&guard)
    }

    /// Merge the stored document under the exclusive lock.
    pub fn load(&self, store: &JsonStore) -> Result<(), ReadError> {
        let mut guard = self.inner.write();
        store.read_into(&mut guard)
    }
}

impl From<CorrelationIndex> for SharedCorrelationIndex {
    fn from(index: CorrelationIndex) -> Self {
        Self::new(index)
    }
}
