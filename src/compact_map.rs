//! CompactMap: map facade over the slot-array engine, with detached entry
//! handles that survive resizes by re-probing.

use crate::table::{Entries, EntriesMut, Table};
use core::borrow::Borrow;
use core::cell::Cell;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;

/// A hash map that stores entries in a single flat slot array.
///
/// Compared to `std::collections::HashMap` the backing storage is leaner:
/// one tri-state slot per bucket, no per-entry metadata beyond the slot tag.
/// The trade-off is a hard 0.5 load-factor target, so lookups stay short.
///
/// Entry access through [`EntryRef`] is deliberately tolerant: a handle that
/// has gone stale (its entry removed, or displaced by a resize) degrades to
/// absence instead of failing. The set flavor ([`crate::CompactSet`]) makes
/// the opposite choice for its cursor; see [`crate::SetCursor`].
pub struct CompactMap<K, V, S = RandomState> {
    table: Table<K, V, S>,
}

impl<K, V> CompactMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl<K, V> Default for CompactMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CompactMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Current slot count; always a power of two, at least one.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Reset to the minimal single-slot table, dropping every entry.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Live view over entries, backed directly by the slot array.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.iter(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.iter(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }
}

impl<K, V, S> CompactMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: Table::with_hasher(hasher),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.table.find(key)?;
        self.table.value_at(index)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.table.find(key)?;
        self.table.value_at_mut(index)
    }

    /// Insert or overwrite, returning the previous value on overwrite.
    ///
    /// # Panics
    ///
    /// Panics when the table is at its hard capacity ceiling.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(key)
    }

    /// Mutable access to the value for `key`, inserting `default()` first
    /// when absent. The constructor only runs on insertion.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        K: Clone,
        F: FnOnce() -> V,
    {
        if !self.table.contains(&key) {
            self.table.insert(key.clone(), default());
        }
        let index = self
            .table
            .find(&key)
            .expect("entry must exist immediately after insert");
        self.table
            .value_at_mut(index)
            .expect("found slot must be occupied")
    }

    /// A detached handle for the entry at `key`, or `None` when absent.
    ///
    /// The handle owns a copy of the key plus a cached slot index and a
    /// version snapshot; it re-probes after the map has resized and verifies
    /// the cached slot still holds an equal key on every access.
    pub fn entry(&self, key: &K) -> Option<EntryRef<K>>
    where
        K: Clone,
    {
        let index = self.table.find(key)?;
        Some(EntryRef {
            key: key.clone(),
            index: Cell::new(Some(index)),
            version: Cell::new(self.table.version()),
        })
    }
}

impl<K, V, S> fmt::Debug for CompactMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for CompactMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for CompactMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for CompactMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for CompactMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a CompactMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached handle to one map entry, in the style of a remembered slot.
///
/// All accessors take the owning map as an argument. Before each access the
/// handle compares its version snapshot against the map's and re-probes for
/// its key when the map has resized in between; an entry that is gone reads
/// as `None`. A `put` overwriting the same key is visible through an
/// outstanding handle, since reads always go through the current slot.
pub struct EntryRef<K> {
    key: K,
    index: Cell<Option<usize>>,
    version: Cell<u64>,
}

impl<K> EntryRef<K>
where
    K: Eq + Hash,
{
    /// The handle's owned copy of the entry key.
    pub fn key(&self) -> &K {
        &self.key
    }

    fn locate<V, S>(&self, map: &CompactMap<K, V, S>) -> Option<usize>
    where
        S: BuildHasher,
    {
        if self.version.get() != map.table.version() {
            self.version.set(map.table.version());
            self.index.set(map.table.find(&self.key));
        }
        let index = self.index.get()?;
        match map.table.key_at(index) {
            Some(k) if *k == self.key => Some(index),
            _ => None,
        }
    }

    /// Borrow the entry's current value, or `None` once the entry is gone.
    pub fn get<'a, V, S>(&self, map: &'a CompactMap<K, V, S>) -> Option<&'a V>
    where
        S: BuildHasher,
    {
        let index = self.locate(map)?;
        map.table.value_at(index)
    }

    /// Overwrite the entry's value, returning the previous one, or `None`
    /// (without inserting) once the entry is gone.
    pub fn set<V, S>(&self, map: &mut CompactMap<K, V, S>, value: V) -> Option<V>
    where
        S: BuildHasher,
    {
        let index = self.locate(map)?;
        map.table
            .value_at_mut(index)
            .map(|slot| mem::replace(slot, value))
    }
}

/// Iterator over `(&K, &V)` pairs in slot order.
pub struct Iter<'a, K, V> {
    inner: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Iterator over map keys in slot order.
pub struct Keys<'a, K, V> {
    inner: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// Iterator over map values in slot order.
pub struct Values<'a, K, V> {
    inner: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// Iterator over mutable map values in slot order.
pub struct ValuesMut<'a, K, V> {
    inner: EntriesMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}
