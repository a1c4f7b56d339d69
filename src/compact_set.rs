//! CompactSet: set facade over the slot-array engine, with a fail-fast
//! versioned cursor for mutating walks.

use crate::table::{Entries, Table};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use thiserror::Error;

/// A hash set that stores elements in a single flat slot array.
///
/// The set's version advances on every structural mutation (insert, remove,
/// clear, resize). An outstanding [`SetCursor`] checks that version on every
/// step and fails fast with [`CursorError::Invalidated`] when the set changed
/// under it, the opposite policy to the map's tolerant [`crate::EntryRef`].
/// Removal *through* the cursor is the sanctioned mutation during a walk: it
/// tombstones in place without shrinking, so the cursor's forward scan stays
/// valid.
pub struct CompactSet<T, S = RandomState> {
    table: Table<T, (), S>,
}

/// Failure surfaced by [`SetCursor`] operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CursorError {
    /// The set changed structurally since the cursor was created.
    #[error("set changed structurally while a cursor was outstanding")]
    Invalidated,
    /// The cursor has no current element (never advanced, or the current
    /// element was already removed).
    #[error("cursor has no current element to remove")]
    NoCurrent,
}

impl<T> CompactSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl<T> Default for CompactSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> CompactSet<T, S> {
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

    /// Reset to the minimal single-slot table, dropping every element.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Live view over elements, backed directly by the slot array.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// A detached cursor positioned before the first element.
    pub fn cursor(&self) -> SetCursor {
        SetCursor {
            version: self.table.version(),
            next_index: 0,
            current: None,
        }
    }
}

impl<T, S> CompactSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: Table::with_hasher(hasher),
        }
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(value)
    }

    /// Add an element; `false` when it was already present.
    ///
    /// # Panics
    ///
    /// Panics when the table is at its hard capacity ceiling.
    pub fn insert(&mut self, value: T) -> bool {
        if self.table.insert(value, ()).is_some() {
            return false;
        }
        self.table.bump_version();
        true
    }

    /// Remove an element; `false` when it was not present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.table.remove(value).is_none() {
            return false;
        }
        self.table.bump_version();
        true
    }
}

impl<T, S> fmt::Debug for CompactSet<T, S>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> PartialEq for CompactSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, S> Eq for CompactSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

impl<T, S> FromIterator<T> for CompactSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for CompactSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> IntoIterator for &'a CompactSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over set elements in slot order.
pub struct Iter<'a, T> {
    inner: Entries<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }
}

/// Detached, version-stamped cursor over a [`CompactSet`].
///
/// Every operation takes the set as an argument and first compares the
/// cursor's version snapshot against the set's; a mismatch means the set
/// was structurally mutated elsewhere while the walk was in progress, and
/// the cursor refuses to continue. [`SetCursor::remove`] is exempt from
/// causing invalidation: it tombstones the current slot directly, bypassing
/// the shrink policy, precisely so the forward scan stays coherent.
pub struct SetCursor {
    version: u64,
    next_index: usize,
    current: Option<usize>,
}

impl SetCursor {
    fn check<T, S>(&self, set: &CompactSet<T, S>) -> Result<(), CursorError> {
        if self.version != set.table.version() {
            return Err(CursorError::Invalidated);
        }
        Ok(())
    }

    /// Whether another element remains ahead of the cursor.
    pub fn has_next<T, S>(&mut self, set: &CompactSet<T, S>) -> Result<bool, CursorError> {
        self.check(set)?;
        match set.table.next_occupied(self.next_index) {
            Some(index) => {
                self.next_index = index;
                Ok(true)
            }
            None => {
                self.next_index = set.table.capacity();
                Ok(false)
            }
        }
    }

    /// Advance to the next element, or `Ok(None)` when exhausted.
    pub fn next<'a, T, S>(
        &mut self,
        set: &'a CompactSet<T, S>,
    ) -> Result<Option<&'a T>, CursorError> {
        self.check(set)?;
        match set.table.next_occupied(self.next_index) {
            Some(index) => {
                self.current = Some(index);
                self.next_index = index + 1;
                Ok(set.table.key_at(index))
            }
            None => Ok(None),
        }
    }

    /// Remove the element the cursor currently rests on.
    ///
    /// Tombstones in place and decrements the size without evaluating the
    /// shrink policy or advancing the version, so both this cursor and the
    /// set stay coherent for the rest of the walk.
    pub fn remove<T, S>(&mut self, set: &mut CompactSet<T, S>) -> Result<(), CursorError> {
        self.check(set)?;
        let index = self.current.ok_or(CursorError::NoCurrent)?;
        if !set.table.remove_at(index) {
            return Err(CursorError::NoCurrent);
        }
        Ok(())
    }
}
