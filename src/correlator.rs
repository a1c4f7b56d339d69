//! Bidirectional id correlation between a central system and its peripheral
//! systems.
//!
//! The index keeps two coupled directional mappings:
//!
//! - per core id, a private map of system tag -> peripheral ids, and
//! - per system tag, a reverse index of peripheral id -> core ids.
//!
//! Every mutation maintains the two as mirror images: a triple
//! `(core, tag, peripheral)` reachable from the core's private map is always
//! present in the reverse index for `(tag, peripheral)`, and vice versa.
//! Relationships are deliberately permissive: many cores may share one
//! peripheral id and one core may carry many, with structural dedup by set
//! semantics as the only constraint.

use crate::compact_map::CompactMap;
use crate::compact_set::CompactSet;
use thiserror::Error;
use tracing::debug;

/// System tag that can never be registered: persisted correlation documents
/// use it as the core-id key inside each core object.
pub const RESERVED_SYSTEM_TAG: &str = "id";

type IdSet = CompactSet<String>;
// Peripheral id -> core ids correlated to it (one system's reverse index).
type ReverseIndex = CompactMap<String, IdSet>;
// System tag -> peripheral ids one core is correlated to.
type TaggedIds = CompactMap<String, IdSet>;

/// Failure surfaced by [`CorrelationIndex::add_correlation`]. Both variants
/// indicate the caller skipped a registration step, so no partial mutation
/// is left behind.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CorrelationError {
    #[error("unknown system tag '{0}'")]
    UnknownSystem(String),
    #[error("unknown core id '{0}'")]
    UnknownCore(String),
}

/// In-memory id correlator over the compact containers.
///
/// Single-threaded by design: no internal synchronization, no operation
/// blocks, and every query returns a defensive copy. Wrap it in
/// [`crate::SharedCorrelationIndex`] for concurrent use.
#[derive(Debug, Default)]
pub struct CorrelationIndex {
    cores: CompactMap<String, TaggedIds>,
    systems: CompactMap<String, ReverseIndex>,
    blocked: CompactSet<String>,
}

impl CorrelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peripheral system; `false` when the tag is blocked,
    /// reserved, or already registered.
    pub fn add_system(&mut self, system_tag: &str) -> bool {
        if self.blocked.contains(system_tag) || system_tag == RESERVED_SYSTEM_TAG {
            debug!(system = system_tag, "rejected system registration");
            return false;
        }
        if self.systems.contains_key(system_tag) {
            return false;
        }
        self.systems
            .insert(system_tag.to_string(), ReverseIndex::new());
        debug!(system = system_tag, "registered peripheral system");
        true
    }

    /// Drop a system and every correlation under it, on both sides of the
    /// index. Idempotent on unknown tags.
    pub fn remove_system(&mut self, system_tag: &str) {
        for tagged in self.cores.values_mut() {
            tagged.remove(system_tag);
        }
        if self.systems.remove(system_tag).is_some() {
            debug!(system = system_tag, "removed peripheral system");
        }
    }

    /// Block a tag from future registration. Does not retroactively remove
    /// an already-registered system.
    pub fn add_blocked_system(&mut self, system_tag: &str) {
        self.blocked.insert(system_tag.to_string());
    }

    /// Allow a previously blocked tag to register again.
    pub fn remove_blocked_system(&mut self, system_tag: &str) {
        self.blocked.remove(system_tag);
    }

    /// Register a core id; `false` when already registered.
    pub fn add_core(&mut self, core_id: &str) -> bool {
        if self.cores.contains_key(core_id) {
            return false;
        }
        self.cores.insert(core_id.to_string(), TaggedIds::new());
        true
    }

    /// Drop a core and remove it from every reverse entry it appears in,
    /// deleting reverse entries that become empty. The system itself stays
    /// registered even when its reverse index empties; only
    /// [`CorrelationIndex::remove_system`] unregisters. No-op on unknown
    /// ids.
    pub fn remove_core(&mut self, core_id: &str) {
        let Some(tagged) = self.cores.remove(core_id) else {
            return;
        };
        for (system_tag, peripheral_ids) in tagged.iter() {
            let Some(reverse) = self.systems.get_mut(system_tag) else {
                continue;
            };
            for peripheral_id in peripheral_ids.iter() {
                let now_empty = match reverse.get_mut(peripheral_id) {
                    Some(cores) => {
                        cores.remove(core_id);
                        cores.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    reverse.remove(peripheral_id);
                }
            }
        }
        debug!(core = core_id, "removed core id");
    }

    /// Correlate `core_id` with `peripheral_id` under `system_tag`.
    ///
    /// Both the system and the core must already be registered; failure
    /// leaves the index untouched. Many-to-many relationships are allowed.
    pub fn add_correlation(
        &mut self,
        core_id: &str,
        system_tag: &str,
        peripheral_id: &str,
    ) -> Result<(), CorrelationError> {
        if !self.systems.contains_key(system_tag) {
            return Err(CorrelationError::UnknownSystem(system_tag.to_string()));
        }
        if !self.cores.contains_key(core_id) {
            return Err(CorrelationError::UnknownCore(core_id.to_string()));
        }

        let reverse = self
            .systems
            .get_mut(system_tag)
            .expect("validated system tag must be present");
        reverse
            .get_or_insert_with(peripheral_id.to_string(), IdSet::new)
            .insert(core_id.to_string());

        let tagged = self
            .cores
            .get_mut(core_id)
            .expect("validated core id must be present");
        tagged
            .get_or_insert_with(system_tag.to_string(), IdSet::new)
            .insert(peripheral_id.to_string());
        Ok(())
    }

    /// Drop one peripheral id from the whole index: out of every core's
    /// private map (pruning per-tag sets that empty) and out of the
    /// system's reverse index. Idempotent on unknown ids.
    pub fn remove_id(&mut self, system_tag: &str, peripheral_id: &str) {
        for tagged in self.cores.values_mut() {
            let emptied = match tagged.get_mut(system_tag) {
                Some(ids) => {
                    ids.remove(peripheral_id);
                    ids.is_empty()
                }
                None => false,
            };
            if emptied {
                tagged.remove(system_tag);
            }
        }
        if let Some(reverse) = self.systems.get_mut(system_tag) {
            reverse.remove(peripheral_id);
        }
    }

    /// Core ids correlated to `peripheral_id` under `system_tag`; a fresh
    /// copy, empty when either is unknown.
    pub fn cores_for(&self, system_tag: &str, peripheral_id: &str) -> CompactSet<String> {
        self.systems
            .get(system_tag)
            .and_then(|reverse| reverse.get(peripheral_id))
            .map(|cores| cores.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Peripheral ids correlated to `core_id` under `system_tag`; a fresh
    /// copy, empty when either is unknown.
    pub fn ids_for(&self, core_id: &str, system_tag: &str) -> CompactSet<String> {
        if !self.systems.contains_key(system_tag) {
            return CompactSet::new();
        }
        self.cores
            .get(core_id)
            .and_then(|tagged| tagged.get(system_tag))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Fresh copy of the registered system tags.
    pub fn systems(&self) -> CompactSet<String> {
        self.systems.keys().cloned().collect()
    }

    /// Fresh copy of the registered core ids.
    pub fn cores(&self) -> CompactSet<String> {
        self.cores.keys().cloned().collect()
    }
}
