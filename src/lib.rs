//! compact-correlator: memory-compact associative containers plus a
//! bidirectional id-correlation index built on top of them.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: correlate identifiers between a central system (core ids) and
//!   any number of peripheral systems (peripheral ids, scoped per system
//!   tag), on top of containers that keep per-entry storage at one flat
//!   slot per bucket.
//! - Layers:
//!   - Table<K, V, S> (internal): open-addressing slot-array engine with
//!     tombstone deletion, doubling/halving resize with hysteresis, and a
//!     version counter for detecting structural change under detached
//!     accessors.
//!   - CompactMap<K, V, S> / CompactSet<T, S>: typed map/set facades over
//!     the engine. The map hands out re-probing `EntryRef` handles that
//!     tolerate staleness; the set hands out a version-stamped `SetCursor`
//!     that fails fast on concurrent structural change.
//!   - CorrelationIndex: the correlator: two coupled directional mappings
//!     (core -> tag -> peripheral ids, and tag -> peripheral -> core ids)
//!     kept as mirror images through every mutation, plus a registration
//!     blocklist owned by the index.
//!   - SharedCorrelationIndex: coarse read/write-lock composition for
//!     concurrent use; JsonStore: file-backed JSON persistence that drains
//!     and replays the index through its public API.
//!
//! Constraints
//! - The containers and the correlator are single-threaded: no internal
//!   synchronization; concurrency is the facade's job.
//! - Capacity is always a power of two with at least one empty slot; the
//!   live load factor is kept at or below one half.
//! - Query results are defensive copies; callers never observe internal
//!   storage.
//!
//! Why this split?
//! - Localize invariants: the engine owns slot-state and resize
//!   accounting, the facades own the staleness policies, the correlator
//!   owns the mirror invariant. Each layer has a small, precise contract.
//! - The two staleness policies intentionally differ per container flavor:
//!   map entry handles degrade to absence (live-view semantics), set
//!   cursors refuse to continue (fail-fast semantics).
//!
//! Notes and non-goals
//! - Not tuned for deletion-heavy workloads that never grow again; the
//!   table shrinks on demand instead.
//! - Correlations are permissively many-to-many; only set semantics dedup
//!   them.
//! - Persistence omits cores that have no correlations; an id-only core is
//!   valid, queryable in-memory state that a write/read cycle drops.

pub mod compact_map;
pub mod compact_set;
mod correlator;
mod json;
mod sync;
mod table;
mod table_proptest;

// Public surface
pub use compact_map::{CompactMap, EntryRef};
pub use compact_set::{CompactSet, CursorError, SetCursor};
pub use correlator::{CorrelationError, CorrelationIndex, RESERVED_SYSTEM_TAG};
pub use json::{merge_document, to_document, DocumentError, JsonStore, ReadError, WriteError};
pub use sync::SharedCorrelationIndex;
