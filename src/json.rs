//! JSON persistence for [`CorrelationIndex`].
//!
//! The document shape:
//!
//! ```json
//! {
//!   "systems": ["GIS", "OMS"],
//!   "cores": [
//!     { "id": "1", "GIS": ["G1", "G2"], "OMS": ["O5"] }
//!   ]
//! }
//! ```
//!
//! The writer drains the index through its public enumeration APIs, so no
//! internal structure crosses this boundary. Cores without any correlation
//! are omitted entirely, and empty id arrays are never emitted. The reader
//! replays the document through the public mutation APIs as an additive
//! merge: it never removes state already present in the target index.

use crate::correlator::{CorrelationError, CorrelationIndex};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const SYSTEMS_KEY: &str = "systems";
const CORES_KEY: &str = "cores";
const CORE_ID_KEY: &str = "id";

/// A persisted document that cannot be replayed into an index.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("required key '{0}' must be specified")]
    MissingKey(&'static str),
    #[error("error reading key '{0}'")]
    InvalidKey(String),
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
}

/// Failure while writing an index to the backing store.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write correlation store")]
    Io(#[source] io::Error),
}

/// Failure while reading an index from the backing store.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read correlation store")]
    Io(#[source] io::Error),
    #[error("correlation store contains malformed JSON")]
    Malformed(#[source] serde_json::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// File-backed JSON store for a [`CorrelationIndex`].
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    pretty: bool,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: false,
        }
    }

    /// Toggle pretty-printed output for subsequent writes.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the index.
    ///
    /// Do not call this directly on an index that is shared between
    /// threads; use [`crate::SharedCorrelationIndex::save`], which takes
    /// the read lock for the duration of the write.
    pub fn write(&self, index: &CorrelationIndex) -> Result<(), WriteError> {
        let document = to_document(index);
        let encoded = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .expect("a correlation document always encodes");
        fs::write(&self.path, encoded).map_err(WriteError::Io)?;
        debug!(path = %self.path.display(), "wrote correlation store");
        Ok(())
    }

    /// Merge the stored document into `index` (additive; never removes
    /// pre-existing state).
    pub fn read_into(&self, index: &mut CorrelationIndex) -> Result<(), ReadError> {
        let text = fs::read_to_string(&self.path).map_err(ReadError::Io)?;
        let document: Value = serde_json::from_str(&text).map_err(ReadError::Malformed)?;
        merge_document(&document, index)?;
        debug!(path = %self.path.display(), "read correlation store");
        Ok(())
    }

    /// Read the stored document into a fresh index.
    pub fn read(&self) -> Result<CorrelationIndex, ReadError> {
        let mut index = CorrelationIndex::new();
        self.read_into(&mut index)?;
        Ok(index)
    }
}

/// Convert an index into its persisted document.
///
/// Cores with no correlations under any system are omitted; id arrays are
/// only emitted when non-empty.
pub fn to_document(index: &CorrelationIndex) -> Value {
    let systems = index.systems();

    let mut cores = Vec::new();
    for core_id in index.cores().iter() {
        let mut correlations = Map::new();
        for system_tag in systems.iter() {
            let ids: Vec<Value> = index
                .ids_for(core_id, system_tag)
                .iter()
                .map(|id| Value::String(id.clone()))
                .collect();
            if !ids.is_empty() {
                correlations.insert(system_tag.clone(), Value::Array(ids));
            }
        }
        if correlations.is_empty() {
            continue; // id-only cores are not persisted
        }
        let mut core = Map::new();
        core.insert(
            CORE_ID_KEY.to_string(),
            Value::String(core_id.clone()),
        );
        for (tag, ids) in correlations {
            core.insert(tag, ids);
        }
        cores.push(Value::Object(core));
    }

    let mut document = Map::new();
    document.insert(
        SYSTEMS_KEY.to_string(),
        Value::Array(
            systems
                .iter()
                .map(|tag| Value::String(tag.clone()))
                .collect(),
        ),
    );
    document.insert(CORES_KEY.to_string(), Value::Array(cores));
    Value::Object(document)
}

/// Replay a persisted document into `index`.
///
/// Registers every listed system, then registers each core and replays its
/// correlations. Core-object keys that do not match a registered system are
/// ignored; in particular, correlations under a tag the target index has
/// blocked are skipped silently, since the blocked tag never registers.
pub fn merge_document(
    document: &Value,
    index: &mut CorrelationIndex,
) -> Result<(), DocumentError> {
    let systems = document
        .get(SYSTEMS_KEY)
        .ok_or(DocumentError::MissingKey(SYSTEMS_KEY))?
        .as_array()
        .ok_or_else(|| DocumentError::InvalidKey(SYSTEMS_KEY.to_string()))?;
    for tag in systems {
        let tag = tag
            .as_str()
            .ok_or_else(|| DocumentError::InvalidKey(SYSTEMS_KEY.to_string()))?;
        index.add_system(tag);
    }

    // Includes pre-existing registrations: the merge replays correlations
    // under any tag the target index knows about.
    let registered = index.systems();

    let cores = document
        .get(CORES_KEY)
        .ok_or(DocumentError::MissingKey(CORES_KEY))?
        .as_array()
        .ok_or_else(|| DocumentError::InvalidKey(CORES_KEY.to_string()))?;
    for core in cores {
        let core = core
            .as_object()
            .ok_or_else(|| DocumentError::InvalidKey(CORES_KEY.to_string()))?;
        let core_id = core
            .get(CORE_ID_KEY)
            .ok_or(DocumentError::MissingKey(CORE_ID_KEY))?
            .as_str()
            .ok_or_else(|| DocumentError::InvalidKey(CORE_ID_KEY.to_string()))?;
        index.add_core(core_id);

        for system_tag in registered.iter() {
            let Some(ids) = core.get(system_tag) else {
                continue;
            };
            let ids = ids
                .as_array()
                .ok_or_else(|| DocumentError::InvalidKey(system_tag.clone()))?;
            for id in ids {
                let id = id
                    .as_str()
                    .ok_or_else(|| DocumentError::InvalidKey(system_tag.clone()))?;
                index.add_correlation(core_id, system_tag, id)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> CorrelationIndex {
        let mut index = CorrelationIndex::new();
        index.add_system("GIS");
        index.add_system("OMS");
        index.add_core("1");
        index.add_core("2");
        index.add_correlation("1", "GIS", "G1").unwrap();
        index.add_correlation("1", "OMS", "O5").unwrap();
        index.add_correlation("2", "OMS", "O5").unwrap();
        index
    }

    /// Invariant: the writer emits every registered system, one object per
    /// correlated core, and no empty arrays or empty core objects.
    #[test]
    fn document_shape() {
        let mut index = sample_index();
        index.add_core("3"); // id-only core: must be dropped from the document

        let document = to_document(&index);
        let systems = document[SYSTEMS_KEY].as_array().expect("systems array");
        assert_eq!(systems.len(), 2);

        let cores = document[CORES_KEY].as_array().expect("cores array");
        assert_eq!(cores.len(), 2, "id-only core must be omitted");
        for core in cores {
            let core = core.as_object().expect("core object");
            assert!(core.contains_key(CORE_ID_KEY));
            for (key, value) in core {
                if key == CORE_ID_KEY {
                    continue;
                }
                let ids = value.as_array().expect("id array");
                assert!(!ids.is_empty(), "empty id arrays are never emitted");
            }
        }

        let core2 = cores
            .iter()
            .find(|c| c[CORE_ID_KEY] == "2")
            .expect("core 2 present");
        assert!(core2.get("GIS").is_none(), "no array for an uncorrelated tag");
    }

    /// Invariant: replaying a document reproduces every triple, and the
    /// merge is additive over pre-existing state.
    #[test]
    fn merge_is_additive() {
        let document = to_document(&sample_index());

        let mut target = CorrelationIndex::new();
        target.add_system("CIS");
        target.add_core("9");
        target.add_correlation("9", "CIS", "C9").unwrap();

        merge_document(&document, &mut target).expect("well-formed document");
        assert!(target.cores_for("OMS", "O5").contains("1"));
        assert!(target.cores_for("OMS", "O5").contains("2"));
        assert!(target.ids_for("1", "GIS").contains("G1"));
        assert!(
            target.ids_for("9", "CIS").contains("C9"),
            "merge must not remove pre-existing state"
        );
    }

    /// Invariant: missing required keys surface as errors naming the key.
    #[test]
    fn missing_keys_are_named() {
        let mut index = CorrelationIndex::new();

        let err = merge_document(&serde_json::json!({}), &mut index).unwrap_err();
        assert!(matches!(err, DocumentError::MissingKey(SYSTEMS_KEY)));

        let err = merge_document(&serde_json::json!({ "systems": [] }), &mut index).unwrap_err();
        assert!(matches!(err, DocumentError::MissingKey(CORES_KEY)));

        let err = merge_document(
            &serde_json::json!({ "systems": ["GIS"], "cores": [ { "GIS": ["G1"] } ] }),
            &mut index,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::MissingKey(CORE_ID_KEY)));
    }

    /// Invariant: wrong-shaped values surface as invalid-key errors naming
    /// the offending key.
    #[test]
    fn wrong_shapes_are_rejected() {
        let mut index = CorrelationIndex::new();

        let err = merge_document(&serde_json::json!({ "systems": "GIS" }), &mut index).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidKey(ref k) if k == SYSTEMS_KEY));

        let err = merge_document(
            &serde_json::json!({ "systems": ["GIS"], "cores": [ { "id": "1", "GIS": "G1" } ] }),
            &mut index,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidKey(ref k) if k == "GIS"));
    }

    /// Invariant: correlations under a blocked tag are skipped silently,
    /// because the blocked tag never registers.
    #[test]
    fn blocked_tag_is_skipped() {
        let document = to_document(&sample_index());

        let mut target = CorrelationIndex::new();
        target.add_blocked_system("GIS");
        merge_document(&document, &mut target).expect("blocked tag must not fail the merge");

        assert!(!target.systems().contains("GIS"));
        assert!(target.ids_for("1", "GIS").is_empty());
        assert!(target.cores_for("OMS", "O5").contains("1"), "other tags replay");
    }
}
