// JsonStore persistence test suite.
//
// Round-trip equality is checked with a deep structural comparator over
// all cores x systems, since slot order (and therefore array order in the
// document) is hasher-dependent.
use compact_correlator::{
    CorrelationIndex, DocumentError, JsonStore, ReadError,
};
use tempfile::tempdir;

fn populated_index() -> CorrelationIndex {
    let mut index = CorrelationIndex::new();
    for tag in ["GIS", "DMS", "OMS", "CIS"] {
        index.add_system(tag);
    }
    for core in ["1", "2", "3"] {
        index.add_core(core);
    }
    index.add_correlation("1", "CIS", "C1").unwrap();
    index.add_correlation("2", "CIS", "C1").unwrap();
    index.add_correlation("2", "GIS", "G2").unwrap();
    index.add_correlation("2", "OMS", "O5").unwrap();
    index.add_correlation("2", "OMS", "O6").unwrap();
    index.add_correlation("3", "DMS", "D3").unwrap();
    index
}

// Deep comparison of every queryable triple in `expected` against `actual`,
// in both directions.
fn assert_same_correlations(expected: &CorrelationIndex, actual: &CorrelationIndex) {
    assert_eq!(expected.systems(), actual.systems());
    for core in expected.cores().iter() {
        for system in expected.systems().iter() {
            assert_eq!(
                expected.ids_for(core, system),
                actual.ids_for(core, system),
                "ids for ({core}, {system}) differ"
            );
            for id in expected.ids_for(core, system).iter() {
                assert_eq!(
                    expected.cores_for(system, id),
                    actual.cores_for(system, id),
                    "cores for ({system}, {id}) differ"
                );
            }
        }
    }
}

// Test: write-then-read reproduces every correlation.
#[test]
fn round_trip_preserves_correlations() {
    let dir = tempdir().expect("temp dir");
    let store = JsonStore::new(dir.path().join("correlations.json"));

    let index = populated_index();
    store.write(&index).expect("write");
    let reread = store.read().expect("read");

    assert_same_correlations(&index, &reread);
}

// Test: pretty output remains a valid document and round-trips equally.
#[test]
fn pretty_round_trip() {
    let dir = tempdir().expect("temp dir");
    let store = JsonStore::new(dir.path().join("pretty.json")).with_pretty(true);

    let index = populated_index();
    store.write(&index).expect("write");

    let text = std::fs::read_to_string(store.path()).expect("readable file");
    assert!(text.contains('\n'), "pretty output is multi-line");

    let reread = store.read().expect("read");
    assert_same_correlations(&index, &reread);
}

// Test: a core registered without correlations survives in memory but is
// dropped by a write/read cycle. This asymmetry is intentional: the writer
// omits cores with no correlations.
#[test]
fn id_only_cores_do_not_round_trip() {
    let dir = tempdir().expect("temp dir");
    let store = JsonStore::new(dir.path().join("cores.json"));

    let mut index = populated_index();
    index.add_core("lonely");
    assert!(index.cores().contains("lonely"));

    store.write(&index).expect("write");
    let reread = store.read().expect("read");

    assert!(!reread.cores().contains("lonely"));
    assert_eq!(reread.cores().len(), 3);
}

// Test: reading merges into existing state without removing it.
#[test]
fn read_into_is_additive() {
    let dir = tempdir().expect("temp dir");
    let store = JsonStore::new(dir.path().join("merge.json"));
    store.write(&populated_index()).expect("write");

    let mut target = CorrelationIndex::new();
    target.add_system("SCADA");
    target.add_core("7");
    target.add_correlation("7", "SCADA", "S7").unwrap();

    store.read_into(&mut target).expect("read");

    assert!(target.ids_for("7", "SCADA").contains("S7"), "existing state kept");
    assert!(target.cores_for("CIS", "C1").contains("1"), "stored state merged");
    assert!(target.systems().contains("SCADA"));
    assert!(target.systems().contains("CIS"));
}

// Test: I/O failures surface as the read-error flavor wrapping the cause.
#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("temp dir");
    let store = JsonStore::new(dir.path().join("does-not-exist.json"));

    let mut index = CorrelationIndex::new();
    match store.read_into(&mut index) {
        Err(ReadError::Io(_)) => {}
        other => panic!("expected ReadError::Io, got {other:?}"),
    }
}

// Test: malformed JSON surfaces as a distinct parse failure.
#[test]
fn malformed_json_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write fixture");

    match JsonStore::new(&path).read() {
        Err(ReadError::Malformed(_)) => {}
        other => panic!("expected ReadError::Malformed, got {other:?}"),
    }
}

// Test: documents missing required keys are rejected with the key named.
#[test]
fn missing_required_keys_are_rejected() {
    let dir = tempdir().expect("temp dir");

    let no_systems = dir.path().join("no_systems.json");
    std::fs::write(&no_systems, r#"{ "cores": [] }"#).expect("write fixture");
    match JsonStore::new(&no_systems).read() {
        Err(ReadError::Document(DocumentError::MissingKey("systems"))) => {}
        other => panic!("expected missing 'systems', got {other:?}"),
    }

    let no_cores = dir.path().join("no_cores.json");
    std::fs::write(&no_cores, r#"{ "systems": ["GIS"] }"#).expect("write fixture");
    match JsonStore::new(&no_cores).read() {
        Err(ReadError::Document(DocumentError::MissingKey("cores"))) => {}
        other => panic!("expected missing 'cores', got {other:?}"),
    }

    let no_id = dir.path().join("no_id.json");
    std::fs::write(
        &no_id,
        r#"{ "systems": ["GIS"], "cores": [ { "GIS": ["G1"] } ] }"#,
    )
    .expect("write fixture");
    match JsonStore::new(&no_id).read() {
        Err(ReadError::Document(DocumentError::MissingKey("id"))) => {}
        other => panic!("expected missing 'id', got {other:?}"),
    }
}

// Test: core-object keys that match no registered system are ignored.
#[test]
fn unregistered_tags_in_core_objects_are_ignored() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("extra_tags.json");
    std::fs::write(
        &path,
        r#"{ "systems": ["GIS"], "cores": [ { "id": "1", "GIS": ["G1"], "SCADA": ["S1"] } ] }"#,
    )
    .expect("write fixture");

    let index = JsonStore::new(&path).read().expect("read");
    assert!(index.ids_for("1", "GIS").contains("G1"));
    assert!(index.ids_for("1", "SCADA").is_empty());
    assert!(!index.systems().contains("SCADA"));
}
