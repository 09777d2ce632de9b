use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use findex::engine::{Delivery, Engine};
use findex::query::SearchMode;
use findex::store::EntryStore;
use tempfile::TempDir;

fn create_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).expect("create parent");
    fs::write(path, contents).expect("write file");
}

fn canonical_temp_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let canonical = dir.path().canonicalize().expect("canonicalize temp root");
    (dir, canonical)
}

fn engine_with_scratch_index(scratch: &Path) -> Engine {
    Engine::new(scratch.join("index.json"))
}

fn wait_for_delivery(engine: &mut Engine) -> Delivery {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(delivery) = engine.wait(Duration::from_millis(200)) {
            return delivery;
        }
        if !engine.is_running() {
            break;
        }
    }
    panic!("no delivery within timeout");
}

fn search_paths(engine: &mut Engine, term: &str, root: &Path) -> (BTreeSet<PathBuf>, SearchMode) {
    engine.search(term, root).expect("search accepted");
    match wait_for_delivery(engine) {
        Delivery::Search { hits, mode } => {
            (hits.into_iter().map(|hit| hit.path).collect(), mode)
        }
        other => panic!("unexpected delivery: {other:?}"),
    }
}

fn rebuild(engine: &mut Engine, root: &Path) {
    engine.index_directory(root).expect("rebuild accepted");
    match wait_for_delivery(engine) {
        Delivery::Index { persist_error, .. } => {
            assert!(persist_error.is_none(), "persist failed: {persist_error:?}");
        }
        other => panic!("unexpected delivery: {other:?}"),
    }
}

#[test]
fn live_and_indexed_search_return_the_same_path_set() {
    let (_tree, root) = canonical_temp_dir();
    create_file(&root.join("docs/report.txt"), "r");
    create_file(&root.join("docs/report-draft.md"), "d");
    create_file(&root.join("media/holiday.jpg"), "j");
    fs::create_dir_all(root.join("reports-archive")).expect("mkdir");

    let (_scratch, scratch) = canonical_temp_dir();
    let mut engine = engine_with_scratch_index(&scratch);

    let (live, live_mode) = search_paths(&mut engine, "report", &root);
    assert_eq!(live_mode, SearchMode::Live);

    rebuild(&mut engine, &root);
    let (indexed, indexed_mode) = search_paths(&mut engine, "report", &root);
    assert_eq!(indexed_mode, SearchMode::Indexed);

    assert!(!live.is_empty());
    assert_eq!(live, indexed);
}

#[test]
fn rebuild_yields_folder_extension_and_plain_file_labels() {
    let (_tree, root) = canonical_temp_dir();
    fs::create_dir(root.join("a")).expect("mkdir");
    create_file(&root.join("a/x.txt"), "x");
    create_file(&root.join("a/y"), "y");

    let (_scratch, scratch) = canonical_temp_dir();
    let mut engine = engine_with_scratch_index(&scratch);
    rebuild(&mut engine, &root);

    let store = engine.store();
    let key = |p: PathBuf| p.to_string_lossy().into_owned();
    assert_eq!(store.len(), 3);
    assert_eq!(store.label_of(&key(root.join("a"))), Some("Folder"));
    assert_eq!(store.label_of(&key(root.join("a/x.txt"))), Some("TXT"));
    assert_eq!(store.label_of(&key(root.join("a/y"))), Some("File"));
}

#[test]
fn path_deleted_after_indexing_is_silently_absent() {
    let (_tree, root) = canonical_temp_dir();
    create_file(&root.join("keep-note.txt"), "k");
    create_file(&root.join("gone-note.txt"), "g");

    let (_scratch, scratch) = canonical_temp_dir();
    let mut engine = engine_with_scratch_index(&scratch);
    rebuild(&mut engine, &root);

    fs::remove_file(root.join("gone-note.txt")).expect("delete");

    let (paths, mode) = search_paths(&mut engine, "note", &root);
    assert_eq!(mode, SearchMode::Indexed);
    assert!(paths.contains(&root.join("keep-note.txt")));
    assert!(!paths.contains(&root.join("gone-note.txt")));
}

#[test]
fn persisted_index_round_trips_into_a_fresh_engine() {
    let (_tree, root) = canonical_temp_dir();
    create_file(&root.join("inbox/invoice.pdf"), "i");

    let (_scratch, scratch) = canonical_temp_dir();
    let index_path = scratch.join("index.json");

    let mut engine = Engine::new(index_path.clone());
    rebuild(&mut engine, &root);

    // A different engine instance picks the persisted store back up.
    let mut fresh = Engine::new(index_path.clone());
    assert!(fresh.load_index_if_present().is_none());
    assert_eq!(fresh.store().len(), engine.store().len());
    assert_eq!(fresh.store().root(), Some(root.as_path()));

    let loaded = EntryStore::load(&index_path).expect("load").expect("present");
    for (path, label) in engine.store().iter() {
        assert_eq!(loaded.label_of(path), Some(label));
    }
}

#[test]
fn corrupt_index_degrades_to_live_search_with_a_warning() {
    let (_tree, root) = canonical_temp_dir();
    create_file(&root.join("hello.txt"), "h");

    let (_scratch, scratch) = canonical_temp_dir();
    let index_path = scratch.join("index.json");
    fs::write(&index_path, "definitely not json").expect("write");

    let mut engine = Engine::new(index_path);
    let warning = engine.load_index_if_present();
    assert!(warning.is_some(), "corrupt index should be reported once");
    assert!(engine.store().is_empty());

    let (paths, mode) = search_paths(&mut engine, "hello", &root);
    assert_eq!(mode, SearchMode::Live);
    assert_eq!(paths.len(), 1);
}

#[test]
fn reindexing_a_narrower_subtree_replaces_the_store() {
    let (_tree, root) = canonical_temp_dir();
    create_file(&root.join("wide/one.txt"), "1");
    create_file(&root.join("wide/sub/two.txt"), "2");

    let (_scratch, scratch) = canonical_temp_dir();
    let mut engine = engine_with_scratch_index(&scratch);

    rebuild(&mut engine, &root);
    let broad = engine.store().len();

    rebuild(&mut engine, &root.join("wide/sub"));
    let narrow = engine.store().len();

    assert!(narrow < broad, "narrower rebuild must replace, not merge");
    assert_eq!(engine.store().root(), Some(root.join("wide/sub").as_path()));
}
