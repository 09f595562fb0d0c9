//! Integration tests for ingesting real directory trees.

use docsift_core::{
    build_query, DocumentStore, DocumentUpdate, IngestionPipeline, LedgerErrorSink, NewDocument,
    PlainTextExtractor, ScanRequest, ScanState, WalkDirWalker,
};
use tempfile::TempDir;

fn write(root: &std::path::Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_extension_filter_is_case_insensitive() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.TXT", b"alpha");
    write(temp_dir.path(), "b.md", b"beta");
    write(temp_dir.path(), "c", b"gamma");

    let store = DocumentStore::open_in_memory().unwrap();
    let mut totals = Vec::new();
    let stats = IngestionPipeline::new(&store)
        .run(
            &ScanRequest::new(temp_dir.path()).with_extensions(["txt"]),
            |_, total| totals.push(total),
        )
        .unwrap();

    assert_eq!(stats.total_discovered, 1);
    assert!(totals.iter().all(|t| *t == 1));
    assert_eq!(store.count().unwrap(), 1);

    let hits = store.search(&build_query("", "alpha").unwrap()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_name, "a.TXT");
    assert_eq!(hits[0].extension, "txt");
}

#[test]
fn test_partial_failure_tolerance() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "one.txt", b"first file");
    write(temp_dir.path(), "nested/two.txt", b"second file");
    write(temp_dir.path(), "nested/deeper/three.txt", b"third file");
    write(temp_dir.path(), "nested/big.txt", &[b'x'; 64]);

    let store = DocumentStore::open_in_memory().unwrap();
    let sink = LedgerErrorSink::new(&store);
    let mut pipeline = IngestionPipeline::with_collaborators(
        &store,
        WalkDirWalker::new(),
        PlainTextExtractor::with_max_bytes(32),
    )
    .with_error_sink(&sink);

    let mut processed = Vec::new();
    let stats = pipeline
        .run(
            &ScanRequest::new(temp_dir.path()).with_label("Phone storage"),
            |p, _| processed.push(p),
        )
        .unwrap();

    assert_eq!(stats.total_discovered, 4);
    assert_eq!(processed, vec![0, 1, 2, 3, 4]);
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(sink.reported(), 1);
    assert_eq!(
        pipeline.state(),
        ScanState::Completed {
            processed: 4,
            total: 4
        }
    );

    let errors = store.list_scan_errors().unwrap();
    assert_eq!(errors[0].name, "big.txt");
    assert_eq!(errors[0].category, "too_large");
    assert_eq!(errors[0].directory, "Phone storage");

    let hits = store.search_raw("content:file").unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.directory == "Phone storage"));
}

#[test]
fn test_ingested_documents_stay_in_sync_after_edits() {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..5 {
        write(
            temp_dir.path(),
            &format!("doc{}.txt", i),
            format!("document number {}", i).as_bytes(),
        );
    }

    let store = DocumentStore::open(temp_dir.path().join("index.sqlite")).unwrap();
    IngestionPipeline::new(&store)
        .run(&ScanRequest::new(temp_dir.path()).with_extensions(["txt"]), |_, _| {})
        .unwrap();
    assert_eq!(store.count().unwrap(), 5);

    let ids: Vec<i64> = store.sequence_ids().unwrap().into_iter().collect();
    store.delete(ids[0]).unwrap();
    store
        .update(
            ids[1],
            &DocumentUpdate {
                name: "renamed.txt".into(),
                extension: "txt".into(),
                content: "rewritten".into(),
            },
        )
        .unwrap();

    assert_eq!(store.sequence_ids().unwrap(), store.index_keys().unwrap());
    assert_eq!(store.search_raw("content:document").unwrap().len(), 3);
    assert_eq!(store.search_raw("name:renamed*").unwrap().len(), 1);
}

#[test]
fn test_store_inside_scanned_tree_is_not_ingested() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.txt", b"plain words");
    write(temp_dir.path(), "blob.bin", b"head\0\0\0tail");

    let store = DocumentStore::open(temp_dir.path().join("index.sqlite")).unwrap();
    // Forces WAL and shm files next to the database
    store
        .insert(&NewDocument::new("/seed", "seed", "", "seed", "seed"))
        .unwrap();

    let sink = LedgerErrorSink::new(&store);
    let stats = IngestionPipeline::new(&store)
        .with_error_sink(&sink)
        .run(&ScanRequest::new(temp_dir.path()), |_, _| {})
        .unwrap();

    assert_eq!(stats.total_discovered, 2);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(sink.reported(), 1);

    let errors = store.list_scan_errors().unwrap();
    assert_eq!(errors[0].name, "blob.bin");
    assert_eq!(errors[0].category, "decode");
    assert!(store.search_raw("name:index*").unwrap().is_empty());
}
