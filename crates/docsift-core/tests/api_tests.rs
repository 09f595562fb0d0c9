//! Integration tests for the `DocSift` async API.

use docsift_core::{DocSift, DocSiftError, ScanRequest, ScanRunStatus};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A notes tree with one file that cannot be decoded.
fn create_test_tree() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("notes");

    std::fs::create_dir_all(root.join("work/2024")).unwrap();
    std::fs::write(root.join("todo.txt"), "buy milk\ncall the plumber\n").unwrap();
    std::fs::write(root.join("work/report.txt"), "error budget exceeded").unwrap();
    std::fs::write(root.join("work/2024/report-q1.TXT"), "no error this quarter").unwrap();
    std::fs::write(root.join("work/readme.md"), "markdown is ignored").unwrap();
    std::fs::write(root.join("work/broken.txt"), [0xff, 0xfe, 0xfd]).unwrap();

    temp_dir
}

fn open_api(temp_dir: &TempDir) -> DocSift {
    DocSift::open(temp_dir.path().join("db").join("docsift.sqlite")).unwrap()
}

#[tokio::test]
async fn test_insert_and_search() {
    let temp_dir = TempDir::new().unwrap();
    let api = open_api(&temp_dir);

    api.insert_document("/docs/notes.txt", "notes.txt", "hello world", "txt", "docs")
        .await
        .unwrap();

    let results = api.search_terms("", "hello").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "/docs/notes.txt");
    assert_eq!(results[0].file_name, "notes.txt");

    let results = api.search("name:note*").await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_blank_terms_perform_no_search() {
    let temp_dir = TempDir::new().unwrap();
    let api = open_api(&temp_dir);
    api.insert_document("/a.txt", "a.txt", "alpha", "txt", "docs")
        .await
        .unwrap();

    assert!(api.search_terms(" ", "").await.unwrap().is_empty());
    assert!(matches!(
        api.search("").await,
        Err(DocSiftError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_index_directory() {
    let temp_dir = create_test_tree();
    let api = open_api(&temp_dir);
    let root = temp_dir.path().join("notes");

    let progress = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&progress);

    let outcome = api
        .index_directory(
            ScanRequest::new(&root).with_extensions(["txt"]),
            move |processed, total| recorder.lock().unwrap().push((processed, total)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.stats.total_discovered, 4);
    assert_eq!(outcome.stats.processed_count, 4);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.indexed(), 3);
    assert_eq!(
        *progress.lock().unwrap(),
        vec![(0, 4), (1, 4), (2, 4), (3, 4), (4, 4)]
    );

    let store = api.store();
    assert_eq!(store.count().unwrap(), 3);
    assert!(store.check_consistency().unwrap().is_consistent());

    let reports = api.search_terms("report", "error").await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.directory == "notes"));
    assert!(reports.iter().all(|r| r.extension == "txt"));

    let errors = store.list_scan_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name, "broken.txt");
    assert_eq!(errors[0].category, "decode");

    let root_str = root.to_string_lossy().to_string();
    let run = store.get_scan_run(&root_str).unwrap().unwrap();
    assert_eq!(run.discovered_count, 4);
    assert_eq!(run.success_count, 3);
    assert_eq!(run.error_count, 1);
    assert_eq!(run.status, ScanRunStatus::Completed);
    assert!(run.index_size > 0);
    assert_eq!(store.last_directory().unwrap(), Some(root_str));
}

#[tokio::test]
async fn test_index_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let api = open_api(&temp_dir);

    let result = api
        .index_directory(ScanRequest::new(temp_dir.path().join("missing")), |_, _| {})
        .await;

    assert!(matches!(result, Err(DocSiftError::NotADirectory(_))));

    let runs = api.with_store(|store| store.list_scan_runs()).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, ScanRunStatus::Failed);
    assert_eq!(runs[0].discovered_count, 0);
    assert!(api.store().last_directory().unwrap().is_none());
}

#[tokio::test]
async fn test_close_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let api = open_api(&temp_dir);
    api.insert_document("/a.txt", "a.txt", "persistent words", "txt", "docs")
        .await
        .unwrap();
    api.close().unwrap();

    let api = open_api(&temp_dir);
    let results = api.search_terms("", "persistent").await.unwrap();
    assert_eq!(results.len(), 1);
}
