//! Subcommand implementations.
//!
//! Store access goes through `DocSift::with_store` so SQLite work stays off
//! the runtime threads.

use anyhow::{Context, Result};
use docsift_core::{
    DocSift, DocSiftError, ScanErrorRecord, ScanRequest, ScanRunRecord, SearchResult, SyncReport,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn index(
    api: &DocSift,
    dir: Option<PathBuf>,
    extensions: Vec<String>,
    all: bool,
    label: Option<String>,
) -> Result<()> {
    let (root, extensions) = api
        .with_store(move |store| {
            let root = match dir {
                Some(dir) => dir,
                None => store.last_directory()?.map(PathBuf::from).ok_or_else(|| {
                    DocSiftError::invalid_argument("No directory given and none indexed before")
                })?,
            };
            let root =
                std::fs::canonicalize(&root).map_err(|e| DocSiftError::io_with_path(e, &root))?;

            let extensions = if all {
                Vec::new()
            } else if extensions.is_empty() {
                store.selected_extensions()?
            } else {
                extensions
            };
            store.set_selected_extensions(&extensions)?;
            Ok((root, extensions))
        })
        .await?;

    let mut request = ScanRequest::new(&root).with_extensions(extensions);
    if let Some(label) = label {
        request = request.with_label(label);
    }

    let outcome = api
        .index_directory(request, |processed, total| {
            eprint!("\rIndexing {}/{}", processed, total);
            let _ = std::io::stderr().flush();
        })
        .await
        .with_context(|| format!("Failed to index {}", root.display()))?;
    eprintln!();

    info!(
        "Indexed {} files, skipped {} (see `docsift errors`)",
        outcome.indexed(),
        outcome.skipped
    );
    Ok(())
}

pub async fn search(
    api: &DocSift,
    name: &str,
    content: &str,
    raw: Option<&str>,
    json: bool,
) -> Result<()> {
    let results = match raw {
        Some(raw) => api.search(raw).await?,
        None => {
            if name.trim().is_empty() && content.trim().is_empty() {
                anyhow::bail!("Give --name, --content or --raw");
            }
            api.search_terms(name, content).await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matches");
        return;
    }
    for result in results {
        println!("{}\t[{}]\t{}", result.file_name, result.directory, result.id);
    }
    println!("{} match(es)", results.len());
}

/// Everything `docsift status` shows.
#[derive(Debug)]
pub struct StatusReport {
    pub sync: SyncReport,
    pub tokenizer: String,
    pub extensions: Vec<String>,
    pub runs: Vec<ScanRunRecord>,
}

pub async fn status_report(api: &DocSift) -> Result<StatusReport> {
    let report = api
        .with_store(|store| {
            Ok(StatusReport {
                sync: store.check_consistency()?,
                tokenizer: store.index_stats()?.tokenizer,
                extensions: store.selected_extensions()?,
                runs: store.list_scan_runs()?,
            })
        })
        .await?;
    Ok(report)
}

pub async fn status(api: &DocSift) -> Result<()> {
    let report = status_report(api).await?;

    println!("Documents:      {}", report.sync.document_count);
    println!("Index entries:  {}", report.sync.index_entry_count);
    println!("Tokenizer:      {}", report.tokenizer);
    println!("Extensions:     {}", display_extensions(&report.extensions));
    if report.sync.is_consistent() {
        println!("Index health:   ok");
    } else {
        warn!(
            "Index out of sync: {} documents without entries, {} orphan entries",
            report.sync.missing_entries.len(),
            report.sync.orphan_entries.len()
        );
        println!("Index health:   out of sync (run `docsift rebuild`)");
    }

    for run in &report.runs {
        println!(
            "{}  {} found, {} indexed, {} skipped  ({}, {})",
            run.path,
            run.discovered_count,
            run.success_count,
            run.error_count,
            run.status.as_str(),
            run.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn display_extensions(extensions: &[String]) -> String {
    if extensions.is_empty() {
        "all".to_string()
    } else {
        extensions.join(", ")
    }
}

pub async fn rebuild(api: &DocSift) -> Result<()> {
    let entries = api
        .with_store(|store| {
            store.rebuild_index()?;
            store.optimize_index()?;
            Ok(store.index_stats()?.row_count)
        })
        .await?;
    info!("Rebuilt index with {} entries", entries);
    Ok(())
}

pub async fn errors(api: &DocSift, clear: bool) -> Result<()> {
    let (errors, removed): (Vec<ScanErrorRecord>, usize) = api
        .with_store(move |store| {
            let errors = store.list_scan_errors()?;
            let removed = if clear { store.clear_scan_errors()? } else { 0 };
            Ok((errors, removed))
        })
        .await?;

    for error in &errors {
        println!(
            "{}/{}\t{}\t{}",
            error.directory, error.name, error.category, error.message
        );
    }
    if errors.is_empty() {
        println!("No skipped files");
    }
    if clear {
        info!("Cleared {} recorded errors", removed);
    }
    Ok(())
}
