//! End-to-end `run` pipeline: documents → extract → merge → summarize → save.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use clausemap_framework::{Framework, merge};
use clausemap_shared::{Obligation, Result, RunConfig};
use clausemap_storage::{Document, Ledger, NewEntry, WriterLock, load_table, save_table};

use crate::Pipeline;
use crate::report::{BatchReport, DocumentOutcome, DocumentReport};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document has been read (or has failed to read).
    fn document_read(&self, path: &Path, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_read(&self, _path: &Path, _current: usize, _total: usize) {}
    fn done(&self, _report: &BatchReport) {}
}

/// Result of [`summarize_framework`].
#[derive(Debug, Clone)]
pub struct SummarizeReport {
    pub output_path: PathBuf,
    pub rows: usize,
    pub rows_summarized: usize,
    pub initialized_columns: Vec<String>,
}

/// Run the full pipeline over a queue of documents.
///
/// 1. Lock the output framework and load the working copy
/// 2. Read each document, skipping those the ledger already knows
/// 3. Extract obligations (in parallel across documents)
/// 4. Merge document by document, in input order
/// 5. Summarize rows (optional) and save atomically
/// 6. Record merged documents in the ledger
///
/// Per-document failures are recorded in the report and never abort the
/// batch. Failing to lock, load or save the framework aborts the run with the
/// framework left unmodified.
#[instrument(skip_all, fields(framework = %run.framework_path.display(), documents = documents.len()))]
pub async fn process_documents(
    pipeline: &Pipeline,
    run: &RunConfig,
    documents: &[PathBuf],
    progress: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let start = Instant::now();

    // --- Phase 1: Framework ---
    progress.phase("Opening framework");
    let _lock = WriterLock::acquire(&run.output_path)?;
    let source = working_source(run);
    let mut table = load_table(source)?;
    if table.sheet.is_empty() {
        table.sheet = run.sheet.clone();
    } else if table.sheet != run.sheet {
        warn!(sheet = %table.sheet, expected = %run.sheet, "framework sheet name differs; using it anyway");
    }
    let mut framework = Framework::bind(table)?;

    let ledger = Ledger::open(&run.ledger_path()).await?;
    let key = framework_key(&run.output_path);

    // --- Phase 2: Read documents ---
    progress.phase("Reading documents");
    let mut reports: Vec<DocumentReport> = Vec::with_capacity(documents.len());
    let mut loaded: Vec<(usize, Document)> = Vec::new();
    let mut queue: VecDeque<&PathBuf> = documents.iter().collect();
    let total = documents.len();

    while let Some(path) = queue.pop_front() {
        let index = reports.len();
        progress.document_read(path, index + 1, total);

        let document = match pipeline.readers().load(path) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document failed, continuing");
                reports.push(DocumentReport {
                    path: path.clone(),
                    outcome: DocumentOutcome::Failed {
                        error: e.to_string(),
                    },
                    warnings: Vec::new(),
                });
                continue;
            }
        };

        if !run.force && ledger.is_processed(&key, &document.content_hash).await? {
            info!(path = %path.display(), "already merged into this framework, skipping");
            reports.push(DocumentReport {
                path: path.clone(),
                outcome: DocumentOutcome::Skipped,
                warnings: document.warnings,
            });
            continue;
        }

        reports.push(DocumentReport {
            path: path.clone(),
            outcome: DocumentOutcome::Processed {
                obligations: Vec::new(),
            },
            warnings: document.warnings.clone(),
        });
        loaded.push((index, document));
    }

    // --- Phase 3: Extract ---
    progress.phase("Extracting obligations");
    let texts: Vec<&str> = loaded.iter().map(|(_, d)| d.text.as_str()).collect();
    let extracted = pipeline.extractor().extract_batch(&texts);

    // --- Phase 4: Merge ---
    progress.phase("Merging into framework");
    let mut rows = framework.rows();
    let mut rows_updated = 0;
    for ((index, _), obligations) in loaded.iter().zip(&extracted) {
        let outcome = merge(obligations, &rows);
        rows_updated += outcome.updated;
        rows = outcome.rows;
        reports[*index].outcome = DocumentOutcome::Processed {
            obligations: obligations.clone(),
        };
    }

    // --- Phase 5: Summarize & save ---
    let rows_summarized = if run.summarize {
        progress.phase("Generating concise observations");
        Some(pipeline.summarizer().summarize_rows(&mut rows))
    } else {
        None
    };

    progress.phase("Saving framework");
    let initialized_columns = framework.initialized_columns().to_vec();
    framework.apply(&rows);
    save_table(&run.output_path, framework.table())?;

    // --- Phase 6: Ledger ---
    for ((_, document), obligations) in loaded.iter().zip(&extracted) {
        let path = document.path.display().to_string();
        ledger
            .record(
                NewEntry {
                    framework: &key,
                    path: &path,
                    content_hash: &document.content_hash,
                    obligations,
                },
                run.persist_obligations,
            )
            .await?;
    }
    let total_processed = ledger.processed_count(&key).await?;

    let report = BatchReport {
        output_path: run.output_path.clone(),
        documents: reports,
        rows_updated,
        rows_summarized,
        initialized_columns,
        total_processed,
        elapsed: start.elapsed(),
    };
    progress.done(&report);

    info!(
        processed = report.processed(),
        skipped = report.skipped(),
        failed = report.failed(),
        obligations = report.obligations_found(),
        rows_updated = report.rows_updated,
        elapsed_ms = report.elapsed.as_millis(),
        "run complete"
    );
    Ok(report)
}

/// Recompute concise observations for every row of a framework.
#[instrument(skip_all, fields(framework = %framework_path.display()))]
pub fn summarize_framework(
    pipeline: &Pipeline,
    framework_path: &Path,
    output_path: &Path,
) -> Result<SummarizeReport> {
    let _lock = WriterLock::acquire(output_path)?;
    let mut framework = Framework::bind(load_table(framework_path)?)?;

    let mut rows = framework.rows();
    let rows_summarized = pipeline.summarizer().summarize_rows(&mut rows);
    framework.apply(&rows);
    save_table(output_path, framework.table())?;

    Ok(SummarizeReport {
        output_path: output_path.to_path_buf(),
        rows: rows.len(),
        rows_summarized,
        initialized_columns: framework.initialized_columns().to_vec(),
    })
}

/// Read one document and classify it without touching any framework.
pub fn extract_document(pipeline: &Pipeline, path: &Path) -> Result<(Document, Vec<Obligation>)> {
    let document = pipeline.readers().load(path)?;
    let obligations = pipeline.extractor().extract(&document.text);
    Ok((document, obligations))
}

/// Continue from an existing output when it differs from the framework.
fn working_source(run: &RunConfig) -> &Path {
    if run.output_path != run.framework_path && run.output_path.is_file() {
        info!(path = %run.output_path.display(), "continuing with existing working framework");
        run.output_path.as_path()
    } else {
        run.framework_path.as_path()
    }
}

/// Stable ledger key for a framework path, even before the file exists.
fn framework_key(path: &Path) -> String {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name).display().to_string(),
        _ => path.display().to_string(),
    }
}
