//! End-to-end runs against a framework on disk.

use std::path::{Path, PathBuf};

use clausemap_core::{BatchStatus, Pipeline, SilentProgress, process_documents};
use clausemap_shared::{AppConfig, RunConfig, Table};
use clausemap_storage::{Ledger, load_table, save_table};
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clausemap_it_{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn framework_table() -> Table {
    let row = |r: &str, d: &str, k: &str| vec![r.to_string(), d.to_string(), k.to_string()];
    Table {
        sheet: "Data Protection Framework 1".into(),
        columns: vec!["Control Ref".into(), "Domain".into(), "Keywords".into()],
        rows: vec![
            row("GOV-1", "Governance and Operating Model", "Data Protection Officer"),
            row("IBM-1", "Incident and Breach Management", "Breach Notification"),
            row("DSR-1", "Data Subject Rights", "Right to Access"),
            row("SEC-1", "Data Security", "Access Control"),
            row("", "", "Section header"),
        ],
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

fn column(table: &Table, name: &str) -> Vec<String> {
    let idx = table.column_index(name).expect("column present");
    (0..table.len()).map(|i| table.cell(i, idx).to_string()).collect()
}

#[tokio::test]
async fn run_merges_summarizes_and_skips_on_rerun() {
    let dir = scratch_dir();
    let framework = dir.join("framework.json");
    save_table(&framework, &framework_table()).unwrap();

    let notice = write(
        &dir,
        "notice.txt",
        "Contact our Data Protection Officer at dpo@example.com. \
         We will notify you of any security breach within 72 hours. \
         You have the right to access your data at any time.",
    );
    let controls = write(
        &dir,
        "controls.md",
        "Role-based access is enforced for all systems. \
         We will notify you of any security breach within 72 hours.",
    );

    let pipeline = Pipeline::default();
    let run = RunConfig::new(&AppConfig::default(), framework.clone(), None);
    let docs = vec![notice.clone(), controls.clone()];

    let first = process_documents(&pipeline, &run, &docs, &SilentProgress)
        .await
        .unwrap();
    assert_eq!(first.processed(), 2);
    assert_eq!(first.status(), BatchStatus::Updated);
    assert_eq!(first.rows_updated, 4);
    assert_eq!(first.total_processed, 2);
    assert_eq!(
        first.initialized_columns,
        vec!["Observation".to_string(), "Concise_Observation".to_string()]
    );

    let table = load_table(&framework).unwrap();
    let observations = column(&table, "Observation");
    assert_eq!(
        observations[1],
        "• We will notify you of any security breach within 72 hours."
    );
    // The blank-domain header row is never populated.
    assert_eq!(observations[4], "");
    // The second document's breach clause did not overwrite or duplicate.
    assert_eq!(observations[1].lines().count(), 1);
    assert_eq!(observations[3], "• Role-based access is enforced for all systems.");

    let concise = column(&table, "Concise_Observation");
    assert_eq!(
        concise[1],
        "Breach notification procedures to authorities and affected individuals."
    );
    assert_eq!(
        concise[3],
        "Controls to restrict and manage system/data access based on roles."
    );
    assert_eq!(concise[4], "");
    assert!(concise.iter().all(|c| !c.contains('\n')));

    // Second pass: the ledger recognizes both documents and nothing changes.
    let before = std::fs::read_to_string(&framework).unwrap();
    let second = process_documents(&pipeline, &run, &docs, &SilentProgress)
        .await
        .unwrap();
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.status(), BatchStatus::NothingProcessed);
    assert_eq!(second.total_processed, 2);
    assert_eq!(std::fs::read_to_string(&framework).unwrap(), before);

    // Forcing re-extraction still never overwrites populated rows.
    let forced = RunConfig {
        force: true,
        ..run.clone()
    };
    let third = process_documents(&pipeline, &forced, &docs, &SilentProgress)
        .await
        .unwrap();
    assert_eq!(third.processed(), 2);
    assert_eq!(third.rows_updated, 0);
    assert_eq!(third.status(), BatchStatus::NoChanges);
    assert_eq!(column(&load_table(&framework).unwrap(), "Observation"), observations);
}

#[tokio::test]
async fn separate_output_keeps_source_framework_pristine() {
    let dir = scratch_dir();
    let framework = dir.join("original.json");
    let working = dir.join("working.json");
    save_table(&framework, &framework_table()).unwrap();
    let original = std::fs::read_to_string(&framework).unwrap();

    let first_doc = write(&dir, "a.txt", "We will notify you of any security breach within 72 hours.");
    let second_doc = write(&dir, "b.txt", "You have the right to access your data at any time.");

    let pipeline = Pipeline::default();
    let run = RunConfig {
        summarize: false,
        persist_obligations: true,
        ..RunConfig::new(&AppConfig::default(), framework.clone(), Some(working.clone()))
    };

    process_documents(&pipeline, &run, &[first_doc], &SilentProgress)
        .await
        .unwrap();
    // A later run continues from the working copy rather than the original.
    let report = process_documents(&pipeline, &run, &[second_doc], &SilentProgress)
        .await
        .unwrap();
    assert_eq!(report.rows_updated, 1);
    assert_eq!(report.total_processed, 2);
    assert_eq!(report.rows_summarized, None);

    assert_eq!(std::fs::read_to_string(&framework).unwrap(), original);
    let observations = column(&load_table(&working).unwrap(), "Observation");
    assert!(observations[1].contains("72 hours"));
    assert!(observations[2].contains("right to access"));

    let ledger = Ledger::open(&run.ledger_path()).await.unwrap();
    let key = std::fs::canonicalize(&working).unwrap().display().to_string();
    let entries = ledger.list_documents(&key).await.unwrap();
    assert_eq!(entries.len(), 2);
    let stored = ledger.obligations_for(&entries[0].id).await.unwrap();
    assert_eq!(stored[0].category, "breach_notification");
}

#[tokio::test]
async fn empty_and_unmatched_documents_report_no_matches() {
    let dir = scratch_dir();
    let framework = dir.join("framework.json");
    save_table(&framework, &framework_table()).unwrap();
    let empty = write(&dir, "empty.txt", "");
    let weather = write(&dir, "weather.txt", "The weather was pleasant all week long.");

    let report = process_documents(
        &Pipeline::default(),
        &RunConfig::new(&AppConfig::default(), framework, None),
        &[empty, weather],
        &SilentProgress,
    )
    .await
    .unwrap();
    assert_eq!(report.processed(), 2);
    assert_eq!(report.obligations_found(), 0);
    assert_eq!(report.status(), BatchStatus::NoMatches);
}
