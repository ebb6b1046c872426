//! Outcome records for a batch run.

use std::path::PathBuf;
use std::time::Duration;

use clausemap_shared::Obligation;

/// What happened to one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Extracted and merged.
    Processed { obligations: Vec<Obligation> },
    /// Already merged into this framework in an earlier run.
    Skipped,
    /// Could not be read; other documents were still processed.
    Failed { error: String },
}

/// Per-document entry in a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
    /// Partial-read warnings from the document reader.
    pub warnings: Vec<String>,
}

impl DocumentReport {
    pub fn obligations(&self) -> &[Obligation] {
        match &self.outcome {
            DocumentOutcome::Processed { obligations } => obligations,
            _ => &[],
        }
    }
}

/// Informational status of a finished batch. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// At least one framework row received new findings.
    Updated,
    /// Documents were processed, but obligations only hit rows that were
    /// already populated or domains the framework lacks.
    NoChanges,
    /// Documents were processed but contained no relevant clauses.
    NoMatches,
    /// Every document was skipped or failed, or none were given.
    NothingProcessed,
}

impl BatchStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Updated => "framework updated with new findings",
            Self::NoChanges => "obligations found, but no empty rows matched their domains",
            Self::NoMatches => "no relevant obligations found",
            Self::NothingProcessed => "no new documents to process",
        }
    }
}

/// Summary of one `run`.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub output_path: PathBuf,
    pub documents: Vec<DocumentReport>,
    /// Rows that received findings in this run.
    pub rows_updated: usize,
    /// Rows with a non-empty concise observation after summarizing.
    pub rows_summarized: Option<usize>,
    /// Columns the framework lacked and that were created empty.
    pub initialized_columns: Vec<String>,
    /// Documents the ledger holds for this framework after the run.
    pub total_processed: u64,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    /// Obligations extracted across all processed documents.
    pub fn obligations_found(&self) -> usize {
        self.documents.iter().map(|d| d.obligations().len()).sum()
    }

    pub fn status(&self) -> BatchStatus {
        if self.processed() == 0 {
            BatchStatus::NothingProcessed
        } else if self.obligations_found() == 0 {
            BatchStatus::NoMatches
        } else if self.rows_updated == 0 {
            BatchStatus::NoChanges
        } else {
            BatchStatus::Updated
        }
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}
