//! Core domain types shared across the Clausemap pipeline.

use serde::{Deserialize, Serialize};

/// Domain label used when a category has no entry in the category→domain map.
pub const UNKNOWN_DOMAIN: &str = "Unknown";

// ---------------------------------------------------------------------------
// Obligation
// ---------------------------------------------------------------------------

/// One sentence classified against a taxonomy category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    /// The sentence, trimmed and whitespace-collapsed.
    pub text: String,
    /// Taxonomy category that matched.
    pub category: String,
    /// Trigger phrase that fired the match.
    pub matched_keyword: String,
    /// Reporting domain derived from `category`.
    pub domain: String,
}

// ---------------------------------------------------------------------------
// FrameworkRow
// ---------------------------------------------------------------------------

/// One control entry of the target framework.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkRow {
    /// Stable external identifier; never modified by the pipeline.
    pub control_ref: String,
    /// Reporting domain; join key against [`Obligation::domain`].
    pub domain: String,
    /// Topic tag used by the summarizer to pick a pattern family.
    pub keywords: String,
    /// Raw findings; written at most once by the merger.
    pub observation: String,
    /// Short templated sentence derived from `observation` and `keywords`.
    pub concise_observation: String,
}

impl FrameworkRow {
    /// Whether the merger has already written (or a human has filled) this row.
    pub fn has_observation(&self) -> bool {
        !self.observation.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Column headers the framework binding looks for.
pub mod columns {
    pub const CONTROL_REF: &str = "Control Ref";
    pub const DOMAIN: &str = "Domain";
    pub const KEYWORDS: &str = "Keywords";
    pub const OBSERVATION: &str = "Observation";
    pub const CONCISE_OBSERVATION: &str = "Concise_Observation";
}

/// Row-oriented tabular payload exchanged with the storage layer.
///
/// Cells are plain strings; a row shorter than `columns` is treated as padded
/// with empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Sheet name carried through load/save unchanged.
    #[serde(default)]
    pub sheet: String,
    /// Ordered column headers.
    pub columns: Vec<String>,
    /// Ordered rows of cells.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers.
    pub fn new(sheet: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            sheet: sheet.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Index of a column by exact header (surrounding whitespace ignored).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Index of a column, appending it with empty cells if absent.
    ///
    /// Returns `(index, created)`.
    pub fn ensure_column(&mut self, name: &str) -> (usize, bool) {
        if let Some(idx) = self.column_index(name) {
            return (idx, false);
        }
        self.columns.push(name.to_string());
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        (width - 1, true)
    }

    /// Cell value, or `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Overwrite a cell, padding the row if needed. Out-of-range rows are ignored.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.into();
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            sheet: "Sheet1".into(),
            columns: vec!["Control Ref".into(), "Domain".into()],
            rows: vec![
                vec!["C-1".into(), "Data Security".into()],
                vec!["C-2".into()],
            ],
        }
    }

    #[test]
    fn column_lookup_ignores_header_padding() {
        let mut table = sample();
        table.columns[1] = " Domain ".into();
        assert_eq!(table.column_index("Domain"), Some(1));
        assert_eq!(table.column_index("Observation"), None);
    }

    #[test]
    fn ensure_column_appends_and_pads() {
        let mut table = sample();
        let (idx, created) = table.ensure_column("Observation");
        assert!(created);
        assert_eq!(idx, 2);
        assert!(table.rows.iter().all(|r| r.len() == 3));

        let (again, created) = table.ensure_column("Observation");
        assert_eq!(again, 2);
        assert!(!created);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = sample();
        assert_eq!(table.cell(1, 1), "");
        assert_eq!(table.cell(9, 0), "");
    }

    #[test]
    fn set_cell_pads_short_row() {
        let mut table = sample();
        table.set_cell(1, 1, "Records Management");
        assert_eq!(table.cell(1, 1), "Records Management");
    }

    #[test]
    fn table_json_roundtrip() {
        let table = sample();
        let json = serde_json::to_string(&table).expect("serialize");
        let parsed: Table = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, table);
    }

    #[test]
    fn whitespace_observation_counts_as_filled() {
        let mut row = FrameworkRow::default();
        assert!(!row.has_observation());
        row.observation = "   ".into();
        assert!(row.has_observation());
        row.observation = "• finding".into();
        assert!(row.has_observation());
    }
}
