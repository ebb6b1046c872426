//! Binding between a generic [`Table`] and typed [`FrameworkRow`]s.
//!
//! The storage layer hands over whatever columns the framework file has. The
//! binding locates the columns the pipeline cares about by header. The
//! identifying columns must exist; missing observation columns are appended
//! empty. Results are written back without touching other cells or
//! reordering anything.

use tracing::warn;

use clausemap_shared::{ClausemapError, FrameworkRow, Result, Table, columns};

/// Columns a framework must already have to be merged into.
const REQUIRED: [&str; 3] = [columns::CONTROL_REF, columns::DOMAIN, columns::KEYWORDS];

/// Column positions resolved against a table's headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    control_ref: usize,
    domain: usize,
    keywords: usize,
    observation: usize,
    concise_observation: usize,
}

/// A framework table with its pipeline columns resolved.
#[derive(Debug, Clone)]
pub struct Framework {
    table: Table,
    map: ColumnMap,
    initialized: Vec<String>,
}

impl Framework {
    /// Bind a table, initializing missing observation columns to empty.
    ///
    /// Fails with a validation error when `Control Ref`, `Domain` or
    /// `Keywords` is absent; the table is not modified in that case.
    pub fn bind(mut table: Table) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED
            .into_iter()
            .filter(|name| table.column_index(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ClausemapError::validation(format!(
                "framework is missing required column(s): {} (found: {})",
                missing.join(", "),
                table.columns.join(", ")
            )));
        }

        let mut initialized = Vec::new();
        let mut resolve = |table: &mut Table, name: &str| {
            let (idx, created) = table.ensure_column(name);
            if created {
                initialized.push(name.to_string());
            }
            idx
        };

        let map = ColumnMap {
            control_ref: resolve(&mut table, columns::CONTROL_REF),
            domain: resolve(&mut table, columns::DOMAIN),
            keywords: resolve(&mut table, columns::KEYWORDS),
            observation: resolve(&mut table, columns::OBSERVATION),
            concise_observation: resolve(&mut table, columns::CONCISE_OBSERVATION),
        };

        if !initialized.is_empty() {
            warn!(columns = ?initialized, "framework lacked columns; initialized them empty");
        }

        Ok(Self {
            table,
            map,
            initialized,
        })
    }

    /// Columns that were absent from the source table and got created empty.
    pub fn initialized_columns(&self) -> &[String] {
        &self.initialized
    }

    /// Typed view of every row, in table order.
    pub fn rows(&self) -> Vec<FrameworkRow> {
        (0..self.table.len())
            .map(|i| FrameworkRow {
                control_ref: self.table.cell(i, self.map.control_ref).to_string(),
                domain: self.table.cell(i, self.map.domain).trim().to_string(),
                keywords: self.table.cell(i, self.map.keywords).trim().to_string(),
                observation: self.table.cell(i, self.map.observation).to_string(),
                concise_observation: self
                    .table
                    .cell(i, self.map.concise_observation)
                    .to_string(),
            })
            .collect()
    }

    /// Write observation fields back into the table.
    ///
    /// Only `Observation` and `Concise_Observation` cells change; rows beyond the
    /// table length are ignored since the pipeline never adds rows.
    pub fn apply(&mut self, rows: &[FrameworkRow]) {
        for (i, row) in rows.iter().enumerate().take(self.table.len()) {
            if self.table.cell(i, self.map.observation) != row.observation {
                self.table
                    .set_cell(i, self.map.observation, row.observation.clone());
            }
            if self.table.cell(i, self.map.concise_observation) != row.concise_observation {
                self.table.set_cell(
                    i,
                    self.map.concise_observation,
                    row.concise_observation.clone(),
                );
            }
        }
    }

    /// Borrow the underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Give back the underlying table for saving.
    pub fn into_table(self) -> Table {
        self.table
    }
}
