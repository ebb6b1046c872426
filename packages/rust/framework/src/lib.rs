//! Framework merger: writes extracted obligations into empty observation cells.
//!
//! The merger is safe to run once per newly processed document against the
//! same framework: a row whose observation is already filled is never
//! touched again, so repeated passes neither duplicate nor overwrite findings.

mod binding;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use clausemap_shared::text::{collapse_whitespace, truncate_with_ellipsis};
use clausemap_shared::{FrameworkRow, Obligation};

pub use binding::Framework;

/// Maximum rendered characters per bullet, ellipsis included.
pub const MAX_BULLET_CHARS: usize = 150;

/// Bullet glyph prefixed to every finding.
pub const BULLET: &str = "•";

/// Result of one merge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// All rows, in input order, with newly filled observations.
    pub rows: Vec<FrameworkRow>,
    /// Number of rows populated by this pass.
    pub updated: usize,
}

/// Merge obligations into framework rows.
///
/// Rows with a blank domain or a non-empty observation are skipped; other rows
/// receive the formatted findings for their domain, if any.
#[instrument(skip_all, fields(obligations = obligations.len(), rows = rows.len()))]
pub fn merge(obligations: &[Obligation], rows: &[FrameworkRow]) -> MergeOutcome {
    let by_domain = group_by_domain(obligations);
    let mut updated = 0;

    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let domain = row.domain.trim();
            if domain.is_empty() || row.has_observation() {
                return row.clone();
            }
            let Some(found) = by_domain.get(domain) else {
                return row.clone();
            };

            updated += 1;
            debug!(index, domain, clauses = found.len(), "populating row");
            FrameworkRow {
                observation: format_observations(found.iter().copied()),
                ..row.clone()
            }
        })
        .collect();

    info!(updated, "merge pass complete");
    MergeOutcome { rows, updated }
}

/// Render obligation texts as a deduplicated, truncated bullet list.
///
/// Exact duplicates collapse to their first occurrence. Each text is
/// whitespace-collapsed and cut to [`MAX_BULLET_CHARS`].
pub fn format_observations<'a>(obligations: impl IntoIterator<Item = &'a Obligation>) -> String {
    let mut seen = HashSet::new();
    obligations
        .into_iter()
        .filter(|o| seen.insert(o.text.as_str()))
        .map(|o| {
            let clean = collapse_whitespace(&o.text);
            format!("{BULLET} {}", truncate_with_ellipsis(&clean, MAX_BULLET_CHARS))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group obligations by trimmed domain, preserving input order within groups.
fn group_by_domain(obligations: &[Obligation]) -> HashMap<&str, Vec<&Obligation>> {
    let mut groups: HashMap<&str, Vec<&Obligation>> = HashMap::new();
    for obligation in obligations {
        groups
            .entry(obligation.domain.trim())
            .or_default()
            .push(obligation);
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
