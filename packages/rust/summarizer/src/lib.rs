//! Observation summarizer: condenses a row's accumulated findings into one
//! short sentence keyed by the row's keyword tag.
//!
//! Summaries are always computed from the raw observation. Feeding a previous
//! summary back in is not meaningful.

pub mod builders;
pub mod patterns;

use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, instrument};

use clausemap_shared::FrameworkRow;
use clausemap_shared::text::collapse_whitespace;

pub use patterns::{Aspect, AspectHits, PatternFamily, PatternLibrary, DEFAULT_FAMILY};

/// Placeholder used in templates when a row has no keyword tag.
const UNTAGGED: &str = "this control";

/// Observation text handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationInput {
    Single(String),
    /// Raw fragments, cleaned individually and joined with a space.
    Fragments(Vec<String>),
}

impl From<&str> for ObservationInput {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ObservationInput {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ObservationInput {
    fn from(value: Vec<String>) -> Self {
        Self::Fragments(value)
    }
}

impl From<&[&str]> for ObservationInput {
    fn from(value: &[&str]) -> Self {
        Self::Fragments(value.iter().map(|s| (*s).to_string()).collect())
    }
}

impl ObservationInput {
    /// Cleaned single-line text; empty when nothing usable remains.
    pub fn normalize(&self) -> String {
        match self {
            Self::Single(text) => clean_fragment(text),
            Self::Fragments(parts) => {
                let cleaned: Vec<String> = parts
                    .iter()
                    .map(|p| clean_fragment(p))
                    .filter(|p| !p.is_empty())
                    .collect();
                cleaned.join(" ")
            }
        }
    }
}

/// Strip bullet glyphs and list markers, then collapse whitespace.
///
/// `-` and `*` are only removed when they act as list markers, so hyphenated
/// words such as "opt-out" survive.
pub fn clean_fragment(text: &str) -> String {
    static GLYPH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[•◦▪]").expect("valid regex"));
    static MARKER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)(^|\s)[-*]+\s+").expect("valid regex"));

    let without_glyphs = GLYPH_RE.replace_all(text, " ");
    let without_markers = MARKER_RE.replace_all(&without_glyphs, "$1");
    collapse_whitespace(&without_markers)
}

// ---------------------------------------------------------------------------
// Summarizer
// ---------------------------------------------------------------------------

/// Summarizer over a read-only pattern library.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    library: PatternLibrary,
}

impl Summarizer {
    pub fn new(library: PatternLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Produce one concise sentence for an observation and its keyword tag.
    ///
    /// Blank observations yield an empty string. Never fails.
    pub fn summarize(&self, observation: impl Into<ObservationInput>, tag: &str) -> String {
        let text = observation.into().normalize();
        if text.is_empty() {
            return String::new();
        }

        let display_tag = match collapse_whitespace(tag) {
            t if t.is_empty() => UNTAGGED.to_string(),
            t => t,
        };
        let tag_lower = display_tag.to_lowercase();

        let family = self.library.resolve_family(&display_tag);
        let hits = family.score(&text);
        let (topic, builder) = builders::select(&tag_lower);
        debug!(
            tag = %display_tag,
            family = %family.name,
            topic,
            aspects = ?hits.aspects().collect::<Vec<_>>(),
            "summarizing observation"
        );

        let ctx = builders::BuildContext {
            tag: &display_tag,
            tag_lower: &tag_lower,
            text: &text,
            hits: &hits,
        };
        collapse_whitespace(&builder(&ctx))
    }

    /// Recompute `concise_observation` for every row, in parallel.
    ///
    /// The summary always derives from `observation` and `keywords`; rows with
    /// a blank observation get a blank summary.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn summarize_rows(&self, rows: &mut [FrameworkRow]) -> usize {
        rows.par_iter_mut().for_each(|row| {
            row.concise_observation = self.summarize(row.observation.as_str(), &row.keywords);
        });
        let summarized = rows
            .iter()
            .filter(|r| !r.concise_observation.is_empty())
            .count();
        info!(summarized, "concise observations generated");
        summarized
    }
}

/// Summarize with the built-in pattern library.
pub fn summarize(observation: impl Into<ObservationInput>, tag: &str) -> String {
    static BUILTIN: LazyLock<Summarizer> = LazyLock::new(Summarizer::default);
    BUILTIN.summarize(observation, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DPO_TEXT: &str = "• If you wish to request access to or to rectify your Personal Data or \
        withdraw/limit your consent, you may send your request in writing to the following. \
        • How You Can Contact Us Any questions, comments and requests regarding this Privacy \
        Notice are welcomed and should be addressed to: Data Protection";

    #[test]
    fn dpo_scenario_names_contact_and_rights_handling() {
        let out = summarize(DPO_TEXT, "Data Protection Officer");
        assert_eq!(
            out,
            "Serves as the designated point of contact and handles data subject rights requests."
        );
        assert!(!out.contains('•'));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn access_control_scenario() {
        let out = summarize(
            "• System access controls prevent unauthorized changes to personal data",
            "Access Control",
        );
        assert_eq!(
            out,
            "Controls to restrict and manage system/data access based on roles."
        );
    }

    #[test]
    fn shared_token_family_without_generic_aspects_uses_first_sentence() {
        // "Data Quality" shares "data" with the DPO family, which has no
        // implementation aspect, so the generic builder falls back.
        let out = summarize(
            "We implement quarterly quality checks on customer records.",
            "Data Quality",
        );
        assert_eq!(out, "We implement quarterly quality checks on customer records.");
    }

    #[test]
    fn blank_input_yields_empty() {
        assert_eq!(summarize("", "Consent"), "");
        assert_eq!(summarize("  •  \n ", "Consent"), "");
        assert_eq!(summarize(Vec::<String>::new(), "Consent"), "");
    }

    #[test]
    fn summarize_is_pure() {
        let summarizer = Summarizer::default();
        let first = summarizer.summarize(DPO_TEXT, "DPO");
        let second = summarizer.summarize(DPO_TEXT, "DPO");
        assert_eq!(first, second);
    }

    #[test]
    fn fragments_are_cleaned_and_joined() {
        let input = ObservationInput::from(&["• First part.", "  - second part "][..]);
        assert_eq!(input.normalize(), "First part. second part");
    }

    #[test]
    fn hyphenated_words_survive_cleanup() {
        assert_eq!(
            clean_fragment("- Users may opt-out * anytime"),
            "Users may opt-out anytime"
        );
        assert_eq!(clean_fragment("◦ one ▪ two"), "one two");
    }

    #[test]
    fn blank_tag_uses_placeholder() {
        let out = summarize("Short.", "   ");
        assert_eq!(out, "Provisions and procedures related to this control.");
    }

    #[test]
    fn output_is_single_line() {
        let out = summarize(
            "Line one of a long policy statement\nthat spans lines.\n\nAnother.",
            "Vendor\nOversight",
        );
        assert!(!out.contains('\n'));
        assert_eq!(out, "Line one of a long policy statement that spans lines.");
    }

    #[test]
    fn summarize_rows_recomputes_from_observation() {
        let mut rows = vec![
            FrameworkRow {
                keywords: "Access Control".into(),
                observation: "• Access is restricted.".into(),
                concise_observation: "stale".into(),
                ..FrameworkRow::default()
            },
            FrameworkRow {
                keywords: "Consent".into(),
                observation: "   ".into(),
                concise_observation: "stale".into(),
                ..FrameworkRow::default()
            },
        ];
        let count = Summarizer::default().summarize_rows(&mut rows);
        assert_eq!(count, 1);
        assert_eq!(
            rows[0].concise_observation,
            "Controls to restrict and manage system/data access based on roles."
        );
        assert_eq!(rows[1].concise_observation, "");
    }

    #[test]
    fn custom_library_is_used() {
        let library = PatternLibrary::from_toml_str(
            r#"
[[family]]
name = "default"

[[family.aspect]]
name = "implementation"
triggers = ["roll out"]
"#,
        )
        .unwrap();
        let out = Summarizer::new(library).summarize("We roll out new tooling.", "Tooling");
        assert_eq!(out, "Implementation and maintenance of Tooling.");
    }
}
