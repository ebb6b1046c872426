//! Core pipeline orchestration for Clausemap.
//!
//! Ties together document reading, obligation extraction, the framework
//! merger and the observation summarizer into end-to-end workflows
//! (e.g. [`process_documents`]).

pub mod pipeline;
pub mod report;

use tracing::info;

use clausemap_extractor::{Extractor, Taxonomy};
use clausemap_shared::{AppConfig, Result, validate_sources};
use clausemap_storage::DocumentReaders;
use clausemap_summarizer::{PatternLibrary, Summarizer};

pub use pipeline::{
    ProgressReporter, SilentProgress, SummarizeReport, extract_document, process_documents,
    summarize_framework,
};
pub use report::{BatchReport, BatchStatus, DocumentOutcome, DocumentReport};

/// Read-only configuration shared by every stage of a run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    extractor: Extractor,
    summarizer: Summarizer,
    readers: DocumentReaders,
}

impl Pipeline {
    pub fn new(taxonomy: Taxonomy, library: PatternLibrary, readers: DocumentReaders) -> Self {
        Self {
            extractor: Extractor::new(taxonomy),
            summarizer: Summarizer::new(library),
            readers,
        }
    }

    /// Build from app config, loading alternate taxonomy/pattern files when set.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        validate_sources(config)?;

        let taxonomy = match &config.sources.taxonomy_path {
            Some(path) => Taxonomy::load(path)?,
            None => Taxonomy::builtin(),
        };
        let library = match &config.sources.patterns_path {
            Some(path) => PatternLibrary::load(path)?,
            None => PatternLibrary::builtin(),
        };
        info!(
            categories = taxonomy.categories().len(),
            families = library.families().len(),
            "pipeline configured"
        );

        Ok(Self::new(taxonomy, library, DocumentReaders::default()))
    }

    /// Replace the document reader registry (e.g. to add PDF support).
    pub fn with_readers(mut self, readers: DocumentReaders) -> Self {
        self.readers = readers;
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn readers(&self) -> &DocumentReaders {
        &self.readers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clausemap_shared::SourcesConfig;
    use uuid::Uuid;

    #[test]
    fn default_config_uses_builtins() {
        let pipeline = Pipeline::from_config(&AppConfig::default()).unwrap();
        assert_eq!(
            pipeline.extractor().taxonomy().categories().len(),
            Taxonomy::builtin().categories().len()
        );
    }

    #[test]
    fn missing_source_file_is_config_error() {
        let config = AppConfig {
            sources: SourcesConfig {
                taxonomy_path: Some("/nonexistent/taxonomy.toml".into()),
                patterns_path: None,
            },
            ..AppConfig::default()
        };
        let err = Pipeline::from_config(&config).unwrap_err();
        assert!(matches!(err, clausemap_shared::ClausemapError::Config { .. }));
    }

    #[test]
    fn custom_taxonomy_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("taxonomy_{}.toml", Uuid::now_v7()));
        std::fs::write(
            &path,
            "[[category]]\nname = \"vendors\"\ndomain = \"Third Party Oversight\"\nkeywords = [\"vendor\"]\n",
        )
        .unwrap();
        let config = AppConfig {
            sources: SourcesConfig {
                taxonomy_path: Some(path.clone()),
                patterns_path: None,
            },
            ..AppConfig::default()
        };
        let pipeline = Pipeline::from_config(&config).unwrap();
        let found = pipeline.extractor().extract("Every vendor signs our terms.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].domain, "Third Party Oversight");
        let _ = std::fs::remove_file(path);
    }
}
