//! Document source: format detection and a registry of pluggable readers.
//!
//! Only plain text ships built in. PDF and DOCX extraction are provided by
//! whoever embeds the pipeline, by registering a [`DocumentReader`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use clausemap_shared::{ClausemapError, Result};

/// Input formats the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Text,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text recovered from a document, plus anything worth telling the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    pub text: String,
    /// Partial-recovery notes; the text is still usable.
    pub warnings: Vec<String>,
}

/// A loaded document ready for extraction.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub text: String,
    pub warnings: Vec<String>,
    /// SHA-256 of the raw file bytes, lowercase hex.
    pub content_hash: String,
}

/// Something that turns a file into text.
pub trait DocumentReader: Send + Sync {
    /// Formats this reader handles.
    fn formats(&self) -> &[DocumentFormat];

    /// Read `bytes` (the contents of `path`) into text.
    fn read(&self, path: &Path, bytes: &[u8]) -> Result<DocumentText>;
}

/// Built-in reader for `.txt` and `.md` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Text, DocumentFormat::Markdown]
    }

    fn read(&self, _path: &Path, bytes: &[u8]) -> Result<DocumentText> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(DocumentText {
                text: text.to_string(),
                warnings: Vec::new(),
            }),
            Err(e) => Ok(DocumentText {
                text: String::from_utf8_lossy(bytes).into_owned(),
                warnings: vec![format!(
                    "invalid UTF-8 at byte {}; undecodable bytes were replaced",
                    e.valid_up_to()
                )],
            }),
        }
    }
}

/// Registry mapping formats to readers. Later registrations win.
#[derive(Clone)]
pub struct DocumentReaders {
    readers: Vec<Arc<dyn DocumentReader>>,
}

impl fmt::Debug for DocumentReaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentReaders")
            .field("formats", &self.supported_formats())
            .finish()
    }
}

impl Default for DocumentReaders {
    fn default() -> Self {
        Self {
            readers: vec![Arc::new(PlainTextReader)],
        }
    }
}

impl DocumentReaders {
    /// A registry with no readers at all.
    pub fn empty() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Add a reader; it takes precedence for the formats it declares.
    pub fn register(&mut self, reader: Arc<dyn DocumentReader>) -> &mut Self {
        self.readers.push(reader);
        self
    }

    /// Formats with at least one registered reader.
    pub fn supported_formats(&self) -> Vec<DocumentFormat> {
        let mut formats: Vec<DocumentFormat> = Vec::new();
        for reader in &self.readers {
            for format in reader.formats() {
                if !formats.contains(format) {
                    formats.push(*format);
                }
            }
        }
        formats
    }

    fn reader_for(&self, format: DocumentFormat) -> Option<&Arc<dyn DocumentReader>> {
        self.readers
            .iter()
            .rev()
            .find(|r| r.formats().contains(&format))
    }

    /// Load a document from disk.
    ///
    /// Unknown extensions and formats without a registered reader yield
    /// [`ClausemapError::UnsupportedFormat`]. Reader warnings are logged and
    /// carried on the returned [`Document`].
    pub fn load(&self, path: &Path) -> Result<Document> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            ClausemapError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<none>".to_string()),
            }
        })?;

        let reader = self
            .reader_for(format)
            .ok_or_else(|| ClausemapError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format.to_string(),
            })?;

        let bytes = std::fs::read(path).map_err(|e| ClausemapError::io(path, e))?;
        let content_hash = content_hash(&bytes);
        let DocumentText { text, warnings } = reader.read(path, &bytes)?;

        for warning in &warnings {
            warn!(path = %path.display(), warning = %warning, "partial document read");
        }
        debug!(path = %path.display(), %format, chars = text.len(), "document loaded");

        Ok(Document {
            path: path.to_path_buf(),
            format,
            text,
            warnings,
            content_hash,
        })
    }
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
