//! SQL migrations for the run ledger.
//!
//! Applied in version order when the ledger opens; each migration records
//! itself in `schema_migrations`.

/// A ledger schema migration.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: documents, obligations",
        sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per document merged into a framework
CREATE TABLE IF NOT EXISTS documents (
    id           TEXT PRIMARY KEY,
    framework    TEXT NOT NULL,
    path         TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    obligations  INTEGER NOT NULL DEFAULT 0,
    processed_at TEXT NOT NULL,
    UNIQUE(framework, content_hash)
);

CREATE INDEX IF NOT EXISTS idx_documents_framework ON documents(framework);

-- Full obligation list, kept only when persistence is enabled
CREATE TABLE IF NOT EXISTS obligations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id     TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    category        TEXT NOT NULL,
    matched_keyword TEXT NOT NULL,
    domain          TEXT NOT NULL,
    text            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_obligations_document ON obligations(document_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}

/// Highest version defined above.
pub(crate) fn latest_version() -> u32 {
    all_migrations().last().map_or(0, |m| m.version)
}
