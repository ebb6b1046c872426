//! libSQL run ledger (offline, local file).
//!
//! Records which documents, by content hash, have already been merged into
//! which framework, so a later run can skip them. Optionally keeps the full
//! obligation list per document.

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use tracing::{debug, info};
use uuid::Uuid;

use clausemap_shared::{ClausemapError, Obligation, Result};

use crate::migrations;

/// One processed document as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: String,
    pub framework: String,
    pub path: String,
    pub content_hash: String,
    pub obligations: u32,
    pub processed_at: DateTime<Utc>,
}

/// What to record for a freshly merged document.
#[derive(Debug, Clone, Copy)]
pub struct NewEntry<'a> {
    pub framework: &'a str,
    pub path: &'a str,
    pub content_hash: &'a str,
    pub obligations: &'a [Obligation],
}

/// Ledger handle wrapping a libSQL database.
pub struct Ledger {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

fn storage_err(e: impl std::fmt::Display) -> ClausemapError {
    ClausemapError::Storage(e.to_string())
}

impl Ledger {
    /// Open or create the ledger at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClausemapError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let ledger = Self { db, conn };
        ledger.run_migrations().await?;
        debug!(path = %path.display(), "ledger opened");
        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<()> {
        let current = self.schema_version().await;
        for migration in migrations::all_migrations() {
            if migration.version > current {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying ledger migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ClausemapError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Whether a document with this content hash was already merged into `framework`.
    pub async fn is_processed(&self, framework: &str, content_hash: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM documents WHERE framework = ?1 AND content_hash = ?2",
                params![framework, content_hash],
            )
            .await
            .map_err(storage_err)?;
        Ok(rows.next().await.map_err(storage_err)?.is_some())
    }

    /// Record a merged document, replacing any earlier record of the same content.
    ///
    /// Obligation texts are stored only when `persist_obligations` is set; the
    /// count is always kept. Returns the new entry id.
    pub async fn record(&self, entry: NewEntry<'_>, persist_obligations: bool) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let count = entry.obligations.len() as i64;

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        tx.execute(
            "DELETE FROM obligations WHERE document_id IN
             (SELECT id FROM documents WHERE framework = ?1 AND content_hash = ?2)",
            params![entry.framework, entry.content_hash],
        )
        .await
        .map_err(storage_err)?;
        tx.execute(
            "DELETE FROM documents WHERE framework = ?1 AND content_hash = ?2",
            params![entry.framework, entry.content_hash],
        )
        .await
        .map_err(storage_err)?;
        tx.execute(
            "INSERT INTO documents (id, framework, path, content_hash, obligations, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.as_str(),
                entry.framework,
                entry.path,
                entry.content_hash,
                count,
                now.as_str()
            ],
        )
        .await
        .map_err(storage_err)?;

        if persist_obligations {
            for obligation in entry.obligations {
                tx.execute(
                    "INSERT INTO obligations (document_id, category, matched_keyword, domain, text)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        id.as_str(),
                        obligation.category.as_str(),
                        obligation.matched_keyword.as_str(),
                        obligation.domain.as_str(),
                        obligation.text.as_str()
                    ],
                )
                .await
                .map_err(storage_err)?;
            }
        }
        tx.commit().await.map_err(storage_err)?;

        debug!(id = %id, path = entry.path, obligations = count, "document recorded");
        Ok(id)
    }

    /// Number of documents recorded against `framework`.
    pub async fn processed_count(&self, framework: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM documents WHERE framework = ?1",
                params![framework],
            )
            .await
            .map_err(storage_err)?;
        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<u64>(0).map_err(storage_err)?),
            None => Ok(0),
        }
    }

    /// All documents recorded against `framework`, oldest first.
    pub async fn list_documents(&self, framework: &str) -> Result<Vec<LedgerEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, framework, path, content_hash, obligations, processed_at
                 FROM documents WHERE framework = ?1 ORDER BY processed_at, id",
                params![framework],
            )
            .await
            .map_err(storage_err)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// Persisted obligations for one document, in extraction order.
    pub async fn obligations_for(&self, document_id: &str) -> Result<Vec<Obligation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT text, category, matched_keyword, domain
                 FROM obligations WHERE document_id = ?1 ORDER BY id",
                params![document_id],
            )
            .await
            .map_err(storage_err)?;

        let mut obligations = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            obligations.push(Obligation {
                text: row.get::<String>(0).map_err(storage_err)?,
                category: row.get::<String>(1).map_err(storage_err)?,
                matched_keyword: row.get::<String>(2).map_err(storage_err)?,
                domain: row.get::<String>(3).map_err(storage_err)?,
            });
        }
        Ok(obligations)
    }
}

fn row_to_entry(row: &libsql::Row) -> Result<LedgerEntry> {
    let processed_at: String = row.get(5).map_err(storage_err)?;
    let processed_at = DateTime::parse_from_rfc3339(&processed_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ClausemapError::Storage(format!("bad processed_at: {e}")))?;

    Ok(LedgerEntry {
        id: row.get(0).map_err(storage_err)?,
        framework: row.get(1).map_err(storage_err)?,
        path: row.get(2).map_err(storage_err)?,
        content_hash: row.get(3).map_err(storage_err)?,
        obligations: row.get(4).map_err(storage_err)?,
        processed_at,
    })
}
