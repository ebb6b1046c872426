//! Persistence for the pipeline: document sources, framework workbooks, and
//! the libSQL run ledger.
//!
//! **Access rules:**
//! - Framework workbooks: one writer at a time, guarded by [`WriterLock`]
//! - Ledger: local libSQL file next to the output framework, opened by the CLI

pub mod documents;
pub mod ledger;
mod migrations;
pub mod table;

pub use documents::{
    Document, DocumentFormat, DocumentReader, DocumentReaders, DocumentText, PlainTextReader,
    content_hash,
};
pub use ledger::{Ledger, LedgerEntry, NewEntry};
pub use table::{WriterLock, load_table, save_table};
