//! SQLite-backed document repository.
//!
//! A single `documents` table holds one row per submitted document. Both
//! status transitions are conditional updates guarded on `status = 'pending'`;
//! the guard doubles as the optimistic-concurrency check, so two racing
//! reviews of the same document resolve deterministically (one wins, the
//! other sees `InvalidTransition`).

use std::path::PathBuf;

use common::model::document::{DocumentRecord, DocumentStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{DocumentError, Result};

const COLUMNS: &str = "document_id, code_id, user_id, doc_type, file_name, \
                       content_type, file_path, status, submitted_at, verified_at, stamp_text";

#[derive(Debug, Clone)]
pub struct Repository {
    db_path: PathBuf,
}

impl Repository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Repository {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.db_path)
    }

    /// Creates the schema. Called once at startup.
    pub fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                document_id  TEXT PRIMARY KEY,
                code_id      TEXT NOT NULL UNIQUE,
                user_id      TEXT NOT NULL,
                doc_type     TEXT NOT NULL,
                file_name    TEXT NOT NULL,
                content_type TEXT NOT NULL,
                file_path    TEXT NOT NULL,
                status       TEXT NOT NULL DEFAULT 'pending',
                submitted_at TEXT NOT NULL,
                verified_at  TEXT,
                stamp_text   TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);",
        )?;
        Ok(())
    }

    pub fn insert(&self, record: &DocumentRecord) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            &format!(
                "INSERT INTO documents ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                record.document_id,
                record.code_id,
                record.user_id,
                record.doc_type,
                record.file_name,
                record.content_type,
                record.file_path,
                record.status.as_str(),
                record.submitted_at,
                record.verified_at,
                record.stamp_text,
            ],
        )?;
        Ok(())
    }

    /// Looks a record up by `document_id` or by its secondary `code_id`.
    pub fn find(&self, identifier: &str) -> Result<DocumentRecord> {
        let conn = self.open()?;
        fetch(&conn, identifier)?.ok_or_else(|| DocumentError::NotFound(identifier.to_string()))
    }

    /// All records in `status`, most recently submitted first.
    pub fn list_by_status(&self, status: DocumentStatus) -> Result<Vec<DocumentRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM documents WHERE status = ?1 ORDER BY submitted_at DESC"
        ))?;
        let rows = stmt.query_map(params![status.as_str()], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Advances a pending record to `Approved`, swapping the file pointer to
    /// the stamped rendition and setting `verified_at`/`stamp_text` in one
    /// statement. Zero affected rows means the record is gone or no longer
    /// pending.
    pub fn mark_approved(
        &self,
        document_id: &str,
        file_path: &str,
        verified_at: &str,
        stamp_text: &str,
    ) -> Result<DocumentRecord> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE documents
             SET status = ?2, file_path = ?3, verified_at = ?4, stamp_text = ?5
             WHERE document_id = ?1 AND status = ?6",
            params![
                document_id,
                DocumentStatus::Approved.as_str(),
                file_path,
                verified_at,
                stamp_text,
                DocumentStatus::Pending.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(transition_conflict(&conn, document_id));
        }
        fetch(&conn, document_id)?.ok_or_else(|| DocumentError::NotFound(document_id.to_string()))
    }

    /// Advances a pending record to `Rejected`. The file pointer is left
    /// untouched.
    pub fn mark_rejected(&self, document_id: &str) -> Result<DocumentRecord> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE documents SET status = ?2 WHERE document_id = ?1 AND status = ?3",
            params![
                document_id,
                DocumentStatus::Rejected.as_str(),
                DocumentStatus::Pending.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(transition_conflict(&conn, document_id));
        }
        fetch(&conn, document_id)?.ok_or_else(|| DocumentError::NotFound(document_id.to_string()))
    }
}

fn fetch(conn: &Connection, identifier: &str) -> Result<Option<DocumentRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM documents WHERE document_id = ?1 OR code_id = ?1"),
            params![identifier],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

/// Distinguishes "gone" from "no longer pending" after a guarded update
/// affected zero rows.
fn transition_conflict(conn: &Connection, document_id: &str) -> DocumentError {
    match fetch(conn, document_id) {
        Ok(Some(record)) => DocumentError::InvalidTransition(record.status.as_str().to_string()),
        Ok(None) => DocumentError::NotFound(document_id.to_string()),
        Err(err) => err,
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<DocumentRecord> {
    let status: String = row.get(7)?;
    let status = DocumentStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(format!("unknown status '{status}'"))),
        )
    })?;
    Ok(DocumentRecord {
        document_id: row.get(0)?,
        code_id: row.get(1)?,
        user_id: row.get(2)?,
        doc_type: row.get(3)?,
        file_name: row.get(4)?,
        content_type: row.get(5)?,
        file_path: row.get(6)?,
        status,
        submitted_at: row.get(8)?,
        verified_at: row.get(9)?,
        stamp_text: row.get(10)?,
    })
}
