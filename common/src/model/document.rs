use serde::{Deserialize, Serialize};

/// Review state of a submitted document.
///
/// The lifecycle is forward-only: every document starts out `pending` and is
/// moved exactly once, by a reviewer, to one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[serde(rename = "pending")]
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// The stored spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "Approved",
            DocumentStatus::Rejected => "Rejected",
        }
    }

    /// Parses a stored or user-supplied status token, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Some(DocumentStatus::Pending),
            "approved" => Some(DocumentStatus::Approved),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted document record, the unit of work of the whole platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub document_id: String,
    /// 6-character retrieval code; also resolves to exactly one record.
    pub code_id: String,
    /// Submitter linkage, immutable.
    pub user_id: String,
    /// Submitter-chosen category ("identity", "residence", "additional").
    pub doc_type: String,
    /// Original upload filename, whitespace sanitized.
    pub file_name: String,
    /// Declared MIME type of the current rendition; drives stamping.
    pub content_type: String,
    /// Object-store pointer to the current rendition. Swapped to the stamped
    /// rendition on approval; never overwritten in place.
    pub file_path: String,
    pub status: DocumentStatus,
    /// RFC 3339, set once at creation.
    pub submitted_at: String,
    /// RFC 3339, set once at the moment of approval.
    pub verified_at: Option<String>,
    /// The literal text burned into the stamped rendition.
    pub stamp_text: Option<String>,
}

/// Read-only projection of a record served over HTTP: everything a review or
/// submission screen needs, with a time-limited access URL in place of the
/// internal storage path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub document_id: String,
    pub code_id: String,
    pub user_id: String,
    pub doc_type: String,
    pub file_name: String,
    pub content_type: String,
    pub status: DocumentStatus,
    pub submitted_at: String,
    pub verified_at: Option<String>,
    pub stamp_text: Option<String>,
    /// Signed, expiring URL for the current rendition.
    pub file_url: String,
}

impl DocumentView {
    pub fn from_record(record: DocumentRecord, file_url: String) -> Self {
        DocumentView {
            document_id: record.document_id,
            code_id: record.code_id,
            user_id: record.user_id,
            doc_type: record.doc_type,
            file_name: record.file_name,
            content_type: record.content_type,
            status: record.status,
            submitted_at: record.submitted_at,
            verified_at: record.verified_at,
            stamp_text: record.stamp_text,
            file_url,
        }
    }
}
