//! The document lifecycle controller: the only component that creates
//! document records or moves them between states.
//!
//! `approve` orders its steps so that readers never observe an `Approved`
//! record pointing at a missing object: the stamped rendition is written and
//! durable before the record is touched, and the record update itself is a
//! conditional single statement. A failure after the object write orphans the
//! stamped copy (logged, not retried) but leaves the record consistent.

use std::path::PathBuf;

use chrono::Utc;
use common::model::document::{DocumentRecord, DocumentStatus, DocumentView};
use log::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{DocumentError, Result};
use crate::normalizer;
use crate::object_store::{ObjectStore, UrlSigner};
use crate::repository::Repository;
use crate::stamp;

/// Stamp text applied when a reviewer does not supply one.
pub const DEFAULT_STAMP_TEXT: &str = "APPROVED";

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

#[derive(Clone)]
pub struct Lifecycle {
    repo: Repository,
    store: ObjectStore,
    signer: UrlSigner,
    fonts_dir: PathBuf,
}

impl Lifecycle {
    pub fn new(config: &AppConfig) -> Self {
        Lifecycle {
            repo: Repository::new(&config.database_path),
            store: ObjectStore::new(&config.storage_root),
            signer: UrlSigner::new(&config.signing_secret, config.signed_url_ttl_secs),
            fonts_dir: config.fonts_dir.clone(),
        }
    }

    pub fn init(&self) -> Result<()> {
        self.repo.init()
    }

    /// Submission path: stores the payload and creates the pending record.
    /// With `normalize` set and an image payload, the upload normalizer runs
    /// first and the stored rendition is the produced PDF.
    pub fn submit(
        &self,
        user_id: &str,
        doc_type: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        normalize: bool,
    ) -> Result<DocumentView> {
        let (file_name, content_type, payload) =
            if normalize && content_type.to_ascii_lowercase().starts_with("image/") {
                let pdf = normalizer::normalize(&bytes)?;
                (
                    pdf_file_name(file_name),
                    "application/pdf".to_string(),
                    pdf,
                )
            } else {
                (file_name.to_string(), content_type.to_string(), bytes)
            };

        let record = DocumentRecord {
            document_id: Uuid::new_v4().to_string(),
            code_id: lookup_code(),
            user_id: user_id.to_string(),
            doc_type: doc_type.to_string(),
            file_path: object_name(user_id, &file_name),
            file_name,
            content_type,
            status: DocumentStatus::Pending,
            submitted_at: Utc::now().to_rfc3339(),
            verified_at: None,
            stamp_text: None,
        };
        self.store.put(&record.file_path, &payload)?;
        self.repo.insert(&record)?;
        info!(
            "document {} ({}) submitted by {}",
            record.document_id, record.doc_type, record.user_id
        );
        Ok(self.view(record))
    }

    /// Read-only lookup by `document_id` or `code_id`, with a freshly signed
    /// access URL for the current rendition.
    pub fn fetch_for_review(&self, identifier: &str) -> Result<DocumentView> {
        Ok(self.view(self.repo.find(identifier)?))
    }

    /// Snapshot of everything still waiting for review, newest first.
    pub fn list_pending(&self) -> Result<Vec<DocumentView>> {
        Ok(self
            .repo
            .list_by_status(DocumentStatus::Pending)?
            .into_iter()
            .map(|record| self.view(record))
            .collect())
    }

    /// Approval: read the current rendition, stamp it, write the stamped copy
    /// under a new timestamp-prefixed name, then advance the record.
    pub fn approve(&self, identifier: &str, stamp_text: &str) -> Result<DocumentView> {
        let record = self.repo.find(identifier)?;
        if record.status != DocumentStatus::Pending {
            return Err(DocumentError::InvalidTransition(
                record.status.as_str().to_string(),
            ));
        }

        let original = self.store.get(&record.file_path)?;
        let stamped = stamp::stamp(&original, &record.content_type, stamp_text, &self.fonts_dir)?;
        let stamped_path = object_name(&record.user_id, &record.file_name);
        self.store.put(&stamped_path, &stamped)?;

        let verified_at = Utc::now().to_rfc3339();
        let updated = self
            .repo
            .mark_approved(&record.document_id, &stamped_path, &verified_at, stamp_text)
            .map_err(|err| {
                // The stamped object is durable but the record never advanced:
                // orphaned, not inconsistent. Left for out-of-band cleanup.
                warn!("stamped object {stamped_path} orphaned: {err}");
                err
            })?;
        info!(
            "document {} approved, stamped rendition at {stamped_path}",
            updated.document_id
        );
        Ok(self.view(updated))
    }

    /// Rejection: status flip only, the file pointer is never touched. The
    /// optional reviewer comment is surfaced in the log; persisting it is a
    /// reviewer-tooling concern, not part of the record.
    pub fn reject(&self, identifier: &str, comment: Option<&str>) -> Result<DocumentView> {
        let record = self.repo.find(identifier)?;
        if record.status != DocumentStatus::Pending {
            return Err(DocumentError::InvalidTransition(
                record.status.as_str().to_string(),
            ));
        }
        let updated = self.repo.mark_rejected(&record.document_id)?;
        match comment {
            Some(comment) => info!("document {} rejected: {comment}", updated.document_id),
            None => info!("document {} rejected", updated.document_id),
        }
        Ok(self.view(updated))
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn view(&self, record: DocumentRecord) -> DocumentView {
        let file_url = self.signer.signed_url(&record.file_path);
        DocumentView::from_record(record, file_url)
    }
}

/// `<user_id>/<unix-millis>_<file name>`: every write gets a fresh,
/// timestamp-prefixed name, so renditions are additive.
fn object_name(user_id: &str, file_name: &str) -> String {
    format!("{}/{}_{}", user_id, Utc::now().timestamp_millis(), file_name)
}

pub(crate) fn pdf_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.pdf"),
        _ => format!("{file_name}.pdf"),
    }
}

/// 6-character A–Z/0–9 retrieval code, derived from fresh UUID entropy.
fn lookup_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(CODE_LEN)
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect()
}
