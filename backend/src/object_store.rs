//! Filesystem object store and signed-URL issuing.
//!
//! Objects live under a configured root at relative, forward-slash paths of
//! the form `<user_id>/<file name>`. Reads and writes map onto the error
//! taxonomy (`SourceUnavailable` / `StorageWriteFailed`); access URLs carry
//! an expiry timestamp and an md5 digest over a server secret, verified by
//! the `/files` route before any byte is served.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{DocumentError, Result};

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ObjectStore { root: root.into() }
    }

    /// Maps a relative object path below the root, rejecting empty, absolute
    /// and traversal segments.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        if path.is_empty()
            || path
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return None;
        }
        Some(self.root.join(path))
    }

    pub fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self
            .resolve(path)
            .ok_or_else(|| DocumentError::SourceUnavailable(format!("bad path '{path}'")))?;
        fs::read(&full).map_err(|e| DocumentError::SourceUnavailable(format!("{path}: {e}")))
    }

    /// All-or-nothing write: the payload lands under a temporary sibling name
    /// and is renamed into place, so a crash mid-write never leaves a partial
    /// object at the final path.
    pub fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self
            .resolve(path)
            .ok_or_else(|| DocumentError::StorageWriteFailed(format!("bad path '{path}'")))?;
        let parent = full
            .parent()
            .ok_or_else(|| DocumentError::StorageWriteFailed(format!("bad path '{path}'")))?;
        fs::create_dir_all(parent)
            .map_err(|e| DocumentError::StorageWriteFailed(format!("{path}: {e}")))?;

        let file_name = full
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocumentError::StorageWriteFailed(format!("bad path '{path}'")))?;
        let staging = parent.join(format!(".{file_name}.part"));
        fs::write(&staging, bytes)
            .map_err(|e| DocumentError::StorageWriteFailed(format!("{path}: {e}")))?;
        fs::rename(&staging, &full)
            .map_err(|e| DocumentError::StorageWriteFailed(format!("{path}: {e}")))?;
        Ok(())
    }
}

/// Issues and verifies time-limited access URLs for stored objects, standing
/// in for the managed store's signed-URL facility.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    secret: String,
    ttl_secs: u64,
}

impl UrlSigner {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        UrlSigner {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// `/files/<path>?expires=<unix>&sig=<digest>`, valid for the configured
    /// lifetime.
    pub fn signed_url(&self, path: &str) -> String {
        let expires = unix_now() + self.ttl_secs;
        let sig = self.signature(path, expires);
        format!("/files/{path}?expires={expires}&sig={sig}")
    }

    pub fn verify(&self, path: &str, expires: u64, sig: &str) -> bool {
        unix_now() <= expires && self.signature(path, expires) == sig
    }

    fn signature(&self, path: &str, expires: u64) -> String {
        format!(
            "{:x}",
            md5::compute(format!("{}:{}:{}", self.secret, path, expires))
        )
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = test_store();
        store.put("user-1/1000_id.pdf", b"payload").unwrap();
        assert_eq!(store.get("user-1/1000_id.pdf").unwrap(), b"payload");
    }

    #[test]
    fn writes_are_additive_not_destructive() {
        let (_dir, store) = test_store();
        store.put("user-1/1000_id.pdf", b"original").unwrap();
        store.put("user-1/2000_id.pdf", b"stamped").unwrap();
        assert_eq!(store.get("user-1/1000_id.pdf").unwrap(), b"original");
        assert_eq!(store.get("user-1/2000_id.pdf").unwrap(), b"stamped");
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let (_dir, store) = test_store();
        assert!(store.put("../escape.pdf", b"x").is_err());
        assert!(matches!(
            store.get("user-1/../../etc/passwd"),
            Err(DocumentError::SourceUnavailable(_))
        ));
        assert!(store.get("/absolute").is_err());
    }

    #[test]
    fn missing_objects_are_source_unavailable() {
        let (_dir, store) = test_store();
        assert!(matches!(
            store.get("user-1/none.pdf"),
            Err(DocumentError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn signed_urls_verify_until_expiry() {
        let signer = UrlSigner::new("secret", 60);
        let url = signer.signed_url("user-1/1000_id.pdf");
        let query = url.split_once('?').unwrap().1;
        let mut expires = 0u64;
        let mut sig = String::new();
        for pair in query.split('&') {
            match pair.split_once('=').unwrap() {
                ("expires", v) => expires = v.parse().unwrap(),
                ("sig", v) => sig = v.to_string(),
                _ => {}
            }
        }

        assert!(signer.verify("user-1/1000_id.pdf", expires, &sig));
        // Tampering with the path or the expiry invalidates the digest.
        assert!(!signer.verify("user-1/other.pdf", expires, &sig));
        assert!(!signer.verify("user-1/1000_id.pdf", expires + 1, &sig));
        // A different signing secret never validates.
        assert!(!UrlSigner::new("other", 60).verify("user-1/1000_id.pdf", expires, &sig));
    }

    #[test]
    fn expired_links_fail_even_with_a_valid_digest() {
        let signer = UrlSigner::new("secret", 60);
        let past = unix_now() - 10;
        let sig = signer.signature("user-1/1000_id.pdf", past);
        assert!(!signer.verify("user-1/1000_id.pdf", past, &sig));
    }
}
