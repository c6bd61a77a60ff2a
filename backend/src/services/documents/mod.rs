//! HTTP surface of the document lifecycle.
//!
//! All routes live under `/documents` and delegate to the lifecycle
//! controller; no handler touches the repository or the object store
//! directly. The provided routes are:
//!
//! - `GET /documents/pending`: every record still waiting for review, most
//!   recently submitted first.
//!
//! - `GET /documents/{identifier}`: a single document, looked up by its
//!   `document_id` or its 6-character lookup code, with a freshly signed
//!   access URL for the current rendition.
//!
//! - `PUT /documents/{identifier}/status`: the coarse status endpoint. The
//!   body carries `{"status": "approved" | "rejected" | "pending"}`;
//!   `approved` runs the full stamping approval with the default stamp text,
//!   `rejected` runs the rejection path, and `pending` is never a legal
//!   target. Unknown tokens are a 400.
//!
//! - `POST /documents/{identifier}/approve`: stamps the current rendition,
//!   stores it as a new object and advances the record to `Approved`. The
//!   optional body field `stamp_text` overrides the default.
//!
//! - `POST /documents/{identifier}/reject`: advances the record to
//!   `Rejected`; the file is untouched. An optional reviewer `comment` is
//!   accepted.
//!
//! - `POST /documents/upload`: multipart submission (`json` metadata field,
//!   then `file`); creates the pending record. Image payloads are optionally
//!   normalized to a single-page PDF first.
//!
//! - `POST /documents/normalize`: runs the image-to-PDF normalizer on the
//!   uploaded file and returns the PDF directly as a download, without
//!   creating a record.

mod approve;
mod get;
mod normalize;
mod pending;
mod reject;
mod status;
mod upload;

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/documents";

/// Configures and returns the Actix scope for the document lifecycle routes.
/// Literal segments are registered ahead of the `{identifier}` matcher.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/pending", get().to(pending::process))
        .route("/upload", post().to(upload::process))
        .route("/normalize", post().to(normalize::process))
        .route("/{identifier}", get().to(get::process))
        .route("/{identifier}/status", put().to(status::process))
        .route("/{identifier}/approve", post().to(approve::process))
        .route("/{identifier}/reject", post().to(reject::process))
}
