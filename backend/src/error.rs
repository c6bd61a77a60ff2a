//! Failure taxonomy of the document lifecycle.
//!
//! Handlers log the full error and answer with [`DocumentError::to_response`],
//! which carries only the taxonomy label and a presentable message — storage
//! paths and driver detail stay in the log.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use common::requests::ErrorBody;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no document matches '{0}'")]
    NotFound(String),

    #[error("stored object could not be read: {0}")]
    SourceUnavailable(String),

    #[error("unsupported document type '{0}'")]
    UnsupportedType(String),

    #[error("object store write failed: {0}")]
    StorageWriteFailed(String),

    #[error("document is already {0}")]
    InvalidTransition(String),

    #[error("payload could not be decoded: {0}")]
    DecodeError(String),

    #[error("stamping failed: {0}")]
    Stamping(String),

    #[error("pdf composition failed: {0}")]
    Normalize(String),

    #[error("repository error: {0}")]
    Repository(#[from] rusqlite::Error),
}

impl DocumentError {
    /// Stable label surfaced to clients next to the HTTP status.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentError::NotFound(_) => "NotFound",
            DocumentError::SourceUnavailable(_) => "SourceUnavailable",
            DocumentError::UnsupportedType(_) => "UnsupportedType",
            DocumentError::StorageWriteFailed(_) => "StorageWriteFailed",
            DocumentError::InvalidTransition(_) => "InvalidTransition",
            DocumentError::DecodeError(_) => "DecodeError",
            DocumentError::Stamping(_) => "StampingFailed",
            DocumentError::Normalize(_) => "NormalizeFailed",
            DocumentError::Repository(_) => "RepositoryError",
        }
    }

    fn public_message(&self) -> String {
        match self {
            DocumentError::NotFound(identifier) => {
                format!("no document matches '{identifier}'")
            }
            DocumentError::SourceUnavailable(_) => {
                "the stored document could not be read".to_string()
            }
            DocumentError::UnsupportedType(mime) => {
                format!("documents of type '{mime}' cannot be stamped")
            }
            DocumentError::StorageWriteFailed(_) => {
                "the stamped document could not be stored".to_string()
            }
            DocumentError::InvalidTransition(status) => {
                format!("document is already {status}; only pending documents can be reviewed")
            }
            DocumentError::DecodeError(_) => {
                "the uploaded payload is not a decodable image".to_string()
            }
            DocumentError::Stamping(_) => "the document could not be stamped".to_string(),
            DocumentError::Normalize(_) => "the document could not be converted".to_string(),
            DocumentError::Repository(_) => "the document repository is unavailable".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
            DocumentError::UnsupportedType(_) | DocumentError::DecodeError(_) => {
                StatusCode::BAD_REQUEST
            }
            DocumentError::InvalidTransition(_) => StatusCode::CONFLICT,
            DocumentError::SourceUnavailable(_)
            | DocumentError::StorageWriteFailed(_)
            | DocumentError::Stamping(_)
            | DocumentError::Normalize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DocumentError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.label().to_string(),
            message: self.public_message(),
        })
    }
}
