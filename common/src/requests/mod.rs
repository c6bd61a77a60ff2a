use serde::{Deserialize, Serialize};

/// Metadata half of the multipart submission payload. Sent as the `json`
/// field ahead of the file itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMeta {
    pub user_id: String,
    pub doc_type: String,
    /// Run the image-to-PDF normalizer before the payload is stored.
    #[serde(default)]
    pub normalize: bool,
}

/// Body of `POST /documents/{identifier}/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Text burned into the stamped rendition; a default is applied when
    /// omitted.
    pub stamp_text: Option<String>,
}

/// Body of `POST /documents/{identifier}/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub comment: Option<String>,
}

/// Body of `PUT /documents/{identifier}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Error payload returned by every failing endpoint: a stable taxonomy label
/// plus a presentable message. Internal paths and driver detail never appear
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
