use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse, Responder};
use common::requests::{ErrorBody, UploadMeta};
use futures_util::StreamExt;
use log::error;
use serde_json::from_slice;

use crate::lifecycle::Lifecycle;

/// Hard cap on a submitted file.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub(super) struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Handler for `POST /documents/upload`: multipart submission with a `json`
/// metadata field and a `file` field. Creates the pending record.
pub async fn process(payload: Multipart, lifecycle: web::Data<Lifecycle>) -> impl Responder {
    let (meta, file) = match read_submission(payload).await {
        Ok(parts) => parts,
        Err(message) => {
            return HttpResponse::BadRequest().json(ErrorBody {
                error: "MalformedUpload".to_string(),
                message,
            });
        }
    };

    match lifecycle.submit(
        &meta.user_id,
        &meta.doc_type,
        &file.file_name,
        &file.content_type,
        file.bytes,
        meta.normalize,
    ) {
        Ok(view) => HttpResponse::Created().json(view),
        Err(e) => {
            error!("submission failed: {e}");
            e.to_response()
        }
    }
}

async fn read_submission(mut payload: Multipart) -> Result<(UploadMeta, FilePart), String> {
    let mut meta: Option<UploadMeta> = None;
    let mut file: Option<FilePart> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("multipart error: {e}"))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("json") => {
                let bytes = read_field(&mut field).await?;
                let parsed: UploadMeta =
                    from_slice(&bytes).map_err(|e| format!("invalid metadata: {e}"))?;
                if parsed.user_id.trim().is_empty() || parsed.doc_type.trim().is_empty() {
                    return Err("user_id and doc_type must not be empty".to_string());
                }
                meta = Some(parsed);
            }
            Some("file") => {
                file = Some(read_file_part(&mut field).await?);
            }
            _ => {}
        }
    }

    let meta = meta.ok_or("missing 'json' metadata field")?;
    let file = file.ok_or("missing 'file' field")?;
    Ok((meta, file))
}

pub(super) async fn read_file_part(field: &mut Field) -> Result<FilePart, String> {
    let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename().map(sanitize_file_name))
        .unwrap_or_else(|| "document".to_string());
    let content_type = field
        .content_type()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let bytes = read_field(field).await?;
    if bytes.is_empty() {
        return Err("uploaded file is empty".to_string());
    }
    Ok(FilePart {
        file_name,
        content_type,
        bytes,
    })
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| format!("read error: {e}"))?;
        if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err("upload exceeds the 20 MB limit".to_string());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Strips any client path prefix and collapses whitespace runs, keeping
/// object names URL-friendly.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = base.split_whitespace().collect::<Vec<_>>().join("_");
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}
