use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder};
use common::requests::ErrorBody;
use futures_util::StreamExt;
use log::error;

use super::upload::{read_file_part, FilePart};
use crate::lifecycle::pdf_file_name;
use crate::normalizer;

/// Handler for `POST /documents/normalize`: run the image-to-PDF normalizer
/// on the uploaded file and hand the single-page PDF straight back as a
/// download. Nothing is stored and no record is created.
pub async fn process(payload: Multipart) -> impl Responder {
    let file = match read_upload(payload).await {
        Ok(file) => file,
        Err(message) => {
            return HttpResponse::BadRequest().json(ErrorBody {
                error: "MalformedUpload".to_string(),
                message,
            });
        }
    };

    match normalizer::normalize(&file.bytes) {
        Ok(pdf) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!(
                    "attachment; filename=\"{}\"",
                    pdf_file_name(&file.file_name)
                ),
            ))
            .body(pdf),
        Err(e) => {
            error!("normalization failed: {e}");
            e.to_response()
        }
    }
}

async fn read_upload(mut payload: Multipart) -> Result<FilePart, String> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("multipart error: {e}"))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() == Some("file") {
            return read_file_part(&mut field).await;
        }
    }
    Err("missing 'file' field".to_string())
}
