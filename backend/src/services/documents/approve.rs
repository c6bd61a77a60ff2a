use actix_web::{web, HttpResponse, Responder};
use common::requests::ApproveRequest;
use log::error;

use crate::lifecycle::{Lifecycle, DEFAULT_STAMP_TEXT};

/// Handler for `POST /documents/{identifier}/approve`: stamp the current
/// rendition, store it as a new object and advance the record.
pub async fn process(
    identifier: web::Path<String>,
    payload: web::Json<ApproveRequest>,
    lifecycle: web::Data<Lifecycle>,
) -> impl Responder {
    let stamp_text = payload
        .stamp_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_STAMP_TEXT);

    match lifecycle.approve(&identifier, stamp_text) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            error!("approval of '{identifier}' failed: {e}");
            e.to_response()
        }
    }
}
