use actix_web::{web, HttpResponse, Responder};
use log::error;

use crate::lifecycle::Lifecycle;

/// Handler for `GET /documents/{identifier}`.
pub async fn process(
    identifier: web::Path<String>,
    lifecycle: web::Data<Lifecycle>,
) -> impl Responder {
    match lifecycle.fetch_for_review(&identifier) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            error!("fetch for review failed: {e}");
            e.to_response()
        }
    }
}
