use actix_web::{web, HttpResponse, Responder};
use common::requests::RejectRequest;
use log::error;

use crate::lifecycle::Lifecycle;

/// Handler for `POST /documents/{identifier}/reject`.
pub async fn process(
    identifier: web::Path<String>,
    payload: web::Json<RejectRequest>,
    lifecycle: web::Data<Lifecycle>,
) -> impl Responder {
    match lifecycle.reject(&identifier, payload.comment.as_deref()) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            error!("rejection of '{identifier}' failed: {e}");
            e.to_response()
        }
    }
}
