use actix_web::{web, HttpResponse, Responder};
use log::error;

use crate::lifecycle::Lifecycle;

/// Handler for `GET /documents/pending`: the review queue, newest first.
pub async fn process(lifecycle: web::Data<Lifecycle>) -> impl Responder {
    match lifecycle.list_pending() {
        Ok(views) => HttpResponse::Ok().json(views),
        Err(e) => {
            error!("pending listing failed: {e}");
            e.to_response()
        }
    }
}
