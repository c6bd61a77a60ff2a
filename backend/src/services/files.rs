//! Signed-object serving.
//!
//! `GET /files/{path}?expires=<unix>&sig=<digest>` is the resolution target
//! of every `file_url` handed out by the lifecycle controller. The signature
//! and expiry are verified before any byte leaves the store; failures answer
//! 403 without revealing whether the object exists.

use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use common::requests::ErrorBody;
use log::error;
use mime_guess::from_path;
use serde::Deserialize;

use crate::lifecycle::Lifecycle;

const API_PATH: &str = "/files";

#[derive(Deserialize)]
pub struct SignedQuery {
    expires: u64,
    sig: String,
}

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{path:.*}", get().to(process))
}

pub async fn process(
    path: web::Path<String>,
    query: web::Query<SignedQuery>,
    lifecycle: web::Data<Lifecycle>,
) -> impl Responder {
    if !lifecycle.signer().verify(&path, query.expires, &query.sig) {
        return HttpResponse::Forbidden().json(ErrorBody {
            error: "LinkExpired".to_string(),
            message: "the access link is invalid or has expired".to_string(),
        });
    }

    match lifecycle.store().get(&path) {
        Ok(bytes) => {
            let mime = from_path(path.as_str()).first_or_octet_stream();
            HttpResponse::Ok().content_type(mime.as_ref()).body(bytes)
        }
        Err(e) => {
            error!("signed object read failed: {e}");
            HttpResponse::NotFound().json(ErrorBody {
                error: "NotFound".to_string(),
                message: "no such object".to_string(),
            })
        }
    }
}
