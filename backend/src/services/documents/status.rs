use actix_web::{web, HttpResponse, Responder};
use common::model::document::DocumentStatus;
use common::requests::{ErrorBody, StatusUpdateRequest};
use log::error;

use crate::lifecycle::{Lifecycle, DEFAULT_STAMP_TEXT};

/// Handler for `PUT /documents/{identifier}/status`, the coarse endpoint the
/// review screens call with `{"status": ...}`. Both legal targets route
/// through the lifecycle controller, so the state machine cannot be bypassed.
pub async fn process(
    identifier: web::Path<String>,
    payload: web::Json<StatusUpdateRequest>,
    lifecycle: web::Data<Lifecycle>,
) -> impl Responder {
    let Some(target) = DocumentStatus::parse(&payload.status) else {
        return HttpResponse::BadRequest().json(ErrorBody {
            error: "UnknownStatus".to_string(),
            message: format!(
                "'{}' is not one of pending, approved, rejected",
                payload.status
            ),
        });
    };

    let result = match target {
        DocumentStatus::Approved => lifecycle.approve(&identifier, DEFAULT_STAMP_TEXT),
        DocumentStatus::Rejected => lifecycle.reject(&identifier, None),
        DocumentStatus::Pending => {
            return HttpResponse::Conflict().json(ErrorBody {
                error: "InvalidTransition".to_string(),
                message: "a document cannot be returned to pending".to_string(),
            });
        }
    };

    match result {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            error!("status update of '{identifier}' failed: {e}");
            e.to_response()
        }
    }
}
