//! Prescription PDF endpoints.
//!
//! - `POST /api/generate-pdf`: PDF attachment from an ad-hoc request
//! - `POST /api/generate-pdf-base64`: same document, base64 in JSON
//! - `GET /api/generate-pdf/:id`: PDF attachment for a stored patient

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_patient_id, ApiContext};
use crate::core_state::RenderedDocument;
use crate::document::{DocumentRequest, PrescriptionDocument};

fn attachment(rendered: RenderedDocument) -> Result<Response, ApiError> {
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", rendered.filename))
            .map_err(|e| {
                tracing::error!(
                    filename = %rendered.filename,
                    error = %e,
                    "Bad attachment filename"
                );
                ApiError::Internal(format!("Invalid attachment filename: {e}"))
            })?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// `POST /api/generate-pdf`
pub async fn generate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let rendered = ctx.core.render_document(&PrescriptionDocument::from(req))?;
    attachment(rendered)
}

#[derive(Debug, Serialize)]
pub struct Base64Response {
    pub status: &'static str,
    pub pdf_base64: String,
    pub filename: String,
}

/// `POST /api/generate-pdf-base64`
pub async fn generate_base64(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<Json<Base64Response>, ApiError> {
    let Json(req) = payload?;
    let rendered = ctx.core.render_document(&PrescriptionDocument::from(req))?;

    Ok(Json(Base64Response {
        status: "success",
        pdf_base64: base64::engine::general_purpose::STANDARD.encode(&rendered.bytes),
        filename: rendered.filename,
    }))
}

/// `GET /api/generate-pdf/:id`
pub async fn for_patient(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_patient_id(&id)?;
    let rendered = ctx.core.render_patient_document(id)?;
    attachment(rendered)
}
