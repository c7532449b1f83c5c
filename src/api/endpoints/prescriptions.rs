//! Final prescription endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_patient_id, ApiContext};
use crate::models::OverrideLogEntry;

#[derive(Debug, Deserialize)]
pub struct FinalPrescriptionRequest {
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub final_prescription: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalPrescriptionResponse {
    pub message: &'static str,
    pub log: OverrideLogEntry,
    /// False when the entry is held in memory only.
    pub persisted: bool,
}

/// `POST /api/appointments/:id/final-prescription`
pub async fn finalize(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<FinalPrescriptionRequest>, JsonRejection>,
) -> Result<Json<FinalPrescriptionResponse>, ApiError> {
    let id = parse_patient_id(&id)?;
    let Json(req) = payload?;

    let finalized = ctx
        .core
        .finalize_prescription(id, &req.doctor_id, req.final_prescription)?;

    Ok(Json(FinalPrescriptionResponse {
        message: "Final prescription recorded",
        log: finalized.entry,
        persisted: finalized.persisted,
    }))
}
