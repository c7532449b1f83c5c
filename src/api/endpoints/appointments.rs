//! Appointment endpoints.
//!
//! - `POST /api/appointments`: create a record with prediction
//! - `GET /api/appointments?status=`: list, optionally filtered
//! - `GET /api/appointments/:id`: one record
//! - `PUT /api/appointments/:id`: change status

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_patient_id, ApiContext, PatientResponse};
use crate::core_state::parse_status;
use crate::models::{NewAppointment, PatientRecord};

/// `POST /api/appointments`: symptoms may be a list or a comma string.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    let Json(input) = payload?;
    let patient = ctx.core.create_appointment(input)?;

    Ok((
        StatusCode::CREATED,
        Json(PatientResponse {
            message: "Appointment created successfully",
            patient,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// `GET /api/appointments`: all records, or one status.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    let Query(query) = query?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    Ok(Json(ctx.core.list_appointments(status)?))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let id = parse_patient_id(&id)?;
    Ok(Json(ctx.core.get_patient(id)?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// `PUT /api/appointments/:id`: body `{"status": "..."}`.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<PatientResponse>, ApiError> {
    let id = parse_patient_id(&id)?;
    let Json(update) = payload?;
    let raw = update
        .status
        .ok_or_else(|| ApiError::BadRequest("status is required".into()))?;
    let status = parse_status(&raw)?;

    let patient = ctx.core.update_status(id, status)?;
    Ok(Json(PatientResponse {
        message: "Appointment status updated successfully",
        patient,
    }))
}
