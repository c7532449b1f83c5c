//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::PatientRecord;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// `{message, patient}` reply for create and update.
#[derive(Debug, Serialize)]
pub struct PatientResponse {
    pub message: &'static str,
    pub patient: PatientRecord,
}

/// Parse a patient id path segment.
pub fn parse_patient_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid patient ID: {raw}")))
}
