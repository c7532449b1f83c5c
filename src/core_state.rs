//! Transport-agnostic application state.
//!
//! `CoreState` is the single context shared by the HTTP API and the tool
//! server. The engine is immutable after bootstrap and read without locking.
//! The patient store and the override log each sit behind a `Mutex`, so every
//! mutating operation is serialized.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;

use crate::config::AppConfig;
use crate::document::{
    DocumentError, DocumentRenderer, PdfPrescriptionRenderer, PrescriptionDocument,
};
use crate::models::{
    AppointmentStatus, InvalidEnum, NewAppointment, OverrideLogEntry, PatientRecord,
};
use crate::pipeline::classifier::{PredictionFailure, INVALID_INPUT, NO_DIAGNOSTIC};
use crate::pipeline::model_store::FileModelStore;
use crate::pipeline::training::TrainingError;
use crate::pipeline::{Engine, EngineSummary};
use crate::records::{OverrideLog, OverrideLogError, PatientDraft, PatientStore};

/// Physician named on documents rendered straight from a patient record.
pub const SYSTEM_DOCTOR: &str = "Dr. System";

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Patient with ID {0} not found")]
    PatientNotFound(u64),
    #[error("Invalid status: {0}")]
    InvalidStatus(#[from] InvalidEnum),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    #[error("Override log error: {0}")]
    OverrideLog(#[from] OverrideLogError),
    #[error("Engine startup failed: {0}")]
    Startup(#[from] TrainingError),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// Result of a finalize call: the logged entry and whether it reached disk.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedPrescription {
    pub entry: OverrideLogEntry,
    pub persisted: bool,
}

/// Rendered file plus its download name.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Parse a status string from a transport.
pub fn parse_status(value: &str) -> Result<AppointmentStatus, CoreError> {
    Ok(AppointmentStatus::from_str(value.trim())?)
}

// ═══════════════════════════════════════════════════════════
// CoreState - shared by the HTTP API and the tool server
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    engine: Engine,
    patients: Mutex<PatientStore>,
    overrides: Mutex<OverrideLog>,
    renderer: Box<dyn DocumentRenderer>,
}

impl CoreState {
    pub fn new(
        engine: Engine,
        overrides: OverrideLog,
        renderer: Box<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            engine,
            patients: Mutex::new(PatientStore::new()),
            overrides: Mutex::new(overrides),
            renderer,
        }
    }

    /// Bootstrap the engine (blocking: may train) and open the override log.
    pub fn initialize(config: &AppConfig) -> Result<Self, CoreError> {
        let store = FileModelStore::new(config.vocabulary_path.clone(), config.model_path.clone());
        let engine = Engine::bootstrap(&config.dataset_path, &config.schema, &store)?;
        let overrides = OverrideLog::open(&config.override_log_path);

        let summary = engine.summary();
        tracing::info!(
            dataset = %summary.dataset,
            rows = summary.dataset_rows,
            origin = ?summary.origin,
            diseases = summary.diseases.len(),
            overrides = overrides.len(),
            "Core state initialized"
        );

        Ok(Self::new(engine, overrides, Box::new(PdfPrescriptionRenderer::new())))
    }

    /// Flush the override log. Called once before exit.
    pub fn shutdown(&self) -> Result<(), CoreError> {
        self.lock_overrides()?.flush()?;
        tracing::info!("Core state shut down");
        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_summary(&self) -> EngineSummary {
        self.engine.summary()
    }

    fn lock_patients(&self) -> Result<MutexGuard<'_, PatientStore>, CoreError> {
        self.patients.lock().map_err(|_| CoreError::LockPoisoned)
    }

    fn lock_overrides(&self) -> Result<MutexGuard<'_, OverrideLog>, CoreError> {
        self.overrides.lock().map_err(|_| CoreError::LockPoisoned)
    }

    // ── Appointments ────────────────────────────────────────

    /// Predict, recommend and store a new pending record.
    ///
    /// Prediction problems never fail the call: the record carries a
    /// sentinel disease, a diagnostic in place of the confidence and no
    /// prescriptions.
    pub fn create_appointment(&self, input: NewAppointment) -> Result<PatientRecord, CoreError> {
        let mut draft = PatientDraft {
            name: input.name,
            phone: input.phone,
            date: input.date,
            appointment_type: input.appointment_type,
            ..Default::default()
        };

        match input.symptoms.normalize() {
            None => {
                tracing::warn!(symptoms = ?input.symptoms, "Malformed symptoms");
                draft.predicted_disease = INVALID_INPUT.to_string();
                draft.confidence = NO_DIAGNOSTIC.to_string();
            }
            Some(symptoms) => {
                match self.engine.predict(&symptoms) {
                    Ok(prediction) => {
                        draft.common_prescriptions =
                            self.engine.top_prescriptions(&prediction.disease);
                        draft.confidence = prediction.confidence_label();
                        draft.predicted_disease = prediction.disease;
                        draft.ignored_symptoms = prediction.ignored_symptoms;
                    }
                    Err(failure) => {
                        tracing::info!(reason = %failure, "Prediction unavailable");
                        draft.predicted_disease = failure.sentinel().to_string();
                        draft.confidence = failure.diagnostic();
                        if let PredictionFailure::UnseenSymptoms(unseen) = failure {
                            draft.ignored_symptoms = unseen;
                        }
                    }
                }
                draft.symptoms = symptoms;
            }
        }

        let record = self.lock_patients()?.insert(draft);
        tracing::info!(
            patient_id = record.id,
            disease = %record.predicted_disease,
            confidence = %record.confidence,
            "Appointment created"
        );
        Ok(record)
    }

    pub fn get_patient(&self, id: u64) -> Result<PatientRecord, CoreError> {
        self.lock_patients()?
            .get(id)
            .cloned()
            .ok_or(CoreError::PatientNotFound(id))
    }

    /// All records, or only those in `status`, in creation order.
    pub fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<PatientRecord>, CoreError> {
        let patients = self.lock_patients()?;
        Ok(match status {
            Some(status) => patients.list_by_status(status).into_iter().cloned().collect(),
            None => patients.list_all().to_vec(),
        })
    }

    pub fn update_status(
        &self,
        id: u64,
        status: AppointmentStatus,
    ) -> Result<PatientRecord, CoreError> {
        let record = self
            .lock_patients()?
            .set_status(id, status)
            .cloned()
            .ok_or(CoreError::PatientNotFound(id))?;
        tracing::info!(patient_id = id, status = %status, "Appointment status updated");
        Ok(record)
    }

    // ── Prescriptions ───────────────────────────────────────

    /// Record the doctor's final prescription against the AI recommendation.
    ///
    /// An unknown patient leaves the log untouched. A failed disk write keeps
    /// the entry in memory and reports `persisted: false`.
    pub fn finalize_prescription(
        &self,
        patient_id: u64,
        doctor_id: &str,
        final_prescription: Vec<String>,
    ) -> Result<FinalizedPrescription, CoreError> {
        let patient = self.get_patient(patient_id)?;
        let entry = OverrideLogEntry {
            doctor_id: doctor_id.to_string(),
            patient_id,
            symptoms: patient.symptoms,
            predicted_disease: patient.predicted_disease,
            ai_prescription: patient.common_prescriptions,
            final_prescription,
            timestamp: Utc::now(),
        };

        let persisted = match self.lock_overrides()?.append(entry.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(patient_id, error = %e, "Override kept in memory only");
                false
            }
        };
        Ok(FinalizedPrescription { entry, persisted })
    }

    pub fn override_entries(&self) -> Result<Vec<OverrideLogEntry>, CoreError> {
        Ok(self.lock_overrides()?.entries().to_vec())
    }

    // ── Documents ───────────────────────────────────────────

    pub fn render_document(
        &self,
        document: &PrescriptionDocument,
    ) -> Result<RenderedDocument, CoreError> {
        let bytes = self.renderer.render(document)?;
        Ok(RenderedDocument {
            filename: document.filename(),
            bytes,
        })
    }

    /// Document for a stored patient: predicted disease as diagnosis and the
    /// recommended prescriptions as lines.
    pub fn render_patient_document(&self, id: u64) -> Result<RenderedDocument, CoreError> {
        let patient = self.get_patient(id)?;
        let document = PrescriptionDocument {
            patient_name: patient.name,
            doctor_name: SYSTEM_DOCTOR.to_string(),
            diagnosis: patient.predicted_disease,
            prescription_lines: patient.common_prescriptions,
        };
        self.render_document(&document)
    }
}
