//! Patient record store.
//!
//! Records are appended in arrival order and never removed. Ids come from a
//! monotonically increasing counter starting at 1, so they are never reused.
//! Only `status` and `updated_at` change after insertion.

use chrono::Utc;

use crate::models::{AppointmentStatus, PatientRecord};

/// Everything a new record needs besides identity, status and timestamps.
#[derive(Debug, Clone, Default)]
pub struct PatientDraft {
    pub name: String,
    pub phone: String,
    pub date: String,
    pub appointment_type: String,
    pub symptoms: Vec<String>,
    pub ignored_symptoms: Vec<String>,
    pub predicted_disease: String,
    pub confidence: String,
    pub common_prescriptions: Vec<String>,
}

#[derive(Debug)]
pub struct PatientStore {
    records: Vec<PatientRecord>,
    next_id: u64,
}

impl Default for PatientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Store `draft` as a new pending record and return a copy of it.
    pub fn insert(&mut self, draft: PatientDraft) -> PatientRecord {
        let record = PatientRecord {
            id: self.next_id,
            name: draft.name,
            phone: draft.phone,
            date: draft.date,
            appointment_type: draft.appointment_type,
            symptoms: draft.symptoms,
            ignored_symptoms: draft.ignored_symptoms,
            predicted_disease: draft.predicted_disease,
            confidence: draft.confidence,
            common_prescriptions: draft.common_prescriptions,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        record
    }

    pub fn get(&self, id: u64) -> Option<&PatientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Move a record to `status` and stamp `updated_at`. `None` if absent.
    pub fn set_status(&mut self, id: u64, status: AppointmentStatus) -> Option<&PatientRecord> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        record.status = status;
        record.updated_at = Some(Utc::now());
        Some(record)
    }

    /// All records in insertion order.
    pub fn list_all(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn list_by_status(&self, status: AppointmentStatus) -> Vec<&PatientRecord> {
        self.records.iter().filter(|r| r.status == status).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
