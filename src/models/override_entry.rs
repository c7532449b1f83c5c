use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record of a doctor's final prescription for a patient.
///
/// Written once per finalize call and never edited. Repeated finalizations
/// of the same patient produce separate entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideLogEntry {
    pub doctor_id: String,
    pub patient_id: u64,
    pub symptoms: Vec<String>,
    pub predicted_disease: String,
    pub ai_prescription: Vec<String>,
    pub final_prescription: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl OverrideLogEntry {
    /// Whether the doctor kept the recommended prescription as-is.
    pub fn matches_recommendation(&self) -> bool {
        self.ai_prescription == self.final_prescription
    }
}
