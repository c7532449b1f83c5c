use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// Symptoms as submitted by a client: a list, a comma-separated string,
/// or anything else (which is malformed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymptomInput {
    List(Vec<String>),
    Text(String),
    Other(serde_json::Value),
}

impl Default for SymptomInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl SymptomInput {
    /// Trimmed, non-empty symptom labels in submission order.
    /// `None` when the input is neither a list nor a string.
    pub fn normalize(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => Some(clean(items.iter().map(String::as_str))),
            Self::Text(text) => Some(clean(text.split(','))),
            Self::Other(serde_json::Value::Null) => Some(Vec::new()),
            Self::Other(_) => None,
        }
    }
}

fn clean<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Front-desk appointment submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAppointment {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, rename = "type")]
    pub appointment_type: String,
    #[serde(default)]
    pub symptoms: SymptomInput,
}

/// A patient moving through the clinic workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub date: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub symptoms: Vec<String>,
    /// Submitted symptoms absent from the training vocabulary.
    pub ignored_symptoms: Vec<String>,
    pub predicted_disease: String,
    /// Formatted percentage, or a diagnostic when prediction failed.
    pub confidence: String,
    pub common_prescriptions: Vec<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_string_is_split_and_trimmed() {
        let input = SymptomInput::Text(" Fever, Cough ,, ".into());
        assert_eq!(
            input.normalize(),
            Some(vec!["Fever".to_string(), "Cough".to_string()])
        );
    }

    #[test]
    fn list_drops_blank_entries() {
        let input = SymptomInput::List(vec!["Fever".into(), "  ".into(), " Nausea".into()]);
        assert_eq!(
            input.normalize(),
            Some(vec!["Fever".to_string(), "Nausea".to_string()])
        );
    }

    #[test]
    fn non_list_input_is_malformed() {
        let input: SymptomInput = serde_json::from_str("42").unwrap();
        assert_eq!(input.normalize(), None);
        let input: SymptomInput = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(input.normalize(), None);
    }

    #[test]
    fn null_input_is_empty() {
        let input: SymptomInput = serde_json::from_str("null").unwrap();
        assert_eq!(input.normalize(), Some(Vec::new()));
    }

    #[test]
    fn new_appointment_accepts_type_key_and_missing_fields() {
        let appt: NewAppointment =
            serde_json::from_str(r#"{"name": "Ada", "type": "walk-in", "symptoms": "Fever"}"#)
                .unwrap();
        assert_eq!(appt.name, "Ada");
        assert_eq!(appt.appointment_type, "walk-in");
        assert!(appt.phone.is_empty());
        assert_eq!(appt.symptoms, SymptomInput::Text("Fever".into()));
    }
}
