//! Disease inference: symptoms → (disease, confidence).
//!
//! Prediction failure is an ordinary outcome of partial or malformed input,
//! so it is reported as a `PredictionFailure` value. Each failure maps to the
//! sentinel strings stored on patient records.

use serde::Serialize;

use super::encoder::SymptomVocabulary;
use super::forest::RandomForest;

pub const CANNOT_PREDICT: &str = "Cannot predict";
pub const PREDICTION_ERROR: &str = "Prediction Error";
pub const INVALID_INPUT: &str = "Invalid input";
pub const NO_DIAGNOSTIC: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub disease: String,
    /// Winning class's mean tree probability, in (0, 1].
    pub confidence: f64,
    /// Submitted symptoms absent from the vocabulary. They had no effect.
    pub ignored_symptoms: Vec<String>,
}

impl Prediction {
    /// Two-decimal percentage, e.g. `"87.00%"`.
    pub fn confidence_label(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum PredictionFailure {
    #[error("Malformed symptoms: {0}")]
    MalformedInput(String),

    #[error("Unseen symptoms: {}", .0.join(", "))]
    UnseenSymptoms(Vec<String>),

    #[error("Model error: {0}")]
    Model(String),
}

impl PredictionFailure {
    /// Placeholder stored as the predicted disease.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) | Self::UnseenSymptoms(_) => CANNOT_PREDICT,
            Self::Model(_) => PREDICTION_ERROR,
        }
    }

    /// Placeholder stored in place of the confidence.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::UnseenSymptoms(symptoms) => format!("Unseen: {}", symptoms.join(", ")),
            _ => NO_DIAGNOSTIC.to_string(),
        }
    }
}

/// Classify `symptoms` with a model and the vocabulary it was fit against.
pub fn predict(
    vocabulary: &SymptomVocabulary,
    model: &RandomForest,
    symptoms: &[String],
) -> Result<Prediction, PredictionFailure> {
    let symptoms: Vec<&str> = symptoms
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if symptoms.is_empty() {
        return Err(PredictionFailure::MalformedInput("no symptoms given".into()));
    }

    let ignored_symptoms = vocabulary.unknown_symptoms(&symptoms);
    if ignored_symptoms.len() == symptoms.len() {
        return Err(PredictionFailure::UnseenSymptoms(ignored_symptoms));
    }

    let features = vocabulary.encode(&symptoms);
    let (disease, confidence) = model
        .predict(&features)
        .map_err(|e| PredictionFailure::Model(e.to_string()))?;

    if !ignored_symptoms.is_empty() {
        tracing::debug!(?ignored_symptoms, "Symptoms outside vocabulary ignored");
    }

    Ok(Prediction {
        disease: disease.to_string(),
        confidence,
        ignored_symptoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::Dataset;
    use crate::pipeline::training::{train, TrainedArtifacts};

    fn artifacts() -> TrainedArtifacts {
        train(&Dataset::synthetic()).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn known_symptoms_predict_known_disease() {
        let a = artifacts();
        let prediction = predict(
            &a.vocabulary,
            &a.model,
            &strings(&["Fever", "Body aches", "Fatigue"]),
        )
        .unwrap();
        assert_eq!(prediction.disease, "Flu");
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
        assert!(prediction.ignored_symptoms.is_empty());
    }

    #[test]
    fn every_known_subset_yields_a_known_label() {
        let a = artifacts();
        let symptoms = a.vocabulary.symptoms().to_vec();
        for window in symptoms.windows(2) {
            let prediction = predict(&a.vocabulary, &a.model, window).unwrap();
            assert!(a.model.classes().contains(&prediction.disease));
            assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
        }
    }

    #[test]
    fn partially_unknown_symptoms_are_reported() {
        let a = artifacts();
        let prediction = predict(
            &a.vocabulary,
            &a.model,
            &strings(&["Headache", "Nausea", "Light sensitivity", "Purple spots"]),
        )
        .unwrap();
        assert_eq!(prediction.disease, "Migraine");
        assert_eq!(prediction.ignored_symptoms, vec!["Purple spots"]);
    }

    #[test]
    fn all_unknown_symptoms_cannot_be_predicted() {
        let a = artifacts();
        let failure =
            predict(&a.vocabulary, &a.model, &strings(&["Purple spots", "fever"])).unwrap_err();
        assert_eq!(
            failure,
            PredictionFailure::UnseenSymptoms(strings(&["Purple spots", "fever"]))
        );
        assert_eq!(failure.sentinel(), CANNOT_PREDICT);
        assert_eq!(failure.diagnostic(), "Unseen: Purple spots, fever");
    }

    #[test]
    fn empty_input_is_malformed() {
        let a = artifacts();
        let failure = predict(&a.vocabulary, &a.model, &strings(&["", "  "])).unwrap_err();
        assert!(matches!(failure, PredictionFailure::MalformedInput(_)));
        assert_eq!(failure.sentinel(), CANNOT_PREDICT);
        assert_eq!(failure.diagnostic(), NO_DIAGNOSTIC);
    }

    #[test]
    fn mismatched_model_is_a_model_error() {
        let a = artifacts();
        let other = SymptomVocabulary::fit(vec![vec!["Fever", "Cough"]]);
        let failure = predict(&other, &a.model, &strings(&["Fever"])).unwrap_err();
        assert!(matches!(failure, PredictionFailure::Model(_)));
        assert_eq!(failure.sentinel(), PREDICTION_ERROR);
    }

    #[test]
    fn confidence_label_has_two_decimals() {
        let prediction = Prediction {
            disease: "Flu".into(),
            confidence: 0.875,
            ignored_symptoms: Vec::new(),
        };
        assert_eq!(prediction.confidence_label(), "87.50%");
    }
}
