//! The loaded prediction engine: vocabulary, classifier, prescription index.
//!
//! Immutable once bootstrapped, so it can be shared across request handlers
//! without locking.

use serde::Serialize;

use super::classifier::{self, Prediction, PredictionFailure};
use super::dataset::{Dataset, DatasetSchema, DatasetSource};
use super::encoder::SymptomVocabulary;
use super::forest::RandomForest;
use super::model_store::ModelStore;
use super::recommender::{PrescriptionIndex, DEFAULT_TOP_N};
use super::training::{self, TrainedArtifacts, TrainingError};

/// How the classifier came to be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOrigin {
    Loaded,
    Trained,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSummary {
    pub dataset: String,
    pub dataset_rows: usize,
    pub origin: ModelOrigin,
    pub diseases: Vec<String>,
    pub vocabulary_size: usize,
}

#[derive(Debug, Clone)]
pub struct Engine {
    vocabulary: SymptomVocabulary,
    model: RandomForest,
    index: PrescriptionIndex,
    dataset_source: DatasetSource,
    dataset_rows: usize,
    origin: ModelOrigin,
}

impl Engine {
    /// Build an engine by training on `dataset`. No persistence.
    pub fn train(dataset: &Dataset) -> Result<Self, TrainingError> {
        let artifacts = training::train(dataset)?;
        Ok(Self::from_artifacts(artifacts, dataset, ModelOrigin::Trained))
    }

    fn from_artifacts(artifacts: TrainedArtifacts, dataset: &Dataset, origin: ModelOrigin) -> Self {
        Self {
            vocabulary: artifacts.vocabulary,
            model: artifacts.model,
            index: artifacts.index,
            dataset_source: dataset.source().clone(),
            dataset_rows: dataset.len(),
            origin,
        }
    }

    /// Load the dataset, then reuse the persisted model pair or retrain.
    ///
    /// Degrades instead of failing: a missing dataset becomes the synthetic
    /// one, a missing or unusable model pair is retrained, and a dataset that
    /// cannot train is replaced by the synthetic one. Save failures are logged
    /// only. An error means even the synthetic dataset failed to train.
    pub fn bootstrap(
        dataset_path: &std::path::Path,
        schema: &DatasetSchema,
        store: &dyn ModelStore,
    ) -> Result<Self, TrainingError> {
        let dataset = Dataset::load_or_synthetic(dataset_path, schema);

        match store.load() {
            Ok(Some(pair)) => {
                return Ok(Self {
                    vocabulary: pair.vocabulary,
                    model: pair.model,
                    index: PrescriptionIndex::build(&dataset),
                    dataset_source: dataset.source().clone(),
                    dataset_rows: dataset.len(),
                    origin: ModelOrigin::Loaded,
                });
            }
            Ok(None) => tracing::info!("No persisted model, training"),
            Err(e) => tracing::warn!(error = %e, "Persisted model unusable, retraining"),
        }

        let (artifacts, dataset) = match training::train(&dataset) {
            Ok(artifacts) => (artifacts, dataset),
            Err(e) => {
                tracing::warn!(
                    source = %dataset.source(),
                    error = %e,
                    "Training failed, retrying on synthetic data"
                );
                let synthetic = Dataset::synthetic();
                (training::train(&synthetic)?, synthetic)
            }
        };

        if let Err(e) = store.save(&artifacts.vocabulary, &artifacts.model) {
            tracing::warn!(error = %e, "Failed to persist trained model");
        }

        Ok(Self::from_artifacts(artifacts, &dataset, ModelOrigin::Trained))
    }

    /// Classify a normalized symptom list.
    pub fn predict(&self, symptoms: &[String]) -> Result<Prediction, PredictionFailure> {
        classifier::predict(&self.vocabulary, &self.model, symptoms)
    }

    /// Most common historical prescriptions for `disease` (top 3).
    pub fn top_prescriptions(&self, disease: &str) -> Vec<String> {
        self.index.top_prescriptions(disease, DEFAULT_TOP_N)
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn diseases(&self) -> &[String] {
        self.model.classes()
    }

    pub fn origin(&self) -> ModelOrigin {
        self.origin
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            dataset: self.dataset_source.to_string(),
            dataset_rows: self.dataset_rows,
            origin: self.origin,
            diseases: self.model.classes().to_vec(),
            vocabulary_size: self.vocabulary.width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::model_store::{FileModelStore, MemoryModelStore};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bootstrap_without_dataset_trains_on_synthetic() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryModelStore::new();
        let engine =
            Engine::bootstrap(&tmp.path().join("absent.csv"), &DatasetSchema::default(), &store)
                .unwrap();

        assert_eq!(engine.origin(), ModelOrigin::Trained);
        assert_eq!(engine.summary().dataset, "synthetic");
        assert_eq!(engine.diseases().len(), 5);
        assert!(store.has_model());
    }

    #[test]
    fn second_bootstrap_reuses_saved_model() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(
            tmp.path().join("vocabulary.json"),
            tmp.path().join("disease_model.json"),
        );
        let dataset = tmp.path().join("absent.csv");

        let first = Engine::bootstrap(&dataset, &DatasetSchema::default(), &store).unwrap();
        let second = Engine::bootstrap(&dataset, &DatasetSchema::default(), &store).unwrap();

        assert_eq!(first.origin(), ModelOrigin::Trained);
        assert_eq!(second.origin(), ModelOrigin::Loaded);
        let symptoms = strings(&["Stomach pain", "Nausea", "Bloating"]);
        assert_eq!(
            first.predict(&symptoms).unwrap().disease,
            second.predict(&symptoms).unwrap().disease
        );
    }

    #[test]
    fn corrupt_model_is_retrained() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("vocabulary.json"), b"[\"Fever\"]").unwrap();
        std::fs::write(tmp.path().join("disease_model.json"), b"garbage").unwrap();
        let store = FileModelStore::new(
            tmp.path().join("vocabulary.json"),
            tmp.path().join("disease_model.json"),
        );

        let engine =
            Engine::bootstrap(&tmp.path().join("absent.csv"), &DatasetSchema::default(), &store)
                .unwrap();
        assert_eq!(engine.origin(), ModelOrigin::Trained);
        // The rewritten pair is now loadable.
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn dataset_without_symptoms_falls_back_to_synthetic() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.csv");
        std::fs::write(
            &path,
            "Disease,Symptom_1,Symptom_2,Symptom_3,Prescription_1,Prescription_2,Prescription_3\n\
             Flu,,,,Rest,,\n",
        )
        .unwrap();

        let engine =
            Engine::bootstrap(&path, &DatasetSchema::default(), &MemoryModelStore::new()).unwrap();
        assert_eq!(engine.summary().dataset, "synthetic");
        assert_eq!(engine.top_prescriptions("Flu"), vec!["Tamiflu", "Rest", "Fluids"]);
    }

    #[test]
    fn top_prescriptions_use_loaded_dataset() {
        let engine = Engine::train(&Dataset::synthetic()).unwrap();
        assert_eq!(
            engine.top_prescriptions("Migraine"),
            vec!["Ibuprofen", "Rest", "Dark room"]
        );
        assert_eq!(engine.top_prescriptions("Scurvy"), vec!["N/A"]);
    }
}
