//! Builds the encoder, classifier and prescription index from a dataset.

use super::dataset::Dataset;
use super::encoder::SymptomVocabulary;
use super::forest::{ForestError, RandomForest};
use super::recommender::PrescriptionIndex;

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("No dataset row has a symptom")]
    NoTrainableRows,

    #[error("Classifier training failed: {0}")]
    Forest(#[from] ForestError),
}

/// Everything inference needs. The vocabulary and model always travel together.
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub vocabulary: SymptomVocabulary,
    pub model: RandomForest,
    pub index: PrescriptionIndex,
}

/// Fit vocabulary and forest on rows with symptoms; index prescriptions
/// over every row.
pub fn train(dataset: &Dataset) -> Result<TrainedArtifacts, TrainingError> {
    let rows: Vec<_> = dataset.trainable_rows().collect();
    if rows.is_empty() {
        return Err(TrainingError::NoTrainableRows);
    }
    let skipped = dataset.len() - rows.len();

    let vocabulary = SymptomVocabulary::fit(rows.iter().map(|row| &row.symptoms));
    let features: Vec<Vec<u8>> = rows
        .iter()
        .map(|row| vocabulary.encode(&row.symptoms))
        .collect();
    let labels: Vec<String> = rows.iter().map(|row| row.disease.clone()).collect();

    let model = RandomForest::fit(&features, &labels)?;
    let index = PrescriptionIndex::build(dataset);

    tracing::info!(
        source = %dataset.source(),
        samples = rows.len(),
        skipped,
        symptoms = vocabulary.width(),
        diseases = model.classes().len(),
        trees = model.n_trees(),
        "Disease model trained"
    );

    Ok(TrainedArtifacts {
        vocabulary,
        model,
        index,
    })
}
