//! Persistence of the trained (vocabulary, classifier) pair.
//!
//! The pair is stored as two blobs. The classifier blob carries the
//! fingerprint of the vocabulary it was fit against, and `load` refuses a
//! pair whose fingerprints disagree: a classifier read through the wrong
//! vocabulary predicts garbage without any other visible error.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::encoder::SymptomVocabulary;
use super::forest::RandomForest;
use crate::persist::{self, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ModelStoreError {
    #[error("Model storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: PersistError,
    },

    #[error("Classifier was trained against vocabulary {expected}, found {found}")]
    VocabularyMismatch { expected: String, found: String },

    #[error("Classifier expects {expected} features, vocabulary has {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("Only one of the model files exists")]
    Incomplete,

    #[error("Model store lock poisoned")]
    LockPoisoned,
}

/// A vocabulary and the classifier fit against it.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedModel {
    pub vocabulary: SymptomVocabulary,
    pub model: RandomForest,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierBlob {
    vocabulary_fingerprint: String,
    trained_at: DateTime<Utc>,
    forest: RandomForest,
}

/// Load/save capability for the trained model pair.
pub trait ModelStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PersistedModel>, ModelStoreError>;

    fn save(&self, vocabulary: &SymptomVocabulary, model: &RandomForest)
        -> Result<(), ModelStoreError>;
}

fn verify_pair(
    vocabulary: SymptomVocabulary,
    blob: ClassifierBlob,
) -> Result<PersistedModel, ModelStoreError> {
    let found = vocabulary.fingerprint();
    if blob.vocabulary_fingerprint != found {
        return Err(ModelStoreError::VocabularyMismatch {
            expected: blob.vocabulary_fingerprint,
            found,
        });
    }
    if blob.forest.n_features() != vocabulary.width() {
        return Err(ModelStoreError::WidthMismatch {
            expected: blob.forest.n_features(),
            found: vocabulary.width(),
        });
    }
    Ok(PersistedModel {
        vocabulary,
        model: blob.forest,
    })
}

// ═══════════════════════════════════════════════════════════
// File-backed store
// ═══════════════════════════════════════════════════════════

/// Two JSON files: the vocabulary and the classifier blob.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    vocabulary_path: PathBuf,
    model_path: PathBuf,
}

impl FileModelStore {
    pub fn new(vocabulary_path: PathBuf, model_path: PathBuf) -> Self {
        Self {
            vocabulary_path,
            model_path,
        }
    }

    fn storage_error(path: &std::path::Path) -> impl FnOnce(PersistError) -> ModelStoreError + '_ {
        move |source| ModelStoreError::Storage {
            path: path.display().to_string(),
            source,
        }
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<PersistedModel>, ModelStoreError> {
        let vocabulary: Option<SymptomVocabulary> = persist::read_json(&self.vocabulary_path)
            .map_err(Self::storage_error(&self.vocabulary_path))?;
        let blob: Option<ClassifierBlob> = persist::read_json(&self.model_path)
            .map_err(Self::storage_error(&self.model_path))?;

        match (vocabulary, blob) {
            (Some(vocabulary), Some(blob)) => {
                let trained_at = blob.trained_at;
                let pair = verify_pair(vocabulary, blob)?;
                tracing::info!(
                    path = %self.model_path.display(),
                    %trained_at,
                    "Persisted disease model loaded"
                );
                Ok(Some(pair))
            }
            (None, None) => Ok(None),
            _ => Err(ModelStoreError::Incomplete),
        }
    }

    fn save(
        &self,
        vocabulary: &SymptomVocabulary,
        model: &RandomForest,
    ) -> Result<(), ModelStoreError> {
        let blob = ClassifierBlob {
            vocabulary_fingerprint: vocabulary.fingerprint(),
            trained_at: Utc::now(),
            forest: model.clone(),
        };
        persist::write_json_atomic(&self.vocabulary_path, vocabulary)
            .map_err(Self::storage_error(&self.vocabulary_path))?;
        persist::write_json_atomic(&self.model_path, &blob)
            .map_err(Self::storage_error(&self.model_path))?;
        tracing::info!(path = %self.model_path.display(), "Disease model saved");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// Keeps the pair in memory only. Used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    saved: Mutex<Option<PersistedModel>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pair has been saved.
    pub fn has_model(&self) -> bool {
        self.saved.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

impl ModelStore for MemoryModelStore {
    fn load(&self) -> Result<Option<PersistedModel>, ModelStoreError> {
        let saved = self.saved.lock().map_err(|_| ModelStoreError::LockPoisoned)?;
        Ok(saved.clone())
    }

    fn save(
        &self,
        vocabulary: &SymptomVocabulary,
        model: &RandomForest,
    ) -> Result<(), ModelStoreError> {
        let mut saved = self.saved.lock().map_err(|_| ModelStoreError::LockPoisoned)?;
        *saved = Some(PersistedModel {
            vocabulary: vocabulary.clone(),
            model: model.clone(),
        });
        Ok(())
    }
}
