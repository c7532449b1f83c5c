//! Multi-label symptom encoding.
//!
//! A `SymptomVocabulary` is fit once over the training corpus and then
//! frozen. Each distinct symptom owns one column of the indicator vector,
//! numbered in order of first appearance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SymptomVocabulary {
    symptoms: Vec<String>,
    columns: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Assign a column to every distinct trimmed, non-empty symptom.
    pub fn fit<I, L, S>(symptom_lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symptoms = Vec::new();
        let mut columns = HashMap::new();
        for list in symptom_lists {
            for symptom in list {
                let symptom = symptom.as_ref().trim();
                if symptom.is_empty() || columns.contains_key(symptom) {
                    continue;
                }
                columns.insert(symptom.to_string(), symptoms.len());
                symptoms.push(symptom.to_string());
            }
        }
        Self { symptoms, columns }
    }

    /// Number of columns in an encoded vector.
    pub fn width(&self) -> usize {
        self.symptoms.len()
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn column(&self, symptom: &str) -> Option<usize> {
        self.columns.get(symptom).copied()
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.columns.contains_key(symptom)
    }

    /// Indicator vector: 1 at each column whose symptom is present.
    /// Matching is exact and case-sensitive; unknown symptoms set nothing.
    pub fn encode<S: AsRef<str>>(&self, symptoms: &[S]) -> Vec<u8> {
        let mut vector = vec![0u8; self.width()];
        for symptom in symptoms {
            if let Some(column) = self.column(symptom.as_ref()) {
                vector[column] = 1;
            }
        }
        vector
    }

    /// Inputs that `encode` drops because they were never seen in training.
    pub fn unknown_symptoms<S: AsRef<str>>(&self, symptoms: &[S]) -> Vec<String> {
        symptoms
            .iter()
            .map(|s| -> &str { s.as_ref() })
            .filter(|s| !self.contains(s))
            .map(String::from)
            .collect()
    }

    /// Hex SHA-256 over the ordered symptom list. Identifies which
    /// vocabulary a persisted classifier was trained against.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for symptom in &self.symptoms {
            hasher.update(symptom.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl From<Vec<String>> for SymptomVocabulary {
    fn from(symptoms: Vec<String>) -> Self {
        Self::fit([symptoms])
    }
}

impl From<SymptomVocabulary> for Vec<String> {
    fn from(vocabulary: SymptomVocabulary) -> Self {
        vocabulary.symptoms
    }
}
