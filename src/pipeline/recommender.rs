//! Frequency ranking of historical prescriptions per disease.

use std::collections::HashMap;

use super::dataset::Dataset;

pub const DEFAULT_TOP_N: usize = 3;

/// Returned when the disease never appears in the dataset.
pub const UNKNOWN_DISEASE: &str = "N/A";
/// Returned when the disease appears but no row lists a prescription.
pub const NO_PRESCRIPTIONS: &str = "No prescriptions listed for this disease.";

/// Disease → every prescription recorded for it, in dataset order.
/// Prescription columns are not distinguished.
#[derive(Debug, Clone, Default)]
pub struct PrescriptionIndex {
    by_disease: HashMap<String, Vec<String>>,
}

impl PrescriptionIndex {
    /// Built from every row, including rows without symptoms.
    pub fn build(dataset: &Dataset) -> Self {
        let mut by_disease: HashMap<String, Vec<String>> = HashMap::new();
        for row in dataset.rows() {
            by_disease
                .entry(row.disease.clone())
                .or_default()
                .extend(row.prescriptions.iter().cloned());
        }
        Self { by_disease }
    }

    pub fn contains(&self, disease: &str) -> bool {
        self.by_disease.contains_key(disease)
    }

    pub fn disease_count(&self) -> usize {
        self.by_disease.len()
    }

    /// Up to `n` distinct prescriptions for `disease`, most frequent first.
    /// Equal counts keep the order in which each prescription first appeared.
    pub fn top_prescriptions(&self, disease: &str, n: usize) -> Vec<String> {
        let Some(prescriptions) = self.by_disease.get(disease) else {
            return vec![UNKNOWN_DISEASE.to_string()];
        };
        if prescriptions.is_empty() {
            return vec![NO_PRESCRIPTIONS.to_string()];
        }

        let mut ranked: Vec<(&str, usize)> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();
        for prescription in prescriptions.iter().map(String::as_str) {
            match position.get(prescription) {
                Some(&i) => ranked[i].1 += 1,
                None => {
                    position.insert(prescription, ranked.len());
                    ranked.push((prescription, 1));
                }
            }
        }

        // Stable: ties stay in first-seen order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(prescription, _)| prescription.to_string())
            .collect()
    }
}
