//! Tabular disease/symptom/prescription data.
//!
//! Columns are resolved against an explicit `DatasetSchema` once, when the
//! CSV header is read. A dataset that cannot be loaded is replaced by a small
//! built-in synthetic set so the engine can always train.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Invalid dataset schema: {0}")]
    InvalidSchema(String),

    #[error("Dataset contains no rows")]
    Empty,
}

/// Names of the columns that carry each kind of value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub disease_field: String,
    pub symptom_fields: Vec<String>,
    pub prescription_fields: Vec<String>,
}

impl DatasetSchema {
    /// `Disease`, `Symptom_1..=symptoms`, `Prescription_1..=prescriptions`.
    pub fn standard(symptoms: usize, prescriptions: usize) -> Self {
        Self {
            disease_field: "Disease".into(),
            symptom_fields: (1..=symptoms).map(|i| format!("Symptom_{i}")).collect(),
            prescription_fields: (1..=prescriptions)
                .map(|i| format!("Prescription_{i}"))
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), DatasetError> {
        if self.disease_field.trim().is_empty() {
            return Err(DatasetError::InvalidSchema("disease field is blank".into()));
        }
        if self.symptom_fields.is_empty() {
            return Err(DatasetError::InvalidSchema("no symptom fields".into()));
        }
        if self.prescription_fields.is_empty() {
            return Err(DatasetError::InvalidSchema("no prescription fields".into()));
        }
        Ok(())
    }

    /// Map every schema field to its header position.
    fn resolve(&self, headers: &csv::StringRecord) -> Result<ColumnMap, DatasetError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut missing = Vec::new();
        let mut lookup = |names: &[String]| -> Vec<usize> {
            names
                .iter()
                .filter_map(|name| {
                    let found = position(name);
                    if found.is_none() {
                        missing.push(name.clone());
                    }
                    found
                })
                .collect()
        };

        let disease = lookup(std::slice::from_ref(&self.disease_field));
        let symptoms = lookup(&self.symptom_fields);
        let prescriptions = lookup(&self.prescription_fields);

        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns { missing });
        }

        Ok(ColumnMap {
            disease: disease[0],
            symptoms,
            prescriptions,
        })
    }
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self::standard(3, 3)
    }
}

struct ColumnMap {
    disease: usize,
    symptoms: Vec<usize>,
    prescriptions: Vec<usize>,
}

/// One historical case. Symptom and prescription lists hold only
/// trimmed, non-empty values, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub disease: String,
    pub symptoms: Vec<String>,
    pub prescriptions: Vec<String>,
}

impl TrainingRow {
    pub fn new(disease: &str, symptoms: &[&str], prescriptions: &[&str]) -> Self {
        Self {
            disease: disease.trim().to_string(),
            symptoms: non_empty(symptoms.iter().copied()),
            prescriptions: non_empty(prescriptions.iter().copied()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Synthetic,
    InMemory,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Synthetic => f.write_str("synthetic"),
            Self::InMemory => f.write_str("in-memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<TrainingRow>,
    source: DatasetSource,
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl Dataset {
    pub fn from_rows(rows: Vec<TrainingRow>) -> Self {
        Self {
            rows,
            source: DatasetSource::InMemory,
        }
    }

    /// Read a CSV dataset, resolving columns through `schema`.
    pub fn load(path: &Path, schema: &DatasetSchema) -> Result<Self, DatasetError> {
        schema.validate()?;
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let columns = schema.resolve(reader.headers()?)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let disease = record.get(columns.disease).unwrap_or("").trim();
            if disease.is_empty() {
                tracing::debug!(line = line + 2, "Skipping dataset row without disease");
                continue;
            }
            let cells =
                |indices: &[usize]| non_empty(indices.iter().filter_map(|&i| record.get(i)));
            rows.push(TrainingRow {
                disease: disease.to_string(),
                symptoms: cells(&columns.symptoms),
                prescriptions: cells(&columns.prescriptions),
            });
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        tracing::info!(path = %path.display(), rows = rows.len(), "Dataset loaded");
        Ok(Self {
            rows,
            source: DatasetSource::File(path.to_path_buf()),
        })
    }

    /// Load `path`, or fall back to the synthetic dataset on any failure.
    pub fn load_or_synthetic(path: &Path, schema: &DatasetSchema) -> Self {
        match Self::load(path, schema) {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Dataset unavailable, using synthetic data"
                );
                Self::synthetic()
            }
        }
    }

    /// Five diseases with fixed symptom and prescription triples,
    /// replicated to a usable training size.
    pub fn synthetic() -> Self {
        const REPLICAS: usize = 20;
        const CASES: [(&str, [&str; 3], [&str; 3]); 5] = [
            (
                "Common Cold",
                ["Runny nose", "Cough", "Sneezing"],
                ["Rest", "Fluids", "Vitamin C"],
            ),
            (
                "Flu",
                ["Fever", "Body aches", "Fatigue"],
                ["Tamiflu", "Rest", "Fluids"],
            ),
            (
                "Migraine",
                ["Headache", "Nausea", "Light sensitivity"],
                ["Ibuprofen", "Rest", "Dark room"],
            ),
            (
                "Gastritis",
                ["Stomach pain", "Nausea", "Bloating"],
                ["Antacids", "Dietary changes", "Probiotics"],
            ),
            (
                "Hypertension",
                ["High blood pressure", "Dizziness", "Fatigue"],
                ["Lisinopril", "Lifestyle changes", "Regular monitoring"],
            ),
        ];

        let mut rows = Vec::with_capacity(REPLICAS * CASES.len());
        for _ in 0..REPLICAS {
            for (disease, symptoms, prescriptions) in CASES {
                rows.push(TrainingRow::new(disease, &symptoms, &prescriptions));
            }
        }

        Self {
            rows,
            source: DatasetSource::Synthetic,
        }
    }

    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that carry at least one symptom.
    pub fn trainable_rows(&self) -> impl Iterator<Item = &TrainingRow> {
        self.rows.iter().filter(|row| !row.symptoms.is_empty())
    }
}

fn non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
