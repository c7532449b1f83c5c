use std::net::SocketAddr;
use std::path::PathBuf;

use crate::pipeline::dataset::DatasetSchema;

/// Application-level constants
pub const APP_NAME: &str = "MedAssist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name announced by the tool server during `initialize`.
pub const TOOL_SERVER_NAME: &str = "medical-assistant";

pub const DATASET_FILE: &str = "updated_synthetic_medical_dataset.csv";
pub const MODEL_FILE: &str = "disease_model.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const OVERRIDE_LOG_FILE: &str = "prescription_overrides.json";

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5000";

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medassist_lib=info,medassist=info,tower_http=warn"
}

/// Get the application data directory
/// ~/MedAssist/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub vocabulary_path: PathBuf,
    pub override_log_path: PathBuf,
    pub http_addr: SocketAddr,
    pub schema: DatasetSchema,
}

impl AppConfig {
    /// All artifacts live directly under `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            dataset_path: data_dir.join(DATASET_FILE),
            model_path: data_dir.join(MODEL_FILE),
            vocabulary_path: data_dir.join(VOCABULARY_FILE),
            override_log_path: data_dir.join(OVERRIDE_LOG_FILE),
            http_addr: default_http_addr(),
            schema: DatasetSchema::default(),
            data_dir,
        }
    }

    /// Resolve configuration from `MEDASSIST_*` environment variables.
    ///
    /// - `MEDASSIST_DATA_DIR`: artifact directory (default `~/MedAssist`)
    /// - `MEDASSIST_DATASET`: CSV dataset path
    ///   (default `<data_dir>/updated_synthetic_medical_dataset.csv`)
    /// - `MEDASSIST_HTTP_ADDR`: HTTP bind address (default `127.0.0.1:5000`)
    /// - `MEDASSIST_SYMPTOM_FIELDS` / `MEDASSIST_PRESCRIPTION_FIELDS`: comma-separated column names
    pub fn from_env() -> Self {
        let data_dir = std::env::var("MEDASSIST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir());
        let mut config = Self::with_data_dir(data_dir);

        if let Ok(path) = std::env::var("MEDASSIST_DATASET") {
            config.dataset_path = PathBuf::from(path);
        }

        if let Ok(addr) = std::env::var("MEDASSIST_HTTP_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.http_addr = parsed,
                Err(e) => tracing::warn!(%addr, error = %e, "Ignoring invalid MEDASSIST_HTTP_ADDR"),
            }
        }

        if let Ok(fields) = std::env::var("MEDASSIST_SYMPTOM_FIELDS") {
            config.schema.symptom_fields = split_fields(&fields);
        }
        if let Ok(fields) = std::env::var("MEDASSIST_PRESCRIPTION_FIELDS") {
            config.schema.prescription_fields = split_fields(&fields);
        }

        config
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        if dirs::home_dir().is_some() {
            assert!(dir.ends_with("MedAssist"));
        }
    }

    #[test]
    fn artifacts_live_under_data_dir() {
        let config = AppConfig::with_data_dir(PathBuf::from("/tmp/medassist"));
        assert!(config.model_path.starts_with("/tmp/medassist"));
        assert!(config.vocabulary_path.ends_with(VOCABULARY_FILE));
        assert!(config.override_log_path.ends_with(OVERRIDE_LOG_FILE));
        assert!(config.dataset_path.ends_with(DATASET_FILE));
    }

    #[test]
    fn default_addr_matches_constant() {
        assert_eq!(default_http_addr().to_string(), DEFAULT_HTTP_ADDR);
    }

    #[test]
    fn split_fields_drops_blanks() {
        assert_eq!(
            split_fields(" Symptom_1, ,Symptom_2 ,"),
            vec!["Symptom_1".to_string(), "Symptom_2".to_string()]
        );
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
