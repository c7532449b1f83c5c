//! Append-only audit log of doctors' final prescriptions.
//!
//! The whole log is one JSON array on disk. Every append rewrites the array
//! through `persist::write_json_atomic`; a failed write keeps the entry in
//! memory so the next successful write (or `flush`) catches the file up.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::models::OverrideLogEntry;
use crate::persist::{self, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum OverrideLogError {
    #[error("Failed to write override log {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: PersistError,
    },

    #[error("Refusing to overwrite unreadable override log {path}")]
    Unreadable { path: String },
}

#[derive(Debug)]
pub struct OverrideLog {
    entries: Vec<OverrideLogEntry>,
    /// `None` for an in-memory log.
    path: Option<PathBuf>,
    /// Set when an unreadable file could not be moved out of the way.
    /// Writes are refused so its entries are never overwritten.
    read_only: bool,
}

impl OverrideLog {
    /// Open the log at `path`. A missing file starts an empty log. An
    /// unreadable one is renamed to `<name>.corrupt-<timestamp>` and the log
    /// starts empty; if the rename fails, the log refuses to write.
    pub fn open(path: &Path) -> Self {
        let mut read_only = false;
        let entries = match persist::read_json::<Vec<OverrideLogEntry>>(path) {
            Ok(Some(entries)) => {
                tracing::info!(
                    path = %path.display(),
                    count = entries.len(),
                    "Override log loaded"
                );
                entries
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                let aside = quarantine_path(path);
                match std::fs::rename(path, &aside) {
                    Ok(()) => tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Override log unreadable, moved aside and starting empty"
                    ),
                    Err(rename_err) => {
                        read_only = true;
                        tracing::error!(
                            path = %path.display(),
                            error = %e,
                            rename_error = %rename_err,
                            "Override log unreadable and could not be moved aside, writes disabled"
                        );
                    }
                }
                Vec::new()
            }
        };
        Self {
            entries,
            path: Some(path.to_path_buf()),
            read_only,
        }
    }

    /// A log that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            path: None,
            read_only: false,
        }
    }

    /// Record `entry`. The entry is kept even when the write fails.
    pub fn append(&mut self, entry: OverrideLogEntry) -> Result<(), OverrideLogError> {
        tracing::info!(
            patient_id = entry.patient_id,
            doctor_id = %entry.doctor_id,
            matches_recommendation = entry.matches_recommendation(),
            "Prescription override recorded"
        );
        self.entries.push(entry);
        self.flush()
    }

    /// Rewrite the file from memory.
    pub fn flush(&self) -> Result<(), OverrideLogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.read_only {
            return Err(OverrideLogError::Unreadable {
                path: path.display().to_string(),
            });
        }
        persist::write_json_atomic(path, &self.entries).map_err(|source| {
            OverrideLogError::Write {
                path: path.display().to_string(),
                source,
            }
        })
    }

    pub fn entries(&self) -> &[OverrideLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<path>.corrupt-<UTC timestamp>` next to the original.
fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(patient_id: u64, final_prescription: &[&str]) -> OverrideLogEntry {
        OverrideLogEntry {
            doctor_id: "D1".into(),
            patient_id,
            symptoms: vec!["Fever".into()],
            predicted_disease: "Flu".into(),
            ai_prescription: vec!["Tamiflu".into(), "Rest".into(), "Fluids".into()],
            final_prescription: final_prescription.iter().map(|s| s.to_string()).collect(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn append_persists_whole_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prescription_overrides.json");
        let mut log = OverrideLog::open(&path);
        assert!(log.is_empty());

        log.append(entry(1, &["Rest"])).unwrap();
        log.append(entry(1, &["Rest", "Fluids"])).unwrap();

        let on_disk: Vec<OverrideLogEntry> = persist::read_json(&path).unwrap().unwrap();
        assert_eq!(on_disk, log.entries());
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn reopen_restores_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prescription_overrides.json");
        {
            let mut log = OverrideLog::open(&path);
            log.append(entry(3, &["Ibuprofen"])).unwrap();
        }
        let reopened = OverrideLog::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.entries()[0].patient_id, 3);
        assert_eq!(reopened.entries()[0].final_prescription, vec!["Ibuprofen"]);
    }

    fn quarantined(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("prescription_overrides.json.corrupt-"))
            })
            .collect()
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prescription_overrides.json");
        std::fs::write(&path, b"{ not an array").unwrap();
        let log = OverrideLog::open(&path);
        assert!(log.is_empty());
    }

    #[test]
    fn corrupt_file_survives_open_and_append() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prescription_overrides.json");
        let original = b"[{\"doctor_id\": \"D1\", truncated";
        std::fs::write(&path, original).unwrap();

        let mut log = OverrideLog::open(&path);
        log.append(entry(7, &["Rest"])).unwrap();

        let aside = quarantined(tmp.path());
        assert_eq!(aside.len(), 1);
        assert_eq!(std::fs::read(&aside[0]).unwrap(), original);

        let on_disk: Vec<OverrideLogEntry> = persist::read_json(&path).unwrap().unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].patient_id, 7);
    }

    #[test]
    fn unmovable_unreadable_log_refuses_writes() {
        let tmp = tempfile::tempdir().unwrap();
        // State left by `open` when the rename aside fails.
        let path = tmp.path().join("prescription_overrides.json");
        let mut log = OverrideLog {
            entries: Vec::new(),
            path: Some(path.clone()),
            read_only: true,
        };

        let result = log.append(entry(1, &["Rest"]));
        assert!(matches!(result, Err(OverrideLogError::Unreadable { .. })));
        assert_eq!(log.len(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_keeps_entry_in_memory() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let mut log = OverrideLog::open(&blocker.join("overrides.json"));

        let result = log.append(entry(1, &["Rest"]));
        assert!(matches!(result, Err(OverrideLogError::Write { .. })));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn in_memory_log_never_fails() {
        let mut log = OverrideLog::in_memory();
        log.append(entry(1, &["Rest"])).unwrap();
        log.flush().unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn repeated_finalizations_are_not_deduplicated() {
        let mut log = OverrideLog::in_memory();
        log.append(entry(1, &["Rest"])).unwrap();
        log.append(entry(1, &["Rest"])).unwrap();
        assert_eq!(log.len(), 2);
    }
}
