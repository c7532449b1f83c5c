//! In-process workflow state: patient records and the override audit log.

pub mod overrides;
pub mod patients;

pub use overrides::{OverrideLog, OverrideLogError};
pub use patients::{PatientDraft, PatientStore};
