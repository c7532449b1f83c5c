pub mod enums;
pub mod override_entry;
pub mod patient;

pub use enums::{AppointmentStatus, InvalidEnum};
pub use override_entry::OverrideLogEntry;
pub use patient::{NewAppointment, PatientRecord, SymptomInput};
