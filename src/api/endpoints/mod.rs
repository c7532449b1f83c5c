//! API endpoint handlers.
//!
//! Handlers only translate between HTTP and `CoreState`; all workflow logic
//! lives in the core.

pub mod appointments;
pub mod documents;
pub mod health;
pub mod prescriptions;
