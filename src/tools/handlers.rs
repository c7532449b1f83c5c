//! Tool catalogue and dispatch.
//!
//! Each tool deserializes its arguments, calls `CoreState` and returns a
//! JSON envelope. Failures of any kind become `{"status": "error"}`
//! envelopes.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::ToolDefinition;
use crate::core_state::{parse_status, CoreError, CoreState};
use crate::document::{DocumentRequest, PrescriptionDocument};
use crate::models::NewAppointment;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{0}")]
    Core(#[from] CoreError),
}

// ═══════════════════════════════════════════════════════════
// Catalogue
// ═══════════════════════════════════════════════════════════

pub fn tool_definitions() -> Vec<ToolDefinition> {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    vec![
        ToolDefinition {
            name: "create_appointment",
            description: "Create a patient appointment and predict the likely disease from symptoms",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "phone": {"type": "string"},
                    "date": {"type": "string"},
                    "type": {"type": "string"},
                    "symptoms": {
                        "oneOf": [string_list.clone(), {"type": "string"}],
                        "description": "Symptom list, or a comma-separated string"
                    }
                },
                "required": ["name", "symptoms"]
            }),
        },
        ToolDefinition {
            name: "list_appointments",
            description: "List patient appointments, optionally filtered by status",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status": {"type": "string", "enum": crate::models::AppointmentStatus::all()}
                }
            }),
        },
        ToolDefinition {
            name: "get_patient",
            description: "Fetch one patient record by ID",
            input_schema: json!({
                "type": "object",
                "properties": {"patient_id": {"type": "integer", "minimum": 1}},
                "required": ["patient_id"]
            }),
        },
        ToolDefinition {
            name: "update_status",
            description: "Change the status of a patient appointment",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "patient_id": {"type": "integer", "minimum": 1},
                    "status": {"type": "string", "enum": crate::models::AppointmentStatus::all()}
                },
                "required": ["patient_id", "status"]
            }),
        },
        ToolDefinition {
            name: "submit_final_prescription",
            description: "Record the doctor's final prescription against the recommended one",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "patient_id": {"type": "integer", "minimum": 1},
                    "doctor_id": {"type": ["string", "integer"]},
                    "final_prescription": string_list.clone()
                },
                "required": ["patient_id", "doctor_id", "final_prescription"]
            }),
        },
        ToolDefinition {
            name: "generate_pdf",
            description: "Render a prescription PDF and return it base64-encoded",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "patient_name": {"type": "string"},
                    "doctor_name": {"type": "string"},
                    "diagnosis": {"type": "string"},
                    "prescription": string_list
                },
                "required": ["patient_name", "doctor_name", "diagnosis", "prescription"]
            }),
        },
    ]
}

// ═══════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════

/// Run `name` and always produce an envelope.
pub fn call_tool(core: &CoreState, name: &str, arguments: Value) -> Value {
    match dispatch(core, name, arguments) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(tool = name, error = %e, "Tool call failed");
            json!({
                "status": "error",
                "message": e.to_string(),
                "tool": name,
            })
        }
    }
}

fn dispatch(core: &CoreState, name: &str, arguments: Value) -> Result<Value, ToolError> {
    tracing::debug!(tool = name, "Tool call");
    match name {
        "create_appointment" => create_appointment(core, parse_args(name, arguments)?),
        "list_appointments" => list_appointments(core, parse_args(name, arguments)?),
        "get_patient" => get_patient(core, parse_args(name, arguments)?),
        "update_status" => update_status(core, parse_args(name, arguments)?),
        "submit_final_prescription" => {
            submit_final_prescription(core, parse_args(name, arguments)?)
        }
        "generate_pdf" => generate_pdf(core, parse_args(name, arguments)?),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Missing arguments are treated as an empty object.
fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

// ── Tools ───────────────────────────────────────────────

fn create_appointment(core: &CoreState, input: NewAppointment) -> Result<Value, ToolError> {
    let patient = core.create_appointment(input)?;
    Ok(json!({
        "status": "success",
        "message": "Appointment created successfully",
        "patient": patient,
    }))
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
}

fn list_appointments(core: &CoreState, args: ListArgs) -> Result<Value, ToolError> {
    let status = match args.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    let patients = core.list_appointments(status)?;
    Ok(json!({
        "status": "success",
        "count": patients.len(),
        "patients": patients,
    }))
}

#[derive(Debug, Deserialize)]
struct PatientArgs {
    patient_id: u64,
}

fn get_patient(core: &CoreState, args: PatientArgs) -> Result<Value, ToolError> {
    let patient = core.get_patient(args.patient_id)?;
    Ok(json!({
        "status": "success",
        "patient": patient,
    }))
}

#[derive(Debug, Deserialize)]
struct StatusArgs {
    patient_id: u64,
    status: String,
}

fn update_status(core: &CoreState, args: StatusArgs) -> Result<Value, ToolError> {
    let status = parse_status(&args.status)?;
    let patient = core.update_status(args.patient_id, status)?;
    Ok(json!({
        "status": "success",
        "message": "Appointment status updated successfully",
        "patient": patient,
    }))
}

/// Doctor ids arrive as strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DoctorId {
    Text(String),
    Number(i64),
}

impl DoctorId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FinalPrescriptionArgs {
    patient_id: u64,
    doctor_id: DoctorId,
    #[serde(default)]
    final_prescription: Vec<String>,
}

fn submit_final_prescription(
    core: &CoreState,
    args: FinalPrescriptionArgs,
) -> Result<Value, ToolError> {
    let doctor_id = args.doctor_id.into_string();
    let finalized =
        core.finalize_prescription(args.patient_id, &doctor_id, args.final_prescription)?;
    Ok(json!({
        "status": "success",
        "message": "Final prescription recorded",
        "log": finalized.entry,
        "persisted": finalized.persisted,
    }))
}

fn generate_pdf(core: &CoreState, args: DocumentRequest) -> Result<Value, ToolError> {
    let rendered = core.render_document(&PrescriptionDocument::from(args))?;
    Ok(json!({
        "status": "success",
        "pdf": base64::engine::general_purpose::STANDARD.encode(&rendered.bytes),
        "filename": rendered.filename,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::testing;

    fn create(core: &CoreState, name: &str, symptoms: Value) -> Value {
        call_tool(
            core,
            "create_appointment",
            json!({
                "name": name,
                "phone": "555",
                "date": "2024-05-01",
                "type": "walk-in",
                "symptoms": symptoms,
            }),
        )
    }

    #[test]
    fn catalogue_lists_six_tools() {
        let names: Vec<&str> = tool_definitions().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "create_appointment",
                "list_appointments",
                "get_patient",
                "update_status",
                "submit_final_prescription",
                "generate_pdf",
            ]
        );
    }

    #[test]
    fn create_appointment_from_list() {
        let core = testing::core();
        let envelope = create(&core, "Ada", json!(["Fever", "Body aches"]));
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["patient"]["id"], 1);
        assert_eq!(envelope["patient"]["predicted_disease"], "Flu");
        assert_eq!(envelope["patient"]["type"], "walk-in");
    }

    #[test]
    fn list_and_filter() {
        let core = testing::core();
        create(&core, "A", json!(["Fever"]));
        create(&core, "B", json!(["Cough"]));
        call_tool(&core, "update_status", json!({"patient_id": 2, "status": "confirmed"}));

        let all = call_tool(&core, "list_appointments", Value::Null);
        assert_eq!(all["count"], 2);
        let confirmed = call_tool(&core, "list_appointments", json!({"status": "confirmed"}));
        assert_eq!(confirmed["count"], 1);
        assert_eq!(confirmed["patients"][0]["id"], 2);
    }

    #[test]
    fn get_missing_patient_is_error_envelope() {
        let core = testing::core();
        let envelope = call_tool(&core, "get_patient", json!({"patient_id": 4}));
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["message"], "Patient with ID 4 not found");
    }

    #[test]
    fn invalid_status_is_error_envelope() {
        let core = testing::core();
        create(&core, "A", json!(["Fever"]));
        let envelope = call_tool(
            &core,
            "update_status",
            json!({"patient_id": 1, "status": "gone"}),
        );
        assert_eq!(envelope["status"], "error");
        assert_eq!(core.get_patient(1).unwrap().status.as_str(), "pending");
    }

    #[test]
    fn final_prescription_accepts_numeric_doctor_id() {
        let core = testing::core();
        create(&core, "A", json!(["Cough", "Sneezing"]));
        let envelope = call_tool(
            &core,
            "submit_final_prescription",
            json!({"patient_id": 1, "doctor_id": 17, "final_prescription": ["Rest"]}),
        );
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["message"], "Final prescription recorded");
        assert_eq!(envelope["log"]["doctor_id"], "17");
        assert_eq!(envelope["log"]["ai_prescription"], json!(["Rest", "Fluids", "Vitamin C"]));
    }

    #[test]
    fn final_prescription_for_missing_patient_leaves_log() {
        let core = testing::core();
        let envelope = call_tool(
            &core,
            "submit_final_prescription",
            json!({"patient_id": 99, "doctor_id": "D1", "final_prescription": ["Rest"]}),
        );
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["message"], "Patient with ID 99 not found");
        assert!(core.override_entries().unwrap().is_empty());
    }

    #[test]
    fn generate_pdf_returns_base64() {
        let core = testing::core();
        let envelope = call_tool(
            &core,
            "generate_pdf",
            json!({
                "patient_name": "Ada",
                "doctor_name": "Smith",
                "diagnosis": "Flu",
                "prescription": ["Rest"],
            }),
        );
        assert_eq!(envelope["status"], "success");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(envelope["pdf"].as_str().unwrap())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn bad_arguments_are_error_envelopes() {
        let core = testing::core();
        let envelope = call_tool(&core, "get_patient", json!({"patient_id": "one"}));
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["tool"], "get_patient");

        let envelope = call_tool(&core, "generate_pdf", json!({"patient_name": "Ada"}));
        assert_eq!(envelope["status"], "error");
    }

    #[test]
    fn unknown_tool_is_error_envelope() {
        let core = testing::core();
        let envelope = call_tool(&core, "delete_patient", json!({}));
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["message"], "Unknown tool: delete_patient");
    }
}
