//! Prescription PDF rendering.
//!
//! `DocumentRenderer` keeps callers independent of the PDF library.
//! `PdfPrescriptionRenderer` lays out a single A4 page (more when the
//! prescription list overflows) with builtin Helvetica fonts via `printpdf`.

use std::io::BufWriter;

use chrono::{Local, NaiveDate};
use printpdf::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

/// Content of one prescription document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionDocument {
    pub patient_name: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub prescription_lines: Vec<String>,
}

impl PrescriptionDocument {
    /// Both names must be non-blank.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.patient_name.trim().is_empty() {
            return Err(DocumentError::MissingField("Patient name"));
        }
        if self.doctor_name.trim().is_empty() {
            return Err(DocumentError::MissingField("Doctor name"));
        }
        Ok(())
    }

    /// Download name for a document rendered today.
    pub fn filename(&self) -> String {
        document_filename(&self.patient_name, Local::now().date_naive())
    }
}

/// Diagnosis printed when a request leaves it out.
pub const UNKNOWN_DIAGNOSIS: &str = "Unknown Diagnosis";

/// Wire form of a render request, shared by the HTTP API and the tool server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescription: Vec<String>,
}

impl From<DocumentRequest> for PrescriptionDocument {
    fn from(req: DocumentRequest) -> Self {
        Self {
            patient_name: req.patient_name,
            doctor_name: req.doctor_name,
            diagnosis: req
                .diagnosis
                .unwrap_or_else(|| UNKNOWN_DIAGNOSIS.to_string()),
            prescription_lines: req.prescription,
        }
    }
}

/// `prescription_<name>_<YYYYMMDD>.pdf`. The name keeps ASCII alphanumerics,
/// `_`, `-` and `.`; every other character becomes `_`, so the result is
/// always a valid header value with no path separators or quotes.
pub fn document_filename(patient_name: &str, date: NaiveDate) -> String {
    let name: String = patient_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("prescription_{}_{}.pdf", name, date.format("%Y%m%d"))
}

/// Turns a prescription document into file bytes.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &PrescriptionDocument) -> Result<Vec<u8>, DocumentError>;
}

// ═══════════════════════════════════════════════════════════
// printpdf renderer
// ═══════════════════════════════════════════════════════════

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(18.0);
const INDENT_LEFT: Mm = Mm(25.0);
const BOTTOM_LIMIT: Mm = Mm(30.0);
const WRAP_CHARS: usize = 85;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfPrescriptionRenderer;

impl PdfPrescriptionRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfPrescriptionRenderer {
    fn render(&self, document: &PrescriptionDocument) -> Result<Vec<u8>, DocumentError> {
        document.validate()?;

        let (doc, page1, layer1) =
            PdfDocument::new("Medical Prescription", PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DocumentError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DocumentError::Font(e.to_string()))?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| DocumentError::Font(e.to_string()))?;

        let mut layer = doc.get_page(page1).get_layer(layer1);
        let mut y = Mm(280.0);
        let now = Local::now();

        layer.use_text("MEDICAL PRESCRIPTION", 20.0, Mm(62.0), y, &bold);
        y -= Mm(16.0);

        layer.use_text(
            format!("Date: {}", now.format("%B %d, %Y")),
            12.0,
            MARGIN_LEFT,
            y,
            &font,
        );
        y -= Mm(14.0);

        layer.use_text("Patient Information:", 14.0, MARGIN_LEFT, y, &bold);
        y -= Mm(7.0);
        layer.use_text(format!("Name: {}", document.patient_name), 12.0, INDENT_LEFT, y, &font);
        y -= Mm(14.0);

        layer.use_text("Prescribing Physician:", 14.0, MARGIN_LEFT, y, &bold);
        y -= Mm(7.0);
        layer.use_text(physician_line(&document.doctor_name), 12.0, INDENT_LEFT, y, &font);
        y -= Mm(14.0);

        layer.use_text("Diagnosis:", 14.0, MARGIN_LEFT, y, &bold);
        y -= Mm(7.0);
        for line in wrap_text(&document.diagnosis, WRAP_CHARS) {
            layer.use_text(line, 12.0, INDENT_LEFT, y, &font);
            y -= Mm(6.0);
        }
        y -= Mm(8.0);

        layer.use_text("Prescription:", 14.0, MARGIN_LEFT, y, &bold);
        y -= Mm(10.0);
        for (i, item) in document.prescription_lines.iter().enumerate() {
            for line in wrap_text(&format!("{}. {}", i + 1, item), WRAP_CHARS) {
                if y < BOTTOM_LIMIT {
                    let (page, page_layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
                    layer = doc.get_page(page).get_layer(page_layer);
                    y = Mm(280.0);
                }
                layer.use_text(line, 12.0, INDENT_LEFT, y, &font);
                y -= Mm(8.0);
            }
        }

        layer.use_text(
            "This prescription is generated electronically and is valid.",
            10.0,
            MARGIN_LEFT,
            Mm(18.0),
            &italic,
        );
        layer.use_text(
            format!("Generated on: {}", now.format("%Y-%m-%d %H:%M:%S")),
            10.0,
            MARGIN_LEFT,
            Mm(12.0),
            &italic,
        );

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| DocumentError::Save(e.to_string()))?;
        let bytes = buf
            .into_inner()
            .map_err(|e| DocumentError::Save(e.to_string()))?;

        tracing::debug!(
            patient = %document.patient_name,
            lines = document.prescription_lines.len(),
            bytes = bytes.len(),
            "Prescription PDF rendered"
        );
        Ok(bytes)
    }
}

/// Prefix "Dr." unless the name already carries it.
fn physician_line(doctor_name: &str) -> String {
    let name = doctor_name.trim();
    if name.starts_with("Dr.") || name.starts_with("Dr ") {
        name.to_string()
    } else {
        format!("Dr. {name}")
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
