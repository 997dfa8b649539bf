//! CSV export of saved results and the printable single-report document.

use crate::constants::CSV_HEADER;
use crate::engine::Report;
use crate::results::SavedResult;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Renders saved results as CSV, one row per record in collection order.
///
/// The symptom column is pipe-joined and always double-quoted; other columns are
/// written verbatim. Rows are separated by `\n` with no trailing newline. An empty
/// collection yields the header row only.
pub fn results_to_csv<'a>(results: impl IntoIterator<Item = &'a SavedResult>) -> String {
    let mut lines = vec![CSV_HEADER.to_owned()];

    for record in results {
        let symptoms: Vec<&str> = record.symptoms.iter().map(|s| s.id()).collect();
        lines.push(format!(
            "{},{},{},\"{}\",{},{}",
            record.id,
            record.when.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.patient_email,
            symptoms.join("|"),
            record.diagnosis,
            record.confidence
        ));
    }

    lines.join("\n")
}

/// Human-readable document for one report, rendered via `Display`.
#[derive(Clone, Debug)]
pub struct PrintableReport<'a> {
    patient: &'a str,
    generated_at: DateTime<Utc>,
    report: &'a Report,
}

impl<'a> PrintableReport<'a> {
    pub fn new(patient: &'a str, generated_at: DateTime<Utc>, report: &'a Report) -> Self {
        Self {
            patient,
            generated_at,
            report,
        }
    }

    pub fn patient(&self) -> &str {
        self.patient
    }
}

impl fmt::Display for PrintableReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symptoms: Vec<&str> = self.report.symptoms().iter().map(|s| s.id()).collect();
        let top = self.report.top();

        writeln!(f, "Diagnosis Report")?;
        writeln!(f, "Patient: {}", self.patient)?;
        writeln!(
            f,
            "When: {}",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(f, "Symptoms: {}", symptoms.join(", "))?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "{}", top.name)?;
        writeln!(f, "Confidence: {}%", top.confidence)?;
        write!(f, "Generated by LabDiag.")
    }
}
