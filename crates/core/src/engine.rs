//! Rule-based diagnosis suggestion.
//!
//! The engine is a pure function over a symptom selection. Rules live in two ordered
//! tables:
//!
//! - **Primary rules** are independent. Every rule whose required symptoms are all present
//!   contributes one candidate, in table order.
//! - **Fallback rules** are consulted only when no primary rule fired. The first matching
//!   rule wins. If none match, the catch-all candidate is used, so a report always has at
//!   least one candidate.
//!
//! Candidates are then stable-sorted by confidence, highest first. Equal confidences keep
//! the order in which their rules fired.
//!
//! Suggestions carry no medical validity.

use crate::symptom::{Symptom, SymptomSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A symptom requirement paired with the candidate it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Symptoms that must all be present. An empty list always matches.
    pub requires: &'static [Symptom],
    pub name: &'static str,
    pub confidence: u8,
}

impl Rule {
    pub fn matches(&self, symptoms: &SymptomSet) -> bool {
        symptoms.contains_all(self.requires)
    }

    fn candidate(&self) -> DiagnosisCandidate {
        DiagnosisCandidate {
            name: self.name.to_owned(),
            confidence: self.confidence,
        }
    }
}

pub const PRIMARY_RULES: [Rule; 4] = [
    Rule {
        requires: &[Symptom::Fever, Symptom::Cough, Symptom::SoreThroat],
        name: "Upper Respiratory Infection (possible viral)",
        confidence: 78,
    },
    Rule {
        requires: &[Symptom::Fever, Symptom::Nausea, Symptom::Diarrhea],
        name: "Gastroenteritis",
        confidence: 72,
    },
    Rule {
        requires: &[Symptom::Headache, Symptom::Nausea],
        name: "Migraine",
        confidence: 65,
    },
    Rule {
        requires: &[Symptom::ShortnessOfBreath],
        name: "Respiratory distress — seek urgent care",
        confidence: 90,
    },
];

pub const FALLBACK_RULES: [Rule; 2] = [
    Rule {
        requires: &[Symptom::Cough, Symptom::Fatigue],
        name: "Bronchitis or mild infection",
        confidence: 55,
    },
    Rule {
        requires: &[Symptom::Headache],
        name: "Tension headache",
        confidence: 40,
    },
];

pub const CATCH_ALL: Rule = Rule {
    requires: &[],
    name: "No strong match — consult a clinician",
    confidence: 30,
};

/// A suggested condition with a confidence score between 0 and 100.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisCandidate {
    pub name: String,
    pub confidence: u8,
}

/// Caller-supplied context recorded alongside a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub when: DateTime<Utc>,
}

impl ReportMeta {
    pub fn new(when: DateTime<Utc>) -> Self {
        Self {
            age: None,
            gender: None,
            when,
        }
    }

    /// Builds metadata from optional form fields. Blank fields are treated as not provided.
    pub fn from_fields(when: DateTime<Utc>, age: Option<String>, gender: Option<String>) -> Self {
        Self {
            age: age.and_then(non_blank),
            gender: gender.and_then(non_blank),
            when,
        }
    }

    /// Sets the age. Blank input is treated as not provided.
    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = non_blank(age.into());
        self
    }

    /// Sets the gender. Blank input is treated as not provided.
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = non_blank(gender.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// The outcome of one evaluation.
///
/// `results` is never empty and is ordered by confidence, highest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    meta: ReportMeta,
    symptoms: Vec<Symptom>,
    results: Vec<DiagnosisCandidate>,
}

impl Report {
    pub fn meta(&self) -> &ReportMeta {
        &self.meta
    }

    /// Symptoms in first-selection order, without duplicates.
    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn results(&self) -> &[DiagnosisCandidate] {
        &self.results
    }

    /// The highest-ranked candidate.
    pub fn top(&self) -> &DiagnosisCandidate {
        // evaluate always produces at least the catch-all candidate
        &self.results[0]
    }
}

/// Maps symptom selections to ranked candidates using the fixed rule tables.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosisEngine {
    primary: &'static [Rule],
    fallback: &'static [Rule],
    catch_all: Rule,
}

impl Default for DiagnosisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisEngine {
    pub const fn new() -> Self {
        Self {
            primary: &PRIMARY_RULES,
            fallback: &FALLBACK_RULES,
            catch_all: CATCH_ALL,
        }
    }

    /// Evaluates a symptom selection.
    ///
    /// Repeated symptoms collapse. An empty selection matches no rule and yields the
    /// catch-all candidate; callers that require a selection must check before calling.
    pub fn evaluate(
        &self,
        symptoms: impl IntoIterator<Item = Symptom>,
        meta: ReportMeta,
    ) -> Report {
        let symptoms: SymptomSet = symptoms.into_iter().collect();

        let mut results: Vec<DiagnosisCandidate> = self
            .primary
            .iter()
            .filter(|rule| rule.matches(&symptoms))
            .map(Rule::candidate)
            .collect();

        if results.is_empty() {
            let rule = self
                .fallback
                .iter()
                .find(|rule| rule.matches(&symptoms))
                .unwrap_or(&self.catch_all);
            results.push(rule.candidate());
        }

        // Vec::sort_by is stable; equal confidences keep rule order.
        results.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        Report {
            meta,
            symptoms: symptoms.into_vec(),
            results,
        }
    }
}
