//! Saved diagnosis records and the administrative per-patient grouping.

use crate::symptom::Symptom;
use chrono::{DateTime, Utc};
use labdiag_types::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub u64);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A persisted diagnosis outcome. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResult {
    pub id: ResultId,
    pub when: DateTime<Utc>,
    #[serde(rename = "patient")]
    pub patient_email: EmailAddress,
    pub symptoms: Vec<Symptom>,
    pub diagnosis: String,
    pub confidence: u8,
}

/// One patient's records for the administrative view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientResults<'a> {
    pub patient_email: &'a EmailAddress,
    /// Display name of the matching account, if the email still resolves to one.
    pub patient_name: Option<&'a str>,
    /// Most recent first.
    pub records: Vec<&'a SavedResult>,
}

/// Groups records by patient email.
///
/// Groups appear in the order of each patient's first record in `results`. Within a group
/// records are ordered by timestamp descending, ties broken by the higher id first.
pub fn group_by_patient<'a>(
    results: &'a [SavedResult],
    mut name_for: impl FnMut(&EmailAddress) -> Option<&'a str>,
) -> Vec<PatientResults<'a>> {
    let mut groups: Vec<PatientResults<'a>> = Vec::new();

    for record in results {
        match groups
            .iter_mut()
            .find(|g| g.patient_email == &record.patient_email)
        {
            Some(group) => group.records.push(record),
            None => groups.push(PatientResults {
                patient_email: &record.patient_email,
                patient_name: name_for(&record.patient_email),
                records: vec![record],
            }),
        }
    }

    for group in &mut groups {
        group
            .records
            .sort_by(|a, b| b.when.cmp(&a.when).then_with(|| b.id.cmp(&a.id)));
    }

    groups
}
