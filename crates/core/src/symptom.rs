//! The closed symptom vocabulary and the deduplicated selection passed to the engine.

use crate::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A symptom a patient can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    Cough,
    SoreThroat,
    Headache,
    Fatigue,
    Nausea,
    Diarrhea,
    ShortnessOfBreath,
}

impl Symptom {
    /// Every symptom, in the order the intake form lists them.
    pub const ALL: [Symptom; 8] = [
        Symptom::Fever,
        Symptom::Cough,
        Symptom::SoreThroat,
        Symptom::Headache,
        Symptom::Fatigue,
        Symptom::Nausea,
        Symptom::Diarrhea,
        Symptom::ShortnessOfBreath,
    ];

    /// Stable identifier used in reports, exports and persisted records.
    pub fn id(self) -> &'static str {
        match self {
            Self::Fever => "fever",
            Self::Cough => "cough",
            Self::SoreThroat => "sore_throat",
            Self::Headache => "headache",
            Self::Fatigue => "fatigue",
            Self::Nausea => "nausea",
            Self::Diarrhea => "diarrhea",
            Self::ShortnessOfBreath => "shortness_of_breath",
        }
    }

    /// Human-readable label shown next to the checkbox.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fever => "Fever",
            Self::Cough => "Cough",
            Self::SoreThroat => "Sore throat",
            Self::Headache => "Headache",
            Self::Fatigue => "Fatigue",
            Self::Nausea => "Nausea",
            Self::Diarrhea => "Diarrhea",
            Self::ShortnessOfBreath => "Shortness of breath",
        }
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Symptom {
    type Err = SessionError;

    fn from_str(s: &str) -> SessionResult<Self> {
        let s = s.trim();
        Symptom::ALL
            .into_iter()
            .find(|symptom| symptom.id() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown symptom: {s}")))
    }
}

/// A deduplicated symptom selection that remembers first-occurrence order.
///
/// Matching only cares about membership; the order is kept so reports list symptoms the
/// way they were selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymptomSet(Vec<Symptom>);

impl SymptomSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symptom. Returns `false` if it was already present.
    pub fn insert(&mut self, symptom: Symptom) -> bool {
        if self.contains(symptom) {
            return false;
        }
        self.0.push(symptom);
        true
    }

    pub fn contains(&self, symptom: Symptom) -> bool {
        self.0.contains(&symptom)
    }

    /// True when every symptom in `required` is present. Vacuously true for an empty slice.
    pub fn contains_all(&self, required: &[Symptom]) -> bool {
        required.iter().all(|s| self.contains(*s))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symptom> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Symptom] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Symptom> {
        self.0
    }

    /// Parses a list of symptom identifiers, deduplicating as it goes.
    pub fn parse_ids<I, S>(ids: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| id.as_ref().parse::<Symptom>())
            .collect()
    }
}

impl FromIterator<Symptom> for SymptomSet {
    fn from_iter<T: IntoIterator<Item = Symptom>>(iter: T) -> Self {
        let mut set = SymptomSet::new();
        for symptom in iter {
            set.insert(symptom);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SymptomSet {
    type Item = Symptom;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Symptom>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
