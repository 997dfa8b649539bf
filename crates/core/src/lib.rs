//! # LabDiag Core
//!
//! Core logic for the LabDiag clinical intake workflow.
//!
//! This crate contains the decision logic and session data model:
//! - [`DiagnosisEngine`]: a pure, rule-based mapping from symptoms to ranked candidates
//! - [`SessionStore`]: accounts, the signed-in identity, the current report and saved results
//! - Route authorization ([`can_access`] / [`authorize`])
//! - CSV export and printable reports
//! - A key-value persistence boundary for saved results
//!
//! **No UI concerns**: rendering, navigation and prompting belong in `labdiag-cli`.
//!
//! **Demo only**: credentials are compared in plaintext and diagnoses have no medical
//! validity.

pub mod access;
pub mod account;
pub mod config;
pub mod constants;
pub mod engine;
mod error;
pub mod export;
pub mod persistence;
pub mod results;
pub mod store;
pub mod symptom;
pub mod validation;

pub use access::{authorize, can_access, landing_route, Route};
pub use account::{Account, AccountId, Role, SignupForm};
pub use config::CoreConfig;
pub use engine::{DiagnosisCandidate, DiagnosisEngine, Report, ReportMeta};
pub use error::{PersistenceError, PersistenceResult, SessionError, SessionResult};
pub use export::{results_to_csv, PrintableReport};
pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use results::{PatientResults, ResultId, SavedResult};
pub use store::SessionStore;
pub use symptom::{Symptom, SymptomSet};

pub use labdiag_types::{EmailAddress, NonEmptyText};
