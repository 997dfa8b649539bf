//! Session state: accounts, the signed-in identity, the current report and saved results.
//!
//! [`SessionStore`] owns every piece of mutable session state and is passed explicitly to
//! whoever needs it. There are no process-wide singletons.
//!
//! Saved results are mirrored into a [`KeyValueStore`]: the whole collection is rewritten
//! on every save and on a bulk clear, and restored when the store is opened. Restore and
//! write failures are logged as warnings and never stop the session.

use crate::access::{self, landing_route, Route};
use crate::account::{Account, AccountId, NewAccount, SignupForm};
use crate::config::CoreConfig;
use crate::constants::{DEMO_ACCOUNTS, DEMO_PASSWORD, GUEST_NAME};
use crate::engine::Report;
use crate::export::PrintableReport;
use crate::persistence::{KeyValueStore, MemoryKeyValueStore};
use crate::results::{group_by_patient, PatientResults, ResultId, SavedResult};
use crate::{PersistenceError, PersistenceResult, SessionError, SessionResult};
use chrono::{DateTime, Utc};

pub struct SessionStore<K: KeyValueStore = MemoryKeyValueStore> {
    kv: K,
    results_key: String,
    accounts: Vec<Account>,
    saved_results: Vec<SavedResult>,
    active: Option<AccountId>,
    current_report: Option<Report>,
    next_account_id: u64,
    next_result_id: u64,
}

impl SessionStore<MemoryKeyValueStore> {
    /// A store backed by process memory only, with the demo accounts seeded.
    pub fn in_memory() -> Self {
        Self::open(&CoreConfig::default(), MemoryKeyValueStore::new())
    }
}

impl<K: KeyValueStore> SessionStore<K> {
    /// Opens a session, restoring saved results from `kv`.
    ///
    /// A missing entry starts an empty collection. An unreadable or corrupt entry, or one
    /// whose largest id leaves no room for another, is logged as a warning and also starts
    /// empty.
    pub fn open(cfg: &CoreConfig, kv: K) -> Self {
        let mut saved_results = restore_results(&kv, cfg.results_key());
        let max_id = saved_results.iter().map(|r| r.id.0).max();
        let next_result_id = match max_id {
            None => 1,
            Some(max) => max.checked_add(1).unwrap_or_else(|| {
                tracing::warn!(
                    "ignoring saved results under {}: result id {} leaves no room for new ids",
                    cfg.results_key(),
                    max
                );
                saved_results.clear();
                1
            }),
        };

        let mut store = Self {
            kv,
            results_key: cfg.results_key().to_owned(),
            accounts: Vec::new(),
            saved_results,
            active: None,
            current_report: None,
            next_account_id: 1,
            next_result_id,
        };

        if cfg.seed_demo_accounts() {
            store.seed_demo_accounts();
        }

        store
    }

    fn seed_demo_accounts(&mut self) {
        for (name, email, role) in DEMO_ACCOUNTS {
            let form = SignupForm {
                name: name.into(),
                email: email.into(),
                password: DEMO_PASSWORD.into(),
                role: Some(role),
                phone: None,
            };
            if let Err(e) = self.register(form) {
                tracing::warn!("failed to seed demo account {}: {}", email, e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accounts and identity
    // ------------------------------------------------------------------

    /// Registers a new account with the next sequential id.
    ///
    /// # Errors
    ///
    /// - `SessionError::Validation` if name, email or password is missing or malformed.
    ///   Nothing is committed in that case.
    /// - `SessionError::Conflict` if an account with the same email already exists.
    /// - `SessionError::IdsExhausted` if the account id counter cannot advance.
    pub fn register(&mut self, form: SignupForm) -> SessionResult<Account> {
        let new = NewAccount::validate(form)?;

        if self.account_by_email(new.email.as_str()).is_some() {
            return Err(SessionError::Conflict(new.email.to_string()));
        }

        let next_account_id = self
            .next_account_id
            .checked_add(1)
            .ok_or(SessionError::IdsExhausted("account"))?;

        let account = Account {
            id: AccountId(self.next_account_id),
            name: new.name,
            email: new.email,
            role: new.role,
            phone: new.phone,
            password: new.password,
        };
        self.next_account_id = next_account_id;

        tracing::info!(
            "registered account {} <{}> as {}",
            account.id,
            account.email,
            account.role
        );
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// Checks credentials by exact match on email and password. No normalisation is applied.
    ///
    /// An unknown email and a wrong password fail identically.
    pub fn authenticate(&self, email: &str, password: &str) -> SessionResult<&Account> {
        self.accounts
            .iter()
            .find(|a| a.email.as_str() == email && a.password.matches(password))
            .ok_or(SessionError::InvalidCredentials)
    }

    /// Authenticates, makes the account active and returns the route it lands on.
    pub fn sign_in(&mut self, email: &str, password: &str) -> SessionResult<Route> {
        let (id, role) = match self.authenticate(email, password) {
            Ok(account) => (account.id, account.role),
            Err(e) => {
                tracing::warn!("sign-in failed for {}", email);
                return Err(e);
            }
        };

        self.set_active(id)?;
        tracing::info!("signed in {}", email);
        Ok(landing_route(role))
    }

    pub fn set_active(&mut self, id: AccountId) -> SessionResult<()> {
        if self.account(id).is_none() {
            return Err(SessionError::UnknownAccount(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Signs out. The account is kept; any unsaved report is discarded.
    pub fn clear_active(&mut self) {
        self.active = None;
        self.current_report = None;
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.active.and_then(|id| self.account(id))
    }

    /// Name shown on printable reports: the active account's name, or "Guest".
    pub fn display_name(&self) -> &str {
        self.active_account()
            .map_or(GUEST_NAME, |account| account.name.as_str())
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email.as_str() == email)
    }

    /// All accounts in registration order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Checks the active account against a route.
    pub fn authorize(&self, route: Route) -> SessionResult<()> {
        access::authorize(route, self.active_account())
    }

    pub fn can_access(&self, route: Route) -> bool {
        access::can_access(route, self.active_account())
    }

    // ------------------------------------------------------------------
    // Current report
    // ------------------------------------------------------------------

    /// Makes `report` the current report, replacing any unsaved one.
    pub fn record_report(&mut self, report: Report) {
        self.current_report = Some(report);
    }

    pub fn current_report(&self) -> Option<&Report> {
        self.current_report.as_ref()
    }

    /// Discards the current report, as when the symptom selection is reset.
    pub fn reset_report(&mut self) {
        self.current_report = None;
    }

    /// Builds a printable document for the current report.
    pub fn printable(&self, generated_at: DateTime<Utc>) -> SessionResult<PrintableReport<'_>> {
        let report = self
            .current_report
            .as_ref()
            .ok_or(SessionError::NoCurrentReport)?;
        Ok(PrintableReport::new(
            self.display_name(),
            generated_at,
            report,
        ))
    }

    // ------------------------------------------------------------------
    // Saved results
    // ------------------------------------------------------------------

    /// Saves the current report's top candidate for the active account, timestamped now.
    pub fn save_current_report(&mut self) -> SessionResult<SavedResult> {
        self.save_current_report_at(Utc::now())
    }

    /// Saves the current report's top candidate for the active account.
    ///
    /// The current report stays in place, so saving again creates another record.
    ///
    /// # Errors
    ///
    /// - `SessionError::NoCurrentReport` if nothing has been evaluated.
    /// - `SessionError::AuthorizationRequired` if nobody is signed in.
    /// - `SessionError::IdsExhausted` if the result id counter cannot advance.
    pub fn save_current_report_at(&mut self, when: DateTime<Utc>) -> SessionResult<SavedResult> {
        let report = self
            .current_report
            .as_ref()
            .ok_or(SessionError::NoCurrentReport)?;
        let account = self
            .active_account()
            .ok_or(SessionError::AuthorizationRequired {
                route: Route::Patient,
                redirect: Route::Login,
            })?;

        let next_result_id = self
            .next_result_id
            .checked_add(1)
            .ok_or(SessionError::IdsExhausted("result"))?;

        let top = report.top();
        let record = SavedResult {
            id: ResultId(self.next_result_id),
            when,
            patient_email: account.email.clone(),
            symptoms: report.symptoms().to_vec(),
            diagnosis: top.name.clone(),
            confidence: top.confidence,
        };
        self.next_result_id = next_result_id;

        tracing::info!(
            "saved result {} for {}: {} ({}%)",
            record.id,
            record.patient_email,
            record.diagnosis,
            record.confidence
        );
        self.saved_results.push(record.clone());
        self.persist_results();
        Ok(record)
    }

    /// Records belonging to `email`, exact match, in insertion order.
    pub fn results_for(&self, email: &str) -> Vec<&SavedResult> {
        self.saved_results
            .iter()
            .filter(|r| r.patient_email.as_str() == email)
            .collect()
    }

    /// All records in insertion order.
    pub fn saved_results(&self) -> &[SavedResult] {
        &self.saved_results
    }

    /// Records grouped per patient for the administrative view, most recent first.
    pub fn results_by_patient(&self) -> Vec<PatientResults<'_>> {
        group_by_patient(&self.saved_results, |email| {
            self.account_by_email(email.as_str())
                .map(|account| account.name.as_str())
        })
    }

    /// Deletes every saved record. Accounts are untouched and ids are not reused.
    pub fn clear_all_results(&mut self) {
        let cleared = self.saved_results.len();
        self.saved_results.clear();
        tracing::info!("cleared {} saved results", cleared);
        self.persist_results();
    }

    fn persist_results(&mut self) {
        if let Err(e) = self.write_results() {
            tracing::warn!(
                "failed to persist saved results under {}: {}",
                self.results_key,
                e
            );
        }
    }

    fn write_results(&mut self) -> PersistenceResult<()> {
        let raw =
            serde_json::to_string(&self.saved_results).map_err(PersistenceError::Serialization)?;
        self.kv.set(&self.results_key, &raw)
    }

    /// The backing key-value store.
    pub fn storage(&self) -> &K {
        &self.kv
    }
}

fn restore_results<K: KeyValueStore>(kv: &K, key: &str) -> Vec<SavedResult> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("no saved results under {}; starting empty", key);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("failed to read saved results under {}: {}", key, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<SavedResult>>(&raw).map_err(PersistenceError::Deserialization)
    {
        Ok(results) => {
            tracing::info!("restored {} saved results from {}", results.len(), key);
            results
        }
        Err(e) => {
            tracing::warn!("ignoring corrupt saved results under {}: {}", key, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::engine::{DiagnosisEngine, ReportMeta};
    use crate::symptom::Symptom::{self, *};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn report(symptoms: &[Symptom]) -> Report {
        DiagnosisEngine::new().evaluate(symptoms.iter().copied(), ReportMeta::new(at(8)))
    }

    fn cfg(seed: bool) -> CoreConfig {
        CoreConfig::new(PathBuf::from("unused"), "results", seed).expect("valid config")
    }

    fn form(name: &str, email: &str) -> SignupForm {
        SignupForm {
            name: name.into(),
            email: email.into(),
            password: "pw".into(),
            role: Some(Role::Patient),
            phone: Some("555-0100".into()),
        }
    }

    fn signed_in_patient() -> SessionStore {
        let mut store = SessionStore::in_memory();
        store
            .sign_in("patient@example.com", DEMO_PASSWORD)
            .expect("demo patient should sign in");
        store
    }

    #[test]
    fn demo_accounts_are_seeded_in_order() {
        let store = SessionStore::in_memory();
        let accounts = store.accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, AccountId(1));
        assert_eq!(accounts[0].email.as_str(), "admin@example.com");
        assert!(accounts[0].is_admin());
        assert_eq!(accounts[1].id, AccountId(2));
        assert!(accounts[1].has_role(Role::Patient));
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let mut store = SessionStore::open(&cfg(false), MemoryKeyValueStore::new());
        let a = store.register(form("A", "a@example.com")).unwrap();
        let b = store.register(form("B", "b@example.com")).unwrap();
        assert_eq!(a.id, AccountId(1));
        assert_eq!(b.id, AccountId(2));
        assert_eq!(b.phone.as_deref(), Some("555-0100"));
        assert!(b.password.matches("pw"));
    }

    #[test]
    fn register_rejects_duplicate_email_without_committing() {
        let mut store = SessionStore::in_memory();
        let err = store
            .register(form("Impostor", "admin@example.com"))
            .expect_err("duplicate email should be rejected");
        assert!(matches!(err, SessionError::Conflict(email) if email == "admin@example.com"));
        assert_eq!(store.accounts().len(), 2);

        // email matching is case-sensitive, so this is a different account
        store
            .register(form("Other", "Admin@example.com"))
            .expect("different case is a different email");
    }

    #[test]
    fn register_rejects_missing_fields_without_committing() {
        let mut store = SessionStore::in_memory();
        let err = store
            .register(form("", "new@example.com"))
            .expect_err("name is required");
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(store.accounts().len(), 2);

        // the failed attempt must not consume an id
        let account = store.register(form("New", "new@example.com")).unwrap();
        assert_eq!(account.id, AccountId(3));
    }

    #[test]
    fn authenticate_fails_identically_for_unknown_email_and_wrong_password() {
        let store = SessionStore::in_memory();
        let unknown = store.authenticate("nobody@example.com", DEMO_PASSWORD);
        let wrong = store.authenticate("admin@example.com", "nope");
        assert!(matches!(unknown, Err(SessionError::InvalidCredentials)));
        assert!(matches!(wrong, Err(SessionError::InvalidCredentials)));
        assert!(store
            .authenticate("admin@example.com", DEMO_PASSWORD)
            .is_ok());
    }

    #[test]
    fn authenticate_requires_exact_email() {
        let store = SessionStore::in_memory();
        for email in [" admin@example.com", "admin@example.com ", "Admin@example.com"] {
            assert!(
                matches!(
                    store.authenticate(email, DEMO_PASSWORD),
                    Err(SessionError::InvalidCredentials)
                ),
                "{email:?} should not match"
            );
        }
    }

    #[test]
    fn sign_in_returns_landing_route() {
        let mut store = SessionStore::in_memory();
        assert_eq!(
            store.sign_in("admin@example.com", DEMO_PASSWORD).unwrap(),
            Route::Admin
        );
        assert_eq!(
            store.sign_in("patient@example.com", DEMO_PASSWORD).unwrap(),
            Route::Patient
        );
        assert_eq!(store.display_name(), "Patient");
    }

    #[test]
    fn failed_sign_in_keeps_previous_identity() {
        let mut store = signed_in_patient();
        assert!(store.sign_in("admin@example.com", "wrong").is_err());
        assert_eq!(
            store.active_account().map(|a| a.email.as_str()),
            Some("patient@example.com")
        );
    }

    #[test]
    fn set_active_rejects_unknown_account() {
        let mut store = SessionStore::in_memory();
        let err = store.set_active(AccountId(99)).expect_err("no such account");
        assert!(matches!(err, SessionError::UnknownAccount(AccountId(99))));
        assert!(store.active_account().is_none());
    }

    #[test]
    fn clear_active_discards_draft_but_keeps_account() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever]));

        store.clear_active();

        assert!(store.active_account().is_none());
        assert!(store.current_report().is_none());
        assert!(store.account_by_email("patient@example.com").is_some());
        assert_eq!(store.display_name(), GUEST_NAME);
    }

    #[test]
    fn record_report_replaces_previous_report() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever]));
        store.record_report(report(&[Headache]));
        assert_eq!(
            store.current_report().unwrap().top().name,
            "Tension headache"
        );

        store.reset_report();
        assert!(store.current_report().is_none());
    }

    #[test]
    fn save_without_report_fails() {
        let mut store = signed_in_patient();
        let err = store
            .save_current_report_at(at(9))
            .expect_err("nothing to save");
        assert!(matches!(err, SessionError::NoCurrentReport));
        assert!(store.saved_results().is_empty());
    }

    #[test]
    fn save_requires_signed_in_account() {
        let mut store = SessionStore::in_memory();
        store.record_report(report(&[Fever]));
        let err = store
            .save_current_report_at(at(9))
            .expect_err("guest cannot save");
        assert!(matches!(
            err,
            SessionError::AuthorizationRequired {
                redirect: Route::Login,
                ..
            }
        ));
    }

    #[test]
    fn saving_twice_creates_two_records() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Headache, Nausea, Fever, Nausea]));

        let first = store.save_current_report_at(at(9)).unwrap();
        let second = store.save_current_report_at(at(10)).unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.diagnosis, "Migraine");
        assert_eq!(first.confidence, 65);
        assert_eq!(first.symptoms, vec![Headache, Nausea, Fever]);
        assert_eq!(
            (&first.diagnosis, first.confidence, &first.symptoms),
            (&second.diagnosis, second.confidence, &second.symptoms)
        );
        assert_eq!(first.patient_email.as_str(), "patient@example.com");
        assert!(
            store.current_report().is_some(),
            "report stays after saving"
        );
        assert_eq!(store.saved_results().len(), 2);
    }

    #[test]
    fn results_for_filters_by_exact_email() {
        let mut store = SessionStore::in_memory();
        store.sign_in("patient@example.com", DEMO_PASSWORD).unwrap();
        store.record_report(report(&[Cough, Fatigue]));
        store.save_current_report_at(at(9)).unwrap();

        store.sign_in("admin@example.com", DEMO_PASSWORD).unwrap();
        store.record_report(report(&[ShortnessOfBreath]));
        store.save_current_report_at(at(10)).unwrap();

        let mine = store.results_for("patient@example.com");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].diagnosis, "Bronchitis or mild infection");
        assert!(store.results_for("PATIENT@example.com").is_empty());
    }

    #[test]
    fn results_by_patient_resolves_names() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever]));
        store.save_current_report_at(at(9)).unwrap();
        store.save_current_report_at(at(11)).unwrap();

        let groups = store.results_by_patient();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].patient_name, Some("Patient"));
        assert_eq!(groups[0].records[0].when, at(11));
    }

    #[test]
    fn clear_all_results_keeps_accounts_and_never_reuses_ids() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever]));
        let first = store.save_current_report_at(at(9)).unwrap();

        store.clear_all_results();
        assert!(store.saved_results().is_empty());
        assert_eq!(store.accounts().len(), 2);

        let next = store.save_current_report_at(at(10)).unwrap();
        assert!(next.id > first.id);
    }

    #[test]
    fn saved_results_round_trip_through_storage() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever, Cough, SoreThroat]));
        store.save_current_report_at(at(9)).unwrap();
        store.record_report(report(&[Headache]));
        store.save_current_report_at(at(10)).unwrap();
        let before = store.saved_results().to_vec();

        let kv = store.storage().clone();
        let mut reopened = SessionStore::open(&CoreConfig::default(), kv);
        assert_eq!(reopened.saved_results(), before.as_slice());

        reopened.sign_in("patient@example.com", DEMO_PASSWORD).unwrap();
        reopened.record_report(report(&[Fever]));
        let next = reopened.save_current_report_at(at(11)).unwrap();
        assert_eq!(next.id, ResultId(3), "ids continue after restore");
    }

    #[test]
    fn clear_is_persisted() {
        let mut store = signed_in_patient();
        store.record_report(report(&[Fever]));
        store.save_current_report_at(at(9)).unwrap();
        store.clear_all_results();

        let reopened = SessionStore::open(&CoreConfig::default(), store.storage().clone());
        assert!(reopened.saved_results().is_empty());
    }

    #[test]
    fn corrupt_storage_starts_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("results", "{not json").unwrap();

        let store = SessionStore::open(&cfg(true), kv);
        assert!(store.saved_results().is_empty());
        assert_eq!(store.accounts().len(), 2, "session stays usable");
    }

    fn stored_result(id: u64) -> String {
        let record = SavedResult {
            id: ResultId(id),
            when: at(9),
            patient_email: "patient@example.com".parse().expect("valid email"),
            symptoms: vec![Headache],
            diagnosis: "Tension headache".into(),
            confidence: 40,
        };
        serde_json::to_string(&[record]).expect("serialize results")
    }

    #[test]
    fn restore_with_maximal_id_starts_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("results", &stored_result(u64::MAX)).unwrap();

        let mut store = SessionStore::open(&cfg(true), kv);
        assert!(store.saved_results().is_empty());

        store
            .sign_in("patient@example.com", DEMO_PASSWORD)
            .expect("demo patient should sign in");
        store.record_report(report(&[Fever]));
        let saved = store.save_current_report_at(at(10)).expect("save");
        assert_eq!(saved.id, ResultId(1));
    }

    #[test]
    fn save_fails_cleanly_when_result_ids_run_out() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("results", &stored_result(u64::MAX - 1)).unwrap();

        let mut store = SessionStore::open(&cfg(true), kv);
        assert_eq!(store.saved_results().len(), 1);

        store
            .sign_in("patient@example.com", DEMO_PASSWORD)
            .expect("demo patient should sign in");
        store.record_report(report(&[Fever]));
        let err = store
            .save_current_report_at(at(10))
            .expect_err("no ids left");
        assert!(matches!(err, SessionError::IdsExhausted("result")));
        assert_eq!(store.saved_results().len(), 1, "nothing appended");
        assert!(store.current_report().is_some());
    }

    #[test]
    fn printable_requires_current_report() {
        let mut store = SessionStore::in_memory();
        assert!(matches!(
            store.printable(at(12)),
            Err(SessionError::NoCurrentReport)
        ));

        store.record_report(report(&[Fever]));
        let printable = store.printable(at(12)).unwrap();
        assert_eq!(printable.patient(), GUEST_NAME);
    }
}
