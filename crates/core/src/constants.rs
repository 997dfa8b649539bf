//! Constants used throughout the LabDiag core crate.

/// Default directory backing the on-disk key-value store.
pub const DEFAULT_DATA_DIR: &str = "labdiag_data";

/// Default key under which the saved results collection is persisted.
pub const DEFAULT_RESULTS_KEY: &str = "labdiag_results";

/// File extension used by the on-disk key-value store for each entry.
pub const STORE_FILE_EXTENSION: &str = "json";

/// Maximum length of a persistence key.
pub const MAX_STORAGE_KEY_LEN: usize = 128;

/// Shared password of the seeded demo accounts.
///
/// Demo only. Passwords in this crate are compared in plaintext.
pub const DEMO_PASSWORD: &str = "pass123";

/// Seeded demo accounts as `(name, email, role)`, registered in this order.
pub const DEMO_ACCOUNTS: [(&str, &str, crate::Role); 2] = [
    ("Admin", "admin@example.com", crate::Role::Admin),
    ("Patient", "patient@example.com", crate::Role::Patient),
];

/// Display name used on printable reports when nobody is signed in.
pub const GUEST_NAME: &str = "Guest";

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "id,when,patient,symptoms,diagnosis,confidence";
