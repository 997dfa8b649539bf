//! Accounts and roles.
//!
//! **Demo only.** Passwords are held and compared in plaintext, and authentication does
//! not distinguish an unknown email from a wrong password. Do not reuse this module as a
//! template for real credential handling.

use crate::{SessionError, SessionResult};
use labdiag_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequential account identifier, unique within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> SessionResult<Self> {
        match s.trim() {
            "patient" => Ok(Self::Patient),
            "admin" => Ok(Self::Admin),
            other => Err(SessionError::Validation(format!(
                "unknown role: {other} (expected patient or admin)"
            ))),
        }
    }
}

/// A plaintext password.
///
/// Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a password. Passwords are not trimmed, but must not be empty.
    pub fn new(input: impl Into<String>) -> SessionResult<Self> {
        let input = input.into();
        if input.is_empty() {
            return Err(SessionError::Validation("password is required".into()));
        }
        Ok(Self(input))
    }

    pub(crate) fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub role: Role,
    pub phone: Option<String>,
    pub(crate) password: Password,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Raw sign-up form input, validated by [`NewAccount::validate`].
#[derive(Clone, Debug, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

/// A validated registration request.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub password: Password,
    pub role: Role,
    pub phone: Option<String>,
}

impl NewAccount {
    /// Validates a sign-up form.
    ///
    /// Name, email and password are required. Role defaults to patient. A blank phone
    /// number is treated as not provided.
    pub fn validate(form: SignupForm) -> SessionResult<Self> {
        let name = NonEmptyText::new(&form.name)
            .map_err(|_| SessionError::Validation("name is required".into()))?;
        let email = EmailAddress::parse(&form.email)?;
        let password = Password::new(form.password)?;
        let phone = form
            .phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());

        Ok(Self {
            name,
            email,
            password,
            role: form.role.unwrap_or(Role::Patient),
            phone,
        })
    }
}
