//! Validated text primitives shared across the LabDiag crates.
//!
//! Values of these types are checked once at construction, so code that receives them
//! never needs to re-validate.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("value is blank")]
    Empty,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email address cannot be empty")]
    Empty,
    #[error("invalid email address: {0}")]
    Invalid(String),
}

/// Trimmed text with at least one visible character. Used for display names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            trimmed => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

// Honours width and alignment flags.
impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An email address used as an account lookup key.
///
/// Only surrounding whitespace is trimmed. Case is preserved and comparisons are exact,
/// so `Patient@example.com` and `patient@example.com` are different addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an email address.
    ///
    /// The address must contain exactly one `@` with a non-empty local part and domain,
    /// and no interior whitespace.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, EmailError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailError::Invalid(trimmed.to_owned()));
        }

        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(EmailError::Invalid(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for EmailAddress {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Admin  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Admin");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   ").expect_err("whitespace-only should fail");
        assert_eq!(err, TextError::Empty);
    }

    #[test]
    fn email_preserves_case() {
        let email = EmailAddress::parse(" Patient@Example.com ").expect("valid email");
        assert_eq!(email.as_str(), "Patient@Example.com");
        assert_ne!(
            email,
            EmailAddress::parse("patient@example.com").expect("valid email")
        );
    }

    #[test]
    fn email_rejects_malformed_input() {
        assert_eq!(EmailAddress::parse(""), Err(EmailError::Empty));
        assert!(matches!(
            EmailAddress::parse("no-at-sign"),
            Err(EmailError::Invalid(_))
        ));
        assert!(matches!(
            EmailAddress::parse("a@b@c"),
            Err(EmailError::Invalid(_))
        ));
        assert!(matches!(
            EmailAddress::parse("@example.com"),
            Err(EmailError::Invalid(_))
        ));
        assert!(matches!(
            EmailAddress::parse("pat ient@example.com"),
            Err(EmailError::Invalid(_))
        ));
    }

    #[test]
    fn display_honours_width() {
        let name = NonEmptyText::new("Ada").expect("valid name");
        let email = EmailAddress::parse("a@b.io").expect("valid email");
        assert_eq!(format!("[{name:<6}]"), "[Ada   ]");
        assert_eq!(format!("[{email:>8}]"), "[  a@b.io]");
    }

    #[test]
    fn blank_name_does_not_deserialize() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());

        let name: NonEmptyText = serde_json::from_str("\" Ada \"").expect("valid name");
        assert_eq!(name.as_str(), "Ada");
        assert_eq!(serde_json::to_string(&name).expect("serialize"), "\"Ada\"");
    }

    #[test]
    fn email_deserialize_rejects_invalid_value() {
        let result: Result<EmailAddress, _> = serde_json::from_str("\"not-an-email\"");
        assert!(result.is_err(), "invalid email should not deserialize");
    }
}
