//! Normalized, validated waitlist email address.
//!
//! [`WaitlistEmail`] is the only way an address reaches storage. Raw input
//! is trimmed and lowercased before validation, so `"  USER@Example.com "`
//! and `"user@example.com"` resolve to the same row.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on address length (RFC 5321 forward-path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Reason a raw value was rejected as an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    /// Nothing left after trimming.
    #[error("email address is empty")]
    Empty,
    /// Longer than [`MAX_EMAIL_LEN`] characters.
    #[error("email address is too long")]
    TooLong,
    /// Does not match the address grammar.
    #[error("email address is malformed")]
    Malformed,
}

impl EmailError {
    /// Field-level message shown next to the form input.
    #[must_use]
    pub const fn field_message(&self) -> &'static str {
        "Invalid email address."
    }
}

/// An email address that has been trimmed, lowercased, and validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WaitlistEmail(String);

impl WaitlistEmail {
    /// Normalizes and validates a raw address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] if the normalized value is empty, too long,
    /// or not a well-formed address.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let normalized = normalize(raw);
        validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaitlistEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WaitlistEmail {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WaitlistEmail> for String {
    fn from(email: WaitlistEmail) -> Self {
        email.0
    }
}

/// Trims surrounding whitespace and lowercases the address.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate(candidate: &str) -> Result<(), EmailError> {
    if candidate.is_empty() {
        return Err(EmailError::Empty);
    }
    if candidate.chars().count() > MAX_EMAIL_LEN {
        return Err(EmailError::TooLong);
    }
    let (local, domain) = candidate.split_once('@').ok_or(EmailError::Malformed)?;
    if valid_local_part(local) && valid_domain(domain) {
        Ok(())
    } else {
        Err(EmailError::Malformed)
    }
}

fn valid_local_part(local: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '+' | '-' | '.');
    let Some(last) = local.chars().last() else {
        return false;
    };
    !local.starts_with('.')
        && !local.contains("..")
        && local.chars().all(allowed)
        && (last.is_ascii_alphanumeric() || matches!(last, '_' | '+' | '-'))
}

fn valid_domain(domain: &str) -> bool {
    let Some((hosts, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    let label_ok = |label: &str| {
        let mut chars = label.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    tld_ok && hosts.split('.').all(label_ok)
}
