//! Recipient contact resolution.

use std::fmt;

use crate::models::student;

/// Anything that can be turned into a deliverable email address.
pub trait ContactResolvable {
    /// Deliverable address, or `None` when the recipient is unreachable.
    fn contact_address(&self, directory: &ContactDirectory) -> Option<String>;
}

/// Settings needed to derive addresses for roster entries.
#[derive(Debug, Clone)]
pub struct ContactDirectory {
    roll_number_domain: String,
}

impl ContactDirectory {
    pub fn new(roll_number_domain: impl Into<String>) -> Self {
        Self {
            roll_number_domain: roll_number_domain.into(),
        }
    }

    pub fn roll_number_address(&self, roll_number: &str) -> String {
        format!("{}@{}", roll_number.to_lowercase(), self.roll_number_domain)
    }
}

impl ContactResolvable for student::Model {
    fn contact_address(&self, directory: &ContactDirectory) -> Option<String> {
        if let Some(email) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            return Some(email.to_lowercase());
        }
        self.roll_number
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| directory.roll_number_address(r))
    }
}

/// A bare address typed in by a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEmail(String);

impl RawEmail {
    /// Accepts `local@domain.tld` shapes only; lower-cases the result.
    pub fn parse(input: &str) -> Option<Self> {
        let email = input.trim().to_lowercase();
        let (local, domain) = email.split_once('@')?;
        let valid = !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
            && !domain.contains('@');
        valid.then_some(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ContactResolvable for RawEmail {
    fn contact_address(&self, _directory: &ContactDirectory) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Masks the local part for logs: `al***@example.com`.
pub fn mask_address(address: &str) -> String {
    match address.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn student(roll: Option<&str>, email: Option<&str>) -> student::Model {
        student::Model {
            id: 1,
            name: "Asha".to_string(),
            roll_number: roll.map(String::from),
            email: email.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_student_prefers_email() {
        let dir = ContactDirectory::new("smail.iitm.ac.in");
        let s = student(Some("CS21B001"), Some("Asha@Example.com"));
        assert_eq!(s.contact_address(&dir).as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn test_student_falls_back_to_roll_number() {
        let dir = ContactDirectory::new("smail.iitm.ac.in");
        let s = student(Some("CS21B001"), None);
        assert_eq!(
            s.contact_address(&dir).as_deref(),
            Some("cs21b001@smail.iitm.ac.in")
        );
    }

    #[test]
    fn test_student_without_channels_is_unresolvable() {
        let dir = ContactDirectory::new("smail.iitm.ac.in");
        assert!(student(None, None).contact_address(&dir).is_none());
        assert!(student(Some("  "), Some("")).contact_address(&dir).is_none());
    }

    #[test]
    fn test_raw_email_parse() {
        assert_eq!(RawEmail::parse(" Bob@Mail.com ").unwrap().as_str(), "bob@mail.com");
        assert!(RawEmail::parse("bob").is_none());
        assert!(RawEmail::parse("@mail.com").is_none());
        assert!(RawEmail::parse("bob@mail").is_none());
        assert!(RawEmail::parse("bob smith@mail.com").is_none());
    }

    #[test]
    fn test_mask_address() {
        assert_eq!(mask_address("alice@example.com"), "al***@example.com");
        assert_eq!(mask_address("garbage"), "***");
    }
}
