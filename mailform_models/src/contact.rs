use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

/// Deliberately permissive shape check: something, an `@`, something, a dot,
/// something. Full mailbox validation is out of scope for a contact form.
pub static SUBMISSION_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

pub const NAME_MAX_CHARS: usize = 200;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const SERVICE_MAX_CHARS: usize = 200;
pub const MESSAGE_MAX_CHARS: usize = 5000;

#[nutype(
    sanitize(trim, with = |s: String| truncate_chars(s, NAME_MAX_CHARS)),
    derive(Debug, Clone, PartialEq, Eq, From, Deref, Serialize, Deserialize)
)]
pub struct SubmissionName(String);

#[nutype(
    sanitize(trim, with = |s: String| truncate_chars(s, EMAIL_MAX_CHARS)),
    derive(Debug, Clone, PartialEq, Eq, From, Deref, Serialize, Deserialize)
)]
pub struct SubmissionEmail(String);

#[nutype(
    sanitize(trim, with = |s: String| truncate_chars(s, SERVICE_MAX_CHARS)),
    derive(Debug, Clone, PartialEq, Eq, From, Deref, Serialize, Deserialize)
)]
pub struct SubmissionService(String);

#[nutype(
    sanitize(trim, with = |s: String| truncate_chars(s, MESSAGE_MAX_CHARS)),
    derive(Debug, Clone, PartialEq, Eq, From, Deref, Serialize, Deserialize)
)]
pub struct SubmissionMessage(String);

/// One contact form submission, normalized (trimmed, capped) at construction.
///
/// Truncation is silent: an overlong field is cut to its cap, not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: SubmissionName,
    pub email: SubmissionEmail,
    pub service: SubmissionService,
    /// Optional free-form message. Empty means "not provided".
    pub message: SubmissionMessage,
}

impl ContactSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().into(),
            email: email.into().into(),
            service: service.into().into(),
            message: message.into().into(),
        }
    }

    /// Checks the submission and returns every violation as a human-readable
    /// error string, in field order. An empty list means the submission is
    /// valid. Pure: repeated calls yield identical results.
    pub fn validate(&self) -> Vec<String> {
        validate_fields(&self.name, &self.email, &self.service, &self.message)
    }
}

fn validate_fields(name: &str, email: &str, service: &str, message: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if name.chars().count() < 2 {
        errors.push("Name is required and must be at least 2 characters.".into());
    }
    if !SUBMISSION_EMAIL_REGEX.is_match(email) {
        errors.push("A valid email address is required.".into());
    }
    if service.is_empty() {
        errors.push("Please select a service.".into());
    }
    // Normalization already caps the message, so this can only trip for
    // payloads that bypassed it. Kept as a second line of defense.
    if message.chars().count() > MESSAGE_MAX_CHARS {
        errors.push("Message is too long (max 5000 characters).".into());
    }

    errors
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].into(),
        None => s,
    }
}
