//! Roster loading and validation.
//!
//! A [`Roster`] is the validated list of participants: unique names, one
//! syntactically valid email address each, at least two entries. It is
//! constructed once from input data and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::RosterError;

/// Syntactic pattern every participant address must match:
/// local part, `@`, domain label, `.`, domain rest.
pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9-.]+$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"))
}

/// Check a single address against [`EMAIL_PATTERN`].
pub fn is_valid_email(address: &str) -> bool {
    email_regex().is_match(address)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single participant: a unique name and their mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
}

/// Two or more participants sharing one mailbox. Permitted, but surfaced
/// for operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEmail {
    pub address: String,
    pub names: Vec<String>,
}

/// Non-fatal findings from roster validation.
#[derive(Debug, Clone, Default)]
pub struct RosterWarnings {
    pub duplicate_emails: Vec<DuplicateEmail>,
}

impl RosterWarnings {
    /// `true` when validation raised nothing worth confirming.
    pub fn is_clean(&self) -> bool {
        self.duplicate_emails.is_empty()
    }
}

/// The validated, ordered participant list.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
}

// ---------------------------------------------------------------------------
// Construction & validation
// ---------------------------------------------------------------------------

impl Roster {
    /// Build a roster from parallel name and email columns, enforcing every
    /// validation rule. Returns the roster together with any non-fatal
    /// warnings (duplicate mailboxes).
    pub fn from_columns(
        names: Vec<String>,
        emails: Vec<String>,
    ) -> Result<(Self, RosterWarnings), RosterError> {
        debug!(names = names.len(), emails = emails.len(), "validating roster columns");

        // Identity collisions break the pairing bijection outright.
        let duplicate_names = find_duplicates(&names);
        if !duplicate_names.is_empty() {
            return Err(RosterError::DuplicateParticipant {
                names: duplicate_names,
            });
        }

        // More emails than names: nothing to attach the surplus to.
        if names.len() < emails.len() {
            return Err(RosterError::IncompleteRoster {
                missing: emails.len() - names.len(),
                names_without_email: Vec::new(),
            });
        }

        if names.len() < 2 {
            return Err(RosterError::RosterTooSmall { count: names.len() });
        }

        // Fewer emails than names: report exactly which names lack one.
        if emails.len() < names.len() {
            let lacking: Vec<String> = names[emails.len()..].to_vec();
            for name in &lacking {
                warn!(participant = %name, "participant has no email address");
            }
            return Err(RosterError::IncompleteRoster {
                missing: names.len() - emails.len(),
                names_without_email: lacking,
            });
        }

        let participants: Vec<Participant> = names
            .into_iter()
            .zip(emails)
            .map(|(name, email)| Participant { name, email })
            .collect();

        // Any invalid address rejects the whole roster; no partial dispatch.
        let invalid: Vec<String> = participants
            .iter()
            .filter(|p| !is_valid_email(&p.email))
            .map(|p| p.name.clone())
            .collect();
        if !invalid.is_empty() {
            return Err(RosterError::InvalidEmailAddress { names: invalid });
        }

        let warnings = duplicate_email_warnings(&participants);
        info!(
            participants = participants.len(),
            duplicate_mailboxes = warnings.duplicate_emails.len(),
            "roster validated"
        );

        Ok((Self { participants }, warnings))
    }

    /// Load and validate a roster from a two-column CSV file.
    ///
    /// The first row is a header and is discarded; leading and trailing
    /// whitespace in either column is trimmed before validation.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<(Self, RosterWarnings), RosterError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading roster CSV");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut names = Vec::new();
        let mut emails = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(name) = record.get(0) {
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
            if let Some(email) = record.get(1) {
                if !email.is_empty() {
                    emails.push(email.to_string());
                }
            }
        }

        Self::from_columns(names, emails)
    }

    /// Participants in roster order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participant names in roster order.
    pub fn names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }

    /// Look up the email address for a participant name.
    pub fn email_of(&self, name: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.email.as_str())
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Values appearing more than once, first-seen order, reported once each.
fn find_duplicates(values: &[String]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_default() += 1;
    }
    let mut seen = Vec::new();
    for v in values {
        if counts[v.as_str()] > 1 && !seen.iter().any(|s: &String| s == v) {
            seen.push(v.clone());
        }
    }
    seen
}

/// Group participants by mailbox and report every shared address.
fn duplicate_email_warnings(participants: &[Participant]) -> RosterWarnings {
    let mut by_email: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for p in participants {
        by_email.entry(p.email.as_str()).or_default().push(&p.name);
    }

    let duplicate_emails = by_email
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(address, names)| DuplicateEmail {
            address: address.to_string(),
            names: names.into_iter().map(str::to_string).collect(),
        })
        .collect();

    RosterWarnings { duplicate_emails }
}
