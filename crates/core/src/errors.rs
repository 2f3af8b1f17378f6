//! Error types for the santapost core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Gif(#[from] GifError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

// ---------------------------------------------------------------------------
// Roster errors
// ---------------------------------------------------------------------------

/// Errors from roster loading and validation.
///
/// Every validation failure is fatal: the whole roster is rejected and no
/// messages are dispatched.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Two or more participants share a name.
    #[error("duplicate participant name(s): {}", .names.join(", "))]
    DuplicateParticipant {
        names: Vec<String>,
    },

    /// The name and email columns do not line up.
    ///
    /// When emails are missing, `names_without_email` lists exactly which
    /// participants lack an address. When there are surplus emails the list
    /// is empty and `missing` counts the unmatched addresses.
    #[error("incomplete roster: {missing} unmatched entry(ies){}", format_missing_names(.names_without_email))]
    IncompleteRoster {
        missing: usize,
        names_without_email: Vec<String>,
    },

    /// Fewer than two participants. A derangement needs at least two.
    #[error("roster too small: {count} participant(s), minimum of two required")]
    RosterTooSmall {
        count: usize,
    },

    /// One or more email addresses failed syntactic validation.
    #[error("invalid email address for participant(s): {}", .names.join(", "))]
    InvalidEmailAddress {
        names: Vec<String>,
    },

    /// CSV parsing failure while loading the roster file.
    #[error("roster CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Generic I/O wrapper.
    #[error("roster I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_missing_names(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(" (no email address for: {})", names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Template errors
// ---------------------------------------------------------------------------

/// Errors from loading the message body templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The templates directory does not exist.
    #[error("templates directory not found: {0}")]
    DirNotFound(String),

    /// No file with the expected extension was found in the directory.
    #[error("no '{ext}' template found in '{dir}'")]
    MissingTemplate {
        ext: String,
        dir: String,
    },

    /// Generic I/O wrapper.
    #[error("template I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GIPHY errors
// ---------------------------------------------------------------------------

/// Errors from the GIPHY random-GIF client.
#[derive(Debug, Error)]
pub enum GifError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GIPHY HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GIPHY API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },

    /// The API response did not carry an expected field.
    #[error("GIPHY response missing field: {0}")]
    MissingField(String),

    /// Generic I/O error while saving a GIF to disk.
    #[error("GIF I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from the email dispatch subsystem.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// A mailbox string could not be parsed.
    #[error("invalid mailbox '{address}': {detail}")]
    InvalidMailbox {
        address: String,
        detail: String,
    },

    /// Building or sending an email failed.
    #[error("email delivery failed: {0}")]
    EmailError(String),

    /// Template failure while rendering a message body.
    #[error("notification template error: {0}")]
    TemplateError(#[from] TemplateError),

    /// GIF fetch failure while assembling a message.
    #[error("notification GIF error: {0}")]
    GifError(#[from] GifError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = RosterError::DuplicateParticipant {
            names: vec!["Holly".into()],
        };
        assert_eq!(err.to_string(), "duplicate participant name(s): Holly");

        let err = RosterError::RosterTooSmall { count: 1 };
        assert!(err.to_string().contains("minimum of two"));

        let err = RosterError::IncompleteRoster {
            missing: 1,
            names_without_email: vec![],
        };
        assert_eq!(err.to_string(), "incomplete roster: 1 unmatched entry(ies)");

        let err = RosterError::IncompleteRoster {
            missing: 2,
            names_without_email: vec!["Ivy".into(), "Noel".into()],
        };
        assert_eq!(
            err.to_string(),
            "incomplete roster: 2 unmatched entry(ies) (no email address for: Ivy, Noel)"
        );

        let err = ConfigError::EnvVarMissing {
            var: "SANTAPOST_SMTP_PASSWORD".into(),
            field: "smtp.password_env".into(),
        };
        assert!(err.to_string().contains("SANTAPOST_SMTP_PASSWORD"));

        let err = TemplateError::MissingTemplate {
            ext: ".html".into(),
            dir: "./templates".into(),
        };
        assert_eq!(err.to_string(), "no '.html' template found in './templates'");
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let roster_err = RosterError::RosterTooSmall { count: 0 };
        let core_err: CoreError = roster_err.into();
        assert!(matches!(core_err, CoreError::Roster(_)));

        let notify_err = NotificationError::EmailError("relay refused".into());
        let core_err: CoreError = notify_err.into();
        assert!(matches!(core_err, CoreError::Notification(_)));
    }
}
