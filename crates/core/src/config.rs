//! TOML-based configuration system for santapost.
//!
//! All sensitive values (the SMTP mailbox password, the GIPHY API token)
//! are stored as `_env` fields that reference environment variable names.
//! The actual secrets are resolved at runtime via
//! [`AppConfig::resolve_env_vars`] and never appear in the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::roster::is_valid_email;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outgoing SMTP mailbox settings.
    pub smtp: SmtpConfig,

    /// Roster validation policy.
    #[serde(default)]
    pub roster: RosterConfig,

    /// Message template settings.
    #[serde(default)]
    pub templates: TemplateConfig,

    /// GIPHY festive-GIF settings. Omit the section to send without an
    /// embedded GIF.
    #[serde(default)]
    pub giphy: Option<GiphyConfig>,
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Outgoing SMTP mailbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host (e.g. `smtp.gmail.com`).
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// SMTP submission port (default 587, STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender mailbox. Also used as the SMTP username.
    pub from: String,

    /// Environment variable holding the mailbox password.
    #[serde(default = "default_smtp_password_env")]
    pub password_env: String,

    /// Resolved password (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub password: Option<String>,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_password_env() -> String {
    "SANTAPOST_SMTP_PASSWORD".into()
}

// ---------------------------------------------------------------------------
// Roster policy
// ---------------------------------------------------------------------------

/// Roster validation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Whether two participants may share a mailbox. In interactive runs
    /// the operator is asked instead; this toggle decides non-interactive
    /// runs.
    #[serde(default)]
    pub allow_duplicate_emails: bool,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            allow_duplicate_emails: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Message template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding a `.txt` (plain) and `.html` template. When unset,
    /// built-in defaults are used.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Subject line for every message.
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_subject() -> String {
    "Secret Santa".into()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: None,
            subject: default_subject(),
        }
    }
}

// ---------------------------------------------------------------------------
// GIPHY
// ---------------------------------------------------------------------------

/// GIPHY festive-GIF configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiphyConfig {
    /// GIPHY API base URL.
    #[serde(default = "default_giphy_api_url")]
    pub api_url: String,

    /// Environment variable holding the GIPHY API token.
    #[serde(default = "default_giphy_token_env")]
    pub token_env: String,

    /// Search tag for the random GIF.
    #[serde(default = "default_giphy_tag")]
    pub tag: String,

    /// Maximum content rating.
    #[serde(default = "default_giphy_rating")]
    pub rating: String,

    /// Keep a copy of each downloaded GIF under `save_dir`.
    #[serde(default)]
    pub keep_gifs: bool,

    /// Directory for retained GIFs (used when `keep_gifs` is set).
    #[serde(default = "default_gif_save_dir")]
    pub save_dir: PathBuf,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_giphy_api_url() -> String {
    "https://api.giphy.com".into()
}
fn default_giphy_token_env() -> String {
    "SANTAPOST_GIPHY_TOKEN".into()
}
fn default_giphy_tag() -> String {
    "Merry Christmas".into()
}
fn default_giphy_rating() -> String {
    "PG-13".into()
}
fn default_gif_save_dir() -> PathBuf {
    PathBuf::from("./images")
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables and populate
    /// the corresponding resolved fields.
    ///
    /// Fields that reference a missing variable will log a warning but will
    /// **not** fail -- the CLI falls back to an interactive password prompt
    /// when a secret is still absent at send time.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        self.smtp.password = resolve_optional_env(&self.smtp.password_env, "smtp.password_env");

        if let Some(ref mut giphy) = self.giphy {
            giphy.token = resolve_optional_env(&giphy.token_env, "giphy.token_env");
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "smtp.host".into(),
                detail: "SMTP host must not be empty".into(),
            });
        }
        if self.smtp.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "smtp.port".into(),
                detail: "SMTP port must be > 0".into(),
            });
        }
        if !is_valid_email(&self.smtp.from) {
            return Err(ConfigError::InvalidValue {
                field: "smtp.from".into(),
                detail: format!("'{}' is not a valid mailbox address", self.smtp.from),
            });
        }
        if self.templates.subject.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "templates.subject".into(),
                detail: "subject must not be empty".into(),
            });
        }
        if let Some(ref giphy) = self.giphy {
            if giphy.api_url.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "giphy.api_url".into(),
                    detail: "GIPHY API URL must not be empty".into(),
                });
            }
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[smtp]
host = "smtp.example.com"
port = 587
from = "santa@example.com"
password_env = "TEST_SMTP_PASSWORD"

[roster]
allow_duplicate_emails = true

[templates]
dir = "./templates"
subject = "Secret Santa 2025"

[giphy]
api_url = "https://api.giphy.com"
token_env = "TEST_GIPHY_TOKEN"
tag = "Happy Holidays"
rating = "PG"
keep_gifs = true
save_dir = "./gifs"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.roster.allow_duplicate_emails);
        assert_eq!(config.templates.subject, "Secret Santa 2025");
        let giphy = config.giphy.expect("giphy section missing");
        assert_eq!(giphy.tag, "Happy Holidays");
        assert!(giphy.keep_gifs);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("santapost.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.smtp.from, "santa@example.com");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/santapost.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_rejects_bad_from_address() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.smtp.from = "not-a-mailbox".into();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "smtp.from"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.smtp.port = 0;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "smtp.port"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("TEST_SMTP_PW_RESOLVE", "s3cret");

        let toml_str = r#"
[smtp]
from = "santa@example.com"
password_env = "TEST_SMTP_PW_RESOLVE"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.smtp.password.as_deref(), Some("s3cret"));

        // Clean up
        std::env::remove_var("TEST_SMTP_PW_RESOLVE");
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[smtp]
from = "santa@example.com"
"#;
        let config: AppConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.password_env, "SANTAPOST_SMTP_PASSWORD");
        assert!(!config.roster.allow_duplicate_emails);
        assert_eq!(config.templates.subject, "Secret Santa");
        assert!(config.templates.dir.is_none());
        assert!(config.giphy.is_none());
    }
}
