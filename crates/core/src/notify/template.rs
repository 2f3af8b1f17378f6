//! Message body templates.
//!
//! Each letter is rendered from a plain-text and an HTML template with
//! `{giver}`, `{receiver}`, `{link}`, and `{id}` placeholders substituted
//! by plain string replacement. Templates come from a configured directory
//! (the first `.txt` and `.html` file found) or from built-in defaults.

use std::path::Path;

use tracing::{debug, info};

use crate::config::TemplateConfig;
use crate::errors::TemplateError;

const DEFAULT_PLAIN: &str = "\
Ho ho ho {giver},

You have been chosen as the Secret Santa for... {receiver}!

Keep it under your hat, and happy gifting.
{link}
";

const DEFAULT_HTML: &str = "\
<html><body>
<h2>Ho ho ho {giver},</h2>
<p>You have been chosen as the Secret Santa for... <strong>{receiver}</strong>!</p>
<img src=\"cid:{id}\" alt=\"A festive GIF\">
<p>Keep it under your hat, and happy gifting.</p>
</body></html>
";

const DEFAULT_HTML_NO_GIF: &str = "\
<html><body>
<h2>Ho ho ho {giver},</h2>
<p>You have been chosen as the Secret Santa for... <strong>{receiver}</strong>!</p>
<p>Keep it under your hat, and happy gifting.</p>
</body></html>
";

const DEFAULT_PLAIN_NO_GIF: &str = "\
Ho ho ho {giver},

You have been chosen as the Secret Santa for... {receiver}!

Keep it under your hat, and happy gifting.
";

/// A loaded pair of body templates plus the subject line.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    subject: String,
    plain: String,
    html: String,
}

impl TemplateSet {
    /// Built-in default templates. `with_gif` selects the variant carrying
    /// the inline-image placeholders.
    pub fn builtin(subject: &str, with_gif: bool) -> Self {
        let (plain, html) = if with_gif {
            (DEFAULT_PLAIN, DEFAULT_HTML)
        } else {
            (DEFAULT_PLAIN_NO_GIF, DEFAULT_HTML_NO_GIF)
        };
        Self {
            subject: subject.to_string(),
            plain: plain.to_string(),
            html: html.to_string(),
        }
    }

    /// Load templates from a directory: the first `.txt` file becomes the
    /// plain body, the first `.html` file the HTML body.
    pub fn from_dir<P: AsRef<Path>>(dir: P, subject: &str) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::DirNotFound(dir.display().to_string()));
        }

        let plain = read_first_with_ext(dir, ".txt")?;
        let html = read_first_with_ext(dir, ".html")?;
        info!(dir = %dir.display(), "loaded message templates");

        Ok(Self {
            subject: subject.to_string(),
            plain,
            html,
        })
    }

    /// Build a template set from config: the configured directory when set,
    /// built-in defaults otherwise.
    pub fn from_config(config: &TemplateConfig, with_gif: bool) -> Result<Self, TemplateError> {
        match config.dir {
            Some(ref dir) => Self::from_dir(dir, &config.subject),
            None => Ok(Self::builtin(&config.subject, with_gif)),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Render the plain-text body for one assignment.
    pub fn render_plain(&self, giver: &str, receiver: &str, link: &str) -> String {
        render(&self.plain, giver, receiver, link, "")
    }

    /// Render the HTML body for one assignment. `id` is the Content-ID of
    /// the inline GIF, referenced as `cid:{id}`.
    pub fn render_html(&self, giver: &str, receiver: &str, link: &str, id: &str) -> String {
        render(&self.html, giver, receiver, link, id)
    }
}

fn render(template: &str, giver: &str, receiver: &str, link: &str, id: &str) -> String {
    template
        .replace("{giver}", giver)
        .replace("{receiver}", receiver)
        .replace("{link}", link)
        .replace("{id}", id)
}

/// Read the first file in `dir` whose name ends with `ext`, in sorted
/// directory order.
fn read_first_with_ext(dir: &Path, ext: &str) -> Result<String, TemplateError> {
    let mut matches: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(ext))
                .unwrap_or(false)
        })
        .collect();
    matches.sort();

    match matches.first() {
        Some(path) => {
            debug!(path = %path.display(), "using template file");
            Ok(std::fs::read_to_string(path)?)
        }
        None => Err(TemplateError::MissingTemplate {
            ext: ext.to_string(),
            dir: dir.display().to_string(),
        }),
    }
}
