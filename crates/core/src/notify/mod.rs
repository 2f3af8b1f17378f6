//! Notification dispatch: one letter per giver.
//!
//! The [`Dispatcher`] facade renders a letter for every assignment and
//! hands it to the SMTP [`Mailer`](email::Mailer). Assignments are
//! processed in giver-name order, which carries no information about how
//! the random pairing was constructed. Any delivery failure aborts the
//! whole run.

pub mod email;
pub mod template;

use tracing::{debug, info};

use crate::errors::NotificationError;
use crate::giphy::GiphyClient;
use crate::pairing::Pairing;
use crate::roster::Roster;

use email::{InlineGif, Mailer, OutgoingLetter};
use template::TemplateSet;

/// Outcome of a completed dispatch run.
#[derive(Debug, Clone, Copy)]
pub struct DispatchReport {
    pub sent: usize,
}

/// Renders and sends one letter per pairing entry.
pub struct Dispatcher {
    mailer: Mailer,
    templates: TemplateSet,
    giphy: Option<GiphyClient>,
}

impl Dispatcher {
    /// Create a dispatcher. Pass a [`GiphyClient`] to embed a random
    /// festive GIF into each letter; without one, letters go out as plain
    /// text plus HTML only.
    pub fn new(mailer: Mailer, templates: TemplateSet, giphy: Option<GiphyClient>) -> Self {
        Self {
            mailer,
            templates,
            giphy,
        }
    }

    /// Render the letter for a single assignment. Fetches a fresh GIF per
    /// letter when a GIPHY client is configured.
    pub async fn render_letter(
        &self,
        giver: &str,
        giver_email: &str,
        receiver: &str,
    ) -> Result<OutgoingLetter, NotificationError> {
        let gif = match self.giphy {
            Some(ref client) => Some(client.fetch_random().await?),
            None => None,
        };

        let (link, id) = match gif {
            Some(ref g) => (g.url.as_str(), g.id.as_str()),
            None => ("", ""),
        };

        debug!(giver, receiver, has_gif = gif.is_some(), "rendering letter");

        Ok(OutgoingLetter {
            to: giver_email.to_string(),
            subject: self.templates.subject().to_string(),
            plain_body: self.templates.render_plain(giver, receiver, link),
            html_body: self.templates.render_html(giver, receiver, link, id),
            inline_gif: gif.map(|g| InlineGif {
                content_id: g.id,
                bytes: g.bytes,
            }),
        })
    }

    /// Render and send the letter for a single assignment.
    pub async fn send_assignment(
        &self,
        giver: &str,
        giver_email: &str,
        receiver: &str,
    ) -> Result<(), NotificationError> {
        let letter = self.render_letter(giver, giver_email, receiver).await?;
        self.mailer.send(&letter).await
    }

    /// Send every assignment in the pairing. Fails fast on the first
    /// delivery error; nothing is retried.
    pub async fn dispatch(
        &self,
        roster: &Roster,
        pairing: &Pairing,
    ) -> Result<DispatchReport, NotificationError> {
        for (giver, receiver) in pairing.assignments() {
            let giver_email = roster.email_of(giver).ok_or_else(|| {
                NotificationError::EmailError(format!("no email address on roster for '{giver}'"))
            })?;
            self.send_assignment(giver, giver_email, receiver).await?;
        }

        info!(sent = pairing.len(), "all letters dispatched");
        Ok(DispatchReport {
            sent: pairing.len(),
        })
    }
}
