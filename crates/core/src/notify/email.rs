//! SMTP letter delivery via `lettre`.
//!
//! Each letter is a `multipart/alternative` message: plain text first, then
//! a `multipart/related` part carrying the HTML body and the inline festive
//! GIF referenced by Content-ID. Mail clients that prefer HTML render the
//! GIF; everything else falls back to the plain body.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::config::SmtpConfig;
use crate::errors::NotificationError;

/// A GIF embedded into the HTML part by Content-ID.
#[derive(Debug, Clone)]
pub struct InlineGif {
    pub content_id: String,
    pub bytes: Vec<u8>,
}

/// One rendered letter, ready to send.
#[derive(Debug, Clone)]
pub struct OutgoingLetter {
    pub to: String,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
    pub inline_gif: Option<InlineGif>,
}

/// SMTP mailer for the Secret Santa mailbox.
pub struct Mailer {
    host: String,
    port: u16,
    from: String,
    password: String,
}

impl Mailer {
    /// Create a mailer from the SMTP configuration and the resolved
    /// mailbox password. The sender address doubles as the SMTP username.
    pub fn new(config: &SmtpConfig, password: String) -> Self {
        info!(host = %config.host, port = config.port, from = %config.from, "initializing mailer");
        Self {
            host: config.host.clone(),
            port: config.port,
            from: config.from.clone(),
            password,
        }
    }

    /// Send one letter.
    pub async fn send(&self, letter: &OutgoingLetter) -> Result<(), NotificationError> {
        debug!(to = %letter.to, subject = %letter.subject, "sending letter");

        let message = self.build_message(letter)?;
        let transport = self.build_transport()?;

        match transport.send(message).await {
            Ok(_) => {
                info!(to = %letter.to, "letter sent");
                Ok(())
            }
            Err(e) => {
                warn!(to = %letter.to, error = %e, "failed to send letter");
                Err(NotificationError::EmailError(format!(
                    "SMTP send to '{}' failed: {}",
                    letter.to, e
                )))
            }
        }
    }

    /// Assemble the MIME message for a letter.
    fn build_message(&self, letter: &OutgoingLetter) -> Result<Message, NotificationError> {
        let from_mailbox: Mailbox =
            self.from
                .parse()
                .map_err(|e| NotificationError::InvalidMailbox {
                    address: self.from.clone(),
                    detail: format!("{}", e),
                })?;
        let to_mailbox: Mailbox =
            letter
                .to
                .parse()
                .map_err(|e| NotificationError::InvalidMailbox {
                    address: letter.to.clone(),
                    detail: format!("{}", e),
                })?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(letter.subject.clone());

        let result = match letter.inline_gif {
            Some(ref gif) => {
                let gif_type: ContentType = "image/gif".parse().map_err(|e| {
                    NotificationError::EmailError(format!("invalid GIF content type: {:?}", e))
                })?;
                let gif_part = Attachment::new_inline(gif.content_id.clone())
                    .body(Body::new(gif.bytes.clone()), gif_type);

                builder.multipart(
                    MultiPart::alternative()
                        .singlepart(SinglePart::plain(letter.plain_body.clone()))
                        .multipart(
                            MultiPart::related()
                                .singlepart(SinglePart::html(letter.html_body.clone()))
                                .singlepart(gif_part),
                        ),
                )
            }
            None => builder.multipart(MultiPart::alternative_plain_html(
                letter.plain_body.clone(),
                letter.html_body.clone(),
            )),
        };

        result.map_err(|e| NotificationError::EmailError(format!("failed to build email: {}", e)))
    }

    /// Build the STARTTLS transport with credentials.
    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let creds = Credentials::new(self.from.clone(), self.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| NotificationError::EmailError(format!("SMTP connection error: {}", e)))?
            .port(self.port)
            .credentials(creds)
            .build();

        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            from: "santa@example.com".into(),
            password_env: "UNUSED".into(),
            password: None,
        }
    }

    fn test_letter(with_gif: bool) -> OutgoingLetter {
        OutgoingLetter {
            to: "alice@example.com".into(),
            subject: "Secret Santa".into(),
            plain_body: "You drew Bob.".into(),
            html_body: "<p>You drew <b>Bob</b>.</p>".into(),
            inline_gif: with_gif.then(|| InlineGif {
                content_id: "gif123".into(),
                bytes: vec![0x47, 0x49, 0x46, 0x38],
            }),
        }
    }

    #[test]
    fn test_mailer_construction() {
        let mailer = Mailer::new(&test_config(), "hunter2".into());
        assert_eq!(mailer.from, "santa@example.com");
        assert_eq!(mailer.port, 587);
    }

    #[test]
    fn test_build_message_with_gif() {
        let mailer = Mailer::new(&test_config(), "hunter2".into());
        let message = mailer.build_message(&test_letter(true)).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("multipart/related"));
        assert!(raw.contains("gif123"));
    }

    #[test]
    fn test_build_message_without_gif() {
        let mailer = Mailer::new(&test_config(), "hunter2".into());
        let message = mailer.build_message(&test_letter(false)).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("multipart/alternative"));
        assert!(!raw.contains("multipart/related"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let mailer = Mailer::new(&test_config(), "hunter2".into());
        let mut letter = test_letter(false);
        letter.to = "not a mailbox".into();
        let err = mailer.build_message(&letter).unwrap_err();
        assert!(matches!(err, NotificationError::InvalidMailbox { .. }));
    }
}
