//! Mail transports.
//!
//! [`MailTransport`] is the seam between the application and whatever
//! actually delivers the mail. [`LettreTransport`] delivers over SMTP.

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::{Error, Result};
use crate::message::OutgoingMail;
use crate::settings::SmtpSettings;

/// Delivers a resolved message using the given connection settings.
///
/// Implementations block until delivery finishes and return an error on any
/// connection, authentication or delivery failure.
pub trait MailTransport: Send + Sync {
    /// Delivers `mail` through the server described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is rejected or cannot be delivered.
    fn send(&self, settings: &SmtpSettings, mail: &OutgoingMail) -> Result<()>;
}

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain text for the whole session.
    #[default]
    None,
    /// Start in plain text, upgrade with STARTTLS.
    StartTls,
}

/// What the SMTP client will connect with, resolved from [`SmtpSettings`].
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server hostname, trimmed.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// User and password to authenticate with, if any.
    pub credentials: Option<(String, String)>,
}

impl ClientConfig {
    /// Resolves the client configuration for `settings`.
    #[must_use]
    pub fn from_settings(settings: &SmtpSettings) -> Self {
        Self {
            host: settings.host.trim().to_string(),
            port: settings.port,
            security: if settings.enable_ssl {
                Security::StartTls
            } else {
                Security::None
            },
            credentials: settings
                .credentials()
                .map(|(user, password)| (user.to_string(), password.to_string())),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .finish_non_exhaustive()
    }
}

/// SMTP delivery backed by `lettre`.
///
/// `enable_ssl` upgrades the connection with STARTTLS; otherwise the session
/// stays in plain text. Credentials are sent unless default credentials are
/// requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct LettreTransport;

impl LettreTransport {
    /// Creates the transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the SMTP client for `settings` without connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS parameters cannot be built for the host.
    pub fn build_client(settings: &SmtpSettings) -> Result<SmtpTransport> {
        Self::client_for(ClientConfig::from_settings(settings))
    }

    fn client_for(config: ClientConfig) -> Result<SmtpTransport> {
        let builder = match config.security {
            Security::StartTls => SmtpTransport::starttls_relay(&config.host)?,
            Security::None => SmtpTransport::builder_dangerous(&config.host),
        };
        let mut builder = builder.port(config.port);

        if let Some((user, password)) = config.credentials {
            builder = builder.credentials(Credentials::new(user, password));
        }

        Ok(builder.build())
    }

    /// Assembles the MIME message for `mail`.
    ///
    /// Attachments are read from disk here.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid, an attachment cannot be
    /// read, or the message cannot be built.
    pub fn build_message(mail: &OutgoingMail) -> Result<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&mail.from)?)
            .subject(mail.subject.as_str());

        for recipient in &mail.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let body = if mail.is_html {
            SinglePart::html(mail.body.clone())
        } else {
            SinglePart::plain(mail.body.clone())
        };

        if mail.attachments.is_empty() {
            return Ok(builder.singlepart(body)?);
        }

        let mut mixed = MultiPart::mixed().singlepart(body);
        for path in &mail.attachments {
            mixed = mixed.singlepart(attachment_part(path)?);
        }
        Ok(builder.multipart(mixed)?)
    }
}

impl MailTransport for LettreTransport {
    fn send(&self, settings: &SmtpSettings, mail: &OutgoingMail) -> Result<()> {
        let message = Self::build_message(mail)?;
        let client = Self::build_client(settings)?;

        tracing::debug!(
            host = %settings.host,
            port = settings.port,
            starttls = settings.enable_ssl,
            "Connecting to SMTP server"
        );
        let response = client.send(&message)?;
        tracing::debug!(code = %response.code(), "SMTP server accepted message");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| Error::invalid_address(address, e.to_string()))
}

fn attachment_part(path: &Path) -> Result<SinglePart> {
    let bytes = std::fs::read(path).map_err(|source| Error::Attachment {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned());

    let mime = guess_content_type(path);
    let content_type = ContentType::parse(mime)
        .map_err(|e| Error::Transport(format!("Invalid content type {mime}: {e}")))?;

    Ok(Attachment::new(filename).body(bytes, content_type))
}

/// Guesses a MIME type from the file extension.
#[must_use]
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("htm" | "html") => "text/html",
        Some("csv") => "text/csv",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            from: "a@example.com".into(),
            to: vec!["b@example.com".into(), "c@example.com".into()],
            subject: "Hi".into(),
            body: "<b>hi</b>".into(),
            is_html: true,
            attachments: Vec::new(),
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_html_message_headers() {
        let message = LettreTransport::build_message(&mail()).unwrap();
        let raw = formatted(&message);

        assert!(raw.contains("From: a@example.com"));
        assert!(raw.contains("To: b@example.com, c@example.com"));
        assert!(raw.contains("Subject: Hi"));
        assert!(raw.contains("text/html"));
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn test_plain_message() {
        let mut plain = mail();
        plain.is_html = false;
        let raw = formatted(&LettreTransport::build_message(&plain).unwrap());
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut bad = mail();
        bad.to = vec!["not an address".into()];
        let err = LettreTransport::build_message(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { ref address, .. } if address == "not an address"));
    }

    #[test]
    fn test_missing_attachment() {
        let mut with_file = mail();
        with_file.attachments = vec![PathBuf::from("/nonexistent/anymail/report.pdf")];
        let err = LettreTransport::build_message(&with_file).unwrap_err();
        assert!(matches!(err, Error::Attachment { .. }));
    }

    #[test]
    fn test_attachment_becomes_multipart() {
        let dir = std::env::temp_dir().join(format!("anymail-attach-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notes.txt");
        std::fs::write(&path, "meeting at noon").unwrap();

        let mut with_file = mail();
        with_file.attachments = vec![path];
        let raw = formatted(&LettreTransport::build_message(&with_file).unwrap());

        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("filename=\"notes.txt\""));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.PDF")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("archive")), "application/octet-stream");
    }

    #[test]
    fn test_plain_client_builds_offline() {
        let settings = SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            user: "a@example.com".into(),
            password: "secret".into(),
            ..SmtpSettings::default()
        };
        let config = ClientConfig::from_settings(&settings);

        assert_eq!(config.security, Security::None);
        assert_eq!(config.port, 2525);
        assert_eq!(
            config.credentials,
            Some(("a@example.com".to_string(), "secret".to_string()))
        );
        assert!(LettreTransport::build_client(&settings).is_ok());
    }

    #[test]
    fn test_enable_ssl_uses_starttls() {
        let settings = SmtpSettings {
            host: "  smtp.example.com ".into(),
            port: 587,
            enable_ssl: true,
            user: "a@example.com".into(),
            password: "secret".into(),
            ..SmtpSettings::default()
        };
        let config = ClientConfig::from_settings(&settings);

        assert_eq!(config.security, Security::StartTls);
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 587);
        assert!(config.credentials.is_some());
        assert!(LettreTransport::build_client(&settings).is_ok());
    }

    #[test]
    fn test_default_credentials_send_no_login() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 465,
            enable_ssl: true,
            user: "a@example.com".into(),
            password: "secret".into(),
            use_default_credentials: true,
            ..SmtpSettings::default()
        };
        let config = ClientConfig::from_settings(&settings);

        assert_eq!(config.credentials, None);
        assert_eq!(config.port, 465);
        assert!(LettreTransport::build_client(&settings).is_ok());
    }

    #[test]
    fn test_client_config_debug_hides_password() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            user: "a@example.com".into(),
            password: "secret".into(),
            ..SmtpSettings::default()
        };
        let debug = format!("{:?}", ClientConfig::from_settings(&settings));

        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("secret"));
    }
}
