//! Email sending service.

use std::sync::Arc;

use super::transport::MailTransport;
use crate::error::Result;
use crate::message::{EmailMessage, OutgoingMail};
use crate::settings::SmtpSettings;

/// Sends messages with a fixed set of connection settings.
#[derive(Clone)]
pub struct EmailService {
    settings: SmtpSettings,
    transport: Arc<dyn MailTransport>,
}

impl EmailService {
    /// Creates a service delivering through `transport`.
    #[must_use]
    pub fn new(settings: SmtpSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Send `message` and block until the transport finishes.
    ///
    /// There is no retry: the first failure is returned as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be resolved or delivered.
    pub fn send(&self, message: &EmailMessage) -> Result<()> {
        let mail = OutgoingMail::compose(&self.settings, message)?;

        tracing::info!(
            host = %self.settings.host,
            recipients = mail.to.len(),
            attachments = mail.attachments.len(),
            "Sending email"
        );

        match self.transport.send(&self.settings, &mail) {
            Ok(()) => {
                tracing::info!("Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Email send failed: {e}");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(SmtpSettings, OutgoingMail)>>,
    }

    impl MailTransport for RecordingTransport {
        fn send(&self, settings: &SmtpSettings, mail: &OutgoingMail) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((settings.clone(), mail.clone()));
            Ok(())
        }
    }

    struct FailingTransport;

    impl MailTransport for FailingTransport {
        fn send(&self, _settings: &SmtpSettings, _mail: &OutgoingMail) -> Result<()> {
            Err(Error::Transport("Auth failed".into()))
        }
    }

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            enable_ssl: true,
            user: "a@example.com".into(),
            password: "secret".into(),
            use_default_credentials: false,
            from: "a@example.com".into(),
        }
    }

    #[test]
    fn test_send_hands_resolved_mail_to_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let service = EmailService::new(settings(), transport.clone());
        let message = EmailMessage {
            to: "b@example.com,c@example.com".into(),
            subject: "Hi".into(),
            body: "<b>hi</b>".into(),
            attachments: Vec::new(),
        };

        service.send(&message).unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (used_settings, mail) = &sent[0];
        assert_eq!(used_settings.port, 587);
        assert!(used_settings.enable_ssl);
        assert_eq!(mail.to, vec!["b@example.com", "c@example.com"]);
        assert!(mail.is_html);
        assert_eq!(mail.body, "<b>hi</b>");
    }

    #[test]
    fn test_send_propagates_transport_error() {
        let service = EmailService::new(settings(), Arc::new(FailingTransport));
        let message = EmailMessage {
            to: "b@example.com".into(),
            ..EmailMessage::default()
        };

        let err = service.send(&message).unwrap_err();
        assert_eq!(err.to_string(), "Auth failed");
    }

    #[test]
    fn test_send_without_recipients_skips_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let service = EmailService::new(settings(), transport.clone());

        let err = service.send(&EmailMessage::default()).unwrap_err();

        assert!(matches!(err, Error::NoRecipients));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
