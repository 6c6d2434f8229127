//! Email message types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::settings::SmtpSettings;

/// Characters that separate addresses in the To field.
pub const RECIPIENT_SEPARATORS: [char; 2] = [',', ';'];

/// The email being edited in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    /// One or more recipients separated by `,` or `;`.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// Files to attach.
    #[serde(skip)]
    pub attachments: Vec<PathBuf>,
}

impl EmailMessage {
    /// Creates a message with the form's starting values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the To field into individual addresses.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        parse_recipients(&self.to)
    }
}

impl Default for EmailMessage {
    fn default() -> Self {
        Self {
            to: String::new(),
            subject: "Test subject".to_string(),
            body: "Test body".to_string(),
            attachments: Vec::new(),
        }
    }
}

/// Splits a recipient list on `,` and `;`, trimming whitespace and dropping
/// empty entries.
#[must_use]
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(RECIPIENT_SEPARATORS)
        .map(str::trim)
        .filter(|recipient| !recipient.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// A fully resolved message handed to a [`MailTransport`](crate::MailTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Sender address.
    pub from: String,
    /// Resolved recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether `body` is HTML.
    pub is_html: bool,
    /// Files to attach.
    pub attachments: Vec<PathBuf>,
}

impl OutgoingMail {
    /// Resolves `message` against the sender configured in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if no sender is configured and
    /// [`Error::NoRecipients`] if the To field holds no address.
    pub fn compose(settings: &SmtpSettings, message: &EmailMessage) -> Result<Self> {
        let from = settings.from.trim();
        if from.is_empty() {
            return Err(Error::invalid_address(from, "sender address is empty"));
        }

        let to = message.recipients();
        if to.is_empty() {
            return Err(Error::NoRecipients);
        }

        Ok(Self {
            from: from.to_string(),
            to,
            subject: message.subject.clone(),
            body: message.body.clone(),
            is_html: true,
            attachments: message.attachments.clone(),
        })
    }
}
