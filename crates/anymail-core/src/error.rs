//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or sending an email.
#[derive(Debug, Error)]
pub enum Error {
    /// An address could not be parsed.
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress {
        /// The offending input.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The To field resolved to no recipients.
    #[error("No recipients specified")]
    NoRecipients,

    /// An attachment could not be read.
    #[error("Failed to read attachment {}", path.display())]
    Attachment {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The MIME message could not be assembled.
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP connection, authentication or delivery failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Delivery failed in a transport other than SMTP.
    #[error("{0}")]
    Transport(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an [`Error::InvalidAddress`].
    #[must_use]
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the message of the innermost cause of `error`.
///
/// This is the text shown to the user when a send fails: wrappers added on
/// the way up are stripped so the underlying reason is what they read.
#[must_use]
pub fn root_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
