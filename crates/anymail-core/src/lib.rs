//! # anymail-core
//!
//! Application logic for the `AnyMail` test-mail sender.
//!
//! This crate provides:
//! - SMTP settings, the settings file and form validation
//! - The email message model and recipient parsing
//! - The mail sending service and its `lettre` transport
//! - The main window view-model and its send command

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod message;
pub mod notify;
pub mod service;
pub mod settings;
pub mod view_model;

pub use error::{Error, Result, root_message};
pub use message::{EmailMessage, OutgoingMail, parse_recipients};
pub use notify::{LogNotifier, Notifier};
pub use service::{
    ClientConfig, EmailService, LettreTransport, MailTransport, Security, guess_content_type,
};
pub use settings::{
    DEFAULT_SMTP_PORT, SettingsFile, SmtpSettings, ValidationError, ValidationResult,
    default_settings_path, is_valid_email, load_settings, parse_port, save_settings,
    validate_request,
};
pub use view_model::{MainViewModel, SEND_OK, SendCommand, SendRequest};
