//! Services for sending email.
//!
//! This module bridges the view-model with the mail transport.

mod email;
mod transport;

pub use email::EmailService;
pub use transport::{ClientConfig, LettreTransport, MailTransport, Security, guess_content_type};
