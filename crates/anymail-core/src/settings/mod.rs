//! SMTP connection settings.
//!
//! Provides the settings model, form validation, and the optional settings
//! file the form is prefilled from.

mod file;
mod model;
mod validation;

pub use file::{SettingsFile, default_settings_path, load_settings, save_settings};
pub use model::{DEFAULT_SMTP_PORT, SmtpSettings};
pub use validation::{
    ValidationError, ValidationResult, is_valid_email, parse_port, validate_request,
};
