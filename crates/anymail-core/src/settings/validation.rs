//! Form validation.

use super::model::SmtpSettings;
use crate::message::{EmailMessage, parse_recipients};

/// A problem that keeps the form from being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// SMTP host is empty.
    EmptyHost,
    /// SMTP port is zero.
    InvalidPort,
    /// Sender address is empty.
    EmptyFrom,
    /// Sender address format is invalid.
    InvalidFrom,
    /// No recipient given.
    EmptyTo,
    /// A recipient address format is invalid.
    InvalidRecipient(String),
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::EmptyHost => "SMTP server is required".to_string(),
            Self::InvalidPort => "SMTP port must be 1-65535".to_string(),
            Self::EmptyFrom => "Sender address is required".to_string(),
            Self::InvalidFrom => "Invalid sender address format".to_string(),
            Self::EmptyTo => "Please enter at least one recipient".to_string(),
            Self::InvalidRecipient(address) => format!("Invalid email address: {address}"),
        }
    }

    /// Get the form field this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost => "Host",
            Self::InvalidPort => "Port",
            Self::EmptyFrom | Self::InvalidFrom => "From",
            Self::EmptyTo | Self::InvalidRecipient(_) => "To",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating the form.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate settings and message together.
///
/// Only presence and basic address shape are checked; the server has the
/// final word on everything else.
///
/// # Errors
///
/// Returns every `ValidationError` found.
pub fn validate_request(settings: &SmtpSettings, message: &EmailMessage) -> ValidationResult {
    let mut errors = Vec::new();

    if settings.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if settings.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    if settings.from.trim().is_empty() {
        errors.push(ValidationError::EmptyFrom);
    } else if !is_valid_email(&settings.from) {
        errors.push(ValidationError::InvalidFrom);
    }

    let recipients = parse_recipients(&message.to);
    if recipients.is_empty() {
        errors.push(ValidationError::EmptyTo);
    }
    for recipient in recipients {
        if !is_valid_email(&recipient) {
            errors.push(ValidationError::InvalidRecipient(recipient));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parses port field text.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPort`] unless the text is a number
/// from 1 to 65535.
pub fn parse_port(input: &str) -> Result<u16, ValidationError> {
    match input.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ValidationError::InvalidPort),
    }
}

/// Basic email validation.
///
/// Accepts `local@domain.tld`, optionally wrapped as `Name <local@domain.tld>`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let email = match (email.rfind('<'), email.strip_suffix('>')) {
        (Some(start), Some(inner)) => &inner[start + 1..],
        _ => email,
    };

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || local.contains(char::is_whitespace) {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@sub.example.com"));
        assert!(is_valid_email(" user@example.com "));
        assert!(is_valid_email("User Name <user@example.com>"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("first last@example.com"));
    }

    #[test]
    fn test_validate_empty_form() {
        let errors =
            validate_request(&SmtpSettings::default(), &EmailMessage::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyHost));
        assert!(errors.contains(&ValidationError::EmptyFrom));
        assert!(errors.contains(&ValidationError::EmptyTo));
        assert!(!errors.contains(&ValidationError::InvalidPort));
    }

    #[test]
    fn test_validate_complete_form() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            from: "a@example.com".into(),
            ..SmtpSettings::default()
        };
        let message = EmailMessage {
            to: "b@example.com; c@example.com".into(),
            ..EmailMessage::default()
        };
        assert!(validate_request(&settings, &message).is_ok());
    }

    #[test]
    fn test_validate_reports_bad_recipient() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            from: "a@example.com".into(),
            ..SmtpSettings::default()
        };
        let message = EmailMessage {
            to: "b@example.com, nobody".into(),
            ..EmailMessage::default()
        };
        let errors = validate_request(&settings, &message).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidRecipient("nobody".into())]);
        assert_eq!(errors[0].field(), "To");
        assert_eq!(errors[0].to_string(), "Invalid email address: nobody");
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(" 587 "), Ok(587));
        assert_eq!(parse_port("65535"), Ok(65535));
        assert_eq!(parse_port(""), Err(ValidationError::InvalidPort));
        assert_eq!(parse_port("0"), Err(ValidationError::InvalidPort));
        assert_eq!(parse_port("65536"), Err(ValidationError::InvalidPort));
        assert_eq!(parse_port("smtp"), Err(ValidationError::InvalidPort));
    }
}
