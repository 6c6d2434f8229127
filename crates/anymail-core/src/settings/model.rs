//! Settings model types.

use serde::{Deserialize, Serialize};

/// Port used when none is configured.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// SMTP server connection settings.
///
/// The sender address lives here rather than on the message: it is tied to
/// the account the credentials belong to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Upgrade the connection with STARTTLS.
    pub enable_ssl: bool,
    /// Username for authentication.
    pub user: String,
    /// Password for authentication. Never written to the settings file.
    #[serde(skip_serializing)]
    pub password: String,
    /// Send without explicit credentials.
    pub use_default_credentials: bool,
    /// Sender address.
    pub from: String,
}

impl SmtpSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings for `host` on the default port.
    #[must_use]
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Returns the credentials to authenticate with, if any.
    ///
    /// None when default credentials are requested or no user is set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.use_default_credentials || self.user.trim().is_empty() {
            None
        } else {
            Some((self.user.trim(), &self.password))
        }
    }

    /// Suggested port for the current SSL setting.
    #[must_use]
    pub const fn suggested_port(enable_ssl: bool) -> u16 {
        if enable_ssl { 587 } else { DEFAULT_SMTP_PORT }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            enable_ssl: false,
            user: String::new(),
            password: String::new(),
            use_default_credentials: false,
            from: String::new(),
        }
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enable_ssl", &self.enable_ssl)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("use_default_credentials", &self.use_default_credentials)
            .field("from", &self.from)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SmtpSettings::new();
        assert_eq!(settings.port, 25);
        assert!(!settings.enable_ssl);
        assert!(!settings.use_default_credentials);
        assert!(settings.host.is_empty());
    }

    #[test]
    fn test_credentials() {
        let mut settings = SmtpSettings::with_host("smtp.example.com");
        assert_eq!(settings.credentials(), None);

        settings.user = "a@example.com".into();
        settings.password = "secret".into();
        assert_eq!(settings.credentials(), Some(("a@example.com", "secret")));

        settings.use_default_credentials = true;
        assert_eq!(settings.credentials(), None);
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = SmtpSettings {
            password: "secret".into(),
            ..SmtpSettings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_password_not_serialized() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            password: "secret".into(),
            ..SmtpSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));

        let restored: SmtpSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.host, "smtp.example.com");
        assert!(restored.password.is_empty());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let restored: SmtpSettings = serde_json::from_str(r#"{"host":"mail.local"}"#).unwrap();
        assert_eq!(restored.host, "mail.local");
        assert_eq!(restored.port, DEFAULT_SMTP_PORT);
    }
}
