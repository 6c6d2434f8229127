//! Settings file.
//!
//! The form is prefilled from `<config dir>/anymail/settings.json` when the
//! file exists. The password is never written to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::model::SmtpSettings;
use crate::error::{Error, Result};
use crate::message::EmailMessage;

/// Application directory name under the platform config dir.
const APP_DIR: &str = "anymail";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Persisted form defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    /// SMTP connection settings.
    pub smtp: SmtpSettings,
    /// Starting values of the message fields.
    pub message: EmailMessage,
}

/// Default location of the settings file.
#[must_use]
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE)
}

/// Load settings from `path`.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_settings(path: &Path) -> Result<SettingsFile> {
    if !tokio::fs::try_exists(path).await? {
        tracing::debug!("No settings file at {}", path.display());
        return Ok(SettingsFile::default());
    }

    let contents = tokio::fs::read_to_string(path).await?;
    let settings: SettingsFile = serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

    tracing::info!("Settings loaded from {}", path.display());
    Ok(settings)
}

/// Save settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn save_settings(path: &Path, settings: &SettingsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(path, contents).await?;

    tracing::info!("Settings saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("anymail-test-{}-{name}", std::process::id()))
            .join(SETTINGS_FILE)
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let path = scratch_path("missing");
        let settings = load_settings(&path).await.unwrap();
        assert_eq!(settings, SettingsFile::default());
    }

    #[tokio::test]
    async fn test_save_then_load_drops_password() {
        let path = scratch_path("roundtrip");
        let mut settings = SettingsFile::default();
        settings.smtp.host = "smtp.example.com".into();
        settings.smtp.port = 587;
        settings.smtp.enable_ssl = true;
        settings.smtp.password = "secret".into();
        settings.message.subject = "Weekly report".into();

        save_settings(&path, &settings).await.unwrap();
        let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
        let loaded = load_settings(&path).await.unwrap();

        assert!(!on_disk.contains("secret"));
        assert_eq!(loaded.smtp.host, "smtp.example.com");
        assert_eq!(loaded.smtp.port, 587);
        assert!(loaded.smtp.enable_ssl);
        assert!(loaded.smtp.password.is_empty());
        assert_eq!(loaded.message.subject, "Weekly report");

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_file_is_config_error() {
        let path = scratch_path("malformed");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = load_settings(&path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[test]
    fn test_file_layout_uses_smtp_and_message_keys() {
        let mut settings = SettingsFile::default();
        settings.message.to = "b@example.com".into();
        settings.message.attachments = vec![PathBuf::from("/tmp/report.pdf")];

        let value = serde_json::to_value(&settings).unwrap();

        assert!(value.get("smtp").is_some());
        assert_eq!(value["message"]["to"], "b@example.com");
        assert!(value["message"].get("attachments").is_none());
        assert!(value.get("message_defaults").is_none());
    }
}
