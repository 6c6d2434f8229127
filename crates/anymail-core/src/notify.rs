//! User-facing notifications.

/// Shows a short message to the user and waits for acknowledgement.
pub trait Notifier: Send + Sync {
    /// Displays `text`.
    fn notify(&self, text: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, text: &str) {
        self(text);
    }
}

/// Writes notifications to the log instead of showing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str) {
        tracing::info!(notification = text, "User notification");
    }
}
