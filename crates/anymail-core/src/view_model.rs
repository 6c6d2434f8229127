//! Main window view-model.
//!
//! [`MainViewModel`] holds the form state and exposes a send command. Views
//! read the getters, write through the setters and observe
//! [`Bindable::property_changed`] and the command's can-execute-changed
//! notification.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use anymail_mvvm::{Bindable, DelegateCommand, PropertyChanged, WeakEventManager};

use crate::error::root_message;
use crate::message::EmailMessage;
use crate::notify::Notifier;
use crate::service::{EmailService, MailTransport};
use crate::settings::{SettingsFile, SmtpSettings, ValidationResult, validate_request};

/// Notification shown after a successful send.
pub const SEND_OK: &str = "ok";

/// Property names raised by [`MainViewModel`].
pub mod property {
    /// SMTP host.
    pub const HOST: &str = "Host";
    /// SMTP port.
    pub const PORT: &str = "Port";
    /// Login user.
    pub const USER: &str = "User";
    /// Login password.
    pub const PASSWORD: &str = "Password";
    /// STARTTLS switch.
    pub const ENABLE_SSL: &str = "EnableSsl";
    /// Default credentials switch.
    pub const USE_DEFAULT_CREDENTIALS: &str = "UseDefaultCredentials";
    /// Sender address.
    pub const FROM: &str = "From";
    /// Recipient list.
    pub const TO: &str = "To";
    /// Subject line.
    pub const SUBJECT: &str = "Subject";
    /// HTML body.
    pub const BODY: &str = "Body";
    /// Attached files.
    pub const ATTACHMENTS: &str = "Attachments";
}

/// Snapshot of the form handed to the send command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    /// Connection settings.
    pub settings: SmtpSettings,
    /// Message to send.
    pub message: EmailMessage,
}

impl SendRequest {
    /// Returns true if host, sender and recipients are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.settings.host.trim().is_empty()
            && !self.settings.from.trim().is_empty()
            && !self.message.to.trim().is_empty()
    }

    /// Checks address shapes and required fields.
    ///
    /// # Errors
    ///
    /// Returns every problem found.
    pub fn validate(&self) -> ValidationResult {
        validate_request(&self.settings, &self.message)
    }
}

/// Command that sends a [`SendRequest`].
pub type SendCommand = DelegateCommand<Option<SendRequest>>;

/// View-model behind the main window.
pub struct MainViewModel {
    settings: SmtpSettings,
    message: EmailMessage,
    changed: PropertyChanged,
    send_command: Arc<SendCommand>,
    busy: Arc<AtomicBool>,
}

impl MainViewModel {
    /// Creates a view-model from saved form values.
    ///
    /// `events` delivers the send command's can-execute-changed
    /// notifications.
    #[must_use]
    pub fn with_parts(
        initial: SettingsFile,
        transport: Arc<dyn MailTransport>,
        notifier: Arc<dyn Notifier>,
        events: WeakEventManager,
    ) -> Self {
        let busy = Arc::new(AtomicBool::new(false));
        let send_command = build_send_command(transport, notifier, Arc::clone(&busy), events);

        Self {
            settings: initial.smtp,
            message: initial.message,
            changed: PropertyChanged::new(),
            send_command,
            busy,
        }
    }

    /// The send command.
    #[must_use]
    pub const fn send_command(&self) -> &Arc<SendCommand> {
        &self.send_command
    }

    /// Returns true while a send is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Snapshot of the current form.
    #[must_use]
    pub fn send_request(&self) -> SendRequest {
        SendRequest {
            settings: self.settings.clone(),
            message: self.message.clone(),
        }
    }

    /// Returns true if the send command accepts the current form.
    #[must_use]
    pub fn can_send(&self) -> bool {
        self.send_command.can_execute(&Some(self.send_request()))
    }

    /// Sends the current form if the command allows it.
    ///
    /// The returned future owns everything it needs, so it can be handed to
    /// a runtime. It resolves to whether the command ran.
    pub fn send(&self) -> impl Future<Output = bool> + Send + 'static {
        let command = Arc::clone(&self.send_command);
        let request = self.send_request();
        async move { command.try_execute(Some(request)).await }
    }

    /// Current form values in their persisted shape.
    #[must_use]
    pub fn settings_file(&self) -> SettingsFile {
        SettingsFile {
            smtp: self.settings.clone(),
            message: self.message.clone(),
        }
    }

    /// Replaces the form with `file`, raising a notification for every field
    /// that changes.
    pub fn apply_settings_file(&mut self, file: SettingsFile) {
        let SettingsFile { smtp, message } = file;

        self.set_host(smtp.host);
        self.set_port(smtp.port);
        self.set_user(smtp.user);
        self.set_password(smtp.password);
        self.set_enable_ssl(smtp.enable_ssl);
        self.set_use_default_credentials(smtp.use_default_credentials);
        self.set_from(smtp.from);
        self.set_to(message.to);
        self.set_subject(message.subject);
        self.set_body(message.body);
        self.set_attachments(message.attachments);
    }

    /// SMTP host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.settings.host
    }

    /// Sets the SMTP host.
    pub fn set_host(&mut self, value: impl Into<String>) {
        if self
            .changed
            .set(&mut self.settings.host, value.into(), property::HOST)
        {
            self.send_command.raise_can_execute_changed();
        }
    }

    /// SMTP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.settings.port
    }

    /// Sets the SMTP port.
    pub fn set_port(&mut self, value: u16) {
        self.changed
            .set(&mut self.settings.port, value, property::PORT);
    }

    /// Login user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.settings.user
    }

    /// Sets the login user.
    pub fn set_user(&mut self, value: impl Into<String>) {
        self.changed
            .set(&mut self.settings.user, value.into(), property::USER);
    }

    /// Login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.settings.password
    }

    /// Sets the login password.
    pub fn set_password(&mut self, value: impl Into<String>) {
        self.changed
            .set(&mut self.settings.password, value.into(), property::PASSWORD);
    }

    /// Whether the session is upgraded with STARTTLS.
    #[must_use]
    pub const fn enable_ssl(&self) -> bool {
        self.settings.enable_ssl
    }

    /// Sets the STARTTLS switch.
    pub fn set_enable_ssl(&mut self, value: bool) {
        self.changed
            .set(&mut self.settings.enable_ssl, value, property::ENABLE_SSL);
    }

    /// Whether login credentials are left out.
    #[must_use]
    pub const fn use_default_credentials(&self) -> bool {
        self.settings.use_default_credentials
    }

    /// Sets the default credentials switch.
    pub fn set_use_default_credentials(&mut self, value: bool) {
        self.changed.set(
            &mut self.settings.use_default_credentials,
            value,
            property::USE_DEFAULT_CREDENTIALS,
        );
    }

    /// Sender address.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.settings.from
    }

    /// Sets the sender address.
    pub fn set_from(&mut self, value: impl Into<String>) {
        if self
            .changed
            .set(&mut self.settings.from, value.into(), property::FROM)
        {
            self.send_command.raise_can_execute_changed();
        }
    }

    /// Recipient list as typed.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.message.to
    }

    /// Sets the recipient list.
    pub fn set_to(&mut self, value: impl Into<String>) {
        if self
            .changed
            .set(&mut self.message.to, value.into(), property::TO)
        {
            self.send_command.raise_can_execute_changed();
        }
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.message.subject
    }

    /// Sets the subject line.
    pub fn set_subject(&mut self, value: impl Into<String>) {
        self.changed
            .set(&mut self.message.subject, value.into(), property::SUBJECT);
    }

    /// HTML body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.message.body
    }

    /// Sets the HTML body.
    pub fn set_body(&mut self, value: impl Into<String>) {
        self.changed
            .set(&mut self.message.body, value.into(), property::BODY);
    }

    /// Attached files.
    #[must_use]
    pub fn attachments(&self) -> &[PathBuf] {
        &self.message.attachments
    }

    /// Replaces the attached files.
    pub fn set_attachments(&mut self, value: Vec<PathBuf>) {
        self.changed
            .set(&mut self.message.attachments, value, property::ATTACHMENTS);
    }

    /// Attaches `path` unless it is already attached.
    ///
    /// Returns whether the list changed.
    pub fn add_attachment(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.message.attachments.contains(&path) {
            return false;
        }
        tracing::debug!("Attaching {}", path.display());
        self.message.attachments.push(path);
        self.on_property_changed(property::ATTACHMENTS);
        true
    }

    /// Removes the attachment at `index`.
    pub fn remove_attachment(&mut self, index: usize) -> Option<PathBuf> {
        if index >= self.message.attachments.len() {
            return None;
        }
        let removed = self.message.attachments.remove(index);
        self.on_property_changed(property::ATTACHMENTS);
        Some(removed)
    }
}

impl Bindable for MainViewModel {
    fn property_changed(&self) -> &PropertyChanged {
        &self.changed
    }
}

impl std::fmt::Debug for MainViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainViewModel")
            .field("settings", &self.settings)
            .field("message", &self.message)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

fn build_send_command(
    transport: Arc<dyn MailTransport>,
    notifier: Arc<dyn Notifier>,
    busy: Arc<AtomicBool>,
    events: WeakEventManager,
) -> Arc<SendCommand> {
    Arc::new_cyclic(|command: &Weak<SendCommand>| {
        let command = command.clone();
        let available = Arc::clone(&busy);

        SendCommand::from_async_handler_with_can_execute(
            move |request: Option<SendRequest>| {
                run_send(
                    request,
                    Arc::clone(&transport),
                    Arc::clone(&notifier),
                    Arc::clone(&busy),
                    command.clone(),
                )
            },
            move |request: &Option<SendRequest>| {
                !available.load(Ordering::SeqCst)
                    && request.as_ref().is_some_and(SendRequest::is_complete)
            },
        )
        .named("send")
        .with_event_manager(events)
    })
}

async fn run_send(
    request: Option<SendRequest>,
    transport: Arc<dyn MailTransport>,
    notifier: Arc<dyn Notifier>,
    busy: Arc<AtomicBool>,
    command: Weak<SendCommand>,
) {
    let Some(SendRequest { settings, message }) = request else {
        tracing::debug!("Send invoked without a request");
        return;
    };

    busy.store(true, Ordering::SeqCst);
    raise_can_execute_changed(&command);

    let service = EmailService::new(settings, transport);
    let outcome = tokio::task::spawn_blocking(move || service.send(&message)).await;

    let text = match outcome {
        Ok(Ok(())) => SEND_OK.to_string(),
        Ok(Err(e)) => root_message(&e),
        Err(e) => {
            tracing::error!("Send task failed: {e}");
            e.to_string()
        }
    };
    notifier.notify(&text);

    busy.store(false, Ordering::SeqCst);
    raise_can_execute_changed(&command);
}

fn raise_can_execute_changed(command: &Weak<SendCommand>) {
    if let Some(command) = command.upgrade() {
        command.raise_can_execute_changed();
    }
}
