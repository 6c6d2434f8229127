//! `AnyMail` - send a test email through any SMTP server.
//!
//! Built with Rust and the iced GUI framework.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod message;
mod style;
mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use anymail_core::view_model::property;
use anymail_core::{
    LettreTransport, LogNotifier, MainViewModel, Notifier, SendRequest, SettingsFile,
    SmtpSettings, ValidationError, default_settings_path, parse_port,
};
use anymail_mvvm::{
    Bindable, CommandId, DispatchQueue, EventArgs, EventHandler, PropertyChangedEventArgs,
    QueuedDispatcher, WeakEventManager,
};
use iced::keyboard::{self, Key, Modifiers};
use iced::widget::{column, container, scrollable, text};
use iced::{Element, Length, Subscription, Task};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use message::{FormMessage, KeyboardAction, Message};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "anymail=debug,anymail_core=debug,anymail_mvvm=info";

/// How often the UI wakes up while a send is in flight.
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AnyMail");

    iced::application(AnyMail::new, AnyMail::update, AnyMail::view)
        .title("AnyMail")
        .subscription(AnyMail::subscription)
        .run()
        .map_err(|e| anyhow::anyhow!("AnyMail window failed: {e}"))
}

/// Main application state.
struct AnyMail {
    /// Form state and send command.
    vm: MainViewModel,
    /// Where the form is saved.
    settings_path: PathBuf,
    /// Port field text, kept separately so partial input survives.
    port_input: String,
    /// Attachment path field text.
    attachment_input: String,
    /// Notification waiting for the user to press OK.
    dialog: Option<String>,
    /// One-line status under the form.
    status: Option<String>,
    /// Last known availability of the send command.
    can_send: bool,
    /// Whether a send task is running.
    sending: bool,
    /// Notifications from the send command.
    notes: mpsc::UnboundedReceiver<String>,
    /// View-model events waiting for the UI loop.
    events: DispatchQueue,
    /// Set when the send command's availability may have changed.
    availability_stale: Arc<AtomicBool>,
    /// Set when a persisted field changes.
    form_dirty: Arc<AtomicBool>,
    /// Keeps the can-execute-changed subscription alive.
    _availability_handler: EventHandler<CommandId>,
}

impl AnyMail {
    /// Create new application instance.
    fn new() -> (Self, Task<Message>) {
        let (dispatcher, events) = QueuedDispatcher::new();
        let (notifier, notes) = ChannelNotifier::new();

        let vm = MainViewModel::with_parts(
            SettingsFile::default(),
            Arc::new(LettreTransport::new()),
            Arc::new(notifier),
            WeakEventManager::new(Arc::new(dispatcher)),
        );

        let availability_stale = Arc::new(AtomicBool::new(false));
        let stale = Arc::clone(&availability_stale);
        let availability_handler: EventHandler<CommandId> =
            Arc::new(move |_sender: &CommandId, _args: &EventArgs| {
                stale.store(true, Ordering::SeqCst);
            });
        vm.send_command()
            .subscribe_can_execute_changed(&availability_handler);

        let form_dirty = Arc::new(AtomicBool::new(false));
        let dirty = Arc::clone(&form_dirty);
        vm.property_changed()
            .subscribe(move |args: &PropertyChangedEventArgs| {
                if is_persisted(args.property_name()) {
                    dirty.store(true, Ordering::SeqCst);
                }
            });

        let settings_path = default_settings_path();
        let load = Task::perform(
            load_settings_file(settings_path.clone()),
            Message::SettingsLoaded,
        );

        let app = Self {
            port_input: vm.port().to_string(),
            can_send: vm.can_send(),
            vm,
            settings_path,
            attachment_input: String::new(),
            dialog: None,
            status: None,
            sending: false,
            notes,
            events,
            availability_stale,
            form_dirty,
            _availability_handler: availability_handler,
        };
        (app, load)
    }

    /// Update state based on message.
    #[allow(clippy::needless_pass_by_value)]
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::Form(form) => {
                self.apply_form(form);
                Task::none()
            }
            Message::AttachmentPathChanged(path) => {
                self.attachment_input = path;
                Task::none()
            }
            Message::AddAttachment => {
                self.add_attachment();
                Task::none()
            }
            Message::RemoveAttachment(index) => {
                if let Some(path) = self.vm.remove_attachment(index) {
                    tracing::debug!("Removed attachment {}", path.display());
                }
                Task::none()
            }
            Message::Send => self.send(),
            Message::SendFinished(ran) => {
                self.sending = false;
                self.status = None;
                if !ran {
                    tracing::debug!("Send command was not available");
                }
                Task::none()
            }
            Message::DismissDialog => {
                self.dialog = None;
                Task::none()
            }
            Message::SettingsLoaded(result) => {
                match result {
                    Ok(file) => {
                        self.vm.apply_settings_file(file);
                        self.port_input = self.vm.port().to_string();
                        self.form_dirty.store(false, Ordering::SeqCst);
                    }
                    Err(e) => {
                        tracing::warn!("Using default settings: {e}");
                        self.status = Some(e);
                    }
                }
                Task::none()
            }
            Message::SaveSettings => Task::perform(
                save_settings_file(self.settings_path.clone(), self.vm.settings_file()),
                Message::SettingsSaved,
            ),
            Message::SettingsSaved(result) => {
                match result {
                    Ok(()) => {
                        self.form_dirty.store(false, Ordering::SeqCst);
                        self.status = Some("Settings saved".to_string());
                    }
                    Err(e) => {
                        tracing::error!("{e}");
                        self.status = Some(e);
                    }
                }
                Task::none()
            }
            Message::KeyPressed(action) => self.handle_shortcut(action),
            Message::Tick | Message::Ignored => Task::none(),
        };

        self.sync_view_model();
        task
    }

    /// Runs queued view-model events and picks up notifications.
    fn sync_view_model(&mut self) {
        self.events.run_pending();

        if self.availability_stale.swap(false, Ordering::SeqCst) {
            self.can_send = self.vm.can_send();
        }

        while let Ok(note) = self.notes.try_recv() {
            self.dialog = Some(note);
        }
    }

    fn apply_form(&mut self, form: FormMessage) {
        match form {
            FormMessage::HostChanged(host) => self.vm.set_host(host),
            FormMessage::PortChanged(input) => {
                if let Ok(port) = parse_port(&input) {
                    self.vm.set_port(port);
                }
                self.port_input = input;
            }
            FormMessage::UserChanged(user) => self.vm.set_user(user),
            FormMessage::PasswordChanged(password) => self.vm.set_password(password),
            FormMessage::EnableSslToggled(enabled) => {
                // Follow the toggle only while the port is still the stock one.
                if self.vm.port() == SmtpSettings::suggested_port(!enabled) {
                    self.vm.set_port(SmtpSettings::suggested_port(enabled));
                    self.port_input = self.vm.port().to_string();
                }
                self.vm.set_enable_ssl(enabled);
            }
            FormMessage::DefaultCredentialsToggled(on) => self.vm.set_use_default_credentials(on),
            FormMessage::FromChanged(from) => self.vm.set_from(from),
            FormMessage::ToChanged(to) => self.vm.set_to(to),
            FormMessage::SubjectChanged(subject) => self.vm.set_subject(subject),
            FormMessage::BodyChanged(body) => self.vm.set_body(body),
        }
    }

    fn add_attachment(&mut self) {
        let path = PathBuf::from(self.attachment_input.trim());
        if !path.is_file() {
            self.status = Some(format!("File not found: {}", path.display()));
            return;
        }

        if self.vm.add_attachment(path) {
            self.attachment_input.clear();
            self.status = None;
        } else {
            self.status = Some("File is already attached".to_string());
        }
    }

    fn send(&mut self) -> Task<Message> {
        if self.sending || !self.can_send {
            return Task::none();
        }
        if !self.port_ready() {
            self.status = Some(ValidationError::InvalidPort.message());
            return Task::none();
        }
        self.sending = true;
        self.status = Some("Sending...".to_string());
        Task::perform(self.vm.send(), Message::SendFinished)
    }

    /// Whether the port field holds the port the view-model will use.
    fn port_ready(&self) -> bool {
        parse_port(&self.port_input).is_ok()
    }

    fn handle_shortcut(&mut self, action: KeyboardAction) -> Task<Message> {
        match action {
            KeyboardAction::Dismiss => {
                self.dialog = None;
                Task::none()
            }
            _ if self.dialog.is_some() => Task::none(),
            KeyboardAction::Send => self.send(),
            KeyboardAction::Save => self.update(Message::SaveSettings),
        }
    }

    /// Render current state as UI.
    fn view(&self) -> Element<'_, Message> {
        if let Some(note) = &self.dialog {
            return view::view_dialog(note);
        }

        let p = style::palette::current();
        let hints = form_hints(&self.port_input, &self.vm.send_request());
        let can_send = self.can_send && !self.sending && self.port_ready();

        let status = self.status.as_deref().or_else(|| {
            self.form_dirty
                .load(Ordering::SeqCst)
                .then_some("Unsaved changes")
        });

        let content = column![
            text("AnyMail").size(28).color(p.text_primary),
            view::view_server_section(&self.vm, &self.port_input),
            view::view_message_section(&self.vm),
            view::view_attachments(self.vm.attachments(), &self.attachment_input),
            view::view_actions(can_send, self.sending, &hints, status),
        ]
        .spacing(16)
        .padding(24)
        .width(Length::Fill);

        container(
            scrollable(content)
                .height(Length::Fill)
                .style(style::scrollable_style),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(style::surface_style)
        .into()
    }

    /// Keyboard shortcuts, plus a tick while a send is running.
    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::listen().map(|event| {
            if let keyboard::Event::KeyPressed { key, modifiers, .. } = event {
                handle_key_press(key, modifiers).unwrap_or(Message::Ignored)
            } else {
                Message::Ignored
            }
        });

        if self.sending {
            Subscription::batch([
                keys,
                iced::time::every(SEND_POLL_INTERVAL).map(|_| Message::Tick),
            ])
        } else {
            keys
        }
    }
}

/// Whether a change to `property_name` makes the saved settings stale.
fn is_persisted(property_name: &str) -> bool {
    !matches!(property_name, property::PASSWORD | property::ATTACHMENTS)
}

/// Problems to show under the form.
///
/// Address hints appear once the required fields are filled in. A port field
/// that does not parse is always reported, since the view-model keeps its
/// previous port meanwhile.
fn form_hints(port_input: &str, request: &SendRequest) -> Vec<ValidationError> {
    let mut hints = if request.is_complete() {
        request.validate().err().unwrap_or_default()
    } else {
        Vec::new()
    };
    if parse_port(port_input).is_err() && !hints.contains(&ValidationError::InvalidPort) {
        hints.insert(0, ValidationError::InvalidPort);
    }
    hints
}

/// Handle keyboard shortcuts and return appropriate message.
fn handle_key_press(key: Key, modifiers: Modifiers) -> Option<Message> {
    let ctrl = modifiers.command();

    match key {
        Key::Named(keyboard::key::Named::Enter) if ctrl => {
            Some(Message::KeyPressed(KeyboardAction::Send))
        }
        Key::Named(keyboard::key::Named::Escape) => {
            Some(Message::KeyPressed(KeyboardAction::Dismiss))
        }
        Key::Character(c) if ctrl && c.as_str() == "s" => {
            Some(Message::KeyPressed(KeyboardAction::Save))
        }
        _ => None,
    }
}

/// Forwards notifications to the UI loop.
struct ChannelNotifier {
    sender: mpsc::UnboundedSender<String>,
    fallback: LogNotifier,
}

impl ChannelNotifier {
    fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                fallback: LogNotifier,
            },
            receiver,
        )
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, text: &str) {
        if let Err(mpsc::error::SendError(text)) = self.sender.send(text.to_string()) {
            tracing::warn!("Window closed, logging notification instead");
            self.fallback.notify(&text);
        }
    }
}

/// Load the form from the settings file.
async fn load_settings_file(path: PathBuf) -> Result<SettingsFile, String> {
    anymail_core::load_settings(&path)
        .await
        .with_context(|| format!("Could not load settings from {}", path.display()))
        .map_err(|e| format!("{e:#}"))
}

/// Save the form to the settings file.
async fn save_settings_file(path: PathBuf, settings: SettingsFile) -> Result<(), String> {
    anymail_core::save_settings(&path, &settings)
        .await
        .with_context(|| format!("Could not save settings to {}", path.display()))
        .map_err(|e| format!("{e:#}"))
}
