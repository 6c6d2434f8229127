//! Message types for application events.
//!
//! In the Elm architecture, Messages are events that trigger state changes.

use anymail_core::SettingsFile;

/// Application messages (events).
#[derive(Debug, Clone)]
pub enum Message {
    /// Form field edits.
    Form(FormMessage),

    // Attachments
    /// Attachment path input changed.
    AttachmentPathChanged(String),
    /// Attach the file named in the path input.
    AddAttachment,
    /// Remove the attachment at the given index.
    RemoveAttachment(usize),

    // Sending
    /// Run the send command.
    Send,
    /// Send command finished; `true` if it ran.
    SendFinished(bool),
    /// Close the notification dialog.
    DismissDialog,

    // Settings file
    /// Settings loaded from disk.
    SettingsLoaded(Result<SettingsFile, String>),
    /// Write the current form to the settings file.
    SaveSettings,
    /// Settings written.
    SettingsSaved(Result<(), String>),

    /// Periodic wake-up while a send is in flight.
    Tick,
    /// Keyboard shortcut pressed.
    KeyPressed(KeyboardAction),
    /// Event with no effect.
    Ignored,
}

/// Form field edits.
#[derive(Debug, Clone)]
pub enum FormMessage {
    /// SMTP host changed.
    HostChanged(String),
    /// SMTP port text changed.
    PortChanged(String),
    /// Login user changed.
    UserChanged(String),
    /// Login password changed.
    PasswordChanged(String),
    /// STARTTLS toggled.
    EnableSslToggled(bool),
    /// Default credentials toggled.
    DefaultCredentialsToggled(bool),
    /// Sender changed.
    FromChanged(String),
    /// Recipients changed.
    ToChanged(String),
    /// Subject changed.
    SubjectChanged(String),
    /// Body changed.
    BodyChanged(String),
}

/// Keyboard shortcut actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardAction {
    /// Send the form (Ctrl+Enter).
    Send,
    /// Close the dialog (Escape).
    Dismiss,
    /// Save settings (Ctrl+S).
    Save,
}
