//! View components for the application.

mod attachments;
mod dialog;
mod form;

pub use attachments::view_attachments;
pub use dialog::view_dialog;
pub use form::{view_actions, view_message_section, view_server_section};
