//! Server settings, message fields and the action row.

use anymail_core::{MainViewModel, ValidationError};
use iced::widget::{Space, button, column, container, row, text, text_input, toggler};
use iced::{Element, Length};

use crate::message::{FormMessage, Message};
use crate::style::{self, palette};

const LABEL_WIDTH: f32 = 110.0;

/// Renders the SMTP server card.
pub fn view_server_section(vm: &MainViewModel, port_input: &str) -> Element<'static, Message> {
    let host = field_row("Server:", vm.host(), "smtp.example.com", |s| {
        Message::Form(FormMessage::HostChanged(s))
    });
    let port = field_row("Port:", port_input, "25", |s| {
        Message::Form(FormMessage::PortChanged(s))
    });
    let user = field_row("User:", vm.user(), "user@example.com", |s| {
        Message::Form(FormMessage::UserChanged(s))
    });

    let password_input = text_input("Password", vm.password())
        .secure(true)
        .on_input(|s| Message::Form(FormMessage::PasswordChanged(s)))
        .padding(10)
        .size(14)
        .style(style::field_input_style)
        .width(Length::Fill);
    let password = labeled("Password:", password_input.into());

    let switches = row![
        toggler(vm.enable_ssl())
            .label("Use STARTTLS")
            .on_toggle(|on| Message::Form(FormMessage::EnableSslToggled(on)))
            .text_size(14)
            .width(Length::Shrink),
        toggler(vm.use_default_credentials())
            .label("Send without login")
            .on_toggle(|on| Message::Form(FormMessage::DefaultCredentialsToggled(on)))
            .text_size(14)
            .width(Length::Shrink),
    ]
    .spacing(24);

    card("SMTP server", column![host, port, user, password, switches].spacing(10))
}

/// Renders the sender, recipients, subject and body card.
pub fn view_message_section(vm: &MainViewModel) -> Element<'static, Message> {
    let from = field_row("From:", vm.from(), "sender@example.com", |s| {
        Message::Form(FormMessage::FromChanged(s))
    });
    let to = field_row("To:", vm.to(), "one@example.com, two@example.com", |s| {
        Message::Form(FormMessage::ToChanged(s))
    });
    let subject = field_row("Subject:", vm.subject(), "Subject", |s| {
        Message::Form(FormMessage::SubjectChanged(s))
    });
    let body = field_row("Body (HTML):", vm.body(), "<p>Hello</p>", |s| {
        Message::Form(FormMessage::BodyChanged(s))
    });

    card("Message", column![from, to, subject, body].spacing(10))
}

/// Renders validation hints, status line and the Send / Save buttons.
pub fn view_actions(
    can_send: bool,
    busy: bool,
    hints: &[ValidationError],
    status: Option<&str>,
) -> Element<'static, Message> {
    let p = palette::current();

    let hint_lines = hints.iter().fold(column![].spacing(4), |col, hint| {
        col.push(text(hint.message()).size(13).color(p.accent_red))
    });

    let status_line: Element<'static, Message> = status.map_or_else(
        || Space::new().height(Length::Fixed(16.0)).into(),
        |s| text(s.to_string()).size(13).color(p.text_secondary).into(),
    );

    let send_label = if busy { "Sending..." } else { "Send" };
    let send_btn = button(text(send_label).size(14))
        .padding([10, 24])
        .style(style::primary_button_style)
        .on_press_maybe(can_send.then_some(Message::Send));

    let save_btn = button(text("Save settings").size(14))
        .padding([10, 20])
        .style(style::secondary_button_style)
        .on_press(Message::SaveSettings);

    column![hint_lines, status_line, row![send_btn, save_btn].spacing(12)]
        .spacing(12)
        .into()
}

fn card<'a>(
    title: &str,
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    let p = palette::current();

    container(
        column![
            text(title.to_string()).size(16).color(p.text_primary),
            content.into()
        ]
        .spacing(12),
    )
    .padding(16)
    .width(Length::Fill)
    .style(style::card_style)
    .into()
}

fn labeled(label: &str, input: Element<'static, Message>) -> Element<'static, Message> {
    let p = palette::current();
    let label_text = text(label.to_string())
        .size(14)
        .color(p.text_secondary)
        .width(Length::Fixed(LABEL_WIDTH));

    row![label_text, input]
        .spacing(12)
        .align_y(iced::Alignment::Center)
        .into()
}

fn field_row(
    label: &str,
    value: &str,
    placeholder: &str,
    on_change: impl Fn(String) -> Message + 'static,
) -> Element<'static, Message> {
    let input = text_input(placeholder, value)
        .on_input(on_change)
        .padding(10)
        .size(14)
        .style(style::field_input_style)
        .width(Length::Fill);

    labeled(label, input.into())
}
