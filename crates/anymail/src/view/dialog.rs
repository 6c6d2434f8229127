//! Notification dialog.

use iced::widget::{button, column, container, text};
use iced::{Element, Length};

use crate::message::Message;
use crate::style::{self, palette};

/// Renders `note` in a centered card with an OK button.
pub fn view_dialog(note: &str) -> Element<'static, Message> {
    let p = palette::current();

    let ok = button(text("OK").size(14))
        .padding([8, 28])
        .style(style::primary_button_style)
        .on_press(Message::DismissDialog);

    let card = container(
        column![text(note.to_string()).size(15).color(p.text_primary), ok]
            .spacing(20)
            .align_x(iced::Alignment::Center),
    )
    .padding(24)
    .max_width(480)
    .style(style::dialog_card_style);

    container(card)
        .center(Length::Fill)
        .style(style::dialog_backdrop_style)
        .into()
}
