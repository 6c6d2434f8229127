//! Attachment list.

use std::path::PathBuf;

use iced::widget::{button, column, container, row, scrollable, text, text_input};
use iced::{Element, Length};

use crate::message::Message;
use crate::style::{self, palette};

/// Renders the attached files with an input for adding one more.
pub fn view_attachments(attachments: &[PathBuf], path_input: &str) -> Element<'static, Message> {
    let p = palette::current();

    let entries = attachments
        .iter()
        .enumerate()
        .fold(column![].spacing(6), |col, (index, path)| {
            let name = text(path.display().to_string())
                .size(13)
                .color(p.text_primary)
                .width(Length::Fill);
            let remove = button(text("Remove").size(12))
                .padding([4, 10])
                .style(style::danger_button_style)
                .on_press(Message::RemoveAttachment(index));
            col.push(
                row![name, remove]
                    .spacing(8)
                    .align_y(iced::Alignment::Center),
            )
        });

    let list: Element<'static, Message> = if attachments.is_empty() {
        text("No attachments").size(13).color(p.text_muted).into()
    } else {
        scrollable(entries)
            .height(Length::Shrink)
            .style(style::scrollable_style)
            .into()
    };

    let path_field = text_input("/path/to/file", path_input)
        .on_input(Message::AttachmentPathChanged)
        .on_submit(Message::AddAttachment)
        .padding(10)
        .size(14)
        .style(style::field_input_style)
        .width(Length::Fill);

    let attach_btn = button(text("Attach").size(14))
        .padding([10, 20])
        .style(style::secondary_button_style)
        .on_press_maybe((!path_input.trim().is_empty()).then_some(Message::AddAttachment));

    container(
        column![
            text("Attachments").size(16).color(p.text_primary),
            list,
            row![path_field, attach_btn]
                .spacing(12)
                .align_y(iced::Alignment::Center),
        ]
        .spacing(12),
    )
    .padding(16)
    .width(Length::Fill)
    .style(style::card_style)
    .into()
}
