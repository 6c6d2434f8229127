//! Button style functions.

use iced::widget::button;
use iced::{Background, Border, Color};

use super::palette;
use super::shadows;
use super::shadows::radius;

/// Send and OK buttons.
pub fn primary_button_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let p = palette::current();

    let base = button::Style {
        background: Some(Background::Color(p.primary)),
        text_color: p.text_on_primary,
        border: Border {
            color: p.primary_light,
            width: 1.0,
            radius: radius::MEDIUM.into(),
        },
        shadow: shadows::glow(p.primary),
        snap: false,
    };

    match status {
        button::Status::Active => base,
        button::Status::Hovered => button::Style {
            background: Some(Background::Color(p.primary_light)),
            ..base
        },
        button::Status::Pressed => button::Style {
            background: Some(Background::Color(p.primary_dark)),
            shadow: shadows::none(),
            ..base
        },
        button::Status::Disabled => button::Style {
            background: Some(Background::Color(p.text_muted)),
            text_color: p.surface,
            border: Border {
                color: p.text_muted,
                ..base.border
            },
            shadow: shadows::none(),
            ..base
        },
    }
}

/// Outlined button for secondary actions.
pub fn secondary_button_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let p = palette::current();

    let base = button::Style {
        background: Some(Background::Color(Color::TRANSPARENT)),
        text_color: p.text_primary,
        border: Border {
            color: p.border_medium,
            width: 1.0,
            radius: radius::LARGE.into(),
        },
        shadow: shadows::none(),
        snap: false,
    };

    match status {
        button::Status::Active => base,
        button::Status::Hovered => button::Style {
            background: Some(Background::Color(p.hover)),
            ..base
        },
        button::Status::Pressed => button::Style {
            background: Some(Background::Color(p.selected)),
            ..base
        },
        button::Status::Disabled => button::Style {
            text_color: p.text_muted,
            border: Border {
                color: p.border_subtle,
                ..base.border
            },
            ..base
        },
    }
}

/// Borderless red button for removing list entries.
pub fn danger_button_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let p = palette::current();

    let base = button::Style {
        background: Some(Background::Color(Color::TRANSPARENT)),
        text_color: p.accent_red,
        border: Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius: radius::SMALL.into(),
        },
        shadow: shadows::none(),
        snap: false,
    };

    match status {
        button::Status::Active | button::Status::Disabled => base,
        button::Status::Hovered | button::Status::Pressed => button::Style {
            background: Some(Background::Color(p.hover)),
            ..base
        },
    }
}
