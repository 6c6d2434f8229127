//! Container style functions.

use iced::widget::container;
use iced::{Background, Border};

use super::palette;
use super::shadows;
use super::shadows::radius;

/// Window background.
pub fn surface_style(_theme: &iced::Theme) -> container::Style {
    let p = palette::current();

    container::Style {
        background: Some(Background::Color(p.background)),
        ..Default::default()
    }
}

/// Form section card.
pub fn card_style(_theme: &iced::Theme) -> container::Style {
    let p = palette::current();

    container::Style {
        background: Some(Background::Color(p.surface)),
        border: Border {
            color: p.border_subtle,
            width: 1.0,
            radius: radius::MEDIUM.into(),
        },
        shadow: shadows::none(),
        ..Default::default()
    }
}

/// Dimmed backdrop behind the notification dialog.
pub fn dialog_backdrop_style(_theme: &iced::Theme) -> container::Style {
    let p = palette::current();

    container::Style {
        background: Some(Background::Color(p.scrim)),
        ..Default::default()
    }
}

/// Notification dialog card.
pub fn dialog_card_style(_theme: &iced::Theme) -> container::Style {
    let p = palette::current();

    container::Style {
        background: Some(Background::Color(p.surface)),
        border: Border {
            color: p.border_medium,
            width: 1.0,
            radius: radius::LARGE.into(),
        },
        shadow: shadows::card(),
        ..Default::default()
    }
}
