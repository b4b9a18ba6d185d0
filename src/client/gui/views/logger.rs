use iced::widget::{Column, Container, Row, Scrollable, Text};
use iced::{Color, Element, Font, Length};

use crate::client::models::event_log::{EventLog, LogEntry, LogLevel};
use crate::client::models::messages::Message;

pub fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Success => Color::from_rgb(0.2, 0.8, 0.4),
        LogLevel::Error => Color::from_rgb(1.0, 0.2, 0.2),
        LogLevel::Info => Color::from_rgb(0.2, 0.6, 1.0),
        LogLevel::Warning => Color::from_rgb(1.0, 0.8, 0.0),
    }
}

fn entry_row(entry: &LogEntry) -> Element<'_, Message> {
    Row::new()
        .spacing(8)
        .push(
            Text::new(format!("[{}]", entry.timestamp.format("%H:%M:%S")))
                .font(Font::MONOSPACE)
                .size(13)
                .style(Color::from_rgb(0.6, 0.6, 0.6)),
        )
        .push(
            Text::new(&entry.message)
                .font(Font::MONOSPACE)
                .size(13)
                .style(level_color(entry.level)),
        )
        .into()
}

/// Newest-first list of everything in the event log.
pub fn logger_view(log: &EventLog) -> Element<'_, Message> {
    let lines = log
        .iter()
        .fold(Column::new().spacing(4), |column, entry| column.push(entry_row(entry)));

    Container::new(Scrollable::new(lines).height(Length::Fill).width(Length::Fill))
        .padding(12)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(Color::from_rgb(0.04, 0.05, 0.12))),
                text_color: Some(Color::WHITE),
                border: iced::Border {
                    radius: 8.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })))
        .into()
}
