use iced::widget::{Button, Column, Container, PickList, Row, Slider, Space, Text, TextInput};
use iced::{Alignment, Color, Element, Font, Length};

use crate::client::config::BAUD_RATES;
use crate::client::gui::views::logger::logger_view;
use crate::client::gui::widgets::hold_button::hold_button;
use crate::client::input::HoldControl;
use crate::client::models::app_state::{ControlSession, LinkIndicator};
use crate::client::models::messages::Message;
use crate::common::models::DeviceAction;

const BG_MAIN: Color = Color::from_rgb(0.06, 0.07, 0.18); // Deep navy
const CARD_BG: Color = Color::from_rgb(0.18, 0.19, 0.36); // Muted indigo
const ONLINE: Color = Color::from_rgb(0.0, 0.7, 0.3);
const OFFLINE: Color = Color::from_rgb(0.85, 0.2, 0.2);
const TEXT_PRIMARY: Color = Color::WHITE;
const TEXT_SECONDARY: Color = Color::from_rgb(0.7, 0.7, 0.7);

const BOLD_FONT: Font = Font {
    family: iced::font::Family::SansSerif,
    weight: iced::font::Weight::Bold,
    ..Font::DEFAULT
};

fn bg_main_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(BG_MAIN)),
        text_color: Some(TEXT_PRIMARY),
        ..Default::default()
    }
}

fn card_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(CARD_BG)),
        text_color: Some(TEXT_PRIMARY),
        border: iced::Border {
            width: 0.0,
            color: Color::TRANSPARENT,
            radius: 16.0.into(),
        },
        shadow: iced::Shadow {
            offset: iced::Vector::new(0.0, 4.0),
            blur_radius: 12.0,
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
        },
    }
}

fn card<'a>(title: &'a str, body: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    Container::new(
        Column::new()
            .spacing(12)
            .push(Text::new(title).font(BOLD_FONT).size(18).style(TEXT_PRIMARY))
            .push(body),
    )
    .padding(18)
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(card_appearance)))
    .into()
}

fn readout<'a>(label: &'a str, value: String) -> Element<'a, Message> {
    Row::new()
        .spacing(8)
        .push(Text::new(label).size(14).style(TEXT_SECONDARY).width(Length::Fixed(110.0)))
        .push(Text::new(value).size(14).style(TEXT_PRIMARY))
        .into()
}

fn action_button(action: DeviceAction) -> Element<'static, Message> {
    Button::new(Text::new(action.label()).size(14))
        .style(if action == DeviceAction::Stop {
            iced::theme::Button::Destructive
        } else {
            iced::theme::Button::Secondary
        })
        .on_press(Message::ActionPressed(action))
        .padding([10, 16])
        .into()
}

fn header(session: &ControlSession) -> Element<'_, Message> {
    let indicator = session.indicator();
    let color = match indicator {
        LinkIndicator::Online => ONLINE,
        LinkIndicator::Offline => OFFLINE,
    };
    let channel = if session.is_socket_open() { "channel open" } else { "channel closed" };

    Row::new()
        .spacing(12)
        .align_items(Alignment::Center)
        .push(Text::new("Gimbal Control").font(BOLD_FONT).size(24).style(TEXT_PRIMARY))
        .push(Space::new(Length::Fill, Length::Fixed(0.0)))
        .push(Text::new(channel).size(13).style(TEXT_SECONDARY))
        .push(
            Container::new(Text::new(indicator.label()).size(14).style(Color::WHITE))
                .padding([6, 12])
                .style(iced::theme::Container::Custom(Box::new(move |_: &iced::Theme| {
                    iced::widget::container::Appearance {
                        background: Some(iced::Background::Color(color)),
                        border: iced::Border {
                            radius: 12.0.into(),
                            ..Default::default()
                        },
                        ..Default::default()
                    }
                }))),
        )
        .into()
}

fn connection_card(session: &ControlSession) -> Element<'_, Message> {
    let settings = &session.settings;
    let picked_port = session
        .port_options
        .iter()
        .find(|p| **p == settings.selected_port)
        .cloned();

    let form = Column::new()
        .spacing(10)
        .push(
            TextInput::new("Serial port (e.g. /dev/ttyUSB0)", &settings.selected_port)
                .on_input(Message::PortChanged)
                .on_submit(Message::ConnectPressed)
                .padding(10)
                .size(14),
        )
        .push(
            Row::new()
                .spacing(10)
                .align_items(Alignment::Center)
                .push(
                    PickList::new(session.port_options.as_slice(), picked_port, Message::PortPicked)
                        .placeholder("Detected ports")
                        .width(Length::Fill),
                )
                .push(
                    PickList::new(&BAUD_RATES[..], Some(settings.baud_rate), Message::BaudSelected)
                        .width(Length::Fixed(120.0)),
                ),
        )
        .push(
            Row::new()
                .spacing(10)
                .push(
                    Button::new(Text::new("Connect").font(BOLD_FONT).size(14))
                        .style(iced::theme::Button::Primary)
                        .on_press(Message::ConnectPressed)
                        .padding([10, 18]),
                )
                .push(
                    Button::new(Text::new("Disconnect").size(14))
                        .style(iced::theme::Button::Secondary)
                        .on_press(Message::DisconnectPressed)
                        .padding([10, 18]),
                ),
        );

    card("Device", form)
}

fn gimbal_card(session: &ControlSession) -> Element<'_, Message> {
    let pad = |control: HoldControl| hold_button(control, session.is_held(control), 64.0);
    let gap = || Space::new(Length::Fixed(64.0), Length::Fixed(48.0));

    let dpad = Column::new()
        .spacing(6)
        .align_items(Alignment::Center)
        .push(Row::new().spacing(6).push(gap()).push(pad(HoldControl::Up)).push(gap()))
        .push(
            Row::new()
                .spacing(6)
                .push(pad(HoldControl::Left))
                .push(gap())
                .push(pad(HoldControl::Right)),
        )
        .push(Row::new().spacing(6).push(gap()).push(pad(HoldControl::Down)).push(gap()));

    let speed = session.settings.speed_percent;
    let speed_row = Row::new()
        .spacing(10)
        .align_items(Alignment::Center)
        .push(Text::new("Speed").size(14).style(TEXT_SECONDARY))
        .push(Slider::new(0..=100u8, speed, Message::SpeedChanged).width(Length::Fill))
        .push(Text::new(format!("{}%", speed)).size(14).width(Length::Fixed(44.0)));

    let body = Column::new()
        .spacing(14)
        .push(dpad)
        .push(speed_row)
        .push(
            Row::new()
                .spacing(10)
                .push(action_button(DeviceAction::Center))
                .push(action_button(DeviceAction::Stop)),
        );

    card("Gimbal", body)
}

fn camera_card(session: &ControlSession) -> Element<'_, Message> {
    let body = Column::new()
        .spacing(12)
        .push(
            Row::new()
                .spacing(10)
                .push(hold_button(HoldControl::ZoomOut, session.is_held(HoldControl::ZoomOut), 96.0))
                .push(hold_button(HoldControl::ZoomIn, session.is_held(HoldControl::ZoomIn), 96.0)),
        )
        .push(
            Row::new()
                .spacing(10)
                .push(action_button(DeviceAction::Photo))
                .push(action_button(DeviceAction::Record)),
        );

    card("Camera", body)
}

fn status_card(session: &ControlSession) -> Element<'_, Message> {
    let state = session.connection();
    let angle = |v: Option<f64>| v.map(|d| format!("{:.1}°", d)).unwrap_or_else(|| "-".to_string());

    let body = Column::new()
        .spacing(6)
        .push(readout("Last ack", session.last_ack_label()))
        .push(readout("Errors", session.error_count().to_string()))
        .push(readout(
            "Retries",
            state.retries.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
        ))
        .push(readout(
            "Attitude",
            format!("Y {}  P {}  R {}", angle(state.yaw), angle(state.pitch), angle(state.roll)),
        ))
        .push(readout("Zoom", state.zoom_state.clone().unwrap_or_else(|| "-".to_string())))
        .push(readout("Recording", state.record_state.clone().unwrap_or_else(|| "-".to_string())));

    card("Status", body)
}

pub fn view(session: &ControlSession) -> Element<'_, Message> {
    let left = Column::new()
        .spacing(16)
        .width(Length::FillPortion(3))
        .push(connection_card(session))
        .push(gimbal_card(session))
        .push(camera_card(session));

    let log_header = Row::new()
        .align_items(Alignment::Center)
        .push(Text::new("Log").font(BOLD_FONT).size(18).style(TEXT_PRIMARY))
        .push(Space::new(Length::Fill, Length::Fixed(0.0)))
        .push(
            Button::new(Text::new("Clear").size(12))
                .style(iced::theme::Button::Text)
                .on_press(Message::ClearLog),
        );

    let right = Column::new()
        .spacing(16)
        .width(Length::FillPortion(2))
        .push(status_card(session))
        .push(log_header)
        .push(logger_view(&session.log));

    let content = Column::new()
        .spacing(20)
        .padding(24)
        .push(header(session))
        .push(Row::new().spacing(20).push(left).push(right).height(Length::Fill));

    Container::new(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(bg_main_appearance)))
        .into()
}
