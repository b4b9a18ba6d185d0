use iced::advanced::layout::{self, Layout};
use iced::advanced::renderer;
use iced::advanced::widget::{tree, Tree, Widget};
use iced::advanced::{Clipboard, Shell};
use iced::widget::{Container, Text};
use iced::{event, mouse, touch, Color, Element, Event, Length, Rectangle, Size};

use crate::client::input::HoldControl;
use crate::client::models::messages::Message;

const FACE_IDLE: Color = Color::from_rgb(0.24, 0.26, 0.45);
const FACE_ACTIVE: Color = Color::from_rgb(0.0, 0.7, 0.3);

fn face_appearance(active: bool) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(if active { FACE_ACTIVE } else { FACE_IDLE })),
        text_color: Some(Color::WHITE),
        border: iced::Border {
            width: 1.0,
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.15),
            radius: 10.0.into(),
        },
        shadow: iced::Shadow {
            offset: iced::Vector::new(0.0, if active { 1.0 } else { 3.0 }),
            blur_radius: 6.0,
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
        },
    }
}

/// Button that reports press and release separately. Touch presses are
/// captured, so they never turn into scroll gestures.
pub fn hold_button<'a>(control: HoldControl, active: bool, width: f32) -> Element<'a, Message> {
    let face = Container::new(Text::new(control.label()).size(18))
        .width(Length::Fixed(width))
        .height(Length::Fixed(48.0))
        .center_x()
        .center_y()
        .style(iced::theme::Container::Custom(Box::new(move |_: &iced::Theme| {
            face_appearance(active)
        })));

    HoldArea::new(face, Message::HoldPressed(control), Message::HoldReleased(control)).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Engage,
    Release,
}

/// Maps a raw event onto the hold state machine of a single area.
/// Leaving the area while held counts as a release.
fn gesture(held: bool, event: &Event, bounds: Rectangle, cursor: mouse::Cursor) -> Option<Gesture> {
    match event {
        Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left))
            if !held && cursor.is_over(bounds) =>
        {
            Some(Gesture::Engage)
        }
        Event::Touch(touch::Event::FingerPressed { position, .. })
            if !held && bounds.contains(*position) =>
        {
            Some(Gesture::Engage)
        }
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
        | Event::Mouse(mouse::Event::CursorLeft)
        | Event::Touch(touch::Event::FingerLifted { .. })
        | Event::Touch(touch::Event::FingerLost { .. })
            if held =>
        {
            Some(Gesture::Release)
        }
        Event::Mouse(mouse::Event::CursorMoved { position })
        | Event::Touch(touch::Event::FingerMoved { position, .. })
            if held && !bounds.contains(*position) =>
        {
            Some(Gesture::Release)
        }
        _ => None,
    }
}

#[derive(Debug, Default)]
struct HoldState {
    held: bool,
}

/// Wraps any content and publishes `on_press` when it is pressed and
/// `on_release` when the press ends or the pointer leaves it.
pub struct HoldArea<'a, Message, Theme = iced::Theme, Renderer = iced::Renderer> {
    content: Element<'a, Message, Theme, Renderer>,
    on_press: Message,
    on_release: Message,
}

impl<'a, Message, Theme, Renderer> HoldArea<'a, Message, Theme, Renderer> {
    pub fn new(
        content: impl Into<Element<'a, Message, Theme, Renderer>>,
        on_press: Message,
        on_release: Message,
    ) -> Self {
        Self {
            content: content.into(),
            on_press,
            on_release,
        }
    }
}

impl<'a, Message, Theme, Renderer> Widget<Message, Theme, Renderer>
    for HoldArea<'a, Message, Theme, Renderer>
where
    Message: Clone,
    Renderer: renderer::Renderer,
{
    fn tag(&self) -> tree::Tag {
        tree::Tag::of::<HoldState>()
    }

    fn state(&self) -> tree::State {
        tree::State::new(HoldState::default())
    }

    fn children(&self) -> Vec<Tree> {
        vec![Tree::new(&self.content)]
    }

    fn diff(&self, tree: &mut Tree) {
        tree.diff_children(std::slice::from_ref(&self.content));
    }

    fn size(&self) -> Size<Length> {
        self.content.as_widget().size()
    }

    fn layout(&self, tree: &mut Tree, renderer: &Renderer, limits: &layout::Limits) -> layout::Node {
        self.content
            .as_widget()
            .layout(&mut tree.children[0], renderer, limits)
    }

    fn on_event(
        &mut self,
        tree: &mut Tree,
        event: Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> event::Status {
        let state = tree.state.downcast_mut::<HoldState>();
        match gesture(state.held, &event, layout.bounds(), cursor) {
            Some(Gesture::Engage) => {
                state.held = true;
                shell.publish(self.on_press.clone());
                event::Status::Captured
            }
            Some(Gesture::Release) => {
                state.held = false;
                shell.publish(self.on_release.clone());
                event::Status::Ignored
            }
            None => event::Status::Ignored,
        }
    }

    fn mouse_interaction(
        &self,
        _tree: &Tree,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::Idle
        }
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        style: &renderer::Style,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
    ) {
        self.content.as_widget().draw(
            &tree.children[0],
            renderer,
            theme,
            style,
            layout,
            cursor,
            viewport,
        );
    }
}

impl<'a, Message, Theme, Renderer> From<HoldArea<'a, Message, Theme, Renderer>>
    for Element<'a, Message, Theme, Renderer>
where
    Message: Clone + 'a,
    Theme: 'a,
    Renderer: renderer::Renderer + 'a,
{
    fn from(area: HoldArea<'a, Message, Theme, Renderer>) -> Self {
        Element::new(area)
    }
}
