use egui::{Key, Modifiers, PointerButton, Pos2};

mod router;
pub use router::route_event;

/// Where keyboard focus currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Canvas,
    /// A text or number field; editing shortcuts stay out of its way
    TextField,
}

/// Workspace input, reduced to what the editor reacts to.
/// Positions are in screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(Pos2),
    PointerMove(Pos2),
    PointerUp(Pos2),
    /// The pointer left the workspace
    PointerLeave,
    /// The platform aborted the pointer sequence
    Cancel,
    Key { key: Key, modifiers: Modifiers },
}

/// Turns raw egui events into `InputEvent`s.
///
/// Only the primary button drives gestures. Key repeats are dropped.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_pointer_pos(&self) -> Option<Pos2> {
        self.last_pointer_pos
    }

    pub fn process_events(&mut self, events: &[egui::Event]) -> Vec<InputEvent> {
        let mut out = Vec::new();
        for event in events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    if self.last_pointer_pos != Some(*pos) {
                        out.push(InputEvent::PointerMove(*pos));
                    }
                    self.last_pointer_pos = Some(*pos);
                }
                egui::Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    self.last_pointer_pos = Some(*pos);
                    out.push(if *pressed {
                        InputEvent::PointerDown(*pos)
                    } else {
                        InputEvent::PointerUp(*pos)
                    });
                }
                egui::Event::WindowFocused(false) => out.push(InputEvent::Cancel),
                egui::Event::PointerGone => {
                    if self.last_pointer_pos.take().is_some() {
                        out.push(InputEvent::PointerLeave);
                    }
                }
                egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    modifiers,
                    ..
                } => out.push(InputEvent::Key {
                    key: *key,
                    modifiers: *modifiers,
                }),
                _ => {}
            }
        }
        out
    }
}
