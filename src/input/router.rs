use egui::Key;

use crate::state::EditorContext;

use super::{FocusTarget, InputEvent};

/// Route one input event to the editor. Returns true if it was consumed.
///
/// Keyboard shortcuts: Delete / Backspace remove the selected overlay,
/// Ctrl+Z (Cmd+Z on macOS) undoes, Escape cancels the running gesture.
/// None of them fire while a text field has focus.
pub fn route_event(event: &InputEvent, ctx: &mut EditorContext, focus: FocusTarget) -> bool {
    match event {
        InputEvent::PointerDown(pos) => match ctx.pointer_down(*pos) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("Pointer down ignored: {err}");
                false
            }
        },
        InputEvent::PointerMove(pos) => {
            if ctx.state().is_idle() {
                return false;
            }
            ctx.pointer_move(*pos);
            true
        }
        InputEvent::PointerUp(pos) => {
            if ctx.state().is_idle() {
                return false;
            }
            ctx.pointer_up(*pos);
            true
        }
        InputEvent::PointerLeave => {
            if ctx.state().is_idle() {
                return false;
            }
            ctx.pointer_leave();
            true
        }
        InputEvent::Cancel => {
            if ctx.state().is_idle() {
                return false;
            }
            ctx.cancel_gesture();
            true
        }
        InputEvent::Key { key, modifiers } => {
            if focus == FocusTarget::TextField {
                return false;
            }
            let command = modifiers.command || modifiers.ctrl || modifiers.mac_cmd;
            match key {
                Key::Delete | Key::Backspace => ctx.delete_selected(),
                Key::Z if command => ctx.undo(),
                Key::Escape => {
                    let active = !ctx.state().is_idle();
                    ctx.cancel_gesture();
                    active
                }
                _ => false,
            }
        }
    }
}
