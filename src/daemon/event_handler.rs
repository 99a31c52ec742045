//! Translates X11 input on the overlay window into drags and commands

use tracing::{debug, info, warn};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::Keysym;

use super::{Command, DesktopOverlay};
use crate::constants::{keys, mouse};
use crate::drag::{DragController, DragOutcome};
use crate::types::Position;
use crate::x11_utils::KeyMap;

/// What a mouse button does when pressed on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Starts a click or drag gesture
    Drag,
    /// Would open the context menu, which is the tray menu
    ContextMenu,
    Ignored,
}

pub fn button_role(button: u8) -> ButtonRole {
    match button {
        mouse::BUTTON_LEFT => ButtonRole::Drag,
        mouse::BUTTON_RIGHT => ButtonRole::ContextMenu,
        _ => ButtonRole::Ignored,
    }
}

pub fn handle_event(
    overlay: &DesktopOverlay,
    drag: &mut DragController,
    keymap: &KeyMap,
    event: Event,
) -> Option<Command> {
    match event {
        Event::ButtonPress(event) => match button_role(event.detail) {
            ButtonRole::ContextMenu => {
                info!("Overlay menu (Peek, Hide, Move to edge, Quit) is in the system tray; Escape or q closes");
            }
            ButtonRole::Drag => {
                if let Err(e) = overlay.host().focus() {
                    warn!(error = ?e, "Failed to focus overlay");
                }
                drag.pointer_down(overlay, event.detail, Position::new(event.root_x as i32, event.root_y as i32));
            }
            ButtonRole::Ignored => debug!(button = event.detail, "Button ignored"),
        },
        Event::MotionNotify(event) => {
            drag.pointer_move(overlay, Position::new(event.root_x as i32, event.root_y as i32));
        }
        Event::ButtonRelease(event) => {
            if button_role(event.detail) != ButtonRole::Drag {
                return None;
            }
            match drag.pointer_up(overlay) {
                DragOutcome::Click => debug!("Overlay clicked"),
                DragOutcome::Dropped => debug!(state = ?overlay.state(), "Overlay dropped"),
                DragOutcome::Idle => {}
            }
        }
        Event::KeyPress(event) => {
            return keymap.keysym(event.detail).and_then(key_command);
        }
        Event::DestroyNotify(event) if event.window == overlay.host().window() => {
            info!(window = event.window, "Overlay window destroyed");
            return Some(Command::Close);
        }
        _ => {}
    }
    None
}

/// Key bindings of the focused overlay
pub fn key_command(keysym: Keysym) -> Option<Command> {
    match keysym {
        keys::ESCAPE | keys::LOWER_Q => Some(Command::Close),
        keys::SPACE => Some(Command::Toggle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_command(keys::ESCAPE), Some(Command::Close));
        assert_eq!(key_command(keys::LOWER_Q), Some(Command::Close));
        assert_eq!(key_command(keys::SPACE), Some(Command::Toggle));
        assert_eq!(key_command(0x0061), None);
    }

    #[test]
    fn test_button_roles() {
        assert_eq!(button_role(mouse::BUTTON_LEFT), ButtonRole::Drag);
        assert_eq!(button_role(mouse::BUTTON_RIGHT), ButtonRole::ContextMenu);
        assert_eq!(button_role(2), ButtonRole::Ignored);
        // Scroll wheel
        assert_eq!(button_role(4), ButtonRole::Ignored);
    }
}
