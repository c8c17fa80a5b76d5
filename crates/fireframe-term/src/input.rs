#![forbid(unsafe_code)]

//! Terminal events to scene commands.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use fireframe_core::SceneController;

/// Pixels of rotation drag per terminal cell moved.
const DRAG_GAIN: f64 = 4.0;

pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("Left/Right", "previous/next shape"),
    ("Up/Down", "next/previous palette"),
    ("Mouse wheel", "next/previous palette"),
    ("Left/Right click", "next/previous shape"),
    ("Mouse drag", "rotate shape"),
    ("+/-", "increase/decrease scale"),
    ("*//", "increase/decrease depth"),
    ("PageUp/PageDown", "increase/decrease cooling"),
    ("c", "toggle still shape"),
    ("b", "toggle still fire bottom"),
    ("r", "toggle auto-rotate"),
    ("a", "toggle auto-switch"),
    ("w", "toggle renderer"),
    ("Space", "pause/resume"),
    ("q/Esc/Ctrl+C", "quit"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    NextShape,
    PreviousShape,
    NextPalette,
    PreviousPalette,
    Rotate { dx: f64, dy: f64 },
    Scale(f64),
    Depth(f64),
    MoreCooling,
    LessCooling,
    StillShape,
    StillFire,
    AutoRotate,
    AutoSwitch,
    Renderer,
    Pause,
    Resize { cols: u16, rows: u16 },
    Quit,
}

impl Command {
    /// Apply to the scene. Quit and Resize are handled by the caller.
    pub fn apply(self, scene: &SceneController) {
        match self {
            Self::NextShape => scene.next_shape(),
            Self::PreviousShape => scene.previous_shape(),
            Self::NextPalette => scene.next_palette(),
            Self::PreviousPalette => scene.previous_palette(),
            Self::Rotate { dx, dy } => scene.rotate(dx, dy),
            Self::Scale(amount) => scene.increase_scale(amount),
            Self::Depth(amount) => scene.increase_depth(amount),
            Self::MoreCooling => scene.increase_cooling(),
            Self::LessCooling => scene.decrease_cooling(),
            Self::StillShape => scene.toggle_still_shape(),
            Self::StillFire => scene.toggle_still_fire(),
            Self::AutoRotate => scene.toggle_auto_rotate(),
            Self::AutoSwitch => scene.toggle_auto_switch(),
            Self::Renderer => scene.toggle_renderer(),
            Self::Pause => scene.toggle_pause(),
            Self::Resize { .. } | Self::Quit => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: MouseButton,
    last: (u16, u16),
    dragged: bool,
}

/// Stateful mapper; remembers the pointer between drag events.
#[derive(Debug, Default)]
pub struct InputMapper {
    press: Option<Press>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, event: &Event) -> Option<Command> {
        match event {
            Event::Key(key) => map_key(key),
            Event::Mouse(mouse) => self.map_mouse(mouse),
            Event::Resize(cols, rows) => Some(Command::Resize {
                cols: *cols,
                rows: *rows,
            }),
            _ => None,
        }
    }

    fn map_mouse(&mut self, mouse: &MouseEvent) -> Option<Command> {
        let here = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Command::NextPalette),
            MouseEventKind::ScrollDown => Some(Command::PreviousPalette),
            MouseEventKind::Down(button) => {
                self.press = Some(Press {
                    button,
                    last: here,
                    dragged: false,
                });
                None
            }
            MouseEventKind::Drag(_) => {
                let press = self.press.as_mut()?;
                let dx = f64::from(here.0) - f64::from(press.last.0);
                // Rows are two pixels tall.
                let dy = (f64::from(here.1) - f64::from(press.last.1)) * 2.0;
                press.last = here;
                press.dragged = true;
                Some(Command::Rotate {
                    dx: dx * DRAG_GAIN,
                    dy: dy * DRAG_GAIN,
                })
            }
            MouseEventKind::Up(_) => {
                let press = self.press.take()?;
                if press.dragged {
                    return None;
                }
                match press.button {
                    MouseButton::Left => Some(Command::NextShape),
                    _ => Some(Command::PreviousShape),
                }
            }
            _ => None,
        }
    }
}

fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    Some(match key.code {
        KeyCode::Left => Command::PreviousShape,
        KeyCode::Right => Command::NextShape,
        KeyCode::Up => Command::NextPalette,
        KeyCode::Down => Command::PreviousPalette,
        KeyCode::PageUp => Command::MoreCooling,
        KeyCode::PageDown => Command::LessCooling,
        KeyCode::Esc => Command::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            '+' => Command::Scale(50.0),
            '-' => Command::Scale(-50.0),
            '*' => Command::Depth(1.0),
            '/' => Command::Depth(-1.0),
            'c' => Command::StillShape,
            'b' => Command::StillFire,
            'r' => Command::AutoRotate,
            'a' => Command::AutoSwitch,
            'w' => Command::Renderer,
            ' ' => Command::Pause,
            'q' => Command::Quit,
            _ => return None,
        },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn keys_map_to_commands() {
        let mut m = InputMapper::new();
        assert_eq!(m.map(&key(KeyCode::Right)), Some(Command::NextShape));
        assert_eq!(m.map(&key(KeyCode::Up)), Some(Command::NextPalette));
        assert_eq!(m.map(&key(KeyCode::Char('+'))), Some(Command::Scale(50.0)));
        assert_eq!(m.map(&key(KeyCode::Char('/'))), Some(Command::Depth(-1.0)));
        assert_eq!(m.map(&key(KeyCode::Char('W'))), Some(Command::Renderer));
        assert_eq!(m.map(&key(KeyCode::Char(' '))), Some(Command::Pause));
        assert_eq!(m.map(&key(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(m.map(&key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(InputMapper::new().map(&ev), Some(Command::Quit));
    }

    #[test]
    fn click_without_drag_switches_shape() {
        let mut m = InputMapper::new();
        assert_eq!(m.map(&mouse(MouseEventKind::Down(MouseButton::Left), 3, 3)), None);
        assert_eq!(
            m.map(&mouse(MouseEventKind::Up(MouseButton::Left), 3, 3)),
            Some(Command::NextShape)
        );
        m.map(&mouse(MouseEventKind::Down(MouseButton::Right), 3, 3));
        assert_eq!(
            m.map(&mouse(MouseEventKind::Up(MouseButton::Right), 3, 3)),
            Some(Command::PreviousShape)
        );
    }

    #[test]
    fn drag_rotates_and_suppresses_click() {
        let mut m = InputMapper::new();
        m.map(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        assert_eq!(
            m.map(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 4)),
            Some(Command::Rotate { dx: 8.0, dy: -8.0 })
        );
        assert_eq!(m.map(&mouse(MouseEventKind::Up(MouseButton::Left), 12, 4)), None);
    }

    #[test]
    fn wheel_changes_palette() {
        let mut m = InputMapper::new();
        assert_eq!(m.map(&mouse(MouseEventKind::ScrollUp, 0, 0)), Some(Command::NextPalette));
        assert_eq!(m.map(&mouse(MouseEventKind::ScrollDown, 0, 0)), Some(Command::PreviousPalette));
    }

    #[test]
    fn resize_is_forwarded() {
        assert_eq!(
            InputMapper::new().map(&Event::Resize(100, 40)),
            Some(Command::Resize { cols: 100, rows: 40 })
        );
    }

    #[test]
    fn binding_table_covers_quit() {
        assert!(KEY_BINDINGS.iter().any(|(_, what)| *what == "quit"));
    }
}
