#![forbid(unsafe_code)]

//! RAII terminal setup for the fire display.
//!
//! Entering a [`TerminalSession`] switches to raw mode, the alternate screen,
//! mouse capture and a hidden cursor. Dropping it undoes each step in reverse
//! order. A process-wide panic hook performs the same restore so a panic in
//! any thread leaves a usable shell, even with `panic = "abort"`.

use std::io::{self, Write};
use std::sync::OnceLock;

use crossterm::{cursor, event, execute, terminal};

/// Terminal modes held for the lifetime of the display.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen: bool,
    mouse: bool,
    cursor_hidden: bool,
}

impl TerminalSession {
    /// Enter raw mode, then enable the alternate screen, mouse capture and a
    /// hidden cursor. Anything already enabled is undone if a later step
    /// fails.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            alternate_screen: false,
            mouse: false,
            cursor_hidden: false,
        };
        let mut stdout = io::stdout();

        execute!(stdout, terminal::EnterAlternateScreen)?;
        session.alternate_screen = true;

        execute!(stdout, event::EnableMouseCapture)?;
        session.mouse = true;

        execute!(stdout, cursor::Hide)?;
        session.cursor_hidden = true;

        Ok(session)
    }

    /// Terminal size as (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();

        if self.cursor_hidden {
            let _ = execute!(stdout, cursor::Show);
            self.cursor_hidden = false;
        }
        if self.mouse {
            let _ = execute!(stdout, event::DisableMouseCapture);
            self.mouse = false;
        }
        if self.alternate_screen {
            let _ = execute!(stdout, terminal::LeaveAlternateScreen);
            self.alternate_screen = false;
        }

        let _ = terminal::disable_raw_mode();
        tracing::info!("terminal restored");
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Show);
    let _ = execute!(stdout, event::DisableMouseCapture);
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}
