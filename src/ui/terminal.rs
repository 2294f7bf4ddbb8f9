//! Raw-mode terminal setup and teardown

use anyhow::{Context, Result};
use crossterm::ExecutableCommand;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch to the alternate screen in raw mode
pub fn enter() -> Result<Tui> {
    install_panic_hook();
    enable_raw_mode().context("Failed to enable raw mode")?;
    undo_on_error(io::stdout().execute(EnterAlternateScreen).map(|_| ()), || {
        let _ = disable_raw_mode();
    })
    .context("Failed to enter alternate screen")?;

    let terminal = undo_on_error(Terminal::new(CrosstermBackend::new(io::stdout())), || {
        let _ = restore();
    })
    .context("Failed to create terminal")?;
    Ok(terminal)
}

/// Run `undo` when a setup step after raw mode fails, so the shell is not left raw
fn undo_on_error<T>(result: io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        undo();
    }
    result
}

/// Undo everything `enter` did
pub fn restore() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    io::stdout()
        .execute(LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    Ok(())
}

/// Leave the terminal usable if the UI thread panics while in raw mode.
///
/// Panics in request tasks are turned into fallback replies instead.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().name() == Some("main") {
            let _ = restore();
        }
        previous(info);
    }));
}
