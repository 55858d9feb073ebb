//! Terminal state guard that restores the screen on drop.

use crate::application::is_supervised;
use anyhow::Result;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// RAII guard that leaves raw mode and the alternate screen on drop,
/// including early returns via `?` and unwinding panics.
pub struct TerminalGuard {
    active: AtomicBool,
}

impl TerminalGuard {
    /// Enables raw mode and enters the alternate screen.
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            active: AtomicBool::new(true),
        })
    }

    pub fn cleanup() {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = io::stdout().flush();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            Self::cleanup();
        }
    }
}

/// Installs a panic hook that logs every panic.
///
/// Must be called from the UI thread. Panics inside a supervised handler
/// become the crash screen, and panics in background tasks are reported
/// back as events, so both leave the terminal as is. Any other panic on the
/// UI thread restores the terminal first so the default report is readable.
pub fn install_panic_hook() {
    let ui_thread = thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(%panic_info, "panic");
        if !restores_terminal(thread::current().id() == ui_thread, is_supervised()) {
            return;
        }
        TerminalGuard::cleanup();
        original_hook(panic_info);
    }));
}

fn restores_terminal(on_ui_thread: bool, supervised: bool) -> bool {
    on_ui_thread && !supervised
}
