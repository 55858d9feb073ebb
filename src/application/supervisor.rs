//! Keeps a panicking handler from taking the whole terminal down.
//!
//! A caught panic switches the app to the crash screen, from which the user
//! can reload the saved draft or quit.

use super::state::App;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

thread_local! {
    static SUPERVISED: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside [`supervise`]. The panic hook uses
/// this to leave the terminal alone for panics that will be caught.
pub fn is_supervised() -> bool {
    SUPERVISED.get()
}

/// Runs `handler` against the app, converting a panic into [`App::crash`].
///
/// Returns `None` when the handler panicked.
pub fn supervise<R>(app: &mut App, label: &str, handler: impl FnOnce(&mut App) -> R) -> Option<R> {
    let outer = SUPERVISED.replace(true);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(app)));
    SUPERVISED.set(outer);

    match outcome {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(handler = label, %message, "handler panicked");
            app.crash(message);
            None
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
