//! Fatal-error trap for the duration of a run.
//!
//! A panic inside host code (a template engine bug, an out-of-bounds index
//! in a page model) would otherwise tear down the whole process with a
//! message that says nothing about which page was being rendered.
//! [`PanicTrap`] swaps in a panic hook that records the panic location
//! instead of printing it, and [`catch`] turns the unwinding panic into a
//! [`TrappedPanic`] the crawler can annotate like any other render error.
//!
//! The hook is installed once per process. On threads without an active
//! trap it forwards to whatever hook was there before, so panics elsewhere
//! keep their usual output.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static ACTIVE_TRAPS: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<TrappedPanic>> = const { RefCell::new(None) };
}

/// A panic converted into data.
#[derive(Debug, Clone, PartialEq)]
pub struct TrappedPanic {
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Marks the current thread as trapping panics until dropped.
pub struct PanicTrap {
    _private: (),
}

impl PanicTrap {
    pub fn install() -> Self {
        INSTALL_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if ACTIVE_TRAPS.with(Cell::get) == 0 {
                    previous(info);
                    return;
                }
                let location = info.location();
                let trapped = TrappedPanic {
                    message: payload_message(info.payload()),
                    file: location.map(|l| l.file().to_string()),
                    line: location.map(|l| l.line()),
                };
                LAST_PANIC.with(|last| *last.borrow_mut() = Some(trapped));
            }));
        });
        ACTIVE_TRAPS.with(|active| active.set(active.get() + 1));
        Self { _private: () }
    }
}

impl Drop for PanicTrap {
    fn drop(&mut self) {
        ACTIVE_TRAPS.with(|active| active.set(active.get().saturating_sub(1)));
    }
}

/// Run `f`, converting a panic into a [`TrappedPanic`].
///
/// Location details are only available while a [`PanicTrap`] is installed;
/// without one the panic message is still recovered from the payload.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, TrappedPanic> {
    LAST_PANIC.with(|last| last.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        LAST_PANIC
            .with(|last| last.borrow_mut().take())
            .unwrap_or_else(|| TrappedPanic {
                message: payload_message(payload.as_ref()),
                file: None,
                line: None,
            })
    })
}

fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
