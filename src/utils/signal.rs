//! Ctrl+C handling shared by `build` and `serve`.
//!
//! `ctrlc` accepts a single process-wide handler, so it is installed once
//! here. The handler raises [`interrupted`] (which the build orchestrator
//! checks before dispatching each document) and runs any registered hooks,
//! such as unblocking the HTTP server.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

type Hook = Box<dyn Fn() + Send>;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HOOKS: Mutex<Vec<Hook>> = Mutex::new(Vec::new());

/// Install the process-wide Ctrl+C handler.
pub fn install() -> Result<()> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        for hook in HOOKS.lock().iter() {
            hook();
        }
    })
    .context("Failed to set Ctrl+C handler")
}

/// Flag raised on Ctrl+C.
pub fn interrupted() -> &'static AtomicBool {
    &INTERRUPTED
}

/// Run `hook` when Ctrl+C arrives.
pub fn on_interrupt(hook: impl Fn() + Send + 'static) {
    HOOKS.lock().push(Box::new(hook));
}
