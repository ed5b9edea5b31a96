//! Interrupt handling for the shell process.
//!
//! While a foreground child runs, `SIGINT` must reach the child but not end
//! the shell. A handler that only records the signal does that: the shell
//! keeps running, and a spawned child starts with the default disposition
//! again because caught signals are reset on exec.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

/// Set by the handler, cleared by [`take_interrupt`].
static INTERRUPTED: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));

/// Install the `SIGINT` handler.
#[cfg(unix)]
pub fn setup_signal_handlers() -> io::Result<()> {
    use signal_hook::consts::SIGINT;

    signal_hook::flag::register(SIGINT, Arc::clone(&INTERRUPTED))?;
    log::debug!("SIGINT handler installed");
    Ok(())
}

#[cfg(not(unix))]
pub fn setup_signal_handlers() -> io::Result<()> {
    Ok(())
}

/// Whether an interrupt arrived since the last call; clears the flag.
pub fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

