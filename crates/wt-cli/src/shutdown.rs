//! Cooperative shutdown flag set from process signals.
//!
//! The polling loop checks this flag between polls and exits cleanly; no
//! partial write can be interrupted because every store mutation is a single
//! whole-line append or an atomic file swap.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Registers SIGINT/SIGTERM handlers and returns the flag they flip.
///
/// On non-unix targets the flag is returned unregistered and never flips;
/// the loop then runs until the process is killed.
pub fn install_signal_flag() -> &'static AtomicBool {
    #[cfg(unix)]
    {
        let handler = handle_signal as extern "C" fn(libc::c_int);
        #[expect(
            unsafe_code,
            reason = "libc::signal registration; the handler only touches an atomic"
        )]
        unsafe {
            libc::signal(libc::SIGINT, handler as libc::sighandler_t);
            libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
        }
    }
    &SHUTDOWN
}

extern "C" fn handle_signal(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_latches() {
        let flag = install_signal_flag();
        assert!(!flag.load(Ordering::SeqCst));
        handle_signal(0);
        assert!(flag.load(Ordering::SeqCst));
        SHUTDOWN.store(false, Ordering::SeqCst);
    }
}
