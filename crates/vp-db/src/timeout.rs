//! Per-statement timeout watchdog.
//!
//! DuckDB has no server-side statement timeout, so a helper thread waits for
//! the statement to finish and interrupts the connection when the deadline
//! passes first.

use duckdb::InterruptHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Armed watchdog for one statement. Call [`Watchdog::disarm`] once the
/// statement returns.
pub(crate) struct Watchdog {
    done: mpsc::Sender<()>,
    fired: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Watchdog {
    /// Start a watchdog that interrupts `handle` after `timeout`.
    pub(crate) fn arm(handle: Arc<InterruptHandle>, timeout: Duration) -> Self {
        let (done, done_rx) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let thread = {
            let fired = Arc::clone(&fired);
            std::thread::spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(timeout) {
                    fired.store(true, Ordering::SeqCst);
                    handle.interrupt();
                }
            })
        };
        Self {
            done,
            fired,
            thread,
        }
    }

    /// Stop the watchdog; returns whether it interrupted the statement.
    pub(crate) fn disarm(self) -> bool {
        // The receiver may already be gone if the watchdog fired.
        let _ = self.done.send(());
        if self.thread.join().is_err() {
            log::warn!("Statement timeout watchdog panicked");
        }
        self.fired.load(Ordering::SeqCst)
    }
}
