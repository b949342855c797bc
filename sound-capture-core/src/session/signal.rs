use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Cancellation token shared between a controller and one worker.
///
/// Cancelling wakes any `wait_timeout` sleeper immediately; device reads poll
/// `is_cancelled` between short waits.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock() = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `timeout` or until cancelled. Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut cancelled = flag.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*cancelled {
                    if cvar.wait_until(&mut cancelled, deadline).timed_out() {
                        break;
                    }
                }
            }
            // past the end of the clock: only a cancel ends the wait
            None => {
                while !*cancelled {
                    cvar.wait(&mut cancelled);
                }
            }
        }
        *cancelled
    }
}
