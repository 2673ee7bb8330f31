use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::{Condvar, Mutex};

struct SignalInner {
    done: Mutex<bool>,
    cond: Condvar,
}

/// One-shot completion signal fired when a generation's index view is closed.
///
/// Lets a caller wait, with a bound, for resources to actually be released
/// (for example before deleting the files behind them).
#[derive(Clone)]
pub struct DisposalSignal {
    inner: Arc<SignalInner>,
}

impl DisposalSignal {
    pub(crate) fn new() -> Self {
        DisposalSignal {
            inner: Arc::new(SignalInner {
                done: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    pub(crate) fn notify(&self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.cond.notify_all();
    }

    pub fn is_complete(&self) -> bool {
        *self.inner.done.lock()
    }

    /// Wait up to `timeout` for teardown. Returns whether it completed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.inner.done.lock();
        while !*done {
            if self.inner.cond.wait_until(&mut done, deadline).timed_out() {
                break;
            }
        }
        *done
    }
}

impl std::fmt::Debug for DisposalSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalSignal")
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_when_never_notified() {
        let signal = DisposalSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
        assert!(!signal.is_complete());
    }

    #[test]
    fn test_notify_from_other_thread_wakes_waiter() {
        let signal = DisposalSignal::new();
        let notifier = signal.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            notifier.notify();
        });
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        t.join().unwrap();
    }

    #[test]
    fn test_notify_is_idempotent() {
        let signal = DisposalSignal::new();
        signal.notify();
        signal.notify();
        assert!(signal.wait_timeout(Duration::ZERO));
    }
}
