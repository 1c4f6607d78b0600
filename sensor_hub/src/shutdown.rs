//! Cooperative shutdown signal shared by every loop.
//!
//! The signal is monotonic: once set it stays set for the life of the
//! process. The first reason supplied wins; later sets are no-ops.
//! [`ShutdownSignal::sleep`] lets pacing sleeps end early once the signal
//! fires, so loops exit within one cycle.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Why shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The user asked the renderer to quit.
    UserQuit,
    /// Ctrl-C / SIGINT.
    Interrupted,
    /// The capture device could not be opened or stopped reporting open.
    DeviceUnavailable,
    /// A capture read failed.
    FrameReadFailure,
    /// The renderer failed to present a frame.
    RenderFailure,
    /// Set without a specific reason.
    Requested,
}

impl ShutdownReason {
    /// Whether the reason is a fault rather than a deliberate stop.
    pub const fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable | Self::FrameReadFailure | Self::RenderFailure
        )
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UserQuit => "user quit",
            Self::Interrupted => "interrupted",
            Self::DeviceUnavailable => "capture device unavailable",
            Self::FrameReadFailure => "frame read failure",
            Self::RenderFailure => "render failure",
            Self::Requested => "requested",
        };
        f.write_str(text)
    }
}

struct Inner {
    flag: AtomicBool,
    reason: OnceLock<ShutdownReason>,
    lock: Mutex<()>,
    wakeup: Condvar,
}

/// Process-wide stop flag, cheap to clone and pass to every loop.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                reason: OnceLock::new(),
                lock: Mutex::new(()),
                wakeup: Condvar::new(),
            }),
        }
    }

    /// Request shutdown without a specific reason.
    pub fn set(&self) -> bool {
        self.set_with(ShutdownReason::Requested)
    }

    /// Request shutdown.
    ///
    /// Returns `true` for the call that actually set the signal; repeated
    /// calls return `false` and leave the recorded reason unchanged.
    pub fn set_with(&self, reason: ShutdownReason) -> bool {
        // The reason is recorded before the flag so readers that observe the
        // flag always find a reason.
        let won = self.inner.reason.set(reason).is_ok();
        self.inner.flag.store(true, Ordering::SeqCst);
        if !won {
            return false;
        }
        // Taking the lock orders this notify after any sleeper's flag check.
        let _guard = self.inner.lock.lock();
        self.inner.wakeup.notify_all();
        true
    }

    /// Non-blocking check.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Reason recorded by the first set, if any.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.inner.reason.get().copied()
    }

    /// Sleep for `duration` or until the signal is set.
    ///
    /// Returns `true` if the signal is set on return.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock();
        while !self.is_set() {
            if self.inner.wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_set()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("set", &self.is_set())
            .field("reason", &self.reason())
            .finish()
    }
}
