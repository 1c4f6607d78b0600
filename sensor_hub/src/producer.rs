//! Periodic producer loops.
//!
//! A [`PeriodicProducer`] owns a [`SampleSource`] and a mailbox. Each cycle
//! it sleeps for its period, computes the next sample and publishes it,
//! until the shared [`ShutdownSignal`] is observed.
//!
//! ```text
//!   Running ──(signal set)──▶ Stopped
//! ```

use crate::mailbox::LatestValueMailbox;
use crate::shutdown::ShutdownSignal;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Poll interval used while waiting for a producer thread to finish.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Something that computes a new value once per producer cycle.
pub trait SampleSource: Send + 'static {
    /// Value published into the mailbox.
    type Output: Send + 'static;

    /// Advance and return the next value.
    fn next_sample(&mut self) -> Self::Output;
}

/// Synthetic sensor: a counter advanced once per period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value (number of completed cycles).
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl SampleSource for Counter {
    type Output = u64;

    fn next_sample(&mut self) -> u64 {
        self.value += 1;
        self.value
    }
}

/// Lifecycle of a producer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Running,
    Stopped,
}

/// Background loop publishing one sample per period.
pub struct PeriodicProducer<S: SampleSource> {
    name: String,
    source: S,
    period: Duration,
    mailbox: Arc<LatestValueMailbox<S::Output>>,
    shutdown: ShutdownSignal,
}

impl<S: SampleSource> PeriodicProducer<S> {
    pub fn new(
        name: impl Into<String>,
        source: S,
        period: Duration,
        mailbox: Arc<LatestValueMailbox<S::Output>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            period,
            mailbox,
            shutdown,
        }
    }

    /// Execute cycles on the calling thread until shutdown.
    ///
    /// Returns the source so callers can inspect its final state.
    pub fn run(mut self) -> S {
        debug!("Producer '{}' running (period={:?})", self.name, self.period);

        let mut cycles: u64 = 0;
        while !self.shutdown.is_set() {
            if self.shutdown.sleep(self.period) {
                break;
            }
            let value = self.source.next_sample();
            self.mailbox.publish(value);
            cycles += 1;
        }

        debug!("Producer '{}' stopped after {} cycles", self.name, cycles);
        self.source
    }

    /// Run the loop on a dedicated, named OS thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn(self) -> io::Result<ProducerHandle<S>> {
        let name = self.name.clone();
        let thread = thread::Builder::new()
            .name(format!("producer-{name}"))
            .spawn(move || self.run())?;
        info!("Started producer '{}'", name);
        Ok(ProducerHandle { name, thread })
    }
}

/// Handle to a spawned producer thread.
pub struct ProducerHandle<T> {
    name: String,
    thread: JoinHandle<T>,
}

impl<T> ProducerHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProducerState {
        if self.thread.is_finished() {
            ProducerState::Stopped
        } else {
            ProducerState::Running
        }
    }

    /// Wait for the thread without a bound.
    ///
    /// Returns `None` if the producer panicked.
    pub fn join(self) -> Option<T> {
        match self.thread.join() {
            Ok(value) => Some(value),
            Err(_) => {
                error!("Producer '{}' panicked", self.name);
                None
            }
        }
    }

    /// Wait up to `timeout` for the thread to finish.
    ///
    /// A thread still running at the deadline is detached and `None` is
    /// returned.
    pub fn join_within(self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        while !self.thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "Producer '{}' did not stop within {:?}; detaching",
                    self.name, timeout
                );
                return None;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        self.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments() {
        let mut counter = Counter::new();
        assert_eq!(counter.next_sample(), 1);
        assert_eq!(counter.next_sample(), 2);
        assert_eq!(counter.value(), 2);
    }

    #[test]
    fn producer_publishes_until_shutdown() {
        let shutdown = ShutdownSignal::new();
        let mailbox = Arc::new(LatestValueMailbox::new(2));
        let handle = PeriodicProducer::new(
            "fast",
            Counter::new(),
            Duration::from_millis(5),
            Arc::clone(&mailbox),
            shutdown.clone(),
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(handle.state(), ProducerState::Running);
        assert!(!mailbox.is_empty());

        shutdown.set();
        let counter = handle.join_within(Duration::from_secs(2)).unwrap();
        assert!(counter.value() > 0);
        assert_eq!(mailbox.stats().published, counter.value());
    }

    #[test]
    fn producer_exits_without_publishing_when_already_stopped() {
        let shutdown = ShutdownSignal::new();
        shutdown.set();
        let mailbox = Arc::new(LatestValueMailbox::new(2));
        let counter = PeriodicProducer::new(
            "idle",
            Counter::new(),
            Duration::from_millis(1),
            Arc::clone(&mailbox),
            shutdown,
        )
        .run();

        assert_eq!(counter.value(), 0);
        assert_eq!(mailbox.stats().published, 0);
    }

    #[test]
    fn slow_producer_stops_within_one_cycle() {
        let shutdown = ShutdownSignal::new();
        let mailbox = Arc::new(LatestValueMailbox::new(1));
        let handle = PeriodicProducer::new(
            "slow",
            Counter::new(),
            Duration::from_secs(30),
            mailbox,
            shutdown.clone(),
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        shutdown.set();
        let start = Instant::now();
        let counter = handle.join_within(Duration::from_secs(5)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn join_within_detaches_stuck_thread() {
        struct Stuck;
        impl SampleSource for Stuck {
            type Output = ();
            fn next_sample(&mut self) {
                thread::sleep(Duration::from_millis(300));
            }
        }

        let shutdown = ShutdownSignal::new();
        let handle = PeriodicProducer::new(
            "stuck",
            Stuck,
            Duration::from_millis(1),
            Arc::new(LatestValueMailbox::new(1)),
            shutdown.clone(),
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        shutdown.set();
        assert!(handle.join_within(Duration::from_millis(10)).is_none());
    }
}
