//! Bounded latest-value mailbox.
//!
//! A [`LatestValueMailbox`] keeps at most K entries. Publishing into a full
//! mailbox evicts the oldest entry, so producers never block and the most
//! recent K values are always retained. Reads drain oldest-first.
//!
//! The consumer's last-known cache lives outside the mailbox: callers pass
//! it to [`LatestValueMailbox::try_take_or`] or hold a [`MailboxReader`].

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Counters describing mailbox traffic since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Entries published.
    pub published: u64,
    /// Entries discarded because the mailbox was full.
    pub evicted: u64,
    /// Entries handed out by a take.
    pub taken: u64,
}

struct Slots<T> {
    queue: VecDeque<T>,
    stats: MailboxStats,
}

/// Capacity-K FIFO slot favoring freshness over history.
pub struct LatestValueMailbox<T> {
    slots: Mutex<Slots<T>>,
    capacity: usize,
}

impl<T> LatestValueMailbox<T> {
    /// Create a mailbox holding at most `capacity` entries.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Mutex::new(Slots {
                queue: VecDeque::with_capacity(capacity),
                stats: MailboxStats::default(),
            }),
            capacity,
        }
    }

    /// Insert a value, discarding the oldest entry first when full.
    pub fn publish(&self, value: T) {
        let mut slots = self.slots.lock();
        if slots.queue.len() >= self.capacity {
            slots.queue.pop_front();
            slots.stats.evicted += 1;
        }
        slots.queue.push_back(value);
        slots.stats.published += 1;
    }

    /// Remove and return the oldest queued entry, if any.
    pub fn try_take(&self) -> Option<T> {
        let mut slots = self.slots.lock();
        let value = slots.queue.pop_front();
        if value.is_some() {
            slots.stats.taken += 1;
        }
        value
    }

    /// Remove and return the oldest queued entry, or `fallback` when empty.
    pub fn try_take_or(&self, fallback: T) -> T {
        self.try_take().unwrap_or(fallback)
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.slots.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().queue.is_empty()
    }

    /// Fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> MailboxStats {
        self.slots.lock().stats
    }
}

impl<T> fmt::Debug for LatestValueMailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestValueMailbox")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Consumer-side handle owning the last-known value of one mailbox.
///
/// The cache starts at the supplied initial value and is replaced whenever
/// a take returns a fresh entry, so [`MailboxReader::latest`] never reports
/// "no data".
pub struct MailboxReader<T> {
    mailbox: Arc<LatestValueMailbox<T>>,
    last: T,
}

impl<T> MailboxReader<T> {
    pub fn new(mailbox: Arc<LatestValueMailbox<T>>, initial: T) -> Self {
        Self {
            mailbox,
            last: initial,
        }
    }

    /// Freshest queued value, or the last value handed out when empty.
    pub fn latest(&mut self) -> &T {
        if let Some(value) = self.mailbox.try_take() {
            self.last = value;
        }
        &self.last
    }

    /// Last value handed out, without touching the mailbox.
    pub fn last_known(&self) -> &T {
        &self.last
    }

    pub fn mailbox(&self) -> &Arc<LatestValueMailbox<T>> {
        &self.mailbox
    }
}

/// Object-safe view of a reader whose values render as overlay text.
pub trait SampleText: Send {
    /// Text of the freshest (or last-known) value.
    fn latest_text(&mut self) -> String;
}

impl<T: fmt::Display + Send> SampleText for MailboxReader<T> {
    fn latest_text(&mut self) -> String {
        self.latest().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn capacity_two_scenario() {
        let mailbox = LatestValueMailbox::new(2);
        mailbox.publish(1);
        mailbox.publish(2);
        mailbox.publish(3);
        assert_eq!(mailbox.len(), 2);

        assert_eq!(mailbox.try_take_or(0), 2);
        assert_eq!(mailbox.try_take_or(0), 3);
        assert_eq!(mailbox.try_take_or(99), 99);
    }

    #[test]
    fn empty_returns_fallback_including_zero() {
        let mailbox: LatestValueMailbox<u64> = LatestValueMailbox::new(1);
        assert_eq!(mailbox.try_take_or(0), 0);
        assert_eq!(mailbox.try_take(), None);

        let strings: LatestValueMailbox<String> = LatestValueMailbox::new(3);
        assert_eq!(strings.try_take_or(String::new()), "");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mailbox = LatestValueMailbox::new(0);
        assert_eq!(mailbox.capacity(), 1);
        mailbox.publish('a');
        mailbox.publish('b');
        assert_eq!(mailbox.try_take(), Some('b'));
    }

    #[test]
    fn stats_track_traffic() {
        let mailbox = LatestValueMailbox::new(2);
        for i in 0..5 {
            mailbox.publish(i);
        }
        let _ = mailbox.try_take();
        let _ = mailbox.try_take();
        let _ = mailbox.try_take();

        assert_eq!(
            mailbox.stats(),
            MailboxStats {
                published: 5,
                evicted: 3,
                taken: 2,
            }
        );
    }

    #[test]
    fn reader_keeps_last_known_value() {
        let mailbox = Arc::new(LatestValueMailbox::new(2));
        let mut reader = MailboxReader::new(Arc::clone(&mailbox), 0u64);
        assert_eq!(*reader.latest(), 0);

        mailbox.publish(7);
        mailbox.publish(8);
        assert_eq!(*reader.latest(), 7);
        assert_eq!(*reader.latest(), 8);
        assert_eq!(*reader.latest(), 8);
        assert_eq!(reader.latest_text(), "8");
        assert!(mailbox.is_empty());
    }

    #[test]
    fn concurrent_publish_and_take() {
        let mailbox = Arc::new(LatestValueMailbox::new(2));
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 1..=10_000u64 {
                    mailbox.publish(i);
                }
            })
        };

        let mut last = 0;
        while !producer.is_finished() || !mailbox.is_empty() {
            if let Some(v) = mailbox.try_take() {
                assert!(v > last, "FIFO order violated: {v} after {last}");
                last = v;
            }
        }
        producer.join().unwrap();
        assert_eq!(last, 10_000);
    }
}
