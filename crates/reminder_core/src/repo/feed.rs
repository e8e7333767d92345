//! Snapshot fan-out for store push updates.
//!
//! # Responsibility
//! - Deliver the complete current collection to every subscriber after a
//!   store write.
//! - Give each subscriber its own cancel handle.
//!
//! # Invariants
//! - Every delivery is a full snapshot, never a delta.
//! - Dropping or cancelling a `Subscription` removes it from the feed.
//! - Subscribers whose receiver is gone are pruned on the next publish.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

struct FeedInner<T> {
    next_id: u64,
    subscribers: Vec<(u64, Sender<T>)>,
}

type SharedInner<T> = Arc<Mutex<FeedInner<T>>>;

/// Cloneable publish side; clones share one subscriber list.
pub struct SnapshotFeed<T> {
    inner: SharedInner<T>,
}

impl<T> Clone for SnapshotFeed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SnapshotFeed<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }
}

impl<T: Clone> SnapshotFeed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = unbounded();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, sender));
        Subscription {
            id,
            receiver,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Sends `snapshot` to every live subscriber; returns how many received it.
    pub fn publish(&self, snapshot: &T) -> usize {
        let mut inner = lock(&self.inner);
        inner
            .subscribers
            .retain(|(_, sender)| sender.send(snapshot.clone()).is_ok());
        inner.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

/// Receive side owned by one consumer.
pub struct Subscription<T> {
    id: u64,
    receiver: Receiver<T>,
    feed: Weak<Mutex<FeedInner<T>>>,
}

impl<T> Subscription<T> {
    /// Raw channel, for `crossbeam_channel::select!` style consumers.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// Next snapshot, if one is queued.
    pub fn try_next(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains the queue and returns only the newest snapshot.
    ///
    /// Snapshots are complete states, so older queued ones can be skipped.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_iter().last()
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn next_timeout(&self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Unsubscribes explicitly; equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.feed.upgrade() {
            let id = self.id;
            lock(&inner)
                .subscribers
                .retain(|(subscriber_id, _)| *subscriber_id != id);
        }
    }
}

fn lock<T>(inner: &Mutex<FeedInner<T>>) -> MutexGuard<'_, FeedInner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::SnapshotFeed;

    #[test]
    fn every_subscriber_receives_full_snapshot() {
        let feed = SnapshotFeed::<Vec<u32>>::new();
        let first = feed.subscribe();
        let second = feed.subscribe();

        assert_eq!(feed.publish(&vec![1, 2]), 2);
        assert_eq!(first.try_next(), Some(vec![1, 2]));
        assert_eq!(second.try_next(), Some(vec![1, 2]));
        assert_eq!(first.try_next(), None);
    }

    #[test]
    fn cancel_and_drop_unsubscribe() {
        let feed = SnapshotFeed::<u32>::new();
        let first = feed.subscribe();
        let second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        first.cancel();
        assert_eq!(feed.subscriber_count(), 1);
        drop(second);
        assert!(!feed.has_subscribers());
        assert_eq!(feed.publish(&7), 0);
    }

    #[test]
    fn latest_skips_stale_snapshots() {
        let feed = SnapshotFeed::<u32>::new();
        let subscription = feed.subscribe();
        feed.publish(&1);
        feed.publish(&2);
        feed.publish(&3);
        assert_eq!(subscription.latest(), Some(3));
        assert_eq!(subscription.latest(), None);
    }

    #[test]
    fn subscription_outliving_feed_is_harmless() {
        let feed = SnapshotFeed::<u32>::new();
        let subscription = feed.subscribe();
        drop(feed);
        assert_eq!(subscription.try_next(), None);
        drop(subscription);
    }
}
