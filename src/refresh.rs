//! Refresh bookkeeping for views: sequence-tagged fetches and per-view
//! polling timers.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sequence number handed out with each fetch a view starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Tags a view's fetches so that only the newest one is applied.
///
/// A manual refresh issued while a timed refresh is still in flight makes the
/// older response stale; when it arrives, [`RequestTracker::accept`] rejects
/// it instead of letting it overwrite newer data.
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    issued: u64,
}

impl RequestTracker {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// True only for the most recently issued ticket.
    pub fn accept(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}

/// A repeating timer owned by a mounted view. Each tick sends the message
/// built by `message` on the channel; the timer stops when dropped or when
/// the receiver goes away.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn start<M, F>(period: Duration, sender: mpsc::UnboundedSender<M>, message: F) -> Poller
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if sender.send(message()).is_err() {
                    break; // Channel closed, exit task
                }
            }
        });
        Poller { handle }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_accepted() {
        let mut tracker = RequestTracker::default();
        let timed = tracker.issue();
        let manual = tracker.issue();

        assert!(timed < manual);
        assert!(!tracker.accept(timed));
        assert!(tracker.accept(manual));
    }

    #[test]
    fn test_fresh_tracker_accepts_nothing_issued_elsewhere() {
        let mut other = RequestTracker::default();
        let ticket = other.issue();
        let tracker = RequestTracker::default();
        assert!(!tracker.accept(ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_ticks_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = Poller::start(Duration::from_secs(300), tx, || "tick");

        // nothing before the first period elapses
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        assert_eq!(rx.recv().await, Some("tick"));
        assert_eq!(rx.recv().await, Some("tick"));

        drop(poller);
        // the aborted task drops its sender, closing the channel
        assert_eq!(rx.recv().await, None);
    }
}
