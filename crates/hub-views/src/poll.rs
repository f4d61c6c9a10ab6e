use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Refetches a screen's data set on a fixed interval and publishes each
/// result wholesale. The first fetch runs immediately.
///
/// Dropping the poller stops the timer.
pub struct Poller<T> {
    rx: watch::Receiver<Option<T>>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(name: &'static str, every: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let refresh = Arc::new(Notify::new());
        let wake = refresh.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = wake.notified() => {
                        debug!("{} poller: refresh requested", name);
                        interval.reset();
                    }
                }

                let value = fetch().await;
                if tx.send(Some(value)).is_err() {
                    break;
                }
            }
        });

        Self { rx, refresh, task }
    }

    /// Most recent snapshot, `None` until the first fetch lands.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }

    /// Refetch now instead of waiting out the interval.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn counting(every: Duration) -> (Poller<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let poller = Poller::spawn("test", every, move || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 }
        });
        (poller, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_is_immediate_then_interval() {
        let start = Instant::now();
        let (mut poller, _) = counting(Duration::from_secs(3));
        assert_eq!(poller.latest(), None);

        assert_eq!(poller.next().await, Some(1));
        assert!(start.elapsed() < Duration::from_secs(1));

        assert_eq!(poller.next().await, Some(2));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
        assert_eq!(poller.latest(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_skips_the_wait() {
        let (mut poller, _) = counting(Duration::from_secs(60));
        assert_eq!(poller.next().await, Some(1));

        let before = Instant::now();
        poller.refresh();
        assert_eq!(poller.next().await, Some(2));
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_fetching() {
        let (mut poller, calls) = counting(Duration::from_secs(1));
        assert_eq!(poller.next().await, Some(1));
        drop(poller);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
