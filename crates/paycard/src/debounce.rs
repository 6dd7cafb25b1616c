//! Trailing-edge debounce on the local task set

use std::cell::RefCell;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs the most recently scheduled future once `delay` has passed without
/// another call to [`Debouncer::schedule`].
///
/// Only the timer is replaced. Once a future has started it runs to
/// completion even if a newer one is scheduled. Must be used inside a
/// `tokio::task::LocalSet`.
pub struct Debouncer {
    delay: Duration,
    pending: RefCell<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: RefCell::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.cancel();
        let delay = self.delay;
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(?delay, "debounce fired");
            // Detached so aborting a later timer never cancels this run
            tokio::task::spawn_local(fut);
        });
        *self.pending.borrow_mut() = Some(handle);
    }

    /// Drop the pending timer, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.borrow_mut().take() {
            handle.abort();
        }
    }

    /// True while a timer is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.pending
            .borrow()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_runs() {
        LocalSet::new()
            .run_until(async {
                let debouncer = Debouncer::new(Duration::from_millis(500));
                let runs = Rc::new(RefCell::new(Vec::new()));

                for i in 0..3 {
                    let runs = runs.clone();
                    debouncer.schedule(async move { runs.borrow_mut().push(i) });
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                assert!(runs.borrow().is_empty());

                tokio::time::sleep(Duration::from_millis(500)).await;
                tokio::task::yield_now().await;
                assert_eq!(*runs.borrow(), vec![2]);
                assert!(!debouncer.is_pending());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_future_is_not_cancelled() {
        LocalSet::new()
            .run_until(async {
                let debouncer = Debouncer::new(Duration::from_millis(500));
                let finished = Rc::new(Cell::new(0));

                let done = finished.clone();
                debouncer.schedule(async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    done.set(done.get() + 1);
                });
                tokio::time::sleep(Duration::from_millis(600)).await;

                // New keystroke while the first request is in flight
                let done = finished.clone();
                debouncer.schedule(async move { done.set(done.get() + 10) });

                tokio::time::sleep(Duration::from_secs(3)).await;
                tokio::task::yield_now().await;
                assert_eq!(finished.get(), 11);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        LocalSet::new()
            .run_until(async {
                let debouncer = Debouncer::new(Duration::from_millis(50));
                let ran = Rc::new(Cell::new(false));
                let flag = ran.clone();
                debouncer.schedule(async move { flag.set(true) });
                assert!(debouncer.is_pending());
                debouncer.cancel();
                tokio::time::sleep(Duration::from_millis(100)).await;
                assert!(!ran.get());
            })
            .await;
    }
}
