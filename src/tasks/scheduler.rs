//! Cancellable periodic tasks
//!
//! Ticks of one task never overlap: the next tick is only awaited after the
//! previous body completed, and missed ticks are delayed rather than burst.

use log::debug;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a running periodic task
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Run `tick` every `period`, first after one full period
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        Self::spawn_at(name.into(), Instant::now() + period, period, tick)
    }

    /// Run `tick` right away and then every `period`
    pub fn spawn_now<F, Fut>(name: impl Into<String>, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        Self::spawn_at(name.into(), Instant::now(), period, tick)
    }

    fn spawn_at<F, Fut>(name: String, start: Instant, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let flow = tokio::select! {
                    _ = cancelled.cancelled() => break,
                    flow = tick() => flow,
                };
                if flow.is_break() {
                    break;
                }
            }

            debug!("Periodic task '{}' stopped", task_name);
            cancelled.cancel();
        });

        debug!("Spawned periodic task '{}' every {:?}", name, period);
        Self { name, token, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the task; an in-flight tick is dropped at its next await point
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }

    /// Wait for the task to stop on its own (or be cancelled)
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_break() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();

        let task = PeriodicTask::spawn("count", Duration::from_millis(500), move || {
            let counter = counter.clone();
            async move {
                let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if seen == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
            }
        });

        task.join().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();

        let task = PeriodicTask::spawn("delayed", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        task.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticking() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();

        let task = PeriodicTask::spawn_now("forever", Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        task.cancel();
        assert!(!task.is_active());

        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 3);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        task.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_never_overlap() {
        let running = Arc::new(AtomicU32::new(0));
        let overlaps = Arc::new(AtomicU32::new(0));
        let (r, o) = (running.clone(), overlaps.clone());

        let task = PeriodicTask::spawn_now("slow", Duration::from_millis(100), move || {
            let (running, overlaps) = (r.clone(), o.clone());
            async move {
                if running.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(350)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        task.cancel();
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
