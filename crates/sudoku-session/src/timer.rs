//! Periodic elapsed-time ticker.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A running ticker. At most one exists per session; starting a new one
/// cancels the old.
///
/// Cancellation is cooperative: `on_tick` receives the token and must re-check
/// it under the same lock that [`SessionTimer::cancel`] is called under, so a
/// tick either commits fully before a stop or not at all.
pub(crate) struct SessionTimer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionTimer {
    /// Start ticking every `period`, first tick one period from now.
    /// The task ends when cancelled or when `on_tick` returns false.
    pub fn start<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(&CancellationToken) -> bool + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // After a suspension, resume counting instead of bursting the
            // missed ticks.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if !on_tick(&task_token) {
                            break;
                        }
                    }
                }
            }
        });
        Self { token, task }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and hand back the task so the caller can wait for it to exit
    pub fn stop(self) -> JoinHandle<()> {
        self.cancel();
        self.task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let timer = SessionTimer::start(&Handle::current(), Duration::from_secs(1), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        });

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        timer.stop().await.unwrap();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_can_end_the_task() {
        let timer = SessionTimer::start(&Handle::current(), Duration::from_secs(1), |_| false);
        time::sleep(Duration::from_millis(1500)).await;
        assert!(timer.task.is_finished());
    }
}
