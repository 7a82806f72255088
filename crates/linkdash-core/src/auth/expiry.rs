//! Session expiry scheduling.
//!
//! A session owns at most one `ExpiryTimer`. Dropping or cancelling the timer
//! aborts its task, so replacing the session's timer also retires the old one.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

/// What to do with a session given its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPlan {
    /// No readable expiry, so no timer.
    Never,
    /// Already expired: log out now.
    Immediate,
    /// Fire after this delay.
    After(Duration),
}

impl ExpiryPlan {
    pub fn for_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expires_at {
            None => ExpiryPlan::Never,
            Some(exp) => match (exp - now).to_std() {
                Ok(delay) if !delay.is_zero() => ExpiryPlan::After(delay),
                _ => ExpiryPlan::Immediate,
            },
        }
    }
}

/// One-shot task that runs `on_expire` after a delay unless cancelled.
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// Spawn the timer on the current tokio runtime.
    pub fn arm<F>(delay: Duration, on_expire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(delay_secs = delay.as_secs(), "Arming session expiry timer");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expire.await;
        });
        Self { handle }
    }

    pub fn cancel(self) {
        // Drop aborts the task
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tokio::sync::mpsc;

    #[test]
    fn test_plan_for_expiry() {
        let now = Utc::now();
        assert_eq!(ExpiryPlan::for_expiry(None, now), ExpiryPlan::Never);
        assert_eq!(
            ExpiryPlan::for_expiry(Some(now - ChronoDuration::seconds(5)), now),
            ExpiryPlan::Immediate
        );
        assert_eq!(ExpiryPlan::for_expiry(Some(now), now), ExpiryPlan::Immediate);
        assert_eq!(
            ExpiryPlan::for_expiry(Some(now + ChronoDuration::seconds(90)), now),
            ExpiryPlan::After(Duration::from_secs(90))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(1);
        let _timer = ExpiryTimer::arm(Duration::from_secs(3600), async move {
            let _ = tx.send(()).await;
        });

        let start = tokio::time::Instant::now();
        assert_eq!(rx.recv().await, Some(()));
        assert!(start.elapsed() >= Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let timer = ExpiryTimer::arm(Duration::from_secs(60), async move {
            let _ = tx.send(()).await;
        });
        timer.cancel();

        // The aborted task drops its sender without sending
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_timer_cancels_previous() {
        let (tx, mut rx) = mpsc::channel(2);
        let tx_first = tx.clone();
        let first = ExpiryTimer::arm(Duration::from_secs(10), async move {
            let _ = tx_first.send("first").await;
        });
        let _second = ExpiryTimer::arm(Duration::from_secs(20), async move {
            let _ = tx.send("second").await;
        });
        drop(first);

        assert_eq!(rx.recv().await, Some("second"));
        assert_eq!(rx.recv().await, None);
    }
}
