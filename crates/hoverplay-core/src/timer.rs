//! Cancellable engine timers.
//!
//! Each timer is a tokio task racing a sleep against a
//! [`CancellationToken`]. Every token descends from the session's root token,
//! so tearing the session down cancels all pending timers and tasks at once.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Where engine tasks run, and the token that stops them all.
#[derive(Clone)]
pub struct TaskScope {
    handle: Handle,
    token: CancellationToken,
}

impl TaskScope {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            token: CancellationToken::new(),
        }
    }

    /// Scope of the current runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Spawn a task that is dropped when the scope is cancelled.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = task => {}
            }
        });
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

/// A single re-armable timer.
///
/// Arming replaces any pending fire. The callback receives its own token and
/// must check it after taking the engine lock: a cancel can race the fire.
#[derive(Default)]
pub struct TimerSlot {
    token: Option<CancellationToken>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F, Fut>(&mut self, scope: &TaskScope, delay: Duration, on_fire: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = scope.child_token();
        let fired = token.clone();
        scope.handle.spawn(async move {
            tokio::select! {
                _ = fired.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_fire(fired).await,
            }
        });
        self.token = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Forget the pending fire without cancelling it; used by the callback
    /// itself once it ran.
    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn is_armed(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_callback(
        count: &Arc<AtomicUsize>,
    ) -> impl FnOnce(CancellationToken) -> std::future::Ready<()> + Send + 'static {
        let count = count.clone();
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let scope = TaskScope::current();
        let count = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        slot.arm(&scope, Duration::from_millis(100), counter_callback(&count));
        assert!(slot.is_armed());

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_fire() {
        let scope = TaskScope::current();
        let count = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        slot.arm(&scope, Duration::from_millis(100), counter_callback(&count));
        tokio::time::sleep(Duration::from_millis(50)).await;
        slot.arm(&scope, Duration::from_millis(100), counter_callback(&count));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let scope = TaskScope::current();
        let count = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        slot.arm(&scope, Duration::from_millis(100), counter_callback(&count));
        slot.cancel();
        assert!(!slot.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_cancel_stops_timers_and_tasks() {
        let scope = TaskScope::current();
        let count = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();
        slot.arm(&scope, Duration::from_millis(100), counter_callback(&count));

        let task_count = count.clone();
        scope.spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            task_count.fetch_add(10, Ordering::SeqCst);
        });

        scope.cancel();
        assert!(scope.is_cancelled());
        assert!(!slot.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
