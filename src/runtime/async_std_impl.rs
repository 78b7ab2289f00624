//! async-std runtime implementation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{Spawner, TimedOut};

/// async-std task spawner.
pub struct AsyncStdSpawner;

impl Spawner for AsyncStdSpawner {
    type JoinHandle<T: Send + 'static> = AsyncStdJoinHandle<T>;

    fn spawn<F, T>(future: F) -> Self::JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let handle = async_std::task::spawn(async move {
            let output = future.await;
            flag.store(true, Ordering::Release);
            output
        });
        AsyncStdJoinHandle {
            handle: Some(handle),
            finished,
        }
    }
}

/// Wrapper around async-std's JoinHandle.
///
/// async-std cannot report completion without awaiting, so the spawned future
/// raises `finished` itself when it returns.
pub struct AsyncStdJoinHandle<T> {
    handle: Option<async_std::task::JoinHandle<T>>,
    finished: Arc<AtomicBool>,
}

impl<T> Future for AsyncStdJoinHandle<T> {
    type Output = T;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        match self.handle.as_mut() {
            Some(handle) => std::pin::Pin::new(handle).poll(cx),
            None => panic!("Task was cancelled unexpectedly"),
        }
    }
}

impl<T: Send + 'static> AsyncStdJoinHandle<T> {
    /// Cancel the task.
    ///
    /// async-std only cancels through `JoinHandle::cancel`, which consumes the
    /// handle, so the cancellation runs detached and the handle becomes inert.
    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            async_std::task::spawn(handle.cancel());
        }
    }

    /// Returns true once the task has finished or been aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_none() || self.finished.load(Ordering::Acquire)
    }
}

/// Internal instant type for async-std.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstantInner(std::time::Instant);

impl InstantInner {
    pub fn now() -> Self {
        InstantInner(std::time::Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    pub fn saturating_duration_since(&self, earlier: InstantInner) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

/// Sleep for the specified duration using async-std.
pub async fn sleep_impl(duration: Duration) {
    async_std::task::sleep(duration).await
}

/// Run a future with a timeout using async-std.
pub async fn timeout_impl<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    async_std::future::timeout(duration, future)
        .await
        .map_err(|_| TimedOut)
}

/// Run a blocking closure on async-std's blocking pool.
pub async fn unblock_impl<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    async_std::task::spawn_blocking(f).await
}

/// Spawn a task using async-std.
pub fn spawn<F, T>(future: F) -> AsyncStdJoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    AsyncStdSpawner::spawn(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn test_is_finished_after_completion() {
        let handle = spawn(async { 7 });
        while !handle.is_finished() {
            async_std::task::yield_now().await;
        }
        assert_eq!(handle.await, 7);
    }

    #[async_std::test]
    async fn test_is_finished_after_abort() {
        let mut handle = spawn(async_std::future::pending::<()>());
        assert!(!handle.is_finished());
        handle.abort();
        assert!(handle.is_finished());
    }
}
