//! A [`TaskPool`] with a limit on how many tasks run at once.

use super::*;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

pub struct BoundedTaskPool {
    inner: TaskPool,
    semaphore: Arc<Semaphore>,
}

impl BoundedTaskPool {
    pub fn new(max_concurrent: core::num::NonZeroUsize) -> Self {
        Self {
            inner: TaskPool::new(),
            semaphore: Arc::new(Semaphore::new(max_concurrent.get())),
        }
    }

    /// Spawns `task` if the pool is below its limit, otherwise hands `task`
    /// back to the caller.
    ///
    /// Listeners use this to refuse connections rather than queue them.
    pub fn try_spawn<F>(&self, task: F) -> Result<tokio::task::JoinHandle<F::Output>, F>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Ok(self.spawn_with(permit, task)),
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => Err(task),
        }
    }

    /// Spawns `task`, waiting for a slot if the pool is at its limit.
    ///
    /// Returns `None` if the pool is cancelled while waiting.
    pub async fn spawn<F>(&self, task: F) -> Option<tokio::task::JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = self.inner.cancel_token().cancelled() => return None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok()?,
        };
        Some(self.spawn_with(permit, task))
    }

    fn spawn_with<F>(
        &self,
        permit: OwnedSemaphorePermit,
        task: F,
    ) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.spawn(async move {
            let result = task.await;
            drop(permit);
            result
        })
    }

    /// The number of free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.inner.cancel_token()
    }

    pub fn child_token(&self) -> CancellationToken {
        self.inner.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
        self.semaphore.close();
    }
}
