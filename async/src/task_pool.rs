use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// A group of tasks sharing one cancellation token.
///
/// [`TaskPool::shutdown`] cancels the token, stops further spawns from being
/// tracked, then waits for every spawned task to return. Tasks are expected to
/// watch the token (or a child of it) and finish whatever teardown they need
/// before returning.
/// Clones share the token and the tracker.
#[derive(Debug, Default, Clone)]
pub struct TaskPool {
    cancel_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl TaskPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// A token cancelled with the pool, but which can also be cancelled on its
    /// own without affecting the pool.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    pub fn spawn<F>(&self, task: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.task_tracker.spawn(task)
    }

    /// The number of tasks still running.
    pub fn len(&self) -> usize {
        self.task_tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_tracker.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }
}
